//! Integration tests for the plan orchestrator: cache hits, reschedules,
//! onboarding, failure rollback and single-flight generation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use dayplan_core::error::{CaptureError, PlanError};
use dayplan_core::gateway::{FixtureGenerator, GenerationError, GenerationGateway, Generator};
use dayplan_core::orchestrator::{OnboardRequest, PlanRequest, PlanSource, Planner};
use dayplan_core::plan::{self, ONBOARDING_SOURCE, TaskFeedback};
use dayplan_db::models::{ProfileKind, RequestKind};
use dayplan_db::queries::{cache_entries, profiles};
use dayplan_test_utils::{create_test_db, drop_test_db};

// ===========================================================================
// Scripted generator
// ===========================================================================

/// Builds a plan for the first date found in the prompt and counts calls.
#[derive(Default)]
struct ScriptedGenerator {
    calls: AtomicUsize,
    delay: Option<Duration>,
    unavailable: bool,
    /// Returned verbatim instead of a built plan.
    fixed: Option<String>,
}

impl ScriptedGenerator {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn plan_json(date: &str, with_override: bool) -> String {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%A").to_string())
        .unwrap_or_default();

    let mut tasks = Vec::new();
    if with_override {
        tasks.push(json!({
            "task_name": "Dentist appointment",
            "description": "Override task",
            "estimated_duration_minutes": 60,
            "priority": "Highest",
            "suggested_time": "3:00 PM",
            "is_flexible": false
        }));
    }
    tasks.push(json!({
        "task_name": "Write report",
        "description": "Draft section 2",
        "estimated_duration_minutes": 90,
        "priority": "High",
        "related_goal": "Ship the report",
        "suggested_time": "9:00 AM",
        "is_flexible": true
    }));
    tasks.push(json!({
        "task_name": "Gym",
        "description": "Strength session",
        "estimated_duration_minutes": 45,
        "priority": "Medium",
        "suggested_time": "18:00"
    }));

    json!({
        "date": date,
        "day_of_week": day,
        "tasks": tasks,
        "total_committed_hours": 3.25,
        "total_available_hours": 10.0,
        "notes": "scripted",
        "updated_commitments": ["Standup at 9"],
        "updated_goals": ["Ship the report", "Stay fit"],
        "user_behaviour_patterns": ["Focus best in the morning", "Skips lunch"]
    })
    .to_string()
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    fn ensure_available(&self) -> Result<(), GenerationError> {
        if self.unavailable {
            Err(GenerationError::Unavailable("scripted outage".into()))
        } else {
            Ok(())
        }
    }

    async fn generate(&self, prompt: &str, _schema: &Value) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(fixed) = &self.fixed {
            return Ok(fixed.clone());
        }
        let date = prompt
            .find("2025-")
            .map(|i| &prompt[i..i + 10])
            .unwrap_or("2025-01-01");
        Ok(plan_json(date, prompt.contains("OVERRIDE")))
    }
}

// ===========================================================================
// Helpers
// ===========================================================================

fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn planner(pool: &PgPool, generator: Arc<ScriptedGenerator>) -> Planner {
    Planner::new(pool.clone(), GenerationGateway::new(generator))
}

async fn count_entries(pool: &PgPool, kind: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM cache_entries WHERE request_kind = $1")
        .bind(kind)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn count_schedules(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM schedules")
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn task_names(pool: &PgPool, owner: Uuid, day: u32) -> Vec<String> {
    let date = NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
    plan::get_schedule_with_tasks(pool, owner, date)
        .await
        .unwrap()
        .expect("schedule exists")
        .tasks
        .into_iter()
        .map(|t| t.task_name)
        .collect()
}

// ===========================================================================
// Daily plan
// ===========================================================================

#[tokio::test]
async fn cold_cache_generates_then_serves_cached() {
    let (pool, db_name) = create_test_db().await;
    let generator = Arc::new(ScriptedGenerator::default());
    let planner = planner(&pool, generator.clone());
    let owner = Uuid::new_v4();

    let first = planner
        .daily_plan(&PlanRequest::new(owner, at(10, 8, 0)))
        .await
        .unwrap();
    assert_eq!(first.source, PlanSource::Generated);
    assert_eq!(first.plan.date, "2025-03-10");
    let entry = cache_entries::get(&pool, first.cache_entry_id).await.unwrap().unwrap();
    assert_eq!(entry.use_count, 0);
    assert!(entry.is_resolved());
    assert!(!entry.is_synthetic);
    assert_eq!(task_names(&pool, owner, 10).await, ["Write report", "Gym"]);

    let second = planner
        .daily_plan(&PlanRequest::new(owner, at(10, 17, 45)))
        .await
        .unwrap();
    assert_eq!(second.source, PlanSource::Cached);
    assert_eq!(second.cache_entry_id, first.cache_entry_id);
    assert_eq!(second.plan, first.plan);
    let entry = cache_entries::get(&pool, first.cache_entry_id).await.unwrap().unwrap();
    assert_eq!(entry.use_count, 1);

    assert_eq!(generator.calls(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn blank_override_serves_cached_plan() {
    let (pool, db_name) = create_test_db().await;
    let generator = Arc::new(ScriptedGenerator::default());
    let planner = planner(&pool, generator.clone());
    let owner = Uuid::new_v4();

    let first = planner
        .daily_plan(&PlanRequest::new(owner, at(10, 8, 0)))
        .await
        .unwrap();

    let again = planner
        .daily_plan(&PlanRequest::new(owner, at(10, 12, 0)).reschedule(Some("   ".into())))
        .await
        .unwrap();
    assert_eq!(again.source, PlanSource::Cached);
    assert_eq!(again.cache_entry_id, first.cache_entry_id);
    assert_eq!(generator.calls(), 1);
    assert_eq!(count_entries(&pool, "override").await, 0);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn override_regenerates_and_replaces_links() {
    let (pool, db_name) = create_test_db().await;
    let generator = Arc::new(ScriptedGenerator::default());
    let planner = planner(&pool, generator.clone());
    let owner = Uuid::new_v4();

    let first = planner
        .daily_plan(&PlanRequest::new(owner, at(10, 8, 0)))
        .await
        .unwrap();

    let rescheduled = planner
        .daily_plan(
            &PlanRequest::new(owner, at(10, 12, 0)).reschedule(Some("Dentist at 3 PM".into())),
        )
        .await
        .unwrap();
    assert_eq!(rescheduled.source, PlanSource::Generated);
    assert_ne!(rescheduled.cache_entry_id, first.cache_entry_id);
    assert_eq!(generator.calls(), 2);
    assert_eq!(
        task_names(&pool, owner, 10).await,
        ["Dentist appointment", "Write report", "Gym"]
    );
    assert_eq!(count_schedules(&pool).await, 1);

    let captured = cache_entries::latest_for_owner(&pool, owner, RequestKind::Override)
        .await
        .unwrap()
        .expect("override captured");
    assert_eq!(captured.raw_content, "Dentist at 3 PM");

    // No text: falls back to the captured override; same prompt, no generation.
    let fallback = planner
        .daily_plan(&PlanRequest::new(owner, at(10, 12, 30)).reschedule(None))
        .await
        .unwrap();
    assert_eq!(fallback.source, PlanSource::CacheHit);
    assert_eq!(fallback.cache_entry_id, rescheduled.cache_entry_id);
    assert_eq!(generator.calls(), 2);

    // A plain request now serves the newest plan for the day.
    let plain = planner
        .daily_plan(&PlanRequest::new(owner, at(10, 13, 0)))
        .await
        .unwrap();
    assert_eq!(plain.source, PlanSource::Cached);
    assert_eq!(plain.cache_entry_id, rescheduled.cache_entry_id);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn overrides_differing_only_in_time_regenerate() {
    let (pool, db_name) = create_test_db().await;
    let generator = Arc::new(ScriptedGenerator::default());
    let planner = planner(&pool, generator.clone());
    let owner = Uuid::new_v4();

    let first = planner
        .daily_plan(
            &PlanRequest::new(owner, at(10, 9, 0))
                .reschedule(Some("Client meeting moved to 15:00".into())),
        )
        .await
        .unwrap();
    assert_eq!(first.source, PlanSource::Generated);

    let second = planner
        .daily_plan(
            &PlanRequest::new(owner, at(10, 9, 30))
                .reschedule(Some("Client meeting moved to 16:00".into())),
        )
        .await
        .unwrap();
    assert_eq!(second.source, PlanSource::Generated);
    assert_ne!(second.cache_entry_id, first.cache_entry_id);
    assert_eq!(generator.calls(), 2);

    let stored = cache_entries::get(&pool, second.cache_entry_id)
        .await
        .unwrap()
        .expect("entry stored");
    assert!(stored.raw_content.contains("Client meeting moved to 16:00"));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn feedback_survives_rescheduling() {
    let (pool, db_name) = create_test_db().await;
    let generator = Arc::new(ScriptedGenerator::default());
    let planner = planner(&pool, generator.clone());
    let owner = Uuid::new_v4();

    planner
        .daily_plan(&PlanRequest::new(owner, at(10, 8, 0)))
        .await
        .unwrap();
    let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let before = plan::get_schedule_with_tasks(&pool, owner, date)
        .await
        .unwrap()
        .unwrap();
    let gym = before.tasks.iter().find(|t| t.task_name == "Gym").unwrap();

    plan::record_task_feedback(
        &pool,
        gym.id,
        owner,
        &TaskFeedback {
            completed: true,
            feedback: "felt great".into(),
            rating: Some(5),
        },
    )
    .await
    .unwrap();

    planner
        .daily_plan(&PlanRequest::new(owner, at(10, 9, 0)).reschedule(Some("Dentist".into())))
        .await
        .unwrap();

    let after = plan::get_schedule_with_tasks(&pool, owner, date)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.schedule.id, before.schedule.id);
    let gym_after = after.tasks.iter().find(|t| t.task_name == "Gym").unwrap();
    assert_eq!(gym_after.id, gym.id);
    assert!(gym_after.completed);
    assert_eq!(gym_after.feedback, "felt great");
    assert_eq!(gym_after.rating, Some(5));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn days_do_not_share_cache_entries() {
    let (pool, db_name) = create_test_db().await;
    let generator = Arc::new(ScriptedGenerator::default());
    let planner = planner(&pool, generator.clone());
    let owner = Uuid::new_v4();

    let monday = planner
        .daily_plan(&PlanRequest::new(owner, at(10, 8, 0)))
        .await
        .unwrap();
    let tuesday = planner
        .daily_plan(&PlanRequest::new(owner, at(11, 8, 0)))
        .await
        .unwrap();

    assert_eq!(tuesday.source, PlanSource::Generated);
    assert_ne!(monday.cache_entry_id, tuesday.cache_entry_id);
    assert_eq!(tuesday.plan.date, "2025-03-11");
    assert_eq!(generator.calls(), 2);
    assert_eq!(count_schedules(&pool).await, 2);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn owners_do_not_share_cache_entries() {
    let (pool, db_name) = create_test_db().await;
    let generator = Arc::new(ScriptedGenerator::default());
    let planner = planner(&pool, generator.clone());

    let a = planner
        .daily_plan(&PlanRequest::new(Uuid::new_v4(), at(10, 8, 0)))
        .await
        .unwrap();
    let b = planner
        .daily_plan(&PlanRequest::new(Uuid::new_v4(), at(10, 8, 0)))
        .await
        .unwrap();

    assert_eq!(b.source, PlanSource::Generated);
    assert_ne!(a.cache_entry_id, b.cache_entry_id);
    assert_eq!(generator.calls(), 2);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn concurrent_identical_requests_generate_once() {
    let (pool, db_name) = create_test_db().await;
    let generator = Arc::new(ScriptedGenerator {
        delay: Some(Duration::from_millis(300)),
        ..ScriptedGenerator::default()
    });
    let planner = planner(&pool, generator.clone());
    let owner = Uuid::new_v4();

    let request = PlanRequest::new(owner, at(10, 8, 0));
    let results =
        futures::future::join_all((0..5).map(|_| planner.daily_plan(&request))).await;

    let outcomes: Vec<_> = results.into_iter().map(|r| r.expect("request succeeds")).collect();
    assert_eq!(generator.calls(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| o.source == PlanSource::Generated)
            .count(),
        1
    );
    let id = outcomes[0].cache_entry_id;
    assert!(outcomes.iter().all(|o| o.cache_entry_id == id));
    assert_eq!(count_entries(&pool, "summary").await, 1);
    assert_eq!(task_names(&pool, owner, 10).await, ["Write report", "Gym"]);

    pool.close().await;
    drop_test_db(&db_name).await;
}

// ===========================================================================
// Failures roll back
// ===========================================================================

#[tokio::test]
async fn unavailable_generator_leaves_no_cache_entry() {
    let (pool, db_name) = create_test_db().await;
    let generator = Arc::new(ScriptedGenerator {
        unavailable: true,
        ..ScriptedGenerator::default()
    });
    let planner = planner(&pool, generator.clone());

    let err = planner
        .daily_plan(&PlanRequest::new(Uuid::new_v4(), at(10, 8, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::GenerationUnavailable(_)), "{err:?}");
    assert_eq!(generator.calls(), 0);
    assert_eq!(count_entries(&pool, "summary").await, 0);
    assert_eq!(count_schedules(&pool).await, 0);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn priority_outside_closed_set_fails_validation() {
    let (pool, db_name) = create_test_db().await;
    let raw = plan_json("2025-03-10", false).replace("\"Medium\"", "\"Critical\"");
    let generator = Arc::new(ScriptedGenerator {
        fixed: Some(raw.clone()),
        ..ScriptedGenerator::default()
    });
    let planner = planner(&pool, generator.clone());

    let err = planner
        .daily_plan(&PlanRequest::new(Uuid::new_v4(), at(10, 8, 0)))
        .await
        .unwrap_err();
    match err {
        PlanError::GenerationValidation { raw: got, reason } => {
            assert_eq!(got, raw);
            assert!(reason.contains("Critical"), "{reason}");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(count_entries(&pool, "summary").await, 0);
    assert_eq!(count_schedules(&pool).await, 0);

    // The next attempt generates again instead of serving a failure.
    let _ = planner
        .daily_plan(&PlanRequest::new(Uuid::new_v4(), at(10, 8, 0)))
        .await;
    assert_eq!(generator.calls(), 2);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn invalid_plan_date_rolls_back_everything() {
    let (pool, db_name) = create_test_db().await;
    let raw = plan_json("2025-03-10", false).replace("\"2025-03-10\"", "\"someday\"");
    let generator = Arc::new(ScriptedGenerator {
        fixed: Some(raw),
        ..ScriptedGenerator::default()
    });
    let planner = planner(&pool, generator.clone());

    let err = planner
        .daily_plan(&PlanRequest::new(Uuid::new_v4(), at(10, 8, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::PlanDateInvalid(ref d) if d == "someday"), "{err:?}");
    assert_eq!(count_entries(&pool, "summary").await, 0);
    assert_eq!(count_schedules(&pool).await, 0);
    let tasks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(tasks, 0);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn fixture_generator_flags_entries_synthetic() {
    let (pool, db_name) = create_test_db().await;
    let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let planner = Planner::new(
        pool.clone(),
        GenerationGateway::new(Arc::new(FixtureGenerator::sample(date))),
    );

    let outcome = planner
        .daily_plan(&PlanRequest::new(Uuid::new_v4(), at(10, 8, 0)))
        .await
        .unwrap();
    let entry = cache_entries::get(&pool, outcome.cache_entry_id)
        .await
        .unwrap()
        .unwrap();
    assert!(entry.is_synthetic);

    pool.close().await;
    drop_test_db(&db_name).await;
}

// ===========================================================================
// Onboarding and input capture
// ===========================================================================

#[tokio::test]
async fn onboarding_bootstraps_profiles_only_when_generated() {
    let (pool, db_name) = create_test_db().await;
    let generator = Arc::new(ScriptedGenerator::default());
    let planner = planner(&pool, generator.clone());
    let owner = Uuid::new_v4();

    planner
        .capture_input(owner, RequestKind::Goal, "Ship the report by Friday")
        .await
        .unwrap();
    planner
        .capture_input(owner, RequestKind::Commitment, "Standup at 9:00 AM")
        .await
        .unwrap();

    let first = planner
        .onboard(&OnboardRequest {
            owner,
            as_of: at(10, 12, 0),
        })
        .await
        .unwrap();
    assert_eq!(first.source, PlanSource::Generated);

    let goals = profiles::get_profile(&pool, owner, ProfileKind::Goals)
        .await
        .unwrap()
        .expect("goals profile");
    assert_eq!(goals.items, vec!["Ship the report".to_owned(), "Stay fit".to_owned()]);
    assert_eq!(goals.source, ONBOARDING_SOURCE);
    let commitments = profiles::get_profile(&pool, owner, ProfileKind::Commitments)
        .await
        .unwrap()
        .expect("commitments profile");
    assert_eq!(commitments.items, vec!["Standup at 9".to_owned()]);

    let patterns = profiles::list_recent_behaviour_patterns(&pool, owner, 10)
        .await
        .unwrap();
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].pattern_text, "Focus best in the morning\nSkips lunch");
    assert_eq!(patterns[0].date, NaiveDate::from_ymd_opt(2025, 3, 10));

    // Same inputs later: cache hit, no new generation, no new patterns.
    let second = planner
        .onboard(&OnboardRequest {
            owner,
            as_of: at(12, 18, 30),
        })
        .await
        .unwrap();
    assert_eq!(second.source, PlanSource::CacheHit);
    assert_eq!(second.cache_entry_id, first.cache_entry_id);
    assert_eq!(generator.calls(), 1);
    let patterns = profiles::list_recent_behaviour_patterns(&pool, owner, 10)
        .await
        .unwrap();
    assert_eq!(patterns.len(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn onboarding_without_goals_keeps_existing_profiles() {
    let (pool, db_name) = create_test_db().await;
    let owner = Uuid::new_v4();

    let seeding = planner(&pool, Arc::new(ScriptedGenerator::default()));
    seeding
        .capture_input(owner, RequestKind::Goal, "Ship the report by Friday")
        .await
        .unwrap();
    seeding
        .onboard(&OnboardRequest {
            owner,
            as_of: at(10, 12, 0),
        })
        .await
        .unwrap();

    let bare = json!({
        "date": "2025-03-11",
        "day_of_week": "Tuesday",
        "tasks": [],
        "updated_goals": [],
        "updated_commitments": [],
        "user_behaviour_patterns": []
    })
    .to_string();
    let generator = Arc::new(ScriptedGenerator {
        fixed: Some(bare),
        ..ScriptedGenerator::default()
    });
    let planner = planner(&pool, generator.clone());
    planner
        .capture_input(owner, RequestKind::Goal, "Run a half marathon")
        .await
        .unwrap();
    let outcome = planner
        .onboard(&OnboardRequest {
            owner,
            as_of: at(11, 12, 0),
        })
        .await
        .unwrap();
    assert_eq!(outcome.source, PlanSource::Generated);
    assert_eq!(generator.calls(), 1);

    let goals = profiles::get_profile(&pool, owner, ProfileKind::Goals)
        .await
        .unwrap()
        .expect("goals profile");
    assert_eq!(goals.items, vec!["Ship the report".to_owned(), "Stay fit".to_owned()]);
    let commitments = profiles::get_profile(&pool, owner, ProfileKind::Commitments)
        .await
        .unwrap()
        .expect("commitments profile");
    assert_eq!(commitments.items, vec!["Standup at 9".to_owned()]);
    let patterns = profiles::list_recent_behaviour_patterns(&pool, owner, 10)
        .await
        .unwrap();
    assert_eq!(patterns.len(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn captured_input_is_deduplicated_and_validated() {
    let (pool, db_name) = create_test_db().await;
    let planner = planner(&pool, Arc::new(ScriptedGenerator::default()));
    let owner = Uuid::new_v4();

    let (first, created) = planner
        .capture_input(owner, RequestKind::Goal, "Learn Rust")
        .await
        .unwrap();
    assert!(created);
    let (again, created) = planner
        .capture_input(owner, RequestKind::Goal, "  Learn Rust ")
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(again.id, first.id);
    assert_eq!(again.use_count, 1);

    assert!(matches!(
        planner.capture_input(owner, RequestKind::Goal, "   ").await,
        Err(CaptureError::Blank)
    ));
    assert!(matches!(
        planner.capture_input(owner, RequestKind::Summary, "x").await,
        Err(CaptureError::NotUserInput(RequestKind::Summary))
    ));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn previous_day_feedback_changes_the_prompt() {
    let (pool, db_name) = create_test_db().await;
    let generator = Arc::new(ScriptedGenerator::default());
    let planner = planner(&pool, generator.clone());
    let owner = Uuid::new_v4();

    planner
        .daily_plan(&PlanRequest::new(owner, at(9, 8, 0)))
        .await
        .unwrap();
    let sunday = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
    let schedule = plan::get_schedule_with_tasks(&pool, owner, sunday)
        .await
        .unwrap()
        .unwrap();
    plan::record_task_feedback(
        &pool,
        schedule.tasks[0].id,
        owner,
        &TaskFeedback {
            completed: false,
            feedback: "ran out of time".into(),
            rating: Some(2),
        },
    )
    .await
    .unwrap();

    let monday = planner
        .daily_plan(&PlanRequest::new(owner, at(10, 8, 0)))
        .await
        .unwrap();
    let entry = cache_entries::get(&pool, monday.cache_entry_id)
        .await
        .unwrap()
        .unwrap();
    assert!(entry.raw_content.contains("ran out of time"));
    assert!(entry.raw_content.contains("rated 2/5"));

    pool.close().await;
    drop_test_db(&db_name).await;
}
