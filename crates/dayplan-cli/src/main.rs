mod config;
mod plan_cmds;
mod prompt_cmds;
mod schedule_cmds;
mod serve_cmd;

#[cfg(test)]
mod test_util;

use clap::{Parser, Subcommand};
use sqlx::PgPool;
use uuid::Uuid;

use dayplan_db::config::DbConfig;
use dayplan_db::pool;

use config::DayplanConfig;

#[derive(Parser)]
#[command(name = "dayplan", about = "Cached LLM daily planning")]
struct Cli {
    /// Database URL (overrides DAYPLAN_DATABASE_URL and config file)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Owner of the plans, prompts and tasks being worked on
    #[arg(long, global = true, env = "DAYPLAN_USER")]
    user: Option<Uuid>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file with database and Gemini settings
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Gemini model name
        #[arg(long)]
        model: Option<String>,
        /// Gemini API base URL
        #[arg(long)]
        base_url: Option<String>,
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the database (if needed) and run migrations
    DbInit,
    /// Show today's plan, generating it on a cache miss
    Plan {
        /// Regenerate even if today's plan is cached
        #[arg(long)]
        reschedule: bool,
        /// Override text for the regenerated plan (implies --reschedule)
        #[arg(long = "override", value_name = "TEXT")]
        override_text: Option<String>,
        /// Plan as of this local time (YYYY-MM-DDTHH:MM)
        #[arg(long, value_name = "DATETIME")]
        as_of: Option<String>,
        /// Use the built-in sample plan instead of Gemini
        #[arg(long)]
        fixture: bool,
    },
    /// Build the onboarding plan from the latest goals and commitments
    Onboard {
        /// Plan as of this local time (YYYY-MM-DDTHH:MM)
        #[arg(long, value_name = "DATETIME")]
        as_of: Option<String>,
        /// Use the built-in sample plan instead of Gemini
        #[arg(long)]
        fixture: bool,
    },
    /// Capture and list free-text goals, commitments and overrides
    Prompt {
        #[command(subcommand)]
        command: PromptCommands,
    },
    /// Inspect materialized schedules
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommands,
    },
    /// Record feedback on scheduled tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Serve the JSON HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
        /// Use the built-in sample plan instead of Gemini
        #[arg(long)]
        fixture: bool,
    },
}

#[derive(Subcommand)]
pub enum PromptCommands {
    /// Store an input (kind: goal, commitment, override or other)
    Add {
        kind: String,
        /// The input text
        text: String,
    },
    /// List captured inputs and generated plans, newest first
    List {
        /// Only entries of this kind
        #[arg(long)]
        kind: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[derive(Subcommand)]
pub enum ScheduleCommands {
    /// Show the schedule for a date (default: today)
    Show {
        /// Date as YYYY-MM-DD
        date: Option<String>,
    },
    /// List recent schedules
    List {
        #[arg(long, default_value_t = 14)]
        limit: i64,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Mark a task complete or not, with optional notes and a 1-5 rating
    Feedback {
        /// Task ID (UUID)
        task_id: String,
        #[arg(long)]
        completed: bool,
        #[arg(long, default_value = "")]
        feedback: String,
        #[arg(long)]
        rating: Option<i16>,
    },
}

fn cmd_init(
    db_url: &str,
    model: Option<String>,
    base_url: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        gemini: config::GeminiSection {
            model,
            base_url,
            api_key: None,
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    if let Some(model) = &cfg.gemini.model {
        println!("  gemini.model = {model}");
    }
    println!();
    println!("Set GEMINI_API_KEY, then run `dayplan db-init` to create and migrate the database.");

    Ok(())
}

async fn cmd_db_init(resolved: &DayplanConfig) -> anyhow::Result<()> {
    println!("Initializing dayplan database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    let applied = pool::run_migrations(&db_pool).await?;
    if applied.is_empty() {
        println!("Schema already up to date.");
    }
    for migration in &applied {
        println!("  applied {:04} {}", migration.version, migration.description);
    }

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("dayplan db-init complete.");
    Ok(())
}

fn require_user(user: Option<Uuid>) -> anyhow::Result<Uuid> {
    user.ok_or_else(|| anyhow::anyhow!("no user given; pass --user <UUID> or set DAYPLAN_USER"))
}

/// Run a command that needs a database pool.
async fn run_command(
    command: Commands,
    user: Option<Uuid>,
    db_pool: &PgPool,
    resolved: &DayplanConfig,
) -> anyhow::Result<()> {
    match command {
        Commands::Init { .. } | Commands::DbInit => Ok(()),
        Commands::Plan {
            reschedule,
            override_text,
            as_of,
            fixture,
        } => {
            let options = plan_cmds::PlanOptions {
                reschedule,
                override_text,
                as_of,
                fixture,
            };
            plan_cmds::run_plan(db_pool, &resolved.gemini, require_user(user)?, options).await
        }
        Commands::Onboard { as_of, fixture } => {
            let owner = require_user(user)?;
            plan_cmds::run_onboard(db_pool, &resolved.gemini, owner, as_of, fixture).await
        }
        Commands::Prompt { command } => {
            prompt_cmds::run_prompt_command(command, db_pool, require_user(user)?).await
        }
        Commands::Schedule { command } => {
            schedule_cmds::run_schedule_command(command, db_pool, require_user(user)?).await
        }
        Commands::Task { command } => {
            schedule_cmds::run_task_command(command, db_pool, require_user(user)?).await
        }
        Commands::Serve {
            bind,
            port,
            fixture,
        } => {
            let gateway =
                plan_cmds::build_gateway(&resolved.gemini, fixture.then(plan_cmds::today))?;
            serve_cmd::run_serve(db_pool.clone(), gateway, &bind, port).await
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            model,
            base_url,
            force,
        } => {
            cmd_init(&db_url, model, base_url, force)?;
        }
        Commands::DbInit => {
            let resolved = DayplanConfig::resolve(cli.database_url.as_deref());
            cmd_db_init(&resolved).await?;
        }
        command => {
            let resolved = DayplanConfig::resolve(cli.database_url.as_deref());
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = run_command(command, cli.user, &db_pool, &resolved).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
