//! Pool construction, embedded migrations and the `db-init` helpers.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::{debug, info};

use crate::config::DbConfig;

/// Migrations embedded at compile time from `crates/dayplan-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Every table dayplan owns, parents before children.
pub const DAYPLAN_TABLES: &[&str] = &[
    "cache_entries",
    "schedules",
    "tasks",
    "schedule_tasks",
    "profiles",
    "behaviour_patterns",
];

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// A migration applied by [`run_migrations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: i64,
    pub description: String,
}

pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.database_url)
        .await
        .with_context(|| format!("failed to connect to database at {}", config.database_url))
}

/// Versions recorded as successfully applied. Empty before the first run.
async fn applied_versions(pool: &PgPool) -> Result<HashSet<i64>> {
    let tracked: bool = sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
        .fetch_one(pool)
        .await
        .context("failed to look for the migrations table")?;
    if !tracked {
        return Ok(HashSet::new());
    }

    let versions: Vec<i64> = sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success")
        .fetch_all(pool)
        .await
        .context("failed to read applied migrations")?;
    Ok(versions.into_iter().collect())
}

/// Apply pending migrations and return the ones this call applied.
pub async fn run_migrations(pool: &PgPool) -> Result<Vec<AppliedMigration>> {
    let before = applied_versions(pool).await?;

    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;

    let applied: Vec<AppliedMigration> = MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration() && !before.contains(&m.version))
        .map(|m| AppliedMigration {
            version: m.version,
            description: m.description.to_string(),
        })
        .collect();

    for migration in &applied {
        info!(
            version = migration.version,
            description = %migration.description,
            "applied migration"
        );
    }
    if applied.is_empty() {
        debug!("schema up to date");
    }
    Ok(applied)
}

/// Whether `name` can be spliced into `CREATE DATABASE` unquoted.
fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Create the configured database through the `postgres` maintenance
/// database unless it already exists.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<()> {
    let Some(db_name) = config.database_name() else {
        bail!("database URL {} names no database", config.database_url);
    };
    if !is_plain_identifier(db_name) {
        bail!("database name {db_name:?} may only contain letters, digits and underscores");
    }

    let maintenance_url = config.maintenance_url();
    let maint = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&maintenance_url)
        .await
        .with_context(|| format!("failed to connect to maintenance database at {maintenance_url}"))?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(&maint)
            .await
            .context("failed to query pg_database")?;

    let created = if exists {
        false
    } else {
        maint
            .execute(format!("CREATE DATABASE {db_name}").as_str())
            .await
            .with_context(|| format!("failed to create database {db_name}"))?;
        true
    };
    maint.close().await;

    info!(db = db_name, created, "database ready");
    Ok(())
}

/// Row count of each table in [`DAYPLAN_TABLES`], in that order.
pub async fn table_counts(pool: &PgPool) -> Result<Vec<(&'static str, i64)>> {
    let mut counts = Vec::with_capacity(DAYPLAN_TABLES.len());
    for &table in DAYPLAN_TABLES {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to count rows in {table}"))?;
        counts.push((table, count));
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_reject_quoting_and_separators() {
        assert!(is_plain_identifier("dayplan"));
        assert!(is_plain_identifier("dayplan_test_01"));
        assert!(!is_plain_identifier(""));
        assert!(!is_plain_identifier("day-plan"));
        assert!(!is_plain_identifier("x; DROP DATABASE y"));
        assert!(!is_plain_identifier("\"quoted\""));
    }

    #[test]
    fn migrations_are_numbered_in_order() {
        let versions: Vec<i64> = MIGRATOR.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![1, 2, 3, 4]);
    }
}
