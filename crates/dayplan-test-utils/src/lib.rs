//! PostgreSQL fixtures for dayplan integration tests.
//!
//! Every test gets a fresh, migrated database inside one server shared by
//! the whole test binary. The server is either the one named by
//! `DAYPLAN_TEST_PG_URL` (root URL, no database segment) or a
//! testcontainers-managed `postgres:18` started on first use.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use testcontainers::ContainerAsync;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use dayplan_db::pool;

/// Environment variable naming an already-running server.
pub const PG_URL_ENV: &str = "DAYPLAN_TEST_PG_URL";

const DB_PREFIX: &str = "dayplan_test_";

struct Server {
    root_url: String,
    _container: Option<ContainerAsync<Postgres>>,
}

static SERVER: OnceCell<Server> = OnceCell::const_new();

async fn start_server() -> Server {
    if let Ok(root_url) = std::env::var(PG_URL_ENV) {
        return Server {
            root_url: root_url.trim_end_matches('/').to_owned(),
            _container: None,
        };
    }

    let container = Postgres::default()
        .with_tag("18")
        .start()
        .await
        .expect("failed to start PostgreSQL container");
    let host = container.get_host().await.expect("container host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("container port 5432");

    Server {
        root_url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

/// Root URL of the shared server, without a database name.
pub async fn pg_url() -> &'static str {
    &SERVER.get_or_init(start_server).await.root_url
}

async fn connect(url: &str, max_connections: u32) -> PgPool {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(url)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to {url}: {e}"))
}

async fn maintenance_pool() -> PgPool {
    connect(&format!("{}/postgres", pg_url().await), 1).await
}

/// Create a uniquely named database and apply all migrations.
///
/// Returns `(pool, db_name)`; pass `db_name` to [`drop_test_db`] when done.
pub async fn create_test_db() -> (PgPool, String) {
    let db_name = format!("{DB_PREFIX}{}", Uuid::new_v4().simple());

    let maint = maintenance_pool().await;
    maint
        .execute(format!("CREATE DATABASE {db_name}").as_str())
        .await
        .unwrap_or_else(|e| panic!("failed to create {db_name}: {e}"));
    maint.close().await;

    // Enough connections for the concurrent-request tests.
    let pool = connect(&format!("{}/{db_name}", pg_url().await), 10).await;
    pool::run_migrations(&pool)
        .await
        .expect("migrations should apply to a fresh database");

    (pool, db_name)
}

/// Drop a database created by [`create_test_db`], terminating any
/// connections still attached. Missing databases are ignored.
pub async fn drop_test_db(db_name: &str) {
    let maint = maintenance_pool().await;
    let _ = maint
        .execute(
            format!(
                "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
                 WHERE datname = '{db_name}' AND pid <> pg_backend_pid()"
            )
            .as_str(),
        )
        .await;
    let _ = maint
        .execute(format!("DROP DATABASE IF EXISTS {db_name}").as_str())
        .await;
    maint.close().await;
}
