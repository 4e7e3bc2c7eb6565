//! Database initialization for the ordering backend.
//!
//! Provides `init_db_pool` for creating a deadpool-postgres pool and
//! auto-applying SQL migrations from the migrations directory. Migrations
//! are plain `.sql` files applied in lexicographic order, so numbering the
//! files (`0001_...`, `0002_...`) fixes the order.

use anyhow::{Context, Result};
use app_config::AppConfig;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio::fs;
use tokio_postgres::{Client, Config as PgConfig, NoTls};
use tracing::info;

/// Initializes the database connection pool and runs migrations.
///
/// The pool is created once at process start and shared by every repository;
/// each logical operation borrows one connection for its duration and the
/// pool enforces the bounded acquisition wait.
///
/// # Errors
/// Returns an error if the pool cannot be created or migrations fail.
pub async fn init_db_pool(cfg: &AppConfig) -> Result<Pool> {
    let dsn = format!(
        "host={} port={} user={} password={} dbname={} sslmode=disable",
        cfg.db_host, cfg.db_port, cfg.db_user, cfg.db_password, cfg.db_name
    );

    let pg_config: PgConfig = dsn.parse().context("Failed to parse Postgres DSN")?;

    let mgr = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );
    let pool = Pool::builder(mgr)
        .max_size(cfg.db_pool_size)
        .runtime(Runtime::Tokio1)
        .build()
        .context("Failed to create database pool")?;

    let client = pool
        .get()
        .await
        .context("Failed to get DB connection for migrations")?;
    run_migrations(&client, &cfg.migrations_dir).await?;

    Ok(pool)
}

/// Applies all SQL migrations from the given directory to the provided client.
///
/// # Errors
/// Returns an error if migration files cannot be read or applied.
pub async fn run_migrations(client: &Client, migrations_dir: &str) -> Result<()> {
    let mut entries = fs::read_dir(migrations_dir)
        .await
        .context("Failed to read migrations directory")?;

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "sql") {
            paths.push(path);
        }
    }
    paths.sort();

    for path in paths {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!("Applying migration: {}", file_name);
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read migration file {}", file_name))?;

        client
            .batch_execute(&content)
            .await
            .with_context(|| format!("Failed to execute migration {}", file_name))?;
    }
    Ok(())
}
