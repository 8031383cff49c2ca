use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

use leadline_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

/// Session pragmas for every pooled connection. WAL lets the health probe
/// read while a webhook turn writes; foreign keys guard the
/// messages-to-leads relation; the busy timeout rides out write contention
/// between concurrent contacts.
const SESSION_PRAGMAS: &[&str] =
    &["PRAGMA foreign_keys = ON", "PRAGMA journal_mode = WAL", "PRAGMA busy_timeout = 5000"];

/// Opens the pool described by the `[database]` config section.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(&config.url, config.max_connections, config.timeout_secs).await
}

pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                for pragma in SESSION_PRAGMAS {
                    sqlx::query(pragma).execute(&mut *conn).await?;
                }
                Ok(())
            })
        })
        .connect(database_url)
        .await
}

#[cfg(test)]
mod tests {
    use leadline_core::config::AppConfig;

    use super::connect;

    #[tokio::test]
    async fn connect_honors_the_database_config_section() {
        let mut config = AppConfig::default();
        config.database.url = "sqlite::memory:".to_string();
        config.database.max_connections = 1;

        let pool = connect(&config.database).await.expect("pool should connect");

        let foreign_keys: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .expect("pragma query");
        assert_eq!(foreign_keys, 1, "foreign key enforcement must be on");

        pool.close().await;
    }
}
