use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use leadline_agent::conversation::ConversationController;
use leadline_agent::extractor::LlmSlotExtractor;
use leadline_agent::llm::ChatCompletionClient;
use leadline_agent::reply::TemplateReplyGenerator;
use leadline_core::config::{AppConfig, ConfigError, LoadOptions};
use leadline_db::repositories::{SqlLeadRepository, SqlMessageRepository};
use leadline_db::{connect, migrations, DbPool};
use leadline_whatsapp::outbound::{
    CloudApiClient, DeliveryClient, DeliveryError, NoopDeliveryClient,
};

pub type SqlController = ConversationController<
    SqlLeadRepository,
    SqlMessageRepository,
    LlmSlotExtractor<ChatCompletionClient>,
    TemplateReplyGenerator,
>;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub controller: Arc<SqlController>,
    pub delivery: Arc<dyn DeliveryClient>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("llm client initialization failed: {0}")]
    Llm(String),
    #[error("delivery client initialization failed: {0}")]
    Delivery(#[source] DeliveryError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let llm = ChatCompletionClient::from_config(&config.llm)
        .map_err(|error| BootstrapError::Llm(error.to_string()))?;
    let controller = Arc::new(ConversationController::new(
        SqlLeadRepository::new(db_pool.clone()),
        SqlMessageRepository::new(db_pool.clone()),
        LlmSlotExtractor::new(llm),
        TemplateReplyGenerator,
        config.whatsapp.channel.clone(),
    ));

    let delivery = delivery_client(&config)?;

    Ok(Application { config, db_pool, controller, delivery })
}

fn delivery_client(config: &AppConfig) -> Result<Arc<dyn DeliveryClient>, BootstrapError> {
    let (Some(access_token), Some(phone_number_id)) =
        (&config.whatsapp.access_token, &config.whatsapp.phone_number_id)
    else {
        info!(
            event_name = "system.bootstrap.delivery_disabled",
            correlation_id = "bootstrap",
            "no whatsapp access token configured; outbound delivery is a no-op"
        );
        return Ok(Arc::new(NoopDeliveryClient));
    };

    let client = CloudApiClient::new(
        config.whatsapp.api_base_url.clone(),
        phone_number_id.clone(),
        access_token.clone(),
    )
    .map_err(BootstrapError::Delivery)?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use leadline_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn valid_overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                whatsapp_verify_token: Some("hub-secret".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_verify_token() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("error").to_string();
        assert!(message.contains("whatsapp.verify_token"));
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations_and_wires_the_controller() {
        let app = bootstrap(valid_overrides("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('leads', 'messages')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected baseline tables to be available after bootstrap");
        assert_eq!(table_count, 2, "bootstrap should expose the lead-path tables");

        let outcome = app
            .controller
            .handle_turn("+15550001111", "I want to travel")
            .await
            .expect("first turn runs against the migrated store");
        assert_eq!(outcome.reply, "Great! May I know your travel destination?");

        app.db_pool.close().await;
    }
}
