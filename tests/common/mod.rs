use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::env;
use std::sync::Arc;

use tokenforge_backend::config::{Config, Environment};
use tokenforge_backend::services::{
    broadcaster::EventBroadcaster, payment_gateway::PaymentGatewayClient,
};
use tokenforge_backend::AppState;

/// Set up test database connection
/// Uses TEST_DATABASE_URL environment variable or falls back to default
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let database_url = env::var("TEST_DATABASE_URL").unwrap_or_else(|_| {
        "postgresql://tokenforge_user@localhost:5432/tokenforge_test".to_string()
    });

    let db = Database::connect(&database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        bind_addr: "127.0.0.1:0".to_string(),
        jwt_secret: "test-jwt-secret".to_string(),
        payment_api_url: "http://127.0.0.1:1".to_string(),
        payment_api_key: "test-payment-key".to_string(),
        webhook_secret: "whsec_test".to_string(),
        sponsor_address: "0x00000000000000000000000000000000000000aa".to_string(),
        environment: Environment::Development,
    }
}

pub async fn create_test_app_state() -> AppState {
    let db = setup_test_db().await.expect("Failed to connect to test DB");
    let config = test_config();
    let payments = PaymentGatewayClient::new(
        config.payment_api_key.clone(),
        config.payment_api_url.clone(),
    );

    AppState {
        db,
        config: Arc::new(config),
        payments,
        broadcaster: EventBroadcaster::new(),
    }
}

/// Unique email per test run to keep reruns independent
#[allow(dead_code)]
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, uuid::Uuid::new_v4())
}
