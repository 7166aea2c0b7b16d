use axum::{
    routing::{get, patch, post},
    Json, Router,
};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tokenforge_backend::config::Config;
use tokenforge_backend::handlers;
use tokenforge_backend::services::{
    broadcaster::EventBroadcaster, payment_gateway::PaymentGatewayClient,
};
use tokenforge_backend::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tokenforge_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("invalid configuration");
    tokenforge_backend::error::init_environment(config.environment);

    // Connect to database
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let payments = PaymentGatewayClient::new(
        config.payment_api_key.clone(),
        config.payment_api_url.clone(),
    );
    let broadcaster = EventBroadcaster::new();
    let bind_addr = config.bind_addr.clone();

    let state = AppState {
        db,
        config: Arc::new(config),
        payments,
        broadcaster,
    };

    // Build router
    let app = Router::new()
        .route("/", get(health))
        // Auth
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/auth/me",
            get(handlers::auth::me).patch(handlers::auth::update_me),
        )
        // Tokens
        .route(
            "/api/tokens",
            post(handlers::token::create_token).get(handlers::token::list_tokens),
        )
        .route(
            "/api/tokens/{id}",
            get(handlers::token::get_token).patch(handlers::token::update_token),
        )
        // Transactions
        .route(
            "/api/transactions",
            post(handlers::transaction::create_transaction)
                .get(handlers::transaction::list_transactions),
        )
        .route(
            "/api/transactions/{id}",
            get(handlers::transaction::get_transaction),
        )
        .route(
            "/api/transactions/{id}/status",
            patch(handlers::transaction::update_transaction_status),
        )
        // Gasless sponsorships
        .route("/api/gasless/sponsor", post(handlers::gasless::sponsor))
        .route("/api/gasless", get(handlers::gasless::list_sponsorships))
        .route("/api/gasless/{id}", get(handlers::gasless::get_sponsorship))
        .route(
            "/api/gasless/{id}/execute",
            post(handlers::gasless::execute_sponsorship),
        )
        // Security policies
        .route(
            "/api/policies",
            post(handlers::policy::create_policy).get(handlers::policy::list_policies),
        )
        .route(
            "/api/policies/{id}",
            patch(handlers::policy::update_policy).delete(handlers::policy::delete_policy),
        )
        // Payments
        .route("/api/payments/plans", get(handlers::payments::list_plans))
        .route("/api/payments/subscribe", post(handlers::payments::subscribe))
        .route(
            "/api/payments/subscription",
            get(handlers::payments::my_subscription),
        )
        .route(
            "/api/payments/webhook",
            post(handlers::payments::payment_webhook),
        )
        // Admin
        .route("/api/admin/stats", get(handlers::admin::stats))
        .route("/api/admin/users", get(handlers::admin::list_users))
        .route(
            "/api/admin/users/{id}/suspend",
            post(handlers::admin::suspend_user),
        )
        .route(
            "/api/admin/users/{id}/unsuspend",
            post(handlers::admin::unsuspend_user),
        )
        .route("/api/admin/audit", get(handlers::admin::list_audit))
        // Realtime events
        .route("/api/events/ws", get(handlers::events_ws::events_websocket))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind");

    tracing::info!("Server listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "tokenforge-backend",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
