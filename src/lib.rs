// src/lib.rs

use sea_orm::DatabaseConnection;
use services::{broadcaster::EventBroadcaster, payment_gateway::PaymentGatewayClient};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<config::Config>,
    pub payments: PaymentGatewayClient,
    pub broadcaster: EventBroadcaster,
}

pub mod config;
pub mod error;

pub mod entities {
    pub mod prelude;
    pub mod audit_logs;
    pub mod gasless_sponsorships;
    pub mod payment_transactions;
    pub mod security_policies;
    pub mod subscription_plans;
    pub mod tokens;
    pub mod transactions;
    pub mod user_subscriptions;
    pub mod users;
}

pub mod auth {
    pub mod extractor;
    pub mod jwt;
    pub mod password;
}

pub mod services {
    pub mod audit;
    pub mod broadcaster;
    pub mod payment_gateway;
    pub mod policy;
    pub mod recorder;
    pub mod webhook;
}

pub mod models {
    pub mod billing;
    pub mod event;
    pub mod gasless;
    pub mod policy;
    pub mod token;
    pub mod transaction;
    pub mod user;
}

pub mod handlers {
    pub mod admin;
    pub mod auth;
    pub mod events_ws;
    pub mod gasless;
    pub mod payments;
    pub mod policy;
    pub mod token;
    pub mod transaction;
}
