//! Environment-supplied configuration, consumed once at process start.

use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub jwt_secret: String,
    pub payment_api_url: String,
    pub payment_api_key: String,
    pub webhook_secret: String,
    /// Platform account that pays network fees for sponsored transactions
    pub sponsor_address: String,
    pub environment: Environment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl Config {
    /// Load configuration from the environment. Missing required variables
    /// abort startup with the variable name in the message.
    pub fn from_env() -> Result<Self, String> {
        let environment = match env::var("ENVIRONMENT").as_deref() {
            Ok("production") => Environment::Production,
            _ => Environment::Development,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            jwt_secret: required("JWT_SECRET")?,
            payment_api_url: env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "https://api.payments.example.com/v1".to_string()),
            payment_api_key: required("PAYMENT_API_KEY")?,
            webhook_secret: required("WEBHOOK_SECRET")?,
            sponsor_address: required("SPONSOR_ADDRESS")?,
            environment,
        })
    }
}

fn required(name: &str) -> Result<String, String> {
    env::var(name).map_err(|_| format!("{} must be set", name))
}
