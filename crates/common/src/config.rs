//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config. Provider settings live
//! with the provider (`quizdesk_llm::LlmConfig`).

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default upper bound on a single streamed turn
const DEFAULT_TURN_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database connection URL (PostgreSQL)
    pub database_url: String,

    /// Upper bound on one streamed turn, provider call included
    pub turn_timeout_secs: u64,

    /// Runtime configuration
    pub rust_log: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let config = Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL is required"))?,

            turn_timeout_secs: parse_or(
                env::var("TURN_TIMEOUT_SECS").ok(),
                DEFAULT_TURN_TIMEOUT_SECS,
            ),

            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "quizdesk=debug".to_string()),
            port: parse_or(env::var("PORT").ok(), 3000),
        };

        Ok(config)
    }

    /// Turn timeout as a `Duration`
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
