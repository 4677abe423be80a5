//! Application configuration loaded from environment variables.

use std::time::Duration;

use crate::errors::{ApiError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Port for the REST API server
    pub api_port: u16,
    /// Artificial delay awaited before mutating handlers respond
    pub simulated_latency_ms: u64,
    /// Populate the ledger with demo campaigns at startup
    pub seed_demo: bool,
    /// Attach a permissive CORS layer to the router
    pub cors_permissive: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_source(|key| env_var(key).ok())
    }

    /// Build a config from any key lookup; missing keys fall back to defaults.
    pub fn from_source(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Config {
            api_port: lookup("API_PORT")
                .unwrap_or_else(|| "3001".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid API_PORT".to_string()))?,
            simulated_latency_ms: lookup("SIMULATED_LATENCY_MS")
                .unwrap_or_else(|| "0".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid SIMULATED_LATENCY_MS".to_string()))?,
            seed_demo: parse_flag("SEED_DEMO", lookup("SEED_DEMO"), true)?,
            cors_permissive: parse_flag("CORS_PERMISSIVE", lookup("CORS_PERMISSIVE"), true)?,
        })
    }

    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }
}

fn parse_flag(key: &str, value: Option<String>, default: bool) -> Result<bool> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ApiError::Config(format!("Invalid {key}: {value}"))),
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| ApiError::Config(format!("Missing env var: {key}")))
}
