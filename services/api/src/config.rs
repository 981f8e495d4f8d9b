//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use asistencias_core::workflow::ApprovalPolicy;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    /// Optional JSON fixture loaded into the in-memory store at startup.
    pub seed_path: Option<PathBuf>,
    /// What happens when approvals reach an offer's vacancy count.
    pub approval_policy: ApprovalPolicy,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let seed_path = std::env::var("SEED_PATH").map(PathBuf::from).ok();

        let approval_policy = match std::env::var("APPROVAL_POLICY") {
            Ok(raw) => raw
                .parse::<ApprovalPolicy>()
                .map_err(|e| ConfigError::InvalidValue("APPROVAL_POLICY".to_string(), e))?,
            Err(_) => ApprovalPolicy::default(),
        };

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            log_level,
            seed_path,
            approval_policy,
            cors_origin,
        })
    }
}

impl Default for Config {
    /// A configuration suitable for tests: ephemeral port, no seed file.
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 0)),
            log_level: Level::INFO,
            seed_path: None,
            approval_policy: ApprovalPolicy::default(),
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}
