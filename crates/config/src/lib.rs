//! Configuration is read from an optional JSON file and then overridden from
//! the environment (including a `.env` file). Secrets such as the JWT signing
//! key are expected to arrive through the environment.
//!
//! This module provides the narrow views handed to individual services.

use app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

mod config_loader;
pub use config_loader::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub port: u16,
    pub address: String,
}

impl Server {
    pub fn new(address: String, port: u16) -> Self {
        Self { port, address }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Invalid server port: '0' is not a valid port number"
            )));
        }

        if self.address.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Server address cannot be empty"
            )));
        }

        Ok(())
    }

    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Token signing settings passed to the JWT service at startup.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: Vec<u8>,
    pub expiry_minutes: u64,
    pub algorithm: String,
}

impl JwtConfig {
    pub fn new(secret: &[u8], expiry_minutes: u64) -> Self {
        Self {
            secret: secret.to_vec(),
            expiry_minutes,
            algorithm: "HS256".to_string(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }
}

// Don't accidentally log the signing key
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("expiry_minutes", &self.expiry_minutes)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl From<&AppConfig> for Server {
    fn from(config: &AppConfig) -> Self {
        Self {
            port: config.server.port,
            address: config.server.host.clone(),
        }
    }
}

impl From<&AppConfig> for JwtConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            secret: config.security.jwt.secret.clone().into_bytes(),
            expiry_minutes: config.security.jwt.expiry_minutes,
            algorithm: config.security.jwt.algorithm.clone(),
        }
    }
}
