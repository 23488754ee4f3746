use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::{debug, info};

use app_error::{AppError, AppErrorExt, AppResult};

/// Environment variable naming the JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "APP_CONFIG_PATH";

pub const SUPPORTED_JWT_ALGORITHMS: [&str; 3] = ["HS256", "HS384", "HS512"];

/// Longest accepted token lifetime (one year).
pub const MAX_JWT_EXPIRY_MINUTES: u64 = 60 * 24 * 365;

/// Complete application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub database: SurrealDbConfig,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SurrealDbConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub namespace: String,
    pub database: String,
    pub pool: DbPoolConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DbPoolConfig {
    pub size: usize,
    pub connection_timeout: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub body_limit: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SecurityConfig {
    pub jwt: JwtSettings,
    pub cors: CorsConfig,
    pub password: PasswordConfig,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub expiry_minutes: u64,
    pub algorithm: String,
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"[REDACTED]")
            .field("expiry_minutes", &self.expiry_minutes)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub argon2: Argon2Config,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Argon2Config {
    pub variant: String,
    pub memory: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitoringConfig {
    pub sentry: SentryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SentryConfig {
    pub dsn: String,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
    pub environment: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!("Configuration loaded from file");
        Ok(config)
    }

    /// Load configuration: `.env`, then the JSON file named by
    /// `APP_CONFIG_PATH` (defaults otherwise), then environment overrides.
    pub fn load() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(&path).config_err()?,
            Err(_) => {
                info!("{} not set, starting from default configuration", CONFIG_PATH_ENV);
                Self::default()
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        info!("Loaded configuration for environment: {}", config.environment);
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in `load`).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("APP_ENVIRONMENT") {
            self.environment = value;
        }
        if let Some(value) = lookup("DATABASE_ENDPOINT") {
            self.database.endpoint = value;
        }
        if let Some(value) = lookup("DATABASE_USERNAME") {
            self.database.username = value;
        }
        if let Some(value) = lookup("DATABASE_PASSWORD") {
            self.database.password = value;
        }
        if let Some(value) = lookup("DATABASE_NAMESPACE") {
            self.database.namespace = value;
        }
        if let Some(value) = lookup("DATABASE_NAME") {
            self.database.database = value;
        }
        if let Some(value) = lookup("SERVER_HOST") {
            self.server.host = value;
        }
        if let Some(value) = lookup("SERVER_PORT") {
            self.server.port = parse_override("SERVER_PORT", &value)?;
        }
        if let Some(value) = lookup("JWT_SECRET") {
            self.security.jwt.secret = value;
        }
        if let Some(value) = lookup("JWT_EXPIRY_MINUTES") {
            self.security.jwt.expiry_minutes = parse_override("JWT_EXPIRY_MINUTES", &value)?;
        }
        if let Some(value) = lookup("JWT_ALGORITHM") {
            self.security.jwt.algorithm = value;
        }
        if let Some(value) = lookup("SENTRY_DSN") {
            self.monitoring.sentry.dsn = value;
        }
        if let Some(value) = lookup("LOG_LEVEL") {
            self.monitoring.logging.level = value;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        let is_production = self.environment == "production";

        self.validate_database_config(&self.database, is_production, &mut errors);

        if self.server.host.trim().is_empty() {
            errors.push("Server host cannot be empty".to_string());
        }

        if self.server.port == 0 {
            errors.push("Server port cannot be 0".to_string());
        }

        let jwt = &self.security.jwt;
        if jwt.secret.trim().is_empty() {
            errors.push("JWT secret must be provided (set JWT_SECRET)".to_string());
        } else if is_production && jwt.secret.len() < 32 {
            errors.push("JWT secret is not secure for production use".to_string());
        }

        if !SUPPORTED_JWT_ALGORITHMS.contains(&jwt.algorithm.as_str()) {
            errors.push(format!(
                "Unsupported JWT algorithm '{}', expected one of {}",
                jwt.algorithm,
                SUPPORTED_JWT_ALGORITHMS.join(", ")
            ));
        }

        if jwt.expiry_minutes == 0 {
            errors.push("JWT expiry must be greater than 0 minutes".to_string());
        } else if jwt.expiry_minutes > MAX_JWT_EXPIRY_MINUTES {
            errors.push(format!(
                "JWT expiry cannot exceed {} minutes",
                MAX_JWT_EXPIRY_MINUTES
            ));
        }

        if !errors.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Invalid configuration: {}",
                errors.join(", ")
            )));
        }
        Ok(())
    }

    fn validate_database_config(
        &self,
        db_config: &SurrealDbConfig,
        is_production: bool,
        errors: &mut Vec<String>,
    ) {
        if db_config.endpoint.trim().is_empty() {
            errors.push("Database endpoint cannot be empty".to_string());
        } else if is_production
            && !db_config.endpoint.starts_with("wss://")
            && !db_config.endpoint.starts_with("mem")
        {
            errors.push(
                "Database should use a secure 'wss://' connection in production".to_string(),
            );
        }

        if db_config.namespace.trim().is_empty() {
            errors.push("Database namespace cannot be empty".to_string());
        }

        if db_config.database.trim().is_empty() {
            errors.push("Database name cannot be empty".to_string());
        }

        if db_config.pool.size == 0 {
            errors.push("Database pool size must be greater than 0".to_string());
        }

        if is_production {
            if db_config.username == "root" {
                errors.push(
                    "Using default 'root' database username in production is insecure".to_string(),
                );
            }

            if db_config.password == "root" {
                errors.push(
                    "Using default 'root' database password in production is insecure".to_string(),
                );
            }
        }
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> AppResult<T> {
    value.trim().parse::<T>().map_err(|_| {
        AppError::ConfigError(anyhow::anyhow!("Invalid value '{}' for {}", value, key))
    })
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            database: SurrealDbConfig {
                endpoint: "ws://localhost:8000".to_string(),
                username: "root".to_string(),
                password: "root".to_string(),
                namespace: "todo".to_string(),
                database: "todo".to_string(),
                pool: DbPoolConfig {
                    size: 5,
                    connection_timeout: 5000,
                },
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                body_limit: 1048576, // 1MB
                request_timeout_secs: 30,
            },
            security: SecurityConfig {
                jwt: JwtSettings {
                    // No default; must come from JWT_SECRET or the config file
                    secret: String::new(),
                    expiry_minutes: 30,
                    algorithm: "HS256".to_string(),
                },
                cors: CorsConfig {
                    allowed_origins: vec!["*".to_string()],
                    allowed_methods: vec![
                        "GET".to_string(),
                        "POST".to_string(),
                        "PUT".to_string(),
                        "DELETE".to_string(),
                        "OPTIONS".to_string(),
                    ],
                    allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
                },
                password: PasswordConfig {
                    min_length: 1,
                    argon2: Argon2Config {
                        variant: "argon2id".to_string(),
                        memory: 19456,
                        iterations: 2,
                        parallelism: 1,
                    },
                },
            },
            monitoring: MonitoringConfig {
                sentry: SentryConfig {
                    dsn: "".to_string(),
                    sample_rate: 1.0,
                    traces_sample_rate: 0.2,
                    environment: "development".to_string(),
                },
                logging: LoggingConfig {
                    level: "info".to_string(),
                },
            },
        }
    }
}
