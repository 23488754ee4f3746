use app_config::JwtConfig;
use app_error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (user email)
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
}

/// Issues and verifies HMAC-signed access tokens.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    expiry: Duration,
}

impl JwtService {
    pub fn new(secret: &[u8], expiry_minutes: u64) -> AppResult<Self> {
        let expiry = i64::try_from(expiry_minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "JWT expiry of {} minutes is out of range",
                    expiry_minutes
                ))
            })?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            expiry,
        })
    }

    pub fn from_config(config: &JwtConfig) -> AppResult<Self> {
        if config.secret.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT secret cannot be empty"
            )));
        }

        let algorithm: Algorithm = config.algorithm.parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Unknown JWT algorithm '{}': {}",
                config.algorithm,
                e
            ))
        })?;

        // Only symmetric algorithms work with a shared secret
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT algorithm '{}' is not an HMAC algorithm",
                config.algorithm
            )));
        }

        let mut service = Self::new(&config.secret, config.expiry_minutes)?;
        service.algorithm = algorithm;
        Ok(service)
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    pub fn generate_token(&self, subject: &str) -> AppResult<String> {
        self.generate_token_with_ttl(subject, self.expiry)
    }

    pub fn generate_token_with_ttl(&self, subject: &str, ttl: Duration) -> AppResult<String> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            AppError::ServerError(anyhow::anyhow!("Token lifetime {} is out of range", ttl))
        })?;

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key).map_err(|e| {
            AppError::ServerError(anyhow::anyhow!("Failed to generate token: {}", e))
        })
    }

    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                warn!("Token validation failed: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AppError::token_expired(),
                    _ => AppError::token_invalid(),
                }
            })?;

        debug!("Token validated for subject: {}", token_data.claims.sub);
        Ok(token_data.claims)
    }
}
