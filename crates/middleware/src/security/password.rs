use app_config::Argon2Config;
use app_error::{AppError, AppResult};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::{debug, error};

/// Argon2 hashing with configurable cost. Hashes are PHC strings, so the
/// salt and parameters travel with the hash.
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new(config: &Argon2Config) -> AppResult<Self> {
        let algorithm: Algorithm = config.variant.parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Unknown argon2 variant '{}': {}",
                config.variant,
                e
            ))
        })?;

        let params = Params::new(config.memory, config.iterations, config.parallelism, None)
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid argon2 parameters: {}", e))
            })?;

        Ok(Self {
            argon2: Argon2::new(algorithm, Version::V0x13, params),
        })
    }

    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        debug!("Hashing password");
        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                error!("Failed to hash password: {}", e);
                AppError::ServerError(anyhow::anyhow!("Failed to hash password: {}", e))
            })?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against a stored hash
    pub fn verify_password(&self, password: &str, password_hash: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(password_hash).map_err(|e| {
            error!("Invalid password hash: {}", e);
            AppError::ServerError(anyhow::anyhow!("Invalid password hash: {}", e))
        })?;

        let is_valid = self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok();

        debug!("Password verification result: {}", is_valid);
        Ok(is_valid)
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_config() -> Argon2Config {
        Argon2Config {
            variant: "argon2id".to_string(),
            memory: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_password_hash_and_verify() {
        let service = PasswordService::new(&cheap_config()).unwrap();
        let password = "secure_password123";

        let hash = service.hash_password(password).expect("Should hash password");
        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("m=1024,t=1,p=1"));

        assert!(service.verify_password(password, &hash).unwrap());
        assert!(!service.verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let service = PasswordService::new(&cheap_config()).unwrap();
        let first = service.hash_password("repeat").unwrap();
        let second = service.hash_password("repeat").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_hash_verifies_under_different_cost_settings() {
        let hash = PasswordService::new(&cheap_config())
            .unwrap()
            .hash_password("portable")
            .unwrap();

        // Parameters come from the hash string, not the verifier
        let verifier = PasswordService::default();
        assert!(verifier.verify_password("portable", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let service = PasswordService::default();
        assert!(service.verify_password("pw", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = cheap_config();
        config.variant = "scrypt".to_string();
        assert!(PasswordService::new(&config).is_err());

        let mut config = cheap_config();
        config.parallelism = 0;
        assert!(PasswordService::new(&config).is_err());
    }
}
