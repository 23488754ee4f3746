pub mod access;
pub mod credentials;

pub use access::{AccessService, AccessServiceTrait, SharedAccess};
pub use credentials::CredentialService;

use app_config::{AppConfig, JwtConfig};
use app_database::Database;
use app_error::AppResult;
use app_middleware::{JwtService, PasswordService};
use std::sync::Arc;

/// The service handles shared by every request.
#[derive(Clone)]
pub struct Services {
    pub access: SharedAccess,
    pub credentials: Arc<CredentialService>,
}

impl Services {
    pub fn from_config(db: Arc<Database>, config: &AppConfig) -> AppResult<Self> {
        let jwt_service = JwtService::from_config(&JwtConfig::from(config))?;
        let password_service = PasswordService::new(&config.security.password.argon2)?;

        let credentials = Arc::new(CredentialService::new(
            Arc::new(jwt_service),
            Arc::new(password_service),
        ));
        let access: SharedAccess = Arc::new(AccessService::new(
            db,
            Arc::clone(&credentials),
            config.security.password.min_length,
        ));

        Ok(Self {
            access,
            credentials,
        })
    }
}
