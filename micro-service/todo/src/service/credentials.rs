use app_error::{AppError, AppResult, auth_error};
use app_middleware::{JwtService, PasswordService};
use app_models::User;
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::access::AccessServiceTrait;

/// Password hashing plus token issuance and verification.
///
/// Holds no user data; lookups go through the access layer handed in by the
/// caller.
pub struct CredentialService {
    jwt_service: Arc<JwtService>,
    password_service: Arc<PasswordService>,
}

impl CredentialService {
    pub fn new(jwt_service: Arc<JwtService>, password_service: Arc<PasswordService>) -> Self {
        Self {
            jwt_service,
            password_service,
        }
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        Arc::clone(&self.jwt_service)
    }

    pub fn hash(&self, password: &str) -> AppResult<String> {
        self.password_service.hash_password(password)
    }

    pub fn verify(&self, password: &str, password_hash: &str) -> AppResult<bool> {
        self.password_service.verify_password(password, password_hash)
    }

    /// Token for `email` with the configured lifetime.
    pub fn issue_token(&self, email: &str) -> AppResult<String> {
        self.jwt_service.generate_token(email)
    }

    pub fn issue_token_with_ttl(&self, email: &str, ttl: Duration) -> AppResult<String> {
        self.jwt_service.generate_token_with_ttl(email, ttl)
    }

    /// Check email and password. Unknown email and wrong password fail the
    /// same way.
    pub async fn authenticate(
        &self,
        access: &dyn AccessServiceTrait,
        email: &str,
        password: &str,
    ) -> AppResult<User> {
        let Some(user) = access.get_user_by_email(email.trim()).await? else {
            debug!("Login attempt for unknown email");
            return Err(AppError::invalid_credentials());
        };

        if !self.verify(password, &user.hashed_password)? {
            warn!(user_id = %user.key(), "Login failed: wrong password");
            return Err(AppError::invalid_credentials());
        }

        info!(user_id = %user.key(), "User authenticated");
        Ok(user)
    }

    /// Map a bearer token to the user named in its `sub` claim.
    pub async fn resolve_identity(
        &self,
        access: &dyn AccessServiceTrait,
        token: &str,
    ) -> AppResult<User> {
        let claims = self.jwt_service.validate_token(token)?;

        match access.get_user_by_email(&claims.sub).await? {
            Some(user) => Ok(user),
            None => {
                warn!("Token subject does not match any user");
                auth_error!("Could not validate credentials")
            }
        }
    }
}
