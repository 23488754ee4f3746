use app_error::AppError;
use app_models::User;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use crate::service::{CredentialService, SharedAccess};

/// The authenticated caller, resolved from an `Authorization: Bearer` header.
///
/// Handlers that take this extractor reject the request with 401 before
/// running when the token is missing, malformed, expired or names no user.
pub struct CurrentUser(pub User);

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(AppError::missing_token)?
        .to_str()
        .map_err(|_| AppError::token_invalid())?;

    match header.split_once(' ') {
        Some((scheme, token))
            if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() =>
        {
            Ok(token.trim())
        }
        _ => Err(AppError::missing_token()),
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.to_string();

        let credentials = parts
            .extensions
            .get::<Arc<CredentialService>>()
            .cloned()
            .ok_or_else(|| AppError::ServerError(anyhow::anyhow!("Credential service missing")))?;
        let access = parts
            .extensions
            .get::<SharedAccess>()
            .cloned()
            .ok_or_else(|| AppError::ServerError(anyhow::anyhow!("Access service missing")))?;

        let user = credentials.resolve_identity(access.as_ref(), &token).await?;
        Ok(CurrentUser(user))
    }
}
