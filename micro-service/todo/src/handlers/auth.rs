use app_error::AppResult;
use app_models::{LoginForm, TokenResponse};
use axum::{Extension, Form, Json};
use std::sync::Arc;

use crate::service::{CredentialService, SharedAccess};

/// OAuth2 password grant: the form's `username` field carries the email.
pub async fn login_for_access_token(
    Extension(credentials): Extension<Arc<CredentialService>>,
    Extension(access): Extension<SharedAccess>,
    Form(form): Form<LoginForm>,
) -> AppResult<Json<TokenResponse>> {
    let user = credentials
        .authenticate(access.as_ref(), &form.username, &form.password)
        .await?;
    let access_token = credentials.issue_token(&user.email)?;

    Ok(Json(TokenResponse::bearer(access_token)))
}
