use app_error::{AppResult, not_found_error};
use app_models::{SignupInput, UserProfile};
use axum::{Extension, Json, extract::Path, http::StatusCode};

use crate::service::SharedAccess;

pub async fn list_users(
    Extension(access): Extension<SharedAccess>,
) -> AppResult<Json<Vec<UserProfile>>> {
    let users = access.list_users().await?;
    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

pub async fn signup(
    Extension(access): Extension<SharedAccess>,
    Json(input): Json<SignupInput>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    let user = access.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(UserProfile::from(user))))
}

pub async fn get_user(
    Extension(access): Extension<SharedAccess>,
    Path(user_id): Path<String>,
) -> AppResult<Json<UserProfile>> {
    match access.get_user_by_id(&user_id).await? {
        Some(user) => Ok(Json(UserProfile::from(user))),
        None => not_found_error!("User", user_id),
    }
}
