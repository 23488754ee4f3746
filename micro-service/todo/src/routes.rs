use std::{sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use axum::{
    Router,
    extract::Extension,
    middleware::from_fn,
    routing::{delete, get, post, put},
};

use app_config::{AppConfig, CorsConfig};
use app_error::middleware_handling::error_handling_middleware;
use app_middleware::api_middleware::{logging_middleware, security_headers_middleware};

use crate::{
    handlers::{
        auth::login_for_access_token,
        health::health_check,
        todos::{create_todo, delete_todo, get_all_todos, update_todo},
        users::{get_user, list_users, signup},
    },
    service::{CredentialService, SharedAccess},
};

fn cors_layer(cors_config: &CorsConfig) -> CorsLayer {
    // "*" anywhere in the list allows any origin
    let origins = if cors_config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect::<Vec<_>>(),
        )
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(
            cors_config
                .allowed_methods
                .iter()
                .filter_map(|method| method.parse().ok())
                .collect::<Vec<_>>(),
        )
        .allow_headers(
            cors_config
                .allowed_headers
                .iter()
                .filter_map(|header| header.parse().ok())
                .collect::<Vec<_>>(),
        )
}

pub fn create_routes(
    access: SharedAccess,
    credentials: Arc<CredentialService>,
    config: &AppConfig,
) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer(&config.security.cors));

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/users", get(list_users))
        .route("/signup", post(signup))
        .route("/token", post(login_for_access_token))
        .route("/user/{id}", get(get_user))
        .route("/create_todo", post(create_todo))
        .route("/get_all_todos", get(get_all_todos))
        .route("/update", put(update_todo))
        .route("/{todo_id}", delete(delete_todo));

    let app = app
        .layer(Extension(access))
        .layer(Extension(credentials));

    // 408 and 413 are produced here and normalized by the error middleware
    let app = app
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(RequestBodyLimitLayer::new(config.server.body_limit))
        .layer(from_fn(error_handling_middleware));

    let app = app
        .layer(from_fn(logging_middleware))
        .layer(from_fn(security_headers_middleware));

    app.layer(middleware_stack)
}
