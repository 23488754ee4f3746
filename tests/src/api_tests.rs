use app_config::AppConfig;
use app_database::{db_connect::initialize_memory_db, schema::define_schema};
use app_error::AppResult;
use axum::{
    Router,
    body::Body,
    extract::Request,
    http::{Method, StatusCode, header},
};
use micro_todo::{routes::create_routes, service::Services};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;

static NEXT_DB: AtomicUsize = AtomicUsize::new(0);

// Helper function to create a test app over its own in-memory store
async fn setup_test_app() -> AppResult<(Router, Services)> {
    let mut config = AppConfig::default();
    let name = format!("api_{}", NEXT_DB.fetch_add(1, Ordering::SeqCst));
    config.database.endpoint = "memory".to_string();
    config.database.namespace = name.clone();
    config.database.database = name;
    config.database.pool.size = 2;
    config.security.jwt.secret = "test_secret_key_for_system_testing_only".to_string();
    config.security.password.argon2.memory = 1024;
    config.security.password.argon2.iterations = 1;

    let db = initialize_memory_db(&config.database).await?;
    define_schema(&db).await?;

    let services = Services::from_config(db, &config)?;
    let app = create_routes(
        services.access.clone(),
        services.credentials.clone(),
        &config,
    );

    Ok((app, services))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_json: Value = serde_json::from_slice(&body).unwrap_or_else(|_| json!({}));

    (status, body_json)
}

async fn json_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    send(app, request).await
}

async fn signup(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    json_request(
        app,
        Method::POST,
        "/signup",
        Some(json!({
            "email": email,
            "f_name": "Ada",
            "l_name": "Lovelace",
            "password": password,
        })),
        None,
    )
    .await
}

async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={}&password={}", email, password)))
        .unwrap();

    send(app, request).await
}

async fn token_for(app: &Router, email: &str, password: &str) -> String {
    signup(app, email, password).await;
    let (status, body) = login(app, email, password).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["access_token"].as_str().unwrap().to_string()
}

fn titles(todos: &Value) -> Vec<String> {
    let mut titles: Vec<String> = todos
        .as_array()
        .unwrap()
        .iter()
        .map(|todo| todo["title"].as_str().unwrap().to_string())
        .collect();
    titles.sort();
    titles
}

#[tokio::test]
async fn test_health_check_endpoint() -> AppResult<()> {
    let (app, _) = setup_test_app().await?;

    let (status, body) = json_request(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn test_signup_then_lookup() -> AppResult<()> {
    let (app, services) = setup_test_app().await?;

    let (status, profile) = signup(&app, "ada@example.com", "engine").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(profile["email"], "ada@example.com");
    assert!(profile.get("hashed_password").is_none());

    let id = profile["id"].as_str().unwrap();
    let (status, fetched) =
        json_request(&app, Method::GET, &format!("/user/{}", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, profile);

    let by_email = services.access.get_user_by_email("ada@example.com").await?;
    assert_eq!(by_email.map(|u| u.key()), Some(id.to_string()));

    let (status, users) = json_request(&app, Method::GET, "/users", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() -> AppResult<()> {
    let (app, _) = setup_test_app().await?;

    let (status, _) = signup(&app, "dup@example.com", "first").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = signup(&app, "dup@example.com", "second").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (_, users) = json_request(&app, Method::GET, "/users", None, None).await;
    assert_eq!(users.as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_unknown_user_id_is_not_found() -> AppResult<()> {
    let (app, _) = setup_test_app().await?;

    let (status, _) = json_request(&app, Method::GET, "/user/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_token_issuance() -> AppResult<()> {
    let (app, services) = setup_test_app().await?;
    signup(&app, "bob@example.com", "hunter2").await;

    let (status, body) = login(&app, "bob@example.com", "hunter2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");

    let token = body["access_token"].as_str().unwrap();
    let claims = services.credentials.get_jwt_service().validate_token(token)?;
    assert_eq!(claims.sub, "bob@example.com");

    let (status, _) = login(&app, "bob@example.com", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = login(&app, "nobody@example.com", "hunter2").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_protected_routes_reject_bad_tokens() -> AppResult<()> {
    let (app, services) = setup_test_app().await?;
    signup(&app, "eve@example.com", "pw").await;

    let expired = services
        .credentials
        .issue_token_with_ttl("eve@example.com", chrono::Duration::minutes(-1))?;

    let routes = [
        (Method::POST, "/create_todo", Some(json!({ "title": "x" }))),
        (Method::GET, "/get_all_todos", None),
        (Method::PUT, "/update", Some(json!({ "id": "x", "title": "y" }))),
        (Method::DELETE, "/some-todo", None),
    ];

    for (method, uri, body) in routes {
        for token in [None, Some(expired.as_str()), Some("not.a.token")] {
            let (status, _) = json_request(&app, method.clone(), uri, body.clone(), token).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {} {:?}", method, uri, token);
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_todo_lifecycle() -> AppResult<()> {
    let (app, _) = setup_test_app().await?;
    let token = token_for(&app, "owner@example.com", "pw").await;

    let (status, todos) = json_request(
        &app,
        Method::POST,
        "/create_todo",
        Some(json!({ "title": "buy milk" })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&todos), vec!["buy milk"]);

    let (_, todos) = json_request(
        &app,
        Method::POST,
        "/create_todo",
        Some(json!({ "title": "walk dog" })),
        Some(&token),
    )
    .await;
    assert_eq!(titles(&todos), vec!["buy milk", "walk dog"]);

    let milk_id = todos
        .as_array()
        .unwrap()
        .iter()
        .find(|todo| todo["title"] == "buy milk")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, todos) = json_request(
        &app,
        Method::PUT,
        "/update",
        Some(json!({ "id": milk_id, "title": "buy oat milk" })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&todos), vec!["buy oat milk", "walk dog"]);

    let (status, todos) = json_request(
        &app,
        Method::DELETE,
        &format!("/{}", milk_id),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&todos), vec!["walk dog"]);

    let (_, todos) = json_request(&app, Method::GET, "/get_all_todos", None, Some(&token)).await;
    assert_eq!(titles(&todos), vec!["walk dog"]);
    Ok(())
}

#[tokio::test]
async fn test_todos_are_scoped_to_their_owner() -> AppResult<()> {
    let (app, _) = setup_test_app().await?;
    let alice = token_for(&app, "alice@example.com", "pw").await;
    let mallory = token_for(&app, "mallory@example.com", "pw").await;

    let (_, todos) = json_request(
        &app,
        Method::POST,
        "/create_todo",
        Some(json!({ "title": "private" })),
        Some(&alice),
    )
    .await;
    let todo_id = todos[0]["id"].as_str().unwrap().to_string();

    let (_, listed) = json_request(&app, Method::GET, "/get_all_todos", None, Some(&mallory)).await;
    assert!(listed.as_array().unwrap().is_empty());

    let (status, _) = json_request(
        &app,
        Method::PUT,
        "/update",
        Some(json!({ "id": todo_id, "title": "mine now" })),
        Some(&mallory),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = json_request(
        &app,
        Method::DELETE,
        &format!("/{}", todo_id),
        None,
        Some(&mallory),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = json_request(&app, Method::GET, "/get_all_todos", None, Some(&alice)).await;
    assert_eq!(titles(&listed), vec!["private"]);
    Ok(())
}

#[tokio::test]
async fn test_delete_unknown_todo_is_not_found() -> AppResult<()> {
    let (app, _) = setup_test_app().await?;
    let token = token_for(&app, "x@example.com", "pw").await;

    let (status, body) =
        json_request(&app, Method::DELETE, "/no-such-todo", None, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn test_empty_title_is_rejected() -> AppResult<()> {
    let (app, _) = setup_test_app().await?;
    let token = token_for(&app, "t@example.com", "pw").await;

    let (status, _) = json_request(
        &app,
        Method::POST,
        "/create_todo",
        Some(json!({ "title": "" })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_deleting_user_removes_their_todos() -> AppResult<()> {
    let (app, services) = setup_test_app().await?;
    let token = token_for(&app, "leaving@example.com", "pw").await;

    for title in ["one", "two"] {
        json_request(
            &app,
            Method::POST,
            "/create_todo",
            Some(json!({ "title": title })),
            Some(&token),
        )
        .await;
    }

    let user = services
        .access
        .get_user_by_email("leaving@example.com")
        .await?
        .unwrap();
    assert_eq!(services.access.list_todos_for(&user).await?.len(), 2);

    services.access.delete_user(&user.key()).await?;

    assert!(services.access.list_todos_for(&user).await?.is_empty());
    let (status, _) =
        json_request(&app, Method::GET, &format!("/user/{}", user.key()), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The token still verifies but names no user
    let (status, _) = json_request(&app, Method::GET, "/get_all_todos", None, Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
