use account_service::{
    AppState, BcryptHasher, InMemoryRepository, REQUEST_ID_HEADER, SecureTokenGenerator,
    create_router,
    config::AppConfig,
    models::{Role, TokenResponse, UserPublic},
    service::{BOOTSTRAP_ADMIN_LOGIN, BOOTSTRAP_ADMIN_PASSWORD},
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

// --- Test harness ---

async fn spawn_app() -> Router {
    let state = AppState::new(
        Arc::new(InMemoryRepository::new()),
        Arc::new(BcryptHasher::new(4)),
        Arc::new(SecureTokenGenerator),
        AppConfig::default(),
    );
    state.service.bootstrap_admin().await.unwrap();
    create_router(state)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn parse<T: DeserializeOwned>(bytes: &[u8]) -> T {
    serde_json::from_slice(bytes).unwrap()
}

async fn login(app: &Router, login: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        json_request("POST", "/login", None, json!({ "login": login, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    parse::<TokenResponse>(&body).token
}

// --- Tests ---

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;

    let (status, body) = send(&app, get("/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn test_session_lifecycle() {
    let app = spawn_app().await;

    // Register
    let (status, body) = send(
        &app,
        json_request("POST", "/register", None, json!({ "login": "alice", "password": "pw1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let raw: Value = parse(&body);
    assert!(raw.get("password").is_none(), "hash must not leak to clients");
    assert_eq!(raw["role"], "USER");

    // Login + whoami
    let token = login(&app, "alice", "pw1").await;
    let (status, body) = send(&app, get("/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        parse::<UserPublic>(&body),
        UserPublic {
            login: "alice".to_string(),
            role: Role::User
        }
    );

    // Logout revokes the token
    let (status, body) = send(&app, json_request("POST", "/logout", Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse::<TokenResponse>(&body).token, token);

    let (status, _) = send(&app, get("/me", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, json_request("POST", "/logout", Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(parse::<Value>(&body)["error"], "incorrect token");
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = spawn_app().await;

    let (missing, _) = send(&app, get("/me", None)).await;
    let (bogus, _) = send(&app, get("/me", Some("nope"))).await;

    assert_eq!(missing, StatusCode::UNAUTHORIZED);
    assert_eq!(bogus, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_registration_is_conflict() {
    let app = spawn_app().await;
    let body = json!({ "login": "alice", "password": "pw1" });

    let (first, _) = send(&app, json_request("POST", "/register", None, body.clone())).await;
    let (second, _) = send(&app, json_request("POST", "/register", None, body)).await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = spawn_app().await;
    send(
        &app,
        json_request("POST", "/register", None, json!({ "login": "alice", "password": "pw1" })),
    )
    .await;
    let token = login(&app, "alice", "pw1").await;

    let (anonymous, _) = send(&app, get("/admin/users", None)).await;
    let (plain, _) = send(&app, get("/admin/users", Some(&token))).await;

    assert_eq!(anonymous, StatusCode::UNAUTHORIZED);
    assert_eq!(plain, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_bootstrap_admin_manages_users() {
    let app = spawn_app().await;
    send(
        &app,
        json_request("POST", "/register", None, json!({ "login": "alice", "password": "pw1" })),
    )
    .await;
    let root = login(&app, BOOTSTRAP_ADMIN_LOGIN, BOOTSTRAP_ADMIN_PASSWORD).await;

    // Both accounts are listed.
    let (status, body) = send(&app, get("/admin/users", Some(&root))).await;
    assert_eq!(status, StatusCode::OK);
    let mut logins: Vec<String> = parse::<Vec<UserPublic>>(&body)
        .into_iter()
        .map(|u| u.login)
        .collect();
    logins.sort();
    assert_eq!(logins, vec!["alice".to_string(), "root".to_string()]);

    // Promote alice, then look the account up.
    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/admin/users/alice/role",
            Some(&root),
            json!({ "role": "ADMINISTRATOR" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/admin/users/alice", Some(&root))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse::<UserPublic>(&body).role, Role::Administrator);

    // Reset the password.
    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/admin/users/alice/password",
            Some(&root),
            json!({ "password": "fresh" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        json_request("POST", "/login", None, json!({ "login": "alice", "password": "pw1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    login(&app, "alice", "fresh").await;

    // Unknown user.
    let (status, _) = send(&app, get("/admin/users/ghost", Some(&root))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/admin/users/ghost/role",
            Some(&root),
            json!({ "role": "USER" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logins_named_like_admin_actions_are_addressable() {
    let app = spawn_app().await;
    for name in ["role", "password"] {
        let (status, _) = send(
            &app,
            json_request("POST", "/register", None, json!({ "login": name, "password": "pw1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let root = login(&app, BOOTSTRAP_ADMIN_LOGIN, BOOTSTRAP_ADMIN_PASSWORD).await;

    for name in ["role", "password"] {
        let (status, body) = send(&app, get(&format!("/admin/users/{}", name), Some(&root))).await;
        assert_eq!(status, StatusCode::OK, "lookup of '{}'", name);
        assert_eq!(parse::<UserPublic>(&body).login, name);
    }

    // Actions on those accounts hit the right rows too.
    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            "/admin/users/role/role",
            Some(&root),
            json!({ "role": "ADMINISTRATOR" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated = parse::<UserPublic>(&body);
    assert_eq!(updated.login, "role");
    assert_eq!(updated.role, Role::Administrator);

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/admin/users/password/password",
            Some(&root),
            json!({ "password": "fresh" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    login(&app, "password", "fresh").await;
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = spawn_app().await;

    let response = app.oneshot(get("/health", None)).await.unwrap();

    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn test_client_request_id_is_echoed_back() {
    let app = spawn_app().await;
    let mut request = get("/health", None);
    request
        .headers_mut()
        .insert(REQUEST_ID_HEADER, "support-ticket-42".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get(REQUEST_ID_HEADER).unwrap(),
        "support-ticket-42"
    );
}

#[tokio::test]
async fn test_authenticated_request_passes_through_login_aware_span() {
    let app = spawn_app().await;
    let root = login(&app, BOOTSTRAP_ADMIN_LOGIN, BOOTSTRAP_ADMIN_PASSWORD).await;

    // Recording the login on the request span must not disturb the response.
    let (status, body) = send(&app, get("/me", Some(&root))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse::<UserPublic>(&body).login, BOOTSTRAP_ADMIN_LOGIN);
}

