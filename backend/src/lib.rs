use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod hasher;
pub mod models;
pub mod repository;
pub mod service;
pub mod tokens;

// Routing split by access level (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AccountError, RepoError};
pub use hasher::{BcryptHasher, CredentialHasher};
pub use repository::{InMemoryRepository, PostgresRepository, Repository, RepositoryState};
pub use service::{AccountService, AccountServiceState};
pub use tokens::{LegacyTokenGenerator, SecureTokenGenerator, TokenGenerator, TokenStrategy};

/// ApiDoc
///
/// OpenAPI document for every route, served at `/api-docs/openapi.json` and
/// browsable under `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_user, handlers::login, handlers::logout, handlers::get_me,
        handlers::list_users, handlers::get_user, handlers::change_role,
        handlers::change_password
    ),
    components(
        schemas(
            models::AuthData, models::UserPublic, models::TokenResponse, models::Role,
            models::RoleChange, models::PasswordChange
        )
    ),
    tags(
        (name = "accounts", description = "Registration, sessions and user administration")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container of services and configuration handed to every
/// request. Cloning it only clones `Arc` handles.
#[derive(Clone)]
pub struct AppState {
    pub service: AccountServiceState,
    pub config: AppConfig,
}

impl AppState {
    /// Wires an `AccountService` from its collaborators.
    pub fn new(
        repo: RepositoryState,
        hasher: hasher::HasherState,
        tokens: tokens::TokenGeneratorState,
        config: AppConfig,
    ) -> Self {
        Self {
            service: Arc::new(AccountService::new(repo, hasher, tokens)),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for AccountServiceState {
    fn from_ref(app_state: &AppState) -> AccountServiceState {
        app_state.service.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards `authenticated_routes`: extracting `AuthUser` rejects the request
/// with 401 before the handler runs if the bearer token does not resolve.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing tree, applies the middleware stack and registers the
/// shared state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS: the API is consumed by browser front-ends on other origins.
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Correlation header shared by the request-id layers and the span builder.
    let x_request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    // 2. Routing tree
    let base_router = Router::new()
        // Documentation: Swagger UI plus the raw OpenAPI JSON.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public: health, register, login, logout. No session required.
        .merge(public::public_routes())
        // Authenticated: a bearer token must resolve to a user, else 401.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin: handlers authenticate through their `AuthUser` argument and
        // check for ADMINISTRATOR themselves (403 otherwise).
        .nest("/admin", admin::admin_routes())
        .with_state(state);

    // 3. Observability (outermost): assign an id, open a span, echo the id back.
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Every request gets a UUID unless the caller sent one.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. One span per request; status and latency logged on response.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. The id is returned to the client for support requests.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS wraps everything, including preflight responses.
        .layer(cors)
}

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// trace_span_logger
///
/// Builds the per-request span. Besides method, URI and request id it
/// declares an empty `login` field, which `AuthUser` fills in once the bearer
/// token resolves, so every log line of an authenticated request names the
/// account it acted for.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        req_id = %request_id,
        login = tracing::field::Empty,
    )
}
