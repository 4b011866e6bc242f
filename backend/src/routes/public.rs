use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session: health checks and the credential
/// exchange itself (register, login, logout).
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // Creates a USER account. 409 if the login is taken.
        .route("/register", post(handlers::register_user))
        // POST /login
        // Issues a session token. 401 for unknown login or wrong password alike.
        .route("/login", post(handlers::login))
        // POST /logout
        // Revokes the bearer token. It validates the token itself, so an unknown
        // token is reported as "Incorrect token" instead of a bare auth rejection.
        .route("/logout", post(handlers::logout))
}
