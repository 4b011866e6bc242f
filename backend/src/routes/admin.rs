use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Admin Router Module
///
/// User management for ADMINISTRATOR accounts. Every handler takes an
/// `AuthUser` (401 without a valid token) and checks the role itself (403 for
/// ordinary users).
///
/// Per-user routes are all keyed by `{login}` and have no fixed-segment
/// siblings, so every login (including "role" or "password") is addressable.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/users
        // Every registered account.
        .route("/users", get(handlers::list_users))
        // GET /admin/users/{login}
        // A single account's principal (login and role).
        .route("/users/{login}", get(handlers::get_user))
        // PUT /admin/users/{login}/role
        // Body: { role }.
        .route("/users/{login}/role", put(handlers::change_role))
        // PUT /admin/users/{login}/password
        // Body: { password }. Re-hashes and stores the new password.
        .route("/users/{login}/password", put(handlers::change_password))
}
