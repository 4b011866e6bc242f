use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Routes for any caller holding a valid session token. The `auth_middleware`
/// layer applied in `create_router` rejects everything else with 401.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // The caller's login and role.
        .route("/me", get(handlers::get_me))
}
