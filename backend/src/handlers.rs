use crate::{
    AppState,
    auth::{AuthUser, bearer_token},
    error::AccountError,
    models::{AuthData, PasswordChange, RoleChange, TokenResponse, UserPublic},
};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// ApiError
///
/// Everything a handler can fail with: the service's typed failures plus the
/// access-control outcomes that only exist at the HTTP boundary.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    Forbidden,
    Account(AccountError),
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        ApiError::Account(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Forbidden => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": "administrator role required" })))
                    .into_response()
            }
            ApiError::Account(err) => err.into_response(),
        }
    }
}

fn require_admin(user: &AuthUser) -> Result<(), ApiError> {
    if user.is_admin() {
        Ok(())
    } else {
        tracing::debug!(login = %user.login, "non-admin attempted an admin action");
        Err(ApiError::Forbidden)
    }
}

// --- Public Handlers ---

/// register_user
///
/// [Public Route] Creates an account with role `USER`.
#[utoipa::path(
    post,
    path = "/register",
    request_body = AuthData,
    responses(
        (status = 201, description = "Registered", body = UserPublic),
        (status = 409, description = "Login already taken")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<AuthData>,
) -> Result<(StatusCode, Json<UserPublic>), ApiError> {
    let user = state.service.register(&payload.login, &payload.password).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// login
///
/// [Public Route] Exchanges credentials for a session token.
///
/// *Non-enumerating*: unknown login and wrong password produce the same 401.
#[utoipa::path(
    post,
    path = "/login",
    request_body = AuthData,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Incorrect login or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<AuthData>,
) -> Result<Json<TokenResponse>, ApiError> {
    match state.service.login(&payload.login, &payload.password).await {
        Ok(token) => Ok(Json(token.into())),
        Err(AccountError::NotFound(_)) => {
            Err(ApiError::Unauthorized("Incorrect login or password".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// logout
///
/// [Public Route] Revokes the bearer token sent with the request and echoes it back.
/// Deliberately not behind the auth layer so an unknown token reaches the
/// service and is reported as `InvalidToken`.
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Token revoked", body = TokenResponse),
        (status = 401, description = "Incorrect token")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = bearer_token(&headers).ok_or(AccountError::InvalidToken)?;
    let revoked = state.service.logout(token).await?;
    Ok(Json(revoked.into()))
}

// --- Authenticated Handlers ---

/// get_me
///
/// [Authenticated Route] The caller's own login and role, as resolved from the token.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserPublic))
)]
pub async fn get_me(AuthUser { login, role }: AuthUser) -> Json<UserPublic> {
    Json(UserPublic { login, role })
}

// --- Admin Handlers ---

/// list_users
///
/// [Admin Route] Every account, unordered and unpaginated.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "All users", body = [UserPublic]),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn list_users(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserPublic>>, ApiError> {
    require_admin(&user)?;
    let users = state.service.list_users().await?;
    Ok(Json(users.into_iter().map(UserPublic::from).collect()))
}

/// get_user
///
/// [Admin Route] Looks up a single account's principal.
#[utoipa::path(
    get,
    path = "/admin/users/{login}",
    params(("login" = String, Path, description = "User login")),
    responses(
        (status = 200, description = "Found", body = UserPublic),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(login): Path<String>,
) -> Result<Json<UserPublic>, ApiError> {
    require_admin(&user)?;
    let principal = state.service.lookup_principal(&login).await?;
    Ok(Json(principal.into()))
}

/// change_role
///
/// [Admin Route] Sets the role of the account named in the path.
#[utoipa::path(
    put,
    path = "/admin/users/{login}/role",
    params(("login" = String, Path, description = "User login")),
    request_body = RoleChange,
    responses(
        (status = 200, description = "Updated", body = UserPublic),
        (status = 404, description = "Not Found")
    )
)]
pub async fn change_role(
    user: AuthUser,
    State(state): State<AppState>,
    Path(login): Path<String>,
    Json(payload): Json<RoleChange>,
) -> Result<Json<UserPublic>, ApiError> {
    require_admin(&user)?;
    let updated = state.service.change_role(&login, payload.role).await?;
    Ok(Json(updated.into()))
}

/// change_password
///
/// [Admin Route] Resets the password of the account named in the path.
#[utoipa::path(
    put,
    path = "/admin/users/{login}/password",
    params(("login" = String, Path, description = "User login")),
    request_body = PasswordChange,
    responses(
        (status = 200, description = "Updated", body = UserPublic),
        (status = 404, description = "Not Found")
    )
)]
pub async fn change_password(
    user: AuthUser,
    State(state): State<AppState>,
    Path(login): Path<String>,
    Json(payload): Json<PasswordChange>,
) -> Result<Json<UserPublic>, ApiError> {
    require_admin(&user)?;
    let updated = state.service.change_password(&login, &payload.password).await?;
    Ok(Json(updated.into()))
}
