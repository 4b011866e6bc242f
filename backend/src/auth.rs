use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
};

use crate::{
    error::AccountError,
    models::Role,
    service::AccountServiceState,
};

/// AuthUser
///
/// The resolved identity of an authenticated request. Handlers take it as an
/// argument to learn who is calling and with which role.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub login: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }
}

/// Pulls the opaque token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// AuthUser Extractor Implementation
///
/// 1. Token extraction from the `Authorization` header.
/// 2. Token resolution through the account service (the token store is the
///    source of truth, so a logged-out token stops working immediately).
///
/// Rejection: `401 Unauthorized` when the header is missing or the token is
/// unknown, `500` if the store itself fails.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AccountServiceState: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let service = AccountServiceState::from_ref(state);

        let token = bearer_token(&parts.headers).ok_or(StatusCode::UNAUTHORIZED)?;

        match service.resolve_user(token).await {
            Ok(user) => {
                // Tags the enclosing `http_request` span with the caller.
                tracing::Span::current().record("login", user.login.as_str());
                Ok(AuthUser {
                    login: user.login,
                    role: user.role,
                })
            }
            Err(AccountError::NotFound(_)) => Err(StatusCode::UNAUTHORIZED),
            Err(e) => {
                tracing::error!("token resolution failed: {}", e);
                Err(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
