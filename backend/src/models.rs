use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// The closed set of access levels. Persisted in the `users.role` column and
/// serialized on the wire as `USER` / `ADMINISTRATOR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Administrator => "ADMINISTRATOR",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl std::str::FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "ADMINISTRATOR" => Ok(Role::Administrator),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

// Lets `FromRow` decode the TEXT column straight into the enum.
impl TryFrom<String> for Role {
    type Error = ParseRoleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// User
///
/// The identity record stored in the `users` table. `login` is the primary key
/// and never changes after creation. `password` always holds a bcrypt hash; it
/// is never serialized and is redacted from `Debug` output.
#[derive(Clone, Serialize, Deserialize, FromRow, Default, PartialEq)]
pub struct User {
    pub login: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

impl User {
    pub fn new(login: impl Into<String>, password_hash: impl Into<String>, role: Role) -> Self {
        Self {
            login: login.into(),
            password: password_hash.into(),
            role,
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Token
///
/// An opaque session credential from the `tokens` table. Many tokens may point
/// at the same owner. There is no expiry: a token lives until it is logged out.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default, PartialEq)]
pub struct Token {
    pub data: String,
    // FK to users.login
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

/// Principal
///
/// Identity and authority handed to an authorization layer. The adapter at the
/// HTTP boundary decides what to do with it; the core only builds it.
#[derive(Clone, PartialEq)]
pub struct Principal {
    pub login: String,
    pub password_hash: String,
    pub role: Role,
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("login", &self.login)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

// --- Request Payloads (Input Schemas) ---

/// AuthData
///
/// Login/password pair used by registration and login.
/// The plaintext password only lives as long as the request.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthData {
    #[schema(example = "alice")]
    pub login: String,
    #[schema(example = "pw1")]
    pub password: String,
}

impl fmt::Debug for AuthData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthData")
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

/// RoleChange
///
/// Body of `PUT /admin/users/{login}/role`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RoleChange {
    pub role: Role,
}

/// PasswordChange
///
/// Body of `PUT /admin/users/{login}/password`.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PasswordChange {
    pub password: String,
}

impl fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordChange").finish_non_exhaustive()
    }
}

// --- Response Schemas (Output) ---

/// UserPublic
///
/// The client-facing projection of a `User` (no hash).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct UserPublic {
    pub login: String,
    pub role: Role,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        Self {
            login: user.login,
            role: user.role,
        }
    }
}

impl From<Principal> for UserPublic {
    fn from(principal: Principal) -> Self {
        Self {
            login: principal.login,
            role: principal.role,
        }
    }
}

/// TokenResponse
///
/// Returned by login (the freshly issued token) and logout (the revoked one).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
    pub login: String,
}

impl From<Token> for TokenResponse {
    fn from(token: Token) -> Self {
        Self {
            token: token.data,
            login: token.owner,
        }
    }
}
