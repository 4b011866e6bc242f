use crate::{
    error::{AccountError, AccountResult, RepoError},
    hasher::HasherState,
    models::{Principal, Role, Token, User},
    repository::RepositoryState,
    tokens::TokenGeneratorState,
};
use chrono::Utc;
use std::sync::Arc;

/// Login of the administrator created on first boot.
pub const BOOTSTRAP_ADMIN_LOGIN: &str = "root";
/// Well-known initial password of the bootstrap administrator. Change it after first login.
pub const BOOTSTRAP_ADMIN_PASSWORD: &str = "root";

/// AccountService
///
/// Registration, login/logout, token resolution and role/password management.
/// Holds no mutable state of its own: every operation is a single
/// lookup-validate-write against the injected repository, so cloning the
/// service only clones `Arc` handles.
#[derive(Clone)]
pub struct AccountService {
    repo: RepositoryState,
    hasher: HasherState,
    tokens: TokenGeneratorState,
}

pub type AccountServiceState = Arc<AccountService>;

impl AccountService {
    pub fn new(repo: RepositoryState, hasher: HasherState, tokens: TokenGeneratorState) -> Self {
        Self { repo, hasher, tokens }
    }

    /// lookup_principal
    ///
    /// Identity, stored hash and single authority for `login`, in the shape an
    /// authorization layer consumes.
    pub async fn lookup_principal(&self, login: &str) -> AccountResult<Principal> {
        let user = self
            .repo
            .find_user(login)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("User {} not found.", login)))?;

        Ok(Principal {
            login: user.login,
            password_hash: user.password,
            role: user.role,
        })
    }

    /// register
    ///
    /// Creates a `USER` account. The existence check is backed by the store's
    /// primary key, so a concurrent registration that slips past it still fails
    /// with `AlreadyExists`.
    pub async fn register(&self, login: &str, password: &str) -> AccountResult<User> {
        if self.repo.find_user(login).await?.is_some() {
            return Err(already_exists());
        }

        let hash = self.hasher.encode(password).await?;
        let user = self
            .repo
            .insert_user(User::new(login, hash, Role::User))
            .await
            .map_err(|e| match e {
                RepoError::Conflict => already_exists(),
                other => AccountError::Storage(other),
            })?;

        tracing::info!(login = %user.login, "registered user");
        Ok(user)
    }

    /// login
    ///
    /// Issues a new token. An unknown login and a wrong password both fail with
    /// `NotFound` so the response does not reveal which logins exist.
    pub async fn login(&self, login: &str, password: &str) -> AccountResult<Token> {
        let user = self
            .repo
            .find_user(login)
            .await?
            .ok_or_else(|| AccountError::NotFound("There is no user with same login".to_string()))?;

        if !self.hasher.matches(password, &user.password).await? {
            tracing::debug!(login = %login, "rejected login: bad credentials");
            return Err(AccountError::NotFound("Incorrect login or password".to_string()));
        }

        let token = Token {
            data: self.tokens.generate(),
            owner: user.login,
            created_at: Utc::now(),
        };
        let token = self.repo.insert_token(token).await?;

        tracing::info!(login = %token.owner, "issued session token");
        Ok(token)
    }

    /// logout
    ///
    /// Revokes the token and hands back the removed record.
    pub async fn logout(&self, token: &str) -> AccountResult<Token> {
        let found = self.repo.find_token(token).await?.ok_or(AccountError::InvalidToken)?;

        // A concurrent logout may have removed it between the lookup and here.
        if !self.repo.delete_token(&found.data).await? {
            return Err(AccountError::InvalidToken);
        }

        tracing::info!(login = %found.owner, "revoked session token");
        Ok(found)
    }

    /// resolve_user
    ///
    /// The owner of a session token.
    pub async fn resolve_user(&self, token: &str) -> AccountResult<User> {
        self.repo
            .find_token_owner(token)
            .await?
            .ok_or_else(|| AccountError::NotFound("There is no user for this token".to_string()))
    }

    /// list_users
    ///
    /// Snapshot of every account, in no particular order.
    pub async fn list_users(&self) -> AccountResult<Vec<User>> {
        Ok(self.repo.list_users().await?)
    }

    pub async fn change_role(&self, login: &str, role: Role) -> AccountResult<User> {
        let mut user = self.find_existing(login).await?;
        user.role = role;
        let user = self.persist(user).await?;

        tracing::info!(login = %user.login, role = %user.role, "changed role");
        Ok(user)
    }

    pub async fn change_password(&self, login: &str, password: &str) -> AccountResult<User> {
        let mut user = self.find_existing(login).await?;
        user.password = self.hasher.encode(password).await?;
        let user = self.persist(user).await?;

        tracing::info!(login = %user.login, "changed password");
        Ok(user)
    }

    /// bootstrap_admin
    ///
    /// Called once during startup, before the server accepts requests. Creates
    /// `root`/`root` as an administrator if no administrator exists. Returns
    /// whether an account was created.
    ///
    /// Fails with `AlreadyExists` when no administrator exists but an ordinary
    /// account already holds the `root` login: the existing account is neither
    /// promoted nor overwritten, and startup must not continue without an
    /// administrator.
    pub async fn bootstrap_admin(&self) -> AccountResult<bool> {
        if !self.repo.find_users_by_role(Role::Administrator).await?.is_empty() {
            tracing::debug!("administrator present, skipping bootstrap");
            return Ok(false);
        }

        let hash = self.hasher.encode(BOOTSTRAP_ADMIN_PASSWORD).await?;
        let admin = User::new(BOOTSTRAP_ADMIN_LOGIN, hash, Role::Administrator);

        match self.repo.insert_user(admin).await {
            Ok(_) => {
                tracing::warn!(
                    "created bootstrap administrator '{}' with the default password; change it now",
                    BOOTSTRAP_ADMIN_LOGIN
                );
                Ok(true)
            }
            // Either a concurrent bootstrap won the race (an administrator now
            // exists) or an ordinary account holds the login.
            Err(RepoError::Conflict) => {
                if !self.repo.find_users_by_role(Role::Administrator).await?.is_empty() {
                    tracing::debug!("administrator created concurrently, skipping bootstrap");
                    return Ok(false);
                }
                tracing::error!(
                    "cannot bootstrap: login '{}' belongs to a non-administrator and no administrator exists",
                    BOOTSTRAP_ADMIN_LOGIN
                );
                Err(AccountError::AlreadyExists(format!(
                    "login '{}' is held by a non-administrator; no administrator could be created",
                    BOOTSTRAP_ADMIN_LOGIN
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_existing(&self, login: &str) -> AccountResult<User> {
        self.repo
            .find_user(login)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("There is no user with username {}", login)))
    }

    async fn persist(&self, user: User) -> AccountResult<User> {
        let login = user.login.clone();
        self.repo
            .update_user(user)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("There is no user with username {}", login)))
    }
}

fn already_exists() -> AccountError {
    AccountError::AlreadyExists("User with this login already exists".to_string())
}
