use crate::error::RepoError;
use crate::models::{Role, Token, User};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository Trait
///
/// The persistence contract for users and tokens. Handlers and the account
/// service only see this trait, so the backing store (Postgres, in-memory) can
/// be swapped without touching business logic.
///
/// **Send + Sync + async_trait** are required to share it as `Arc<dyn Repository>`
/// across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user(&self, login: &str) -> RepoResult<Option<User>>;
    // Fails with `RepoError::Conflict` if the login is already taken.
    async fn insert_user(&self, user: User) -> RepoResult<User>;
    // Overwrites password and role of an existing row. `None` if the login is unknown.
    async fn update_user(&self, user: User) -> RepoResult<Option<User>>;
    async fn list_users(&self) -> RepoResult<Vec<User>>;
    async fn find_users_by_role(&self, role: Role) -> RepoResult<Vec<User>>;

    // --- Tokens ---
    // Fails with `RepoError::Conflict` if the token value is already issued.
    async fn insert_token(&self, token: Token) -> RepoResult<Token>;
    async fn find_token(&self, data: &str) -> RepoResult<Option<Token>>;
    // Returns true only if a row was removed.
    async fn delete_token(&self, data: &str) -> RepoResult<bool>;
    async fn find_token_owner(&self, data: &str) -> RepoResult<Option<User>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Login and token uniqueness are enforced by
/// primary keys, so concurrent look-then-write sequences cannot create duplicates.
pub struct PostgresRepository {
    pool: PgPool,
}

const SCHEMA: &str = include_str!("../migrations/0001_accounts.sql");

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// ensure_schema
    ///
    /// Applies the bundled DDL. Every statement is `IF NOT EXISTS`, so this is
    /// safe to run on each startup.
    pub async fn ensure_schema(&self) -> RepoResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user(&self, login: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT login, password, role FROM users WHERE login = $1")
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: User) -> RepoResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (login, password, role) VALUES ($1, $2, $3) RETURNING login, password, role",
        )
        .bind(&user.login)
        .bind(&user.password)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)
    }

    async fn update_user(&self, user: User) -> RepoResult<Option<User>> {
        let updated = sqlx::query_as::<_, User>(
            "UPDATE users SET password = $2, role = $3 WHERE login = $1 RETURNING login, password, role",
        )
        .bind(&user.login)
        .bind(&user.password)
        .bind(user.role.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT login, password, role FROM users")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn find_users_by_role(&self, role: Role) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT login, password, role FROM users WHERE role = $1")
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn insert_token(&self, token: Token) -> RepoResult<Token> {
        sqlx::query_as::<_, Token>(
            "INSERT INTO tokens (data, owner, created_at) VALUES ($1, $2, $3) RETURNING data, owner, created_at",
        )
        .bind(&token.data)
        .bind(&token.owner)
        .bind(token.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)
    }

    async fn find_token(&self, data: &str) -> RepoResult<Option<Token>> {
        let token = sqlx::query_as::<_, Token>("SELECT data, owner, created_at FROM tokens WHERE data = $1")
            .bind(data)
            .fetch_optional(&self.pool)
            .await?;
        Ok(token)
    }

    async fn delete_token(&self, data: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM tokens WHERE data = $1")
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_token_owner(&self, data: &str) -> RepoResult<Option<User>> {
        let owner = sqlx::query_as::<_, User>(
            r#"
            SELECT u.login, u.password, u.role
            FROM tokens t
            JOIN users u ON t.owner = u.login
            WHERE t.data = $1
            "#,
        )
        .bind(data)
        .fetch_optional(&self.pool)
        .await?;
        Ok(owner)
    }
}

/// InMemoryRepository
///
/// Map-backed `Repository` for local runs without `DATABASE_URL` and for tests.
/// Mirrors the uniqueness rules of the SQL schema.
#[derive(Default)]
pub struct InMemoryRepository {
    users: RwLock<HashMap<String, User>>,
    tokens: RwLock<HashMap<String, Token>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_user(&self, login: &str) -> RepoResult<Option<User>> {
        Ok(self.users.read().await.get(login).cloned())
    }

    async fn insert_user(&self, user: User) -> RepoResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.login) {
            return Err(RepoError::Conflict);
        }
        users.insert(user.login.clone(), user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: User) -> RepoResult<Option<User>> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.login) {
            Some(existing) => {
                *existing = user.clone();
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn find_users_by_role(&self, role: Role) -> RepoResult<Vec<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect())
    }

    async fn insert_token(&self, token: Token) -> RepoResult<Token> {
        // Same FK rule as the tokens table.
        if !self.users.read().await.contains_key(&token.owner) {
            return Err(RepoError::Database(sqlx::Error::RowNotFound));
        }
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.data) {
            return Err(RepoError::Conflict);
        }
        tokens.insert(token.data.clone(), token.clone());
        Ok(token)
    }

    async fn find_token(&self, data: &str) -> RepoResult<Option<Token>> {
        Ok(self.tokens.read().await.get(data).cloned())
    }

    async fn delete_token(&self, data: &str) -> RepoResult<bool> {
        Ok(self.tokens.write().await.remove(data).is_some())
    }

    async fn find_token_owner(&self, data: &str) -> RepoResult<Option<User>> {
        let owner = match self.tokens.read().await.get(data) {
            Some(token) => token.owner.clone(),
            None => return Ok(None),
        };
        Ok(self.users.read().await.get(&owner).cloned())
    }
}
