use crate::tokens::TokenStrategy;
use std::env;

/// AppConfig
///
/// Holds the application's configuration. Loaded once at startup and then only
/// read, so it is cloned freely into the shared state.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and which settings are mandatory.
    pub env: Env,
    // Postgres connection string. `None` (local only) selects the in-memory store.
    pub db_url: Option<String>,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // How session token values are generated.
    pub token_strategy: TokenStrategy,
    // bcrypt work factor for password hashes.
    pub bcrypt_cost: u32,
}

/// Env
///
/// Runtime context: developer conveniences in `Local`, strict settings in `Production`.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Work factors bcrypt accepts; anything outside fails at hash time.
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

impl Default for AppConfig {
    /// Safe, non-panicking values for test setup. Uses the in-memory store and
    /// bcrypt's minimum cost so tests hash quickly.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: None,
            bind_addr: "127.0.0.1:0".to_string(),
            token_strategy: TokenStrategy::Secure,
            bcrypt_cost: 4,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics on a missing `DATABASE_URL` in production, on an unparsable
    /// `TOKEN_STRATEGY`, and on a `BCRYPT_COST` that is not an integer in
    /// `MIN_BCRYPT_COST..=MAX_BCRYPT_COST`. A misconfigured process never
    /// starts serving.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").unwrap_or_else(|_| "local".to_string()).as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let db_url = match env {
            Env::Production => Some(
                env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
            ),
            Env::Local => env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
        };

        let token_strategy = env::var("TOKEN_STRATEGY")
            .map(|raw| raw.parse::<TokenStrategy>().expect("FATAL: TOKEN_STRATEGY must be 'secure' or 'legacy'"))
            .unwrap_or_default();

        let bcrypt_cost = env::var("BCRYPT_COST")
            .map(|raw| raw.parse::<u32>().expect("FATAL: BCRYPT_COST must be an integer"))
            .unwrap_or(bcrypt::DEFAULT_COST);
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            panic!(
                "FATAL: BCRYPT_COST must be between {} and {}, got {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST, bcrypt_cost
            );
        }

        Self {
            env,
            db_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            token_strategy,
            bcrypt_cost,
        }
    }
}
