use rand::Rng;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// TokenGenerator
///
/// Produces the opaque value of a new session token. The service persists it
/// as-is; uniqueness is enforced by the token store, not here.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}

pub type TokenGeneratorState = Arc<dyn TokenGenerator>;

/// LegacyTokenGenerator
///
/// Decimal string of a random integer in `[0, i32::MAX)`, drawn from the
/// thread-local RNG. Kept for compatibility with clients that expect numeric
/// tokens.
///
/// **Known weakness**: only 31 bits of entropy, so values collide and can be
/// brute-forced. Prefer `SecureTokenGenerator`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyTokenGenerator;

impl TokenGenerator for LegacyTokenGenerator {
    fn generate(&self) -> String {
        rand::rng().random_range(0..i32::MAX).to_string()
    }
}

/// SecureTokenGenerator
///
/// 122 random bits from the OS CSPRNG, rendered as 32 lowercase hex characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecureTokenGenerator;

impl TokenGenerator for SecureTokenGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// TokenStrategy
///
/// Configuration switch selecting the generator (`TOKEN_STRATEGY`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenStrategy {
    #[default]
    Secure,
    Legacy,
}

impl TokenStrategy {
    pub fn generator(self) -> TokenGeneratorState {
        match self {
            TokenStrategy::Secure => Arc::new(SecureTokenGenerator),
            TokenStrategy::Legacy => Arc::new(LegacyTokenGenerator),
        }
    }
}

impl FromStr for TokenStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "secure" => Ok(TokenStrategy::Secure),
            "legacy" => Ok(TokenStrategy::Legacy),
            other => Err(format!("unknown token strategy: {}", other)),
        }
    }
}
