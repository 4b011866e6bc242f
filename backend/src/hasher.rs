use crate::error::{AccountError, AccountResult};
use async_trait::async_trait;
use std::sync::Arc;

/// CredentialHasher
///
/// One-way password encoding and verification. Implementations must never log
/// or return the plaintext.
#[async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn encode(&self, plain: &str) -> AccountResult<String>;
    async fn matches(&self, plain: &str, hash: &str) -> AccountResult<bool>;
}

pub type HasherState = Arc<dyn CredentialHasher>;

/// BcryptHasher
///
/// bcrypt with a configurable cost. Both directions run on the blocking thread
/// pool because bcrypt is CPU-bound.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

#[async_trait]
impl CredentialHasher for BcryptHasher {
    async fn encode(&self, plain: &str) -> AccountResult<String> {
        let plain = plain.to_string();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || {
            bcrypt::hash(plain, cost).map_err(|e| AccountError::Hashing(e.to_string()))
        })
        .await
        .map_err(|e| AccountError::Hashing(format!("task join error: {}", e)))?
    }

    async fn matches(&self, plain: &str, hash: &str) -> AccountResult<bool> {
        let plain = plain.to_string();
        let hash = hash.to_string();

        let verdict = tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash))
            .await
            .map_err(|e| AccountError::Hashing(format!("task join error: {}", e)))?;

        // A stored value that is not a bcrypt hash can never match.
        match verdict {
            Ok(matched) => Ok(matched),
            Err(e) => {
                tracing::warn!("stored credential could not be verified: {}", e);
                Ok(false)
            }
        }
    }
}
