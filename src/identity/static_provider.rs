//! Identity provider backed by a fixed token table.

use crate::core::error::IdentityError;
use crate::identity::{ExternalIdentity, IdentityProvider};

use async_trait::async_trait;
use std::collections::HashMap;

/// Resolves tokens from an in-memory table. Intended for tests and local
/// development.
///
/// # Example
///
/// ```rust
/// use vision_shield::identity::{ExternalIdentity, StaticIdentityProvider};
///
/// let provider = StaticIdentityProvider::new()
///     .with_token("dev-token", ExternalIdentity::new("user_1", "dev@example.com"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    tokens: HashMap<String, ExternalIdentity>,
}

impl StaticIdentityProvider {
    /// Creates a provider that accepts no tokens.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `token` as belonging to `identity`.
    pub fn with_token(mut self, token: impl Into<String>, identity: ExternalIdentity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn verify(&self, token: &str) -> Result<ExternalIdentity, IdentityError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::invalid("unknown token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticIdentityProvider::new()
            .with_token("t1", ExternalIdentity::new("ext-1", "a@example.com").with_name("A"));

        let identity = provider.verify("t1").await.unwrap();
        assert_eq!(identity.external_id, "ext-1");
        assert_eq!(identity.name.as_deref(), Some("A"));

        let err = provider.verify("nope").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredential { .. }));
    }
}
