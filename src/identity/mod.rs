//! Caller authentication.
//!
//! Verifying a bearer token is delegated to an external identity provider
//! behind the [`IdentityProvider`] trait; it yields an [`ExternalIdentity`].
//! The orchestrator then provisions that identity in the store and threads
//! the resulting [`AuthContext`] through the rest of a request.

#[cfg(feature = "http-identity")]
mod http;
mod static_provider;

#[cfg(feature = "http-identity")]
pub use http::{HttpIdentityConfig, HttpIdentityProvider};
pub use static_provider::StaticIdentityProvider;

use crate::core::error::IdentityError;
use crate::store::{User, UserId};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// A verified identity as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    /// Stable identifier issued by the provider.
    pub external_id: String,

    /// Primary email address.
    pub email: String,

    /// Display name, if any.
    pub name: Option<String>,
}

impl ExternalIdentity {
    /// Creates an identity without a display name.
    pub fn new(external_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            email: email.into(),
            name: None,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Verifies bearer tokens.
#[async_trait]
pub trait IdentityProvider: Send + Sync + Debug {
    /// Verifies a token and returns the identity it belongs to.
    ///
    /// Rejected tokens yield [`IdentityError::InvalidCredential`]; transport
    /// or provider failures yield [`IdentityError::Unavailable`].
    async fn verify(&self, token: &str) -> Result<ExternalIdentity, IdentityError>;
}

/// A shared, dynamically dispatched identity provider.
pub type ArcIdentityProvider = Arc<dyn IdentityProvider>;

/// The authenticated, provisioned caller of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    user: User,
}

impl AuthContext {
    /// Wraps a provisioned user.
    pub fn new(user: User) -> Self {
        Self { user }
    }

    /// The caller's internal user id.
    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    /// The caller's user record.
    pub fn user(&self) -> &User {
        &self.user
    }
}
