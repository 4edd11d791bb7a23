//! Identity provider seams.
//!
//! The provider is external; this module only holds what the gates need from
//! it: a server-side token verification call ([`TokenVerifier`]) and a client
//! session manager that pushes auth-state changes ([`AuthStateSource`]).
//! Token material is kept in [`SessionCredential`] and must never be logged.

pub mod session;
pub mod verifier;

pub use session::{AuthStateSource, SessionManager, Subscription};
pub use verifier::{Claims, RemoteVerifier, TokenVerifier, VerifierConfig, VerifyError};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Authenticated user as reported by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub uid: String,
    pub email: String,
}

impl Principal {
    #[must_use]
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
        }
    }
}

/// Opaque bearer token proving an authenticated session.
pub struct SessionCredential(SecretString);

impl SessionCredential {
    /// Wrap a raw token; blank values carry no session and yield `None`.
    #[must_use]
    pub fn new(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(Self(SecretString::from(token)))
        }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionCredential(***)")
    }
}
