//! Server-side verification of session credentials.
//!
//! Flow Overview: the edge gate hands the cookie token to a [`TokenVerifier`].
//! [`RemoteVerifier`] posts it to the identity provider's verification endpoint,
//! decodes the returned claim set and checks audience and expiry locally. Any
//! failure is a [`VerifyError`]; callers only use the outcome as a yes/no signal.

use super::{Principal, SessionCredential};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{
    future::Future,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

const DEFAULT_TIMEOUT_SECONDS: u64 = 5;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("identity provider rejected the token with status {0}")]
    Rejected(u16),
    #[error("token expired")]
    Expired,
    #[error("token audience {0:?} does not match the project")]
    InvalidAudience(Option<String>),
    #[error("missing subject claim")]
    MissingSubject,
    #[error("identity provider request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Decoded claim set returned by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(alias = "uid", alias = "user_id")]
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub aud: Option<String>,
    /// Expiry as unix seconds.
    #[serde(default)]
    pub exp: Option<u64>,
}

impl Claims {
    /// Check subject, audience and expiry against the local clock.
    ///
    /// # Errors
    /// Returns the first failed check.
    pub fn validate(&self, project_id: Option<&str>, now_unix: u64) -> Result<(), VerifyError> {
        if self.sub.trim().is_empty() {
            return Err(VerifyError::MissingSubject);
        }
        if let Some(project_id) = project_id {
            if self.aud.as_deref() != Some(project_id) {
                return Err(VerifyError::InvalidAudience(self.aud.clone()));
            }
        }
        if self.exp.is_some_and(|exp| exp <= now_unix) {
            return Err(VerifyError::Expired);
        }
        Ok(())
    }

    /// Principal view of the claims, when the provider included an email.
    #[must_use]
    pub fn principal(&self) -> Option<Principal> {
        self.email
            .as_ref()
            .map(|email| Principal::new(self.sub.clone(), email.clone()))
    }
}

/// Verification call of the identity provider.
pub trait TokenVerifier: Send + Sync {
    /// Verify a credential and return its claims.
    fn verify(
        &self,
        credential: &SessionCredential,
    ) -> impl Future<Output = Result<Claims, VerifyError>> + Send;
}

#[derive(Debug, Clone)]
pub struct VerifierConfig {
    verify_url: Url,
    project_id: Option<String>,
    api_key: Option<SecretString>,
    timeout: Duration,
}

impl VerifierConfig {
    #[must_use]
    pub fn new(verify_url: Url) -> Self {
        Self {
            verify_url,
            project_id: None,
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    #[must_use]
    pub fn with_project_id(mut self, project_id: Option<String>) -> Self {
        self.project_id = project_id.filter(|id| !id.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<SecretString>) -> Self {
        self.api_key = api_key;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn verify_url(&self) -> &Url {
        &self.verify_url
    }

    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<&'a str>,
}

/// Verifies tokens against the identity provider over HTTP.
#[derive(Debug)]
pub struct RemoteVerifier {
    client: Client,
    config: VerifierConfig,
}

impl RemoteVerifier {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: VerifierConfig) -> Result<Self, VerifyError> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }
}

impl TokenVerifier for RemoteVerifier {
    #[instrument(skip_all, fields(url = %self.config.verify_url))]
    async fn verify(&self, credential: &SessionCredential) -> Result<Claims, VerifyError> {
        let body = VerifyRequest {
            token: credential.expose(),
            project_id: self.config.project_id(),
        };
        let mut request = self
            .client
            .post(self.config.verify_url.clone())
            .json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await?;
        if response.status() != StatusCode::OK {
            return Err(VerifyError::Rejected(response.status().as_u16()));
        }

        let claims: Claims = response.json().await?;
        claims.validate(self.config.project_id(), now_unix_seconds())?;
        debug!(sub = %claims.sub, "token verified");

        Ok(claims)
    }
}

fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
