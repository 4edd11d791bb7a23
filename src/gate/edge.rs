//! Edge gate: session check before a page is served.
//!
//! Flow Overview: classify the path, read the `token` cookie, verify it with
//! the identity provider, then pass the request through or redirect it.
//! A missing cookie and a rejected token both end on the login page; the reason
//! only shows up in the logs. Nothing past this gate ever sees an auth error.

use super::routes::{RouteClass, RouteTable};
use crate::identity::{Claims, SessionCredential, TokenVerifier, VerifyError};
use axum::{
    extract::{Request, State},
    http::{header::COOKIE, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Name of the cookie carrying the session credential.
pub const SESSION_COOKIE_NAME: &str = "token";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeDecision {
    PassThrough,
    RedirectToLogin,
    RedirectToLanding,
}

/// Why a request was not authenticated.
#[derive(Debug, Error)]
pub enum Denial {
    #[error("no session credential")]
    NoCredential,
    #[error("invalid session credential: {0}")]
    InvalidCredential(#[from] VerifyError),
}

/// Read the session credential from the request cookies.
#[must_use]
pub fn session_credential(headers: &HeaderMap) -> Option<SessionCredential> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            if key.trim() == SESSION_COOKIE_NAME {
                Some(value.trim().trim_matches('"'))
            } else {
                None
            }
        })
        // Blank duplicates are skipped, not taken as the session.
        .find_map(SessionCredential::new)
}

/// Verify a credential, treating absence like any other failure.
///
/// # Errors
/// Returns [`Denial::NoCredential`] when there is no credential and
/// [`Denial::InvalidCredential`] when the provider rejects it.
pub async fn authenticate<V>(
    verifier: &V,
    credential: Option<&SessionCredential>,
) -> Result<Claims, Denial>
where
    V: TokenVerifier + ?Sized,
{
    let credential = credential.ok_or(Denial::NoCredential)?;
    Ok(verifier.verify(credential).await?)
}

/// Decide what happens to a request for `path`.
pub async fn decide<V>(
    routes: &RouteTable,
    verifier: &V,
    credential: Option<&SessionCredential>,
    path: &str,
) -> EdgeDecision
where
    V: TokenVerifier + ?Sized,
{
    let on_login = match routes.classify(path) {
        RouteClass::Unmatched => return EdgeDecision::PassThrough,
        RouteClass::Login => true,
        RouteClass::Protected => false,
    };

    match authenticate(verifier, credential).await {
        Ok(claims) => {
            debug!(sub = %claims.sub, "session accepted");
            if on_login {
                EdgeDecision::RedirectToLanding
            } else {
                EdgeDecision::PassThrough
            }
        }
        // The login page must stay reachable without a session.
        Err(_) if on_login => EdgeDecision::PassThrough,
        Err(Denial::NoCredential) => EdgeDecision::RedirectToLogin,
        Err(denial) => {
            info!(reason = %denial, "session rejected");
            EdgeDecision::RedirectToLogin
        }
    }
}

/// Route table plus verifier, shared by every request.
#[derive(Debug)]
pub struct EdgeGate<V> {
    routes: Arc<RouteTable>,
    verifier: V,
}

impl<V: TokenVerifier> EdgeGate<V> {
    #[must_use]
    pub fn new(routes: Arc<RouteTable>, verifier: V) -> Self {
        Self { routes, verifier }
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    #[instrument(skip(self, headers))]
    pub async fn check(&self, headers: &HeaderMap, path: &str) -> EdgeDecision {
        let credential = session_credential(headers);
        let decision = decide(&self.routes, &self.verifier, credential.as_ref(), path).await;
        debug!(?decision, "edge decision");
        decision
    }

    fn redirect(&self, decision: EdgeDecision) -> Option<Response> {
        match decision {
            EdgeDecision::PassThrough => None,
            EdgeDecision::RedirectToLogin => {
                Some(Redirect::temporary(self.routes.login()).into_response())
            }
            EdgeDecision::RedirectToLanding => {
                Some(Redirect::temporary(self.routes.landing()).into_response())
            }
        }
    }
}

/// axum middleware running the edge gate in front of the inner service.
pub async fn edge_gate<V>(
    State(gate): State<Arc<EdgeGate<V>>>,
    request: Request,
    next: Next,
) -> Response
where
    V: TokenVerifier + 'static,
{
    let decision = gate.check(request.headers(), request.uri().path()).await;
    match gate.redirect(decision) {
        Some(response) => response,
        None => next.run(request).await,
    }
}
