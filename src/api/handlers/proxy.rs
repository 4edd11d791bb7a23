//! Forwarding of admitted requests to the dashboard front-end origin.

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    extract::{Extension, Request},
    http::{HeaderMap, HeaderName, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use reqwest::{redirect::Policy, Client};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, instrument};
use url::Url;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
const UPSTREAM_TIMEOUT_SECONDS: u64 = 30;

// Connection-scoped headers, never forwarded (RFC 9110 section 7.6.1).
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
];

/// Front-end origin that serves the dashboard pages.
#[derive(Debug)]
pub struct Upstream {
    base: Url,
    client: Client,
}

impl Upstream {
    /// # Errors
    /// Returns an error if the URL cannot be a base or the HTTP client fails to build.
    pub fn new(base: Url) -> Result<Self> {
        if base.cannot_be_a_base() {
            anyhow::bail!("Upstream URL cannot be a base URL: {base}");
        }
        // Redirects from the front-end go back to the browser untouched.
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .redirect(Policy::none())
            .timeout(Duration::from_secs(UPSTREAM_TIMEOUT_SECONDS))
            .build()
            .context("Failed to build upstream HTTP client")?;
        Ok(Self { base, client })
    }

    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Map a request URI onto the upstream origin, keeping path and query.
    #[must_use]
    pub fn target(&self, uri: &Uri) -> Url {
        let mut url = self.base.clone();
        let base_path = self.base.path().trim_end_matches('/');
        url.set_path(&format!("{base_path}{}", uri.path()));
        url.set_query(uri.query());
        url
    }
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

fn forwardable(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// axum fallback handler forwarding the request to the upstream origin.
#[instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
pub async fn forward(upstream: Extension<Arc<Upstream>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(err) => {
            debug!("Rejecting request body: {err}");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let url = upstream.target(&parts.uri);
    let result = upstream
        .client
        .request(parts.method, url)
        .headers(forwardable(&parts.headers))
        .body(body)
        .send()
        .await;

    let response = match result {
        Ok(response) => response,
        Err(err) => {
            error!("Upstream request failed: {err}");
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let status = response.status();
    let headers = forwardable(response.headers());
    match response.bytes().await {
        Ok(bytes) => {
            let mut reply = Body::from(bytes).into_response();
            *reply.status_mut() = status;
            reply.headers_mut().extend(headers);
            reply
        }
        Err(err) => {
            error!("Failed to read upstream response: {err}");
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}
