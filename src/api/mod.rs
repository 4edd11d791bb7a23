//! HTTP edge service.
//!
//! Every request first goes through the edge gate. Requests it admits are
//! either answered locally (`/health`, `/logout`) or forwarded to the dashboard
//! front-end origin.

use crate::{
    gate::edge::{edge_gate, EdgeGate},
    identity::TokenVerifier,
};
use anyhow::Result;
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

pub mod handlers;
mod openapi;

pub use openapi::openapi;

use handlers::{forward, health, logout, CookiePolicy, Upstream};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the edge router without the tracing layers.
#[must_use]
pub fn router<V>(gate: Arc<EdgeGate<V>>, upstream: Arc<Upstream>, policy: CookiePolicy) -> Router
where
    V: TokenVerifier + 'static,
{
    let routes = Arc::new(gate.routes().clone());

    Router::new()
        .route("/health", get(health).options(health))
        .route("/logout", post(logout))
        .fallback(forward)
        .layer(middleware::from_fn_with_state(gate, edge_gate::<V>))
        .layer(Extension(upstream))
        .layer(Extension(routes))
        .layer(Extension(policy))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new<V>(
    port: u16,
    gate: Arc<EdgeGate<V>>,
    upstream: Arc<Upstream>,
    policy: CookiePolicy,
) -> Result<()>
where
    V: TokenVerifier + 'static,
{
    info!(upstream = %upstream.base(), "Forwarding admitted requests");

    let app = router(gate, upstream, policy).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static(REQUEST_ID_HEADER),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                REQUEST_ID_HEADER,
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span)),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Gracefully shutdown");
            }
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
