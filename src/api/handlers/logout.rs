//! Sign-out: clears the session cookie and sends the browser to login.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::error;

use crate::gate::{edge::SESSION_COOKIE_NAME, RouteTable};

/// Attributes of the session cookie written by this service.
#[derive(Clone, Copy, Debug, Default)]
pub struct CookiePolicy {
    /// Only set when the dashboard is served over HTTPS.
    pub secure: bool,
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 303, description = "Session cookie cleared, redirect to the login page")
    ),
    tag = "session"
)]
pub async fn logout(
    routes: Extension<Arc<RouteTable>>,
    policy: Extension<CookiePolicy>,
) -> impl IntoResponse {
    let mut headers = HeaderMap::new();

    // Always clear the cookie, the session may already be gone upstream.
    match clear_session_cookie(&policy) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build session cookie: {err}"),
    }
    if let Ok(location) = HeaderValue::from_str(routes.login()) {
        headers.insert(LOCATION, location);
    }

    (StatusCode::SEE_OTHER, headers)
}

fn clear_session_cookie(policy: &CookiePolicy) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if policy.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}
