use crate::{
    api::{
        self,
        handlers::{CookiePolicy, Upstream},
    },
    cli::commands::identity,
    gate::{EdgeGate, RouteTable},
    identity::{RemoteVerifier, VerifierConfig},
};
use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub upstream_url: Url,
    pub identity: identity::Options,
    pub routes: RouteTable,
    pub cookie_secure: bool,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the verifier or upstream client cannot be built, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let verifier_config = VerifierConfig::new(args.identity.verify_url)
        .with_project_id(args.identity.project_id)
        .with_api_key(args.identity.api_key)
        .with_timeout(Duration::from_secs(args.identity.timeout_seconds));
    let verifier =
        RemoteVerifier::new(verifier_config).context("Failed to build identity verifier")?;

    info!(
        login = args.routes.login(),
        landing = args.routes.landing(),
        protected = ?args.routes.protected().collect::<Vec<_>>(),
        "Route table loaded"
    );

    let gate = Arc::new(EdgeGate::new(Arc::new(args.routes), verifier));
    let upstream = Arc::new(Upstream::new(args.upstream_url)?);
    let policy = CookiePolicy {
        secure: args.cookie_secure,
    };

    api::new(args.port, gate, upstream, policy).await
}
