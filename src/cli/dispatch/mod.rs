//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action the binary runs, such as starting
//! the edge server with its route table and identity provider settings.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{identity, routes, ARG_PORT, ARG_UPSTREAM_URL};
use anyhow::{Context, Result};
use url::Url;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let upstream = matches
        .get_one::<String>(ARG_UPSTREAM_URL)
        .context("missing required argument: --upstream-url")?;
    let upstream_url =
        Url::parse(upstream).with_context(|| format!("Invalid upstream URL: {upstream}"))?;

    let identity = identity::Options::parse(matches)?;
    let routes = routes::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        upstream_url,
        identity,
        routes: routes.routes,
        cookie_secure: routes.cookie_secure,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_builds_server_action() -> Result<()> {
        let matches = crate::cli::commands::new().try_get_matches_from(vec![
            "mailgate",
            "--port",
            "9000",
            "--upstream-url",
            "http://frontend:3000",
            "--identity-verify-url",
            "https://id.example.com/v1/verify",
            "--landing-path",
            "/contacts",
        ])?;

        let Action::Server(args) = handler(&matches)?;
        assert_eq!(args.port, 9000);
        assert_eq!(args.upstream_url.as_str(), "http://frontend:3000/");
        assert_eq!(args.routes.landing(), "/contacts");
        Ok(())
    }

    #[test]
    fn handler_rejects_bad_upstream() {
        temp_env::with_vars(
            [
                ("MAILGATE_UPSTREAM_URL", Some("not a url")),
                (
                    "MAILGATE_IDENTITY_VERIFY_URL",
                    Some("https://id.example.com/v1/verify"),
                ),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["mailgate"]);
                let result = handler(&matches);
                assert!(result.is_err());
                if let Err(err) = result {
                    assert!(err.to_string().contains("Invalid upstream URL"));
                }
            },
        );
    }
}
