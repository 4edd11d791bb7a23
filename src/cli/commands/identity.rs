//! Identity provider arguments used by the edge gate's token verifier.

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use url::Url;

pub const ARG_VERIFY_URL: &str = "identity-verify-url";
pub const ARG_PROJECT_ID: &str = "identity-project-id";
pub const ARG_API_KEY: &str = "identity-api-key";
pub const ARG_TIMEOUT_SECONDS: &str = "identity-timeout-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    pub verify_url: Url,
    pub project_id: Option<String>,
    pub api_key: Option<SecretString>,
    pub timeout_seconds: u64,
}

impl Options {
    /// Parse identity provider arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the verification URL is missing or not an http(s) URL.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let raw_url = matches
            .get_one::<String>(ARG_VERIFY_URL)
            .context("missing required argument: --identity-verify-url")?;
        let verify_url = Url::parse(raw_url)
            .with_context(|| format!("Invalid identity verification URL: {raw_url}"))?;
        if !matches!(verify_url.scheme(), "http" | "https") {
            anyhow::bail!("Identity verification URL must use http or https: {raw_url}");
        }

        Ok(Self {
            verify_url,
            project_id: matches.get_one::<String>(ARG_PROJECT_ID).cloned(),
            api_key: matches
                .get_one::<String>(ARG_API_KEY)
                .filter(|key| !key.trim().is_empty())
                .map(|key| SecretString::from(key.clone())),
            timeout_seconds: matches
                .get_one::<u64>(ARG_TIMEOUT_SECONDS)
                .copied()
                .unwrap_or(5),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERIFY_URL)
                .long(ARG_VERIFY_URL)
                .help("Identity provider endpoint that verifies session tokens")
                .env("MAILGATE_IDENTITY_VERIFY_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PROJECT_ID)
                .long(ARG_PROJECT_ID)
                .help("Identity provider project id, checked against the token audience")
                .env("MAILGATE_IDENTITY_PROJECT_ID"),
        )
        .arg(
            Arg::new(ARG_API_KEY)
                .long(ARG_API_KEY)
                .help("Service credential sent as a bearer token to the verification endpoint")
                .env("MAILGATE_IDENTITY_API_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT_SECONDS)
                .long(ARG_TIMEOUT_SECONDS)
                .help("Timeout for a single verification request")
                .env("MAILGATE_IDENTITY_TIMEOUT_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
