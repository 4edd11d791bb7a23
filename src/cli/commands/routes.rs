use crate::gate::routes::{paths, RouteTable};
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};

pub const ARG_LOGIN_PATH: &str = "login-path";
pub const ARG_LANDING_PATH: &str = "landing-path";
pub const ARG_PROTECTED_PATHS: &str = "protected-paths";
pub const ARG_COOKIE_SECURE: &str = "cookie-secure";

#[derive(Debug, Clone)]
pub struct Options {
    pub routes: RouteTable,
    pub cookie_secure: bool,
}

impl Options {
    /// Build the route table from matches.
    ///
    /// # Errors
    /// Returns an error if the paths do not form a valid route table.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let login = matches
            .get_one::<String>(ARG_LOGIN_PATH)
            .map_or(paths::LOGIN, String::as_str);
        let landing = matches
            .get_one::<String>(ARG_LANDING_PATH)
            .map_or(paths::EMAILS, String::as_str);
        let protected: Vec<&String> = matches
            .get_many::<String>(ARG_PROTECTED_PATHS)
            .map(Iterator::collect)
            .unwrap_or_default();

        let routes = RouteTable::new(login, landing, protected)
            .context("Invalid route configuration")?;

        Ok(Self {
            routes,
            cookie_secure: matches.get_flag(ARG_COOKIE_SECURE),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_LOGIN_PATH)
                .long(ARG_LOGIN_PATH)
                .help("Public login page")
                .env("MAILGATE_LOGIN_PATH")
                .default_value(paths::LOGIN),
        )
        .arg(
            Arg::new(ARG_LANDING_PATH)
                .long(ARG_LANDING_PATH)
                .help("Page signed-in users are sent to from the login page")
                .env("MAILGATE_LANDING_PATH")
                .default_value(paths::EMAILS),
        )
        .arg(
            Arg::new(ARG_PROTECTED_PATHS)
                .long(ARG_PROTECTED_PATHS)
                .help("Comma separated pages that require a session; '/' is always protected")
                .env("MAILGATE_PROTECTED_PATHS")
                .value_delimiter(',')
                .default_value("/,/emails,/contacts,/calendar"),
        )
        .arg(
            Arg::new(ARG_COOKIE_SECURE)
                .long(ARG_COOKIE_SECURE)
                .help("Mark cleared session cookies as Secure (dashboard served over HTTPS)")
                .env("MAILGATE_COOKIE_SECURE")
                .action(ArgAction::SetTrue),
        )
}
