pub mod identity;
pub mod logging;
pub mod routes;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";
pub const ARG_UPSTREAM_URL: &str = "upstream-url";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("mailgate")
        .about("Session gating edge for the webmail dashboard")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("MAILGATE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_UPSTREAM_URL)
                .short('u')
                .long(ARG_UPSTREAM_URL)
                .help("Dashboard front-end origin that admitted requests are forwarded to")
                .env("MAILGATE_UPSTREAM_URL")
                .required(true),
        );

    let command = identity::with_args(command);
    let command = routes::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "mailgate");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Session gating edge for the webmail dashboard".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_check_port_and_upstream() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "mailgate",
            "--port",
            "8080",
            "--upstream-url",
            "http://127.0.0.1:3000",
            "--identity-verify-url",
            "https://id.example.com/v1/verify",
        ]);

        assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(8080));
        assert_eq!(
            matches.get_one::<String>(ARG_UPSTREAM_URL).cloned(),
            Some("http://127.0.0.1:3000".to_string())
        );
        assert_eq!(
            matches.get_one::<String>(identity::ARG_VERIFY_URL).cloned(),
            Some("https://id.example.com/v1/verify".to_string())
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("MAILGATE_PORT", Some("443")),
                ("MAILGATE_UPSTREAM_URL", Some("http://frontend:3000")),
                (
                    "MAILGATE_IDENTITY_VERIFY_URL",
                    Some("https://id.example.com/v1/verify"),
                ),
                ("MAILGATE_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["mailgate"]);
                assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(443));
                assert_eq!(
                    matches.get_one::<String>(ARG_UPSTREAM_URL).cloned(),
                    Some("http://frontend:3000".to_string())
                );
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(2)
                );
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("MAILGATE_LOG_LEVEL", Some(level)),
                    ("MAILGATE_UPSTREAM_URL", Some("http://frontend:3000")),
                    (
                        "MAILGATE_IDENTITY_VERIFY_URL",
                        Some("https://id.example.com/v1/verify"),
                    ),
                ],
                || {
                    let command = new();
                    let matches = command.get_matches_from(vec!["mailgate"]);
                    assert_eq!(
                        matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                        u8::try_from(index).ok()
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        // loop cover all possible value_parse
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("MAILGATE_LOG_LEVEL", None::<String>)], || {
                let mut args = vec![
                    "mailgate".to_string(),
                    "--upstream-url".to_string(),
                    "http://frontend:3000".to_string(),
                    "--identity-verify-url".to_string(),
                    "https://id.example.com/v1/verify".to_string(),
                ];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let command = new();

                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_missing_upstream_fails() {
        temp_env::with_vars([("MAILGATE_UPSTREAM_URL", None::<&str>)], || {
            let result = new().try_get_matches_from(vec![
                "mailgate",
                "--identity-verify-url",
                "https://id.example.com/v1/verify",
            ]);
            assert_eq!(
                result.map_err(|e| e.kind()).err(),
                Some(clap::error::ErrorKind::MissingRequiredArgument)
            );
        });
    }
}
