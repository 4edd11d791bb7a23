//! # Mailgate (session gating for the webmail dashboard)
//!
//! `mailgate` keeps the dashboard pages (emails, contacts, calendar) behind a
//! valid identity-provider session. It is split into two independent gates
//! that share one route classification table:
//!
//! - **Edge gate** ([`gate::edge`]): runs before a page is served. It reads the
//!   `token` cookie, verifies it with the identity provider and either lets the
//!   request through, sends it to the login page, or sends an already signed-in
//!   user away from the login page.
//! - **Client gate** ([`gate::client`]): runs for the lifetime of a rendered
//!   page. It listens to auth-state notifications and redirects to the login
//!   page when the session goes away.
//!
//! Both gates fail closed: any verification failure ends in a redirect to the
//! login page, never in an error page.
//!
//! The `mailgate` binary wires the edge gate in front of the dashboard
//! front-end origin ([`api`]).

pub mod api;
pub mod cli;
pub mod gate;
pub mod identity;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
