//! Route classification shared by the edge and client gates.
//!
//! Every request path falls in exactly one class: the login page, a protected
//! page, or a path the gates do not look at. The login path can never be part of
//! the protected set, so a signed-out visitor always has somewhere to land.

use axum::http::HeaderValue;
use std::collections::BTreeSet;
use thiserror::Error;

/// Fixed page paths of the dashboard.
pub mod paths {
    pub const ROOT: &str = "/";
    pub const LOGIN: &str = "/login";
    pub const EMAILS: &str = "/emails";
    pub const CONTACTS: &str = "/contacts";
    pub const CALENDAR: &str = "/calendar";
}

/// Navigation entry shown in the dashboard sidebar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SidebarItem {
    pub href: &'static str,
    pub label: &'static str,
}

pub const SIDEBAR: [SidebarItem; 3] = [
    SidebarItem {
        href: paths::CALENDAR,
        label: "Calendar",
    },
    SidebarItem {
        href: paths::CONTACTS,
        label: "Contacts",
    },
    SidebarItem {
        href: paths::EMAILS,
        label: "Emails",
    },
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("route path must start with '/': {0}")]
    InvalidPath(String),
    #[error("login path {0} cannot also be a protected path")]
    LoginProtected(String),
    #[error("landing path {0} must be a protected path")]
    LandingNotProtected(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteClass {
    /// The public login page.
    Login,
    /// A page that requires a valid session.
    Protected,
    /// Not intercepted by the gates.
    Unmatched,
}

/// Static partition of paths into login, protected and unmatched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteTable {
    login: String,
    landing: String,
    protected: BTreeSet<String>,
}

impl RouteTable {
    /// Build a table; the root path is always protected.
    ///
    /// # Errors
    /// Returns an error if a path is not absolute, if the login path is in the
    /// protected set, or if the landing path is not protected.
    pub fn new<I, S>(login: &str, landing: &str, protected: I) -> Result<Self, RouteTableError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let login = normalize_config_path(login)?;
        let landing = normalize_config_path(landing)?;

        let mut set = BTreeSet::from([paths::ROOT.to_string()]);
        for path in protected {
            set.insert(normalize_config_path(path.as_ref())?);
        }

        if set.contains(&login) {
            return Err(RouteTableError::LoginProtected(login));
        }
        if !set.contains(&landing) {
            return Err(RouteTableError::LandingNotProtected(landing));
        }

        Ok(Self {
            login,
            landing,
            protected: set,
        })
    }

    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Default page for signed-in users.
    #[must_use]
    pub fn landing(&self) -> &str {
        &self.landing
    }

    pub fn protected(&self) -> impl Iterator<Item = &str> {
        self.protected.iter().map(String::as_str)
    }

    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        let path = normalize(path);
        if path == self.login {
            RouteClass::Login
        } else if self.protected.contains(path) {
            RouteClass::Protected
        } else {
            RouteClass::Unmatched
        }
    }

    #[must_use]
    pub fn is_login(&self, path: &str) -> bool {
        self.classify(path) == RouteClass::Login
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            login: paths::LOGIN.to_string(),
            landing: paths::EMAILS.to_string(),
            protected: [paths::ROOT, paths::EMAILS, paths::CONTACTS, paths::CALENDAR]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

// `/contacts/` and `/contacts` are the same page.
fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        paths::ROOT
    } else {
        trimmed
    }
}

fn normalize_config_path(path: &str) -> Result<String, RouteTableError> {
    let path = path.trim();
    // Paths end up in Location headers.
    if !path.starts_with('/') || HeaderValue::from_str(path).is_err() {
        return Err(RouteTableError::InvalidPath(path.to_string()));
    }
    Ok(normalize(path).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_classifies_dashboard_pages() {
        let table = RouteTable::default();
        assert_eq!(table.classify("/login"), RouteClass::Login);
        assert_eq!(table.classify("/"), RouteClass::Protected);
        assert_eq!(table.classify("/emails"), RouteClass::Protected);
        assert_eq!(table.classify("/contacts"), RouteClass::Protected);
        assert_eq!(table.classify("/calendar"), RouteClass::Protected);
        assert_eq!(table.classify("/favicon.ico"), RouteClass::Unmatched);
        assert_eq!(table.classify("/contacts/42"), RouteClass::Unmatched);
        assert_eq!(table.landing(), "/emails");
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let table = RouteTable::default();
        assert_eq!(table.classify("/contacts/"), RouteClass::Protected);
        assert_eq!(table.classify("/login/"), RouteClass::Login);
        assert_eq!(table.classify(""), RouteClass::Protected);
    }

    #[test]
    fn new_rejects_paths_unfit_for_location() {
        assert_eq!(
            RouteTable::new("/log\nin", "/emails", ["/emails"]),
            Err(RouteTableError::InvalidPath("/log\nin".to_string()))
        );
        assert_eq!(
            RouteTable::new("/login", "/inbox\u{7f}", ["/inbox\u{7f}"]),
            Err(RouteTableError::InvalidPath("/inbox\u{7f}".to_string()))
        );
    }

    #[test]
    fn new_always_protects_root() -> Result<(), RouteTableError> {
        let table = RouteTable::new("/signin", "/inbox", ["/inbox"])?;
        assert_eq!(table.classify("/"), RouteClass::Protected);
        assert_eq!(table.classify("/signin"), RouteClass::Login);
        assert_eq!(table.protected().collect::<Vec<_>>(), vec!["/", "/inbox"]);
        Ok(())
    }

    #[test]
    fn new_rejects_login_in_protected_set() {
        let result = RouteTable::new("/login", "/emails", ["/emails", "/login/"]);
        assert_eq!(
            result,
            Err(RouteTableError::LoginProtected("/login".to_string()))
        );
        assert_eq!(
            RouteTable::new("/", "/emails", ["/emails"]),
            Err(RouteTableError::LoginProtected("/".to_string()))
        );
    }

    #[test]
    fn new_rejects_unprotected_landing() {
        assert_eq!(
            RouteTable::new("/login", "/inbox", ["/emails"]),
            Err(RouteTableError::LandingNotProtected("/inbox".to_string()))
        );
    }

    #[test]
    fn new_rejects_relative_paths() {
        assert_eq!(
            RouteTable::new("login", "/emails", ["/emails"]),
            Err(RouteTableError::InvalidPath("login".to_string()))
        );
    }

    #[test]
    fn sidebar_links_are_protected() {
        let table = RouteTable::default();
        for item in SIDEBAR {
            assert_eq!(table.classify(item.href), RouteClass::Protected);
        }
    }
}
