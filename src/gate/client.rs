//! Client gate: keeps a mounted page shell in step with the live session.
//!
//! A mount registers one auth-state listener. Until the first notification the
//! shell is loading: nothing protected renders and no redirect is decided. Every
//! notification replaces the known principal; a signed-out state on any page
//! other than login pushes the login page, once. Unmounting removes the
//! listener.

use super::routes::{RouteTable, SIDEBAR};
use crate::identity::{AuthStateSource, Principal, Subscription};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Text shown while the first auth-state notification is pending.
pub const LOADING_PLACEHOLDER: &str = "Loading...";

/// Client-side router used to leave a page.
pub trait Navigator: Send + Sync {
    fn push(&self, path: &str);
}

/// What the page shell may render right now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellView {
    /// Placeholder only; protected content stays hidden.
    Loading,
    Ready {
        principal: Option<Principal>,
        show_sidebar: bool,
    },
}

impl ShellView {
    /// Placeholder text to render instead of the page, if any.
    #[must_use]
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Self::Loading => Some(LOADING_PLACEHOLDER),
            Self::Ready { .. } => None,
        }
    }

    /// Sidebar links when the sidebar is visible.
    #[must_use]
    pub fn sidebar(&self) -> &'static [super::routes::SidebarItem] {
        match self {
            Self::Ready {
                show_sidebar: true, ..
            } => &SIDEBAR,
            _ => &[],
        }
    }
}

#[derive(Debug)]
struct MountState {
    mounted: bool,
    loading: bool,
    principal: Option<Principal>,
    path: String,
    notifications: u64,
}

struct Shared {
    state: Mutex<MountState>,
    routes: Arc<RouteTable>,
    navigator: Arc<dyn Navigator>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, MountState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_auth_state(&self, principal: Option<Principal>) {
        let redirect = {
            let mut state = self.lock();
            if !state.mounted {
                return;
            }
            state.notifications += 1;
            state.loading = false;
            state.principal = principal;
            self.redirect_target(&mut state)
        };
        self.push(redirect);
    }

    fn on_navigate(&self, path: &str) {
        let redirect = {
            let mut state = self.lock();
            state.path = path.to_string();
            if state.loading || !state.mounted {
                None
            } else {
                self.redirect_target(&mut state)
            }
        };
        self.push(redirect);
    }

    // Moving to the login path here is what keeps repeated signed-out
    // notifications from pushing it again.
    fn redirect_target(&self, state: &mut MountState) -> Option<String> {
        if state.principal.is_some() || self.routes.is_login(&state.path) {
            return None;
        }
        let login = self.routes.login().to_string();
        state.path.clone_from(&login);
        Some(login)
    }

    // Called without the state lock held; navigators may call back into the gate.
    fn push(&self, redirect: Option<String>) {
        if let Some(path) = redirect {
            debug!(%path, "signed out, redirecting");
            self.navigator.push(&path);
        }
    }
}

/// One mount of the client gate.
pub struct ClientGate {
    shared: Arc<Shared>,
    subscription: Option<Subscription>,
}

impl ClientGate {
    /// Mount on `current_path` and start listening to `source`.
    pub fn mount<S>(
        source: &S,
        routes: Arc<RouteTable>,
        navigator: Arc<dyn Navigator>,
        current_path: &str,
    ) -> Self
    where
        S: AuthStateSource + ?Sized,
    {
        let shared = Arc::new(Shared {
            state: Mutex::new(MountState {
                mounted: true,
                loading: true,
                principal: None,
                path: current_path.to_string(),
                notifications: 0,
            }),
            routes,
            navigator,
        });

        let listener = Arc::clone(&shared);
        let subscription =
            source.on_auth_state_changed(move |principal| listener.on_auth_state(principal));

        Self {
            shared,
            subscription: Some(subscription),
        }
    }

    #[must_use]
    pub fn view(&self) -> ShellView {
        let state = self.shared.lock();
        if state.loading {
            return ShellView::Loading;
        }
        let show_sidebar =
            state.principal.is_some() && !self.shared.routes.is_login(&state.path);
        ShellView::Ready {
            principal: state.principal.clone(),
            show_sidebar,
        }
    }

    /// Record a client-side navigation and re-check the latest known state.
    pub fn navigate(&self, path: &str) {
        self.shared.on_navigate(path);
    }

    #[must_use]
    pub fn current_path(&self) -> String {
        self.shared.lock().path.clone()
    }

    /// Number of auth-state notifications this mount has processed.
    #[must_use]
    pub fn notifications(&self) -> u64 {
        self.shared.lock().notifications
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.shared.lock().mounted
            && self
                .subscription
                .as_ref()
                .is_some_and(Subscription::is_active)
    }

    /// Stop listening. Dropping the gate does the same.
    pub fn unmount(mut self) {
        self.teardown();
    }

    // A listener callback already past its mounted check may still push once;
    // everything after this returns is ignored.
    fn teardown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.shared.lock().mounted = false;
            subscription.unsubscribe();
        }
    }
}

impl Drop for ClientGate {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for ClientGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientGate")
            .field("state", &*self.shared.lock())
            .field("subscription", &self.subscription)
            .finish()
    }
}
