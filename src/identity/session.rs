//! Client session manager and auth-state subscriptions.
//!
//! Listeners receive the current state right after registering and then every
//! state the manager publishes, in order. Publishing never waits on listeners:
//! each listener owns an unbounded queue drained by its own task, so a slow
//! listener falls behind without losing a change.

use super::Principal;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};
use tokio::{
    sync::mpsc::{self, UnboundedSender},
    task::JoinHandle,
};
use tracing::debug;

/// Push stream of auth-state changes.
pub trait AuthStateSource {
    /// Register a listener; it stays registered until the returned
    /// [`Subscription`] is unsubscribed or dropped.
    fn on_auth_state_changed<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(Option<Principal>) + Send + 'static;
}

/// Disposer for a registered listener.
#[derive(Debug)]
#[must_use = "dropping a Subscription removes the listener"]
pub struct Subscription {
    active: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    fn new(active: Arc<AtomicBool>, task: JoinHandle<()>) -> Self {
        Self {
            active,
            task: Some(task),
        }
    }

    /// Remove the listener. No callback starts after this returns; one already
    /// running finishes.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
            && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    // Abort alone only lands at the task's next await, which a queue with
    // pending states never reaches.
    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            self.active.store(false, Ordering::Release);
            task.abort();
            debug!("auth state listener removed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Debug, Default)]
struct Session {
    current: Option<Principal>,
    listeners: Vec<UnboundedSender<Option<Principal>>>,
}

impl Session {
    // Called with the lock held, so every queue sees the same order.
    fn publish(&mut self, state: Option<Principal>) {
        self.current.clone_from(&state);
        self.listeners
            .retain(|listener| listener.send(state.clone()).is_ok());
    }
}

/// In-process client session manager.
///
/// Cloning shares the same session. Listener tasks run on the ambient tokio
/// runtime.
#[derive(Clone, Debug, Default)]
pub struct SessionManager {
    session: Arc<Mutex<Session>>,
}

impl SessionManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn signed_in(principal: Principal) -> Self {
        let manager = Self::new();
        manager.sign_in(principal);
        manager
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn current_user(&self) -> Option<Principal> {
        self.lock().current.clone()
    }

    /// Number of listeners still registered.
    #[must_use]
    pub fn listeners(&self) -> usize {
        self.lock()
            .listeners
            .iter()
            .filter(|listener| !listener.is_closed())
            .count()
    }

    pub fn sign_in(&self, principal: Principal) {
        debug!(uid = %principal.uid, "session signed in");
        self.lock().publish(Some(principal));
    }

    /// Clear the session and notify listeners, even if already signed out.
    pub fn sign_out(&self) {
        debug!("session signed out");
        self.lock().publish(None);
    }
}

impl AuthStateSource for SessionManager {
    fn on_auth_state_changed<F>(&self, mut listener: F) -> Subscription
    where
        F: FnMut(Option<Principal>) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        {
            let mut session = self.lock();
            // Queued under the lock so no publish can slip in ahead of it.
            let _ = tx.send(session.current.clone());
            session.listeners.push(tx);
        }

        let active = Arc::new(AtomicBool::new(true));
        let running = Arc::clone(&active);
        let task = tokio::spawn(async move {
            while let Some(state) = rx.recv().await {
                if !running.load(Ordering::Acquire) {
                    break;
                }
                listener(state);
            }
        });

        Subscription::new(active, task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::atomic::AtomicUsize, time::Duration};

    fn ada() -> Principal {
        Principal::new("uid-ada", "ada@example.com")
    }

    #[tokio::test]
    async fn listener_receives_current_state_first() {
        let manager = SessionManager::signed_in(ada());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _subscription = manager.on_auth_state_changed(move |state| {
            let _ = tx.send(state);
        });

        assert_eq!(rx.recv().await, Some(Some(ada())));
    }

    #[tokio::test]
    async fn listener_receives_changes_in_order() {
        let manager = SessionManager::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _subscription = manager.on_auth_state_changed(move |state| {
            let _ = tx.send(state);
        });

        assert_eq!(rx.recv().await, Some(None));
        manager.sign_in(ada());
        assert_eq!(rx.recv().await, Some(Some(ada())));
        manager.sign_out();
        assert_eq!(rx.recv().await, Some(None));
    }

    #[tokio::test]
    async fn unsubscribe_stops_notifications() {
        let manager = SessionManager::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscription = manager.on_auth_state_changed(move |state| {
            let _ = tx.send(state);
        });

        assert_eq!(rx.recv().await, Some(None));
        assert!(subscription.is_active());
        subscription.unsubscribe();

        manager.sign_in(ada());
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        // The aborted task drops its sender without delivering the sign-in.
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn dropping_subscription_removes_listener() {
        let manager = SessionManager::new();
        let calls = Arc::new(Mutex::new(0_u32));
        let counter = Arc::clone(&calls);
        let subscription = manager.on_auth_state_changed(move |_| {
            if let Ok(mut calls) = counter.lock() {
                *calls += 1;
            }
        });
        drop(subscription);

        manager.sign_out();
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        assert_eq!(calls.lock().map(|calls| *calls).unwrap_or(u32::MAX), 0);
    }

    #[tokio::test]
    async fn every_change_is_delivered_in_order() {
        let manager = SessionManager::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _subscription = manager.on_auth_state_changed(move |state| {
            let _ = tx.send(state);
        });

        // Published before the listener task gets to run.
        manager.sign_in(ada());
        manager.sign_out();
        manager.sign_in(ada());

        assert_eq!(rx.recv().await, Some(None));
        assert_eq!(rx.recv().await, Some(Some(ada())));
        assert_eq!(rx.recv().await, Some(None));
        assert_eq!(rx.recv().await, Some(Some(ada())));
        assert_eq!(manager.current_user(), Some(ada()));
    }

    #[tokio::test]
    async fn closed_listeners_are_pruned_on_publish() {
        let manager = SessionManager::new();
        let subscription = manager.on_auth_state_changed(|_| {});
        assert_eq!(manager.listeners(), 1);

        subscription.unsubscribe();
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        manager.sign_out();
        assert_eq!(manager.listeners(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn no_callback_starts_after_unsubscribe_returns() {
        let manager = SessionManager::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let (entered_tx, mut entered) = mpsc::unbounded_channel();

        let counter = Arc::clone(&calls);
        let subscription = manager.on_auth_state_changed(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = entered_tx.send(());
            // Keep the first callback busy on its worker.
            std::thread::sleep(Duration::from_millis(200));
        });

        assert_eq!(entered.recv().await, Some(()));
        subscription.unsubscribe();
        let at_unsubscribe = calls.load(Ordering::SeqCst);

        manager.sign_in(ada());
        manager.sign_out();
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(at_unsubscribe, 1);
        assert_eq!(calls.load(Ordering::SeqCst), at_unsubscribe);
    }
}
