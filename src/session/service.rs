//! Session core: token lifecycle and authentication state
//!
//! Owns the persisted token (sole writer), resolves the current user once per
//! instance, and publishes [`SessionState`] snapshots through a `watch`
//! channel. Profile-fetch failures never escape: they demote the session to
//! anonymous, clear the token and are logged.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::state::{SessionPhase, SessionState};
use crate::api::BankApi;
use crate::credentials::{CredentialStore, StoreError, is_authenticated};
use crate::models::User;
use crate::navigation::{Navigator, Route};

pub struct SessionCore {
    store: Arc<dyn CredentialStore>,
    api: Arc<dyn BankApi>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<SessionState>,
    /// Initialization runs at most once per instance
    initialized: AtomicBool,
    /// Cleared by `unmount`; late resolutions are dropped afterwards
    mounted: AtomicBool,
}

impl SessionCore {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        api: Arc<dyn BankApi>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::initial());
        Self {
            store,
            api,
            navigator,
            state,
            initialized: AtomicBool::new(false),
            mounted: AtomicBool::new(true),
        }
    }

    /// Resolve the initial session from the persisted token
    ///
    /// Only the first call does anything.
    pub async fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("Session already initialized");
            return;
        }

        if !is_authenticated(Some(&*self.store)) {
            debug!("No stored token, session is anonymous");
            self.publish(SessionState::anonymous());
            return;
        }

        match self.api.current_user().await {
            Ok(user) => {
                // Token removed while the profile was in flight (logout)
                if self.store.get().is_none() {
                    info!("Token cleared during session resolution, staying anonymous");
                    self.publish(SessionState::anonymous());
                    return;
                }
                info!("Session resolved for user {}", user.id);
                self.publish(SessionState::authenticated(user));
            }
            Err(e) => {
                if let Err(store_err) = self.store.clear() {
                    warn!("Failed to clear token: {}", store_err);
                }
                error!("Authentication failed: {}", e);
                self.publish(SessionState::anonymous());
            }
        }
    }

    /// Persist `token` and go to the dashboard
    ///
    /// The in-memory user is left untouched; it is only populated by the
    /// initialization of a fresh session core.
    pub fn login(&self, token: &str) -> Result<(), StoreError> {
        self.store.set(token)?;
        info!("Token stored, navigating to {}", Route::Dashboard);
        self.navigator.push(Route::Dashboard);
        Ok(())
    }

    /// Drop the token and the user, then go to the login page
    pub fn logout(&self) {
        self.end_session();
        info!("Logged out, navigating to {}", Route::Login);
        self.navigator.push(Route::Login);
    }

    /// An authenticated call was answered with 401: the token is no longer
    /// valid. Same effects as [`SessionCore::logout`].
    pub fn invalidate(&self) {
        self.end_session();
        warn!("Session rejected by server, navigating to {}", Route::Login);
        self.navigator.push(Route::Login);
    }

    fn end_session(&self) {
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear token: {}", e);
        }
        if self.is_mounted() {
            self.state.send_modify(|s| s.user = None);
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().phase()
    }

    /// Observe every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Detach from the host; in-flight resolutions will no longer write state
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    fn publish(&self, next: SessionState) {
        if !self.is_mounted() {
            debug!("Session core unmounted, dropping {} resolution", next.phase());
            return;
        }
        self.state.send_replace(next);
    }
}
