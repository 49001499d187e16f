//! Navigation capability injected into the session core and dashboard

use crate::credentials::{CredentialStore, is_authenticated};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Authenticated landing page
    Dashboard,
    /// Unauthenticated entry page
    Login,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/dashboard",
            Route::Login => "/login",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

pub trait Navigator: Send + Sync {
    fn push(&self, route: Route);
}

/// Where the entry page sends the caller, without waiting for profile resolution
pub fn entry_route(store: Option<&dyn CredentialStore>) -> Route {
    if is_authenticated(store) {
        Route::Dashboard
    } else {
        Route::Login
    }
}

/// Navigator for the terminal front end: there is no page to switch, so the
/// route change is logged and remembered for the caller to act on.
#[derive(Debug, Default)]
pub struct TerminalNavigator {
    current: Mutex<Option<Route>>,
}

impl TerminalNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Route> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for TerminalNavigator {
    fn push(&self, route: Route) {
        info!("Navigate -> {}", route);
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(route);
    }
}

/// Records every push, in order
#[cfg(any(test, feature = "mock-api"))]
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<Route>>,
}

#[cfg(any(test, feature = "mock-api"))]
impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<Route> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<Route> {
        self.history().last().copied()
    }
}

#[cfg(any(test, feature = "mock-api"))]
impl Navigator for RecordingNavigator {
    fn push(&self, route: Route) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route);
    }
}
