//! Session State Definitions
//!
//! ```text
//! INIT(loading, no user) ──[no token]──────────▶ RESOLVED_ANON
//!        │                                        ▲      │
//!        ├──[token, fetch ok]──▶ RESOLVED_USER ───┘      │ login(t): token stored,
//!        │                          (logout)             │ user stays None
//!        └──[token, fetch fails]──▶ RESOLVED_ANON ◀──────┘
//! ```
//!
//! Nothing re-enters INIT; only a fresh session core starts there.

use std::fmt;

use crate::models::User;

/// Snapshot published to subscribers
///
/// `loading` is true only before the initial token check resolves.
/// `user` is set iff that resolution succeeded and logout has not happened since.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    pub loading: bool,
}

impl SessionState {
    pub fn initial() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            user: None,
            loading: false,
        }
    }

    pub fn authenticated(user: User) -> Self {
        Self {
            user: Some(user),
            loading: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match (&self.user, self.loading) {
            (_, true) => SessionPhase::Init,
            (Some(_), false) => SessionPhase::ResolvedUser,
            (None, false) => SessionPhase::ResolvedAnon,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    Init,
    ResolvedAnon,
    ResolvedUser,
}

impl SessionPhase {
    #[inline]
    pub fn is_resolved(&self) -> bool {
        !matches!(self, SessionPhase::Init)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Init => "INIT",
            SessionPhase::ResolvedAnon => "RESOLVED_ANON",
            SessionPhase::ResolvedUser => "RESOLVED_USER",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
