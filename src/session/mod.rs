//! Authentication session
//!
//! [`SessionCore`] decides whether the caller is authenticated and gates
//! navigation; [`SessionState`] is what it publishes.

pub mod service;
pub mod state;

pub use service::SessionCore;
pub use state::{SessionPhase, SessionState};
