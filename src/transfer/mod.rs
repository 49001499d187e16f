//! Transfer workflow
//!
//! ```text
//! IDLE ──[submit, invalid]──▶ IDLE (field errors)
//!   │
//!   └──[submit, valid]──▶ SUBMITTING ──[ok]────▶ IDLE, on_success()
//!                              │
//!                              └──[error]──▶ IDLE (error message)
//! ```
//!
//! A submit while SUBMITTING is rejected as [`TransferOutcome::Busy`].

pub mod error;
pub mod form;
pub mod workflow;

pub use error::{FieldErrors, TRANSFER_FAILED, TransferField};
pub use form::{MIN_AMOUNT, TransferDraft};
pub use workflow::{TransferOutcome, TransferWorkflow};
