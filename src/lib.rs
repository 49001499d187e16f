//! Bank Dashboard - session and transfer core for a banking client
//!
//! # Modules
//!
//! - [`models`] - Wire types (User, Account, Transaction, transfer bodies)
//! - [`credentials`] - Persisted bearer token storage
//! - [`navigation`] - Route targets and the navigator capability
//! - [`api`] - REST contract, reqwest client and scripted mock
//! - [`session`] - Authentication state and token lifecycle
//! - [`login`] - Credentials form and login exchange
//! - [`transfer`] - Transfer form validation and submission
//! - [`dashboard`] - Account view, transfer hosting and reconciliation
//! - [`format`] - Currency, date, account number and pagination helpers
//! - [`config`] / [`logging`] - YAML configuration and tracing setup

// Wire types - everything else builds on them
pub mod models;

// Capabilities injected into the cores
pub mod api;
pub mod credentials;
pub mod navigation;

// Cores
pub mod dashboard;
pub mod login;
pub mod session;
pub mod transfer;

// Support
pub mod config;
pub mod format;
pub mod logging;

// Convenient re-exports at crate root
pub use api::{ApiError, BankApi, HttpBankApi};
pub use config::AppConfig;
pub use credentials::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, StoreError, is_authenticated,
};
pub use dashboard::{Dashboard, DashboardView, Gate};
pub use login::{LoginError, LoginFlow, LoginForm};
pub use models::{Account, AccountId, AccountType, Transaction, TransactionType, User, UserId};
pub use navigation::{Navigator, Route, entry_route};
pub use session::{SessionCore, SessionPhase, SessionState};
pub use transfer::{FieldErrors, TransferField, TransferOutcome, TransferWorkflow};
