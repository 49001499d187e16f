//! Banking REST API
//!
//! The cores only see the [`BankApi`] trait. [`HttpBankApi`] is the real
//! transport; [`MockBankApi`] is the scripted stand-in used by tests.
//!
//! | Operation               | Method & Path                          |
//! |-------------------------|----------------------------------------|
//! | login                   | `POST /auth/login` (never authenticated) |
//! | current user            | `GET /users/me`                        |
//! | list accounts           | `GET /accounts`                        |
//! | account by id           | `GET /accounts/{id}`                   |
//! | accounts by user        | `GET /accounts/user/{userId}`          |
//! | all transactions        | `GET /transactions`                    |
//! | transactions by account | `GET /transactions/account/{accountId}` |
//! | transfer                | `POST /transactions/transfer`          |

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock-api"))]
pub mod mock;

pub use client::{API_PREFIX, HttpBankApi, normalize_base_url};
pub use error::ApiError;
#[cfg(any(test, feature = "mock-api"))]
pub use mock::MockBankApi;

use async_trait::async_trait;

use crate::models::{
    Account, AccountId, LoginRequest, LoginResponse, Transaction, TransferRequest,
    TransferResponse, User, UserId,
};

/// Consumed REST contract
///
/// Every call except [`BankApi::login`] carries the stored bearer token when
/// one exists.
#[async_trait]
pub trait BankApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;

    async fn current_user(&self) -> Result<User, ApiError>;

    async fn accounts(&self) -> Result<Vec<Account>, ApiError>;

    async fn account(&self, id: AccountId) -> Result<Account, ApiError>;

    async fn accounts_by_user(&self, user_id: UserId) -> Result<Vec<Account>, ApiError>;

    async fn transactions(&self) -> Result<Vec<Transaction>, ApiError>;

    async fn transactions_by_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, ApiError>;

    async fn transfer(&self, request: &TransferRequest) -> Result<TransferResponse, ApiError>;
}
