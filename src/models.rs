//! Wire models for the banking REST API
//!
//! All entities are immutable snapshots: the dashboard replaces them wholesale
//! after every fetch and never patches them in place.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type UserId = u64;
pub type AccountId = u64;
pub type TransactionId = u64;

// ============================================================================
// User
// ============================================================================

/// Authenticated user profile (`GET /users/me`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ============================================================================
// Account
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    Checking,
    Savings,
}

impl AccountType {
    /// Wire name (`CHECKING` / `SAVINGS`)
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "CHECKING",
            AccountType::Savings => "SAVINGS",
        }
    }

    /// Human-readable card title
    pub fn label(&self) -> &'static str {
        match self {
            AccountType::Checking => "Checking Account",
            AccountType::Savings => "Savings Account",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bank account snapshot
///
/// `balance` is non-negative by domain convention; the client does not enforce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub account_number: String,
    pub account_type: AccountType,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

// ============================================================================
// Transaction
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdrawal => "WITHDRAWAL",
            TransactionType::Transfer => "TRANSFER",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Money movement relative to the account that owns the transaction row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Credit,
    Debit,
}

impl Direction {
    pub fn sign(&self) -> char {
        match self {
            Direction::Credit => '+',
            Direction::Debit => '-',
        }
    }
}

/// Transaction row as seen from `account_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_account_id: Option<AccountId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_account_id: Option<AccountId>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Balance of `account_id` after this transaction
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub description: String,
    pub transaction_date: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Transaction {
    /// Transfers are incoming when this row's account is the target.
    pub fn direction(&self) -> Direction {
        match self.kind {
            TransactionType::Deposit => Direction::Credit,
            TransactionType::Withdrawal => Direction::Debit,
            TransactionType::Transfer => {
                if self.target_account_id == Some(self.account_id) {
                    Direction::Credit
                } else {
                    Direction::Debit
                }
            }
        }
    }
}

// ============================================================================
// Requests / Responses
// ============================================================================

/// `POST /transactions/transfer` body. Built per submission, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub description: String,
}

/// Success payload of a transfer. The server only promises a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}
