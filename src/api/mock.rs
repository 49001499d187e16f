//! Scripted in-memory [`BankApi`] for tests
//!
//! Responses are configured up front; every call is counted and transfer /
//! login bodies are recorded for verification. A successful transfer moves
//! balances between the stored accounts so refreshed fetches see new data.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

use super::BankApi;
use super::error::ApiError;
use crate::models::{
    Account, AccountId, LoginRequest, LoginResponse, Transaction, TransferRequest,
    TransferResponse, User, UserId,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct MockBankApi {
    current_user: Mutex<Result<User, ApiError>>,
    login: Mutex<Result<LoginResponse, ApiError>>,
    accounts: Mutex<Vec<Account>>,
    accounts_error: Mutex<Option<ApiError>>,
    transactions: Mutex<HashMap<AccountId, Vec<Transaction>>>,
    transactions_error: Mutex<Option<ApiError>>,
    transfer_error: Mutex<Option<ApiError>>,
    /// Recorded bodies
    transfers: Mutex<Vec<TransferRequest>>,
    logins: Mutex<Vec<LoginRequest>>,
    /// Call counters
    current_user_count: AtomicUsize,
    accounts_count: AtomicUsize,
    transactions_count: AtomicUsize,
    /// Calls block until the gate is notified
    current_user_gate: Mutex<Option<Arc<Notify>>>,
    transfer_gate: Mutex<Option<Arc<Notify>>>,
    transactions_gate: Mutex<Option<Arc<Notify>>>,
}

impl Default for MockBankApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBankApi {
    pub fn new() -> Self {
        Self {
            current_user: Mutex::new(Err(ApiError::from_status(401, None))),
            login: Mutex::new(Err(ApiError::from_status(401, None))),
            accounts: Mutex::new(Vec::new()),
            accounts_error: Mutex::new(None),
            transactions: Mutex::new(HashMap::new()),
            transactions_error: Mutex::new(None),
            transfer_error: Mutex::new(None),
            transfers: Mutex::new(Vec::new()),
            logins: Mutex::new(Vec::new()),
            current_user_count: AtomicUsize::new(0),
            accounts_count: AtomicUsize::new(0),
            transactions_count: AtomicUsize::new(0),
            current_user_gate: Mutex::new(None),
            transfer_gate: Mutex::new(None),
            transactions_gate: Mutex::new(None),
        }
    }

    // === Configuration ===

    pub fn set_current_user(&self, user: User) {
        *lock(&self.current_user) = Ok(user);
    }

    pub fn fail_current_user(&self, error: ApiError) {
        *lock(&self.current_user) = Err(error);
    }

    pub fn set_login_response(&self, response: LoginResponse) {
        *lock(&self.login) = Ok(response);
    }

    pub fn fail_login(&self, error: ApiError) {
        *lock(&self.login) = Err(error);
    }

    pub fn set_accounts(&self, accounts: Vec<Account>) {
        *lock(&self.accounts) = accounts;
    }

    pub fn fail_accounts(&self, error: Option<ApiError>) {
        *lock(&self.accounts_error) = error;
    }

    pub fn set_transactions(&self, account_id: AccountId, transactions: Vec<Transaction>) {
        lock(&self.transactions).insert(account_id, transactions);
    }

    pub fn fail_transactions(&self, error: Option<ApiError>) {
        *lock(&self.transactions_error) = error;
    }

    pub fn fail_transfer(&self, error: Option<ApiError>) {
        *lock(&self.transfer_error) = error;
    }

    /// Hold `current_user` calls until the returned handle is notified
    pub fn hold_current_user(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.current_user_gate) = Some(gate.clone());
        gate
    }

    /// Hold `transfer` calls until the returned handle is notified
    pub fn hold_transfer(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.transfer_gate) = Some(gate.clone());
        gate
    }

    /// Hold `transactions_by_account` calls until the returned handle is notified
    pub fn hold_transactions(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.transactions_gate) = Some(gate.clone());
        gate
    }

    /// Let held and future `transactions_by_account` calls through
    pub fn release_transactions(&self) {
        if let Some(gate) = lock(&self.transactions_gate).take() {
            gate.notify_waiters();
        }
    }

    // === Verification ===

    pub fn transfer_requests(&self) -> Vec<TransferRequest> {
        lock(&self.transfers).clone()
    }

    pub fn login_requests(&self) -> Vec<LoginRequest> {
        lock(&self.logins).clone()
    }

    pub fn current_user_count(&self) -> usize {
        self.current_user_count.load(Ordering::SeqCst)
    }

    pub fn accounts_count(&self) -> usize {
        self.accounts_count.load(Ordering::SeqCst)
    }

    pub fn transactions_count(&self) -> usize {
        self.transactions_count.load(Ordering::SeqCst)
    }

    pub fn balance_of(&self, id: AccountId) -> Option<rust_decimal::Decimal> {
        lock(&self.accounts)
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.balance)
    }

    fn accounts_result(&self) -> Result<Vec<Account>, ApiError> {
        self.accounts_count.fetch_add(1, Ordering::SeqCst);
        match lock(&self.accounts_error).clone() {
            Some(e) => Err(e),
            None => Ok(lock(&self.accounts).clone()),
        }
    }

    fn apply_transfer(&self, request: &TransferRequest) {
        let mut accounts = lock(&self.accounts);
        for account in accounts.iter_mut() {
            if account.id == request.from_account_id {
                account.balance -= request.amount;
            } else if account.id == request.to_account_id {
                account.balance += request.amount;
            }
        }
    }
}

#[async_trait]
impl BankApi for MockBankApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        lock(&self.logins).push(request.clone());
        lock(&self.login).clone()
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.current_user_count.fetch_add(1, Ordering::SeqCst);
        let gate = lock(&self.current_user_gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        lock(&self.current_user).clone()
    }

    async fn accounts(&self) -> Result<Vec<Account>, ApiError> {
        self.accounts_result()
    }

    async fn account(&self, id: AccountId) -> Result<Account, ApiError> {
        self.accounts_result()?
            .into_iter()
            .find(|a| a.id == id)
            .ok_or_else(|| ApiError::from_status(404, Some("Account not found".to_string())))
    }

    async fn accounts_by_user(&self, user_id: UserId) -> Result<Vec<Account>, ApiError> {
        Ok(self
            .accounts_result()?
            .into_iter()
            .filter(|a| a.user_id == user_id)
            .collect())
    }

    async fn transactions(&self) -> Result<Vec<Transaction>, ApiError> {
        self.transactions_count.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = lock(&self.transactions_error).clone() {
            return Err(e);
        }
        Ok(lock(&self.transactions).values().flatten().cloned().collect())
    }

    async fn transactions_by_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, ApiError> {
        self.transactions_count.fetch_add(1, Ordering::SeqCst);
        let gate = lock(&self.transactions_gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(e) = lock(&self.transactions_error).clone() {
            return Err(e);
        }
        Ok(lock(&self.transactions)
            .get(&account_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn transfer(&self, request: &TransferRequest) -> Result<TransferResponse, ApiError> {
        lock(&self.transfers).push(request.clone());
        let gate = lock(&self.transfer_gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(e) = lock(&self.transfer_error).clone() {
            return Err(e);
        }
        self.apply_transfer(request);
        Ok(TransferResponse {
            message: Some("Transfer successful".to_string()),
        })
    }
}
