//! Dashboard controller
//!
//! Gates on the session, loads the user's accounts and the selected
//! account's history, hosts the transfer workflow and reconciles balances
//! after a completed transfer.
//!
//! A transaction list is only ever applied for the account that is still
//! selected when the response arrives. A 401 from any call ends the session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use crate::api::{ApiError, BankApi};
use crate::format::{page_count, paginate};
use crate::models::{Account, AccountId, Transaction, User};
use crate::navigation::{Navigator, Route};
use crate::session::{SessionCore, SessionState};
use crate::transfer::{TransferOutcome, TransferWorkflow};

/// Banner shown when the account collection cannot be loaded
pub const LOAD_FAILED: &str = "Failed to load account information. Please try again.";

/// Transfers need a source and a different destination
pub const MIN_ACCOUNTS_FOR_TRANSFER: usize = 2;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What the dashboard should do with the current session snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// Session still resolving; render nothing yet
    Wait,
    /// Anonymous; navigation to the login page was issued
    Redirected,
    Proceed(User),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardView {
    pub user: Option<User>,
    pub accounts: Vec<Account>,
    pub selected: Option<AccountId>,
    pub transactions: Vec<Transaction>,
    pub loading: bool,
    /// Banner message
    pub error: Option<String>,
    /// Last refresh failed; `accounts` predates the latest transfer
    pub stale: bool,
    pub transfer_open: bool,
}

impl DashboardView {
    pub fn selected_account(&self) -> Option<&Account> {
        let id = self.selected?;
        self.accounts.iter().find(|a| a.id == id)
    }
}

pub struct Dashboard {
    api: Arc<dyn BankApi>,
    navigator: Arc<dyn Navigator>,
    session: Arc<SessionCore>,
    view: Mutex<DashboardView>,
    mounted: AtomicBool,
}

impl Dashboard {
    pub fn new(
        api: Arc<dyn BankApi>,
        navigator: Arc<dyn Navigator>,
        session: Arc<SessionCore>,
    ) -> Self {
        Self {
            api,
            navigator,
            session,
            view: Mutex::new(DashboardView::default()),
            mounted: AtomicBool::new(true),
        }
    }

    pub fn gate(&self, session: &SessionState) -> Gate {
        if session.loading {
            return Gate::Wait;
        }
        match &session.user {
            Some(user) => Gate::Proceed(user.clone()),
            None => {
                info!("No authenticated user, redirecting to {}", Route::Login);
                self.navigator.push(Route::Login);
                Gate::Redirected
            }
        }
    }

    pub fn view(&self) -> DashboardView {
        lock(&self.view).clone()
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Apply `f` to the view unless the dashboard is gone
    fn update(&self, f: impl FnOnce(&mut DashboardView)) {
        if !self.is_mounted() {
            debug!("Dashboard unmounted, dropping update");
            return;
        }
        f(&mut *lock(&self.view));
    }

    /// Hand a 401 to the session. Returns whether it was one.
    fn session_rejected(&self, e: &ApiError) -> bool {
        if !e.is_unauthorized() {
            return false;
        }
        warn!(code = e.code(), "Dashboard request unauthorized: {}", e);
        self.session.invalidate();
        true
    }

    // ============================================================
    // Loading
    // ============================================================

    /// Fetch the user's accounts, select the first one and load its history
    pub async fn load(&self, user: &User) {
        self.update(|v| {
            v.user = Some(user.clone());
            v.loading = true;
            v.error = None;
        });

        match self.api.accounts_by_user(user.id).await {
            Ok(accounts) => {
                info!("Loaded {} accounts for user {}", accounts.len(), user.id);
                let first = accounts.first().map(|a| a.id);
                self.update(|v| {
                    v.accounts = accounts;
                    v.selected = first;
                    v.transactions.clear();
                    v.stale = false;
                });
                if let Some(id) = first {
                    self.fetch_transactions(id).await;
                }
            }
            Err(e) if self.session_rejected(&e) => {}
            Err(e) => {
                error!("Failed to load accounts: {}", e);
                self.update(|v| v.error = Some(LOAD_FAILED.to_string()));
            }
        }

        self.update(|v| v.loading = false);
    }

    pub async fn select_account(&self, id: AccountId) {
        let known = lock(&self.view).accounts.iter().any(|a| a.id == id);
        if !known {
            warn!("Ignoring selection of unknown account {}", id);
            return;
        }
        self.update(|v| {
            v.selected = Some(id);
            v.transactions.clear();
        });
        self.fetch_transactions(id).await;
    }

    async fn fetch_transactions(&self, account_id: AccountId) {
        let result = self.api.transactions_by_account(account_id).await;
        if let Err(e) = &result {
            if self.session_rejected(e) {
                return;
            }
        }
        self.update(|v| {
            if v.selected != Some(account_id) {
                debug!("Selection moved away from {}, dropping transactions", account_id);
                return;
            }
            match result {
                Ok(transactions) => v.transactions = transactions,
                Err(e) => {
                    error!("Failed to load transactions for {}: {}", account_id, e);
                    v.transactions.clear();
                }
            }
        });
    }

    /// One page of the selected account's history (1-based)
    pub fn transactions_page(&self, page: usize, page_size: usize) -> Vec<Transaction> {
        let view = lock(&self.view);
        paginate(&view.transactions, page, page_size).to_vec()
    }

    pub fn transaction_pages(&self, page_size: usize) -> usize {
        page_count(lock(&self.view).transactions.len(), page_size)
    }

    // ============================================================
    // Transfer
    // ============================================================

    pub fn can_transfer(&self) -> bool {
        lock(&self.view).accounts.len() >= MIN_ACCOUNTS_FOR_TRANSFER
    }

    /// Open the transfer form over the current accounts
    ///
    /// `None` when fewer than two accounts are loaded or the dashboard
    /// is unmounted.
    pub fn open_transfer(&self) -> Option<TransferWorkflow> {
        let mut accounts = None;
        self.update(|v| {
            if v.accounts.len() < MIN_ACCOUNTS_FOR_TRANSFER {
                debug!("Transfer needs {} accounts", MIN_ACCOUNTS_FOR_TRANSFER);
                return;
            }
            v.transfer_open = true;
            accounts = Some(v.accounts.clone());
        });
        let workflow = TransferWorkflow::new(self.api.clone(), accounts?);
        Some(workflow.with_session(self.session.clone()))
    }

    pub fn close_transfer(&self) {
        self.update(|v| v.transfer_open = false);
    }

    /// Run the workflow and reconcile on success
    pub async fn submit_transfer(&self, workflow: &TransferWorkflow) -> TransferOutcome {
        let outcome = workflow
            .submit(|| debug!("Transfer completed, refreshing dashboard"))
            .await;
        if outcome.is_completed() {
            self.handle_transfer_complete().await;
        }
        outcome
    }

    /// Close the form and refetch balances and the selected history
    pub async fn handle_transfer_complete(&self) {
        self.update(|v| v.transfer_open = false);
        let (user_id, previous) = {
            let view = lock(&self.view);
            (view.user.as_ref().map(|u| u.id), view.selected)
        };
        let Some(user_id) = user_id else {
            warn!("Transfer completed before the dashboard loaded");
            return;
        };

        match self.api.accounts_by_user(user_id).await {
            Ok(accounts) => {
                let still_there = previous.filter(|id| accounts.iter().any(|a| a.id == *id));
                self.update(|v| {
                    v.accounts = accounts;
                    v.stale = false;
                    v.error = None;
                    v.selected = still_there;
                    // Old history predates the transfer
                    v.transactions.clear();
                });
                match still_there {
                    Some(id) => self.fetch_transactions(id).await,
                    None => info!("Selected account vanished after transfer, selection cleared"),
                }
            }
            Err(e) if self.session_rejected(&e) => {}
            Err(e) => {
                error!("Failed to refresh accounts after transfer: {}", e);
                self.update(|v| {
                    v.error = Some(LOAD_FAILED.to_string());
                    v.stale = true;
                });
            }
        }
    }
}
