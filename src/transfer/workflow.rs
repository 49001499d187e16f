//! Transfer submission workflow
//!
//! Owns the draft, validates it, dispatches at most one transfer at a time
//! and reports the result. Reconciling balances afterwards belongs to the
//! caller (see [`crate::dashboard::Dashboard::handle_transfer_complete`]).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::error::{FieldErrors, TRANSFER_FAILED};
use super::form::TransferDraft;
use crate::api::BankApi;
use crate::models::{Account, AccountId};
use crate::session::SessionCore;

pub const SUBMIT_LABEL: &str = "Transfer Money";
pub const SUBMITTING_LABEL: &str = "Processing...";

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Result of one [`TransferWorkflow::submit`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Draft rejected locally; nothing was sent
    Invalid(FieldErrors),
    /// Another submission is still outstanding; nothing was sent
    Busy,
    /// Server accepted the transfer and the callback ran
    Completed,
    /// Server or transport rejected the transfer
    Failed(String),
}

impl TransferOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferOutcome::Invalid(_) => "INVALID",
            TransferOutcome::Busy => "BUSY",
            TransferOutcome::Completed => "COMPLETED",
            TransferOutcome::Failed(_) => "FAILED",
        }
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        matches!(self, TransferOutcome::Completed)
    }
}

/// Clears the in-flight flag on every exit path
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct TransferWorkflow {
    api: Arc<dyn BankApi>,
    accounts: Vec<Account>,
    draft: Mutex<TransferDraft>,
    field_errors: Mutex<FieldErrors>,
    error: Mutex<Option<String>>,
    in_flight: AtomicBool,
    /// Told when the server rejects the bearer token
    session: Option<Arc<SessionCore>>,
}

impl TransferWorkflow {
    pub fn new(api: Arc<dyn BankApi>, accounts: Vec<Account>) -> Self {
        let draft = TransferDraft::for_accounts(&accounts);
        Self {
            api,
            accounts,
            draft: Mutex::new(draft),
            field_errors: Mutex::new(FieldErrors::new()),
            error: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            session: None,
        }
    }

    /// End `session` when a submission comes back 401
    pub fn with_session(mut self, session: Arc<SessionCore>) -> Self {
        self.session = Some(session);
        self
    }

    // ============================================================
    // Draft editing
    // ============================================================

    pub fn select_source(&self, id: AccountId) {
        lock(&self.draft).from_account_id = id;
    }

    pub fn select_destination(&self, id: AccountId) {
        lock(&self.draft).to_account_id = id;
    }

    pub fn set_amount(&self, amount: Decimal) {
        lock(&self.draft).amount = amount;
    }

    pub fn set_description(&self, description: impl Into<String>) {
        lock(&self.draft).description = description.into();
    }

    pub fn draft(&self) -> TransferDraft {
        lock(&self.draft).clone()
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    // ============================================================
    // Derived view
    // ============================================================

    pub fn selected_source(&self) -> Option<&Account> {
        let id = lock(&self.draft).from_account_id;
        self.accounts.iter().find(|a| a.id == id)
    }

    /// Balance of the current source account, 0 when none is selected.
    /// Informational only; the server enforces funds.
    pub fn max_amount(&self) -> Decimal {
        self.selected_source()
            .map_or(Decimal::ZERO, |account| account.balance)
    }

    pub fn field_errors(&self) -> FieldErrors {
        lock(&self.field_errors).clone()
    }

    pub fn error(&self) -> Option<String> {
        lock(&self.error).clone()
    }

    #[inline]
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    #[inline]
    pub fn controls_enabled(&self) -> bool {
        !self.is_submitting()
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_submitting() {
            SUBMITTING_LABEL
        } else {
            SUBMIT_LABEL
        }
    }

    // ============================================================
    // Submission
    // ============================================================

    /// Validate and dispatch the draft. `on_success` runs exactly once,
    /// and only when the server accepts the transfer.
    pub async fn submit<F>(&self, on_success: F) -> TransferOutcome
    where
        F: FnOnce(),
    {
        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            debug!("Transfer already in flight, ignoring submit");
            return TransferOutcome::Busy;
        };

        let draft = self.draft();
        let request = match draft.validate_for(&self.accounts) {
            Ok(request) => request,
            Err(errors) => {
                debug!(errors = %errors, "Transfer draft rejected");
                *lock(&self.field_errors) = errors.clone();
                return TransferOutcome::Invalid(errors);
            }
        };

        *lock(&self.field_errors) = FieldErrors::new();
        *lock(&self.error) = None;

        info!(
            from = request.from_account_id,
            to = request.to_account_id,
            amount = %request.amount,
            "Submitting transfer"
        );

        match self.api.transfer(&request).await {
            Ok(response) => {
                info!(
                    reply = response.message.as_deref().unwrap_or_default(),
                    "Transfer accepted"
                );
                on_success();
                TransferOutcome::Completed
            }
            Err(e) => {
                warn!(code = e.code(), "Transfer failed: {}", e);
                let message = e.user_message(TRANSFER_FAILED);
                *lock(&self.error) = Some(message.clone());
                if e.is_unauthorized() {
                    if let Some(session) = &self.session {
                        session.invalidate();
                    }
                }
                TransferOutcome::Failed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::api::mock::MockBankApi;
    use crate::credentials::{CredentialStore, MemoryCredentialStore};
    use crate::models::fixtures;
    use crate::navigation::{RecordingNavigator, Route};
    use crate::transfer::error::{AMOUNT_TOO_SMALL, TransferField};
    use std::sync::atomic::AtomicUsize;

    fn setup() -> (Arc<MockBankApi>, TransferWorkflow) {
        let accounts = vec![fixtures::account(1, 1000), fixtures::account(2, 5000)];
        let api = Arc::new(MockBankApi::new());
        api.set_accounts(accounts.clone());
        let workflow = TransferWorkflow::new(api.clone(), accounts);
        (api, workflow)
    }

    fn fill(workflow: &TransferWorkflow) {
        workflow.set_amount(Decimal::from(100));
        workflow.set_description("Test transfer");
    }

    #[tokio::test]
    async fn test_successful_transfer() {
        let (api, workflow) = setup();
        fill(&workflow);

        let calls = AtomicUsize::new(0);
        let outcome = workflow
            .submit(|| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        assert_eq!(outcome, TransferOutcome::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let sent = api.transfer_requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from_account_id, 1);
        assert_eq!(sent[0].to_account_id, 2);
        assert_eq!(sent[0].amount, Decimal::from(100));
        assert_eq!(sent[0].description, "Test transfer");

        assert!(!workflow.is_submitting());
        assert_eq!(workflow.submit_label(), SUBMIT_LABEL);
        assert_eq!(workflow.error(), None);
    }

    #[tokio::test]
    async fn test_invalid_draft_never_dispatches() {
        let (api, workflow) = setup();
        workflow.set_description("Test transfer");

        let outcome = workflow.submit(|| panic!("callback must not run")).await;
        match outcome {
            TransferOutcome::Invalid(errors) => {
                assert_eq!(errors.get(TransferField::Amount), Some(AMOUNT_TOO_SMALL));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(api.transfer_requests().is_empty());
        assert!(workflow.field_errors().contains(TransferField::Amount));
        assert!(!workflow.is_submitting());
    }

    #[tokio::test]
    async fn test_minimum_amount_is_sent() {
        let (api, workflow) = setup();
        workflow.set_amount(Decimal::new(1, 2));
        workflow.set_description("abc");

        assert_eq!(workflow.submit(|| {}).await, TransferOutcome::Completed);
        assert_eq!(api.transfer_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_server_message_is_surfaced() {
        let (api, workflow) = setup();
        fill(&workflow);
        api.fail_transfer(Some(ApiError::from_status(
            400,
            Some("Insufficient funds".to_string()),
        )));

        let outcome = workflow.submit(|| panic!("callback must not run")).await;
        assert_eq!(
            outcome,
            TransferOutcome::Failed("Insufficient funds".to_string())
        );
        assert_eq!(workflow.error().as_deref(), Some("Insufficient funds"));
        assert!(workflow.controls_enabled());
    }

    #[tokio::test]
    async fn test_unauthorized_transfer_ends_session() {
        let (api, workflow) = setup();
        let store = Arc::new(MemoryCredentialStore::with_token("t"));
        let nav = Arc::new(RecordingNavigator::new());
        let session = Arc::new(SessionCore::new(store.clone(), api.clone(), nav.clone()));
        let workflow = workflow.with_session(session);
        fill(&workflow);
        api.fail_transfer(Some(ApiError::from_status(401, None)));

        let outcome = workflow.submit(|| panic!("callback must not run")).await;
        assert!(matches!(outcome, TransferOutcome::Failed(_)));
        assert_eq!(store.get(), None);
        assert_eq!(nav.last(), Some(Route::Login));
    }

    #[tokio::test]
    async fn test_unstructured_failure_uses_fallback() {
        let (api, workflow) = setup();
        fill(&workflow);
        api.fail_transfer(Some(ApiError::Network("connection reset".to_string())));

        let outcome = workflow.submit(|| {}).await;
        assert_eq!(outcome, TransferOutcome::Failed(TRANSFER_FAILED.to_string()));
    }

    #[tokio::test]
    async fn test_next_submit_clears_previous_error() {
        let (api, workflow) = setup();
        fill(&workflow);
        api.fail_transfer(Some(ApiError::from_status(500, None)));
        workflow.submit(|| {}).await;
        assert!(workflow.error().is_some());

        api.fail_transfer(None);
        assert!(workflow.submit(|| {}).await.is_completed());
        assert_eq!(workflow.error(), None);
    }

    #[test]
    fn test_max_amount_follows_source() {
        let (_api, workflow) = setup();
        assert_eq!(workflow.max_amount(), Decimal::from(1000));

        workflow.select_source(2);
        assert_eq!(workflow.max_amount(), Decimal::from(5000));

        workflow.select_source(42);
        assert_eq!(workflow.max_amount(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_amount_above_balance_is_still_sent() {
        let (api, workflow) = setup();
        workflow.set_amount(Decimal::from(2000));
        workflow.set_description("Too much");

        workflow.submit(|| {}).await;
        assert_eq!(api.transfer_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_submit_is_busy() {
        let (api, workflow) = setup();
        fill(&workflow);
        let gate = api.hold_transfer();
        let workflow = Arc::new(workflow);

        let first = {
            let workflow = workflow.clone();
            tokio::spawn(async move { workflow.submit(|| {}).await })
        };
        while !workflow.is_submitting() {
            tokio::task::yield_now().await;
        }

        assert!(!workflow.controls_enabled());
        assert_eq!(workflow.submit_label(), SUBMITTING_LABEL);
        assert_eq!(workflow.submit(|| {}).await, TransferOutcome::Busy);

        gate.notify_one();
        assert_eq!(first.await.unwrap(), TransferOutcome::Completed);
        assert_eq!(api.transfer_requests().len(), 1);
        assert!(workflow.controls_enabled());
    }

    #[test]
    fn test_outcome_as_str() {
        assert_eq!(TransferOutcome::Busy.as_str(), "BUSY");
        assert_eq!(
            TransferOutcome::Failed(String::new()).as_str(),
            "FAILED"
        );
    }
}
