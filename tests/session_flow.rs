//! Login -> entry routing -> session resolution -> logout, end to end on the
//! scripted API and a real token file.

use std::sync::Arc;

use bank_dashboard::api::{ApiError, MockBankApi};
use bank_dashboard::credentials::{CredentialStore, FileCredentialStore, is_authenticated};
use bank_dashboard::login::{LoginFlow, LoginForm};
use bank_dashboard::models::{LoginResponse, User};
use bank_dashboard::navigation::{RecordingNavigator, Route, entry_route};
use bank_dashboard::session::{SessionCore, SessionPhase, SessionState};

fn user() -> User {
    User {
        id: 3,
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        created_at: String::new(),
        updated_at: String::new(),
    }
}

#[tokio::test]
async fn test_login_then_fresh_session_resolves_user() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileCredentialStore::new(dir.path().join("auth/token.json")));
    let api = Arc::new(MockBankApi::new());
    api.set_login_response(LoginResponse {
        token: "abc".to_string(),
        user: user(),
    });
    api.set_current_user(user());

    // Entry page before login
    assert_eq!(entry_route(Some(&*store as &dyn CredentialStore)), Route::Login);

    let nav = Arc::new(RecordingNavigator::new());
    let session = SessionCore::new(store.clone(), api.clone(), nav.clone());
    session.initialize().await;
    assert_eq!(session.phase(), SessionPhase::ResolvedAnon);

    LoginFlow::new(api.clone())
        .submit(&LoginForm::new("ada@example.com", "hunter22"), &session)
        .await
        .unwrap();

    // Token persisted, user not populated by login itself
    assert_eq!(store.get().as_deref(), Some("abc"));
    assert_eq!(nav.last(), Some(Route::Dashboard));
    assert_eq!(session.user(), None);
    assert_eq!(entry_route(Some(&*store as &dyn CredentialStore)), Route::Dashboard);

    // A new process picks the token up from disk
    let reopened = Arc::new(FileCredentialStore::new(store.path()));
    let next = SessionCore::new(reopened, api.clone(), Arc::new(RecordingNavigator::new()));
    next.initialize().await;
    assert_eq!(next.state(), SessionState::authenticated(user()));

    next.logout();
    assert_eq!(next.user(), None);
    assert!(!is_authenticated(Some(&*store as &dyn CredentialStore)));
    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_expired_token_is_removed_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileCredentialStore::new(dir.path().join("token.json")));
    store.set("expired").unwrap();

    let api = Arc::new(MockBankApi::new());
    api.fail_current_user(ApiError::from_status(401, Some("Token expired".to_string())));

    let session = SessionCore::new(store.clone(), api.clone(), Arc::new(RecordingNavigator::new()));
    let mut updates = session.subscribe();
    session.initialize().await;

    assert!(updates.has_changed().unwrap());
    assert_eq!(*updates.borrow_and_update(), SessionState::anonymous());
    assert_eq!(store.get(), None);
    assert_eq!(api.current_user_count(), 1);
}

#[tokio::test]
async fn test_no_storage_context_is_anonymous() {
    assert!(!is_authenticated(None));
    assert_eq!(entry_route(None), Route::Login);
}
