//! Login flow
//!
//! Validates the credentials form, exchanges it for a token and hands the
//! token to [`SessionCore::login`]. An invalid form never reaches the network.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use validator::Validate;

use crate::api::BankApi;
use crate::credentials::StoreError;
use crate::models::{LoginRequest, User};
use crate::session::SessionCore;

pub const INVALID_EMAIL: &str = "Invalid email address";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";
pub const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";

#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Per-field messages of a rejected [`LoginForm`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginFieldErrors {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginFieldErrors {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }
}

impl fmt::Display for LoginFieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [("email", &self.email), ("password", &self.password)]
            .into_iter()
            .filter_map(|(name, msg)| msg.as_ref().map(|m| format!("{}: {}", name, m)))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Invalid login form: {0}")]
    Invalid(LoginFieldErrors),

    /// Server or transport rejected the credentials; holds the display message
    #[error("{0}")]
    Rejected(String),

    #[error("Failed to store token: {0}")]
    Store(#[from] StoreError),
}

impl LoginError {
    pub fn code(&self) -> &'static str {
        match self {
            LoginError::Invalid(_) => "LOGIN_INVALID",
            LoginError::Rejected(_) => "LOGIN_REJECTED",
            LoginError::Store(e) => e.code(),
        }
    }
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn check(&self) -> Result<(), LoginFieldErrors> {
        let Err(report) = self.validate() else {
            return Ok(());
        };

        let mut errors = LoginFieldErrors::default();
        for (field, field_errors) in report.field_errors() {
            let message = field_errors
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string());
            match &*field {
                "email" => errors.email = message.or_else(|| Some(INVALID_EMAIL.to_string())),
                "password" => {
                    errors.password = message.or_else(|| Some(PASSWORD_TOO_SHORT.to_string()))
                }
                _ => {}
            }
        }
        Err(errors)
    }
}

pub struct LoginFlow {
    api: Arc<dyn BankApi>,
}

impl LoginFlow {
    pub fn new(api: Arc<dyn BankApi>) -> Self {
        Self { api }
    }

    /// Exchange the credentials for a token and start the session
    ///
    /// Returns the user from the login response. The session's in-memory user
    /// stays as it was until a fresh session core initializes.
    pub async fn submit(&self, form: &LoginForm, session: &SessionCore) -> Result<User, LoginError> {
        form.check().map_err(LoginError::Invalid)?;

        let request = LoginRequest {
            email: form.email.clone(),
            password: form.password.clone(),
        };

        let response = self.api.login(&request).await.map_err(|e| {
            warn!(code = e.code(), "Login failed: {}", e);
            LoginError::Rejected(e.user_message(LOGIN_FAILED))
        })?;

        session.login(&response.token)?;
        info!("Logged in as user {}", response.user.id);
        Ok(response.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::api::mock::MockBankApi;
    use crate::credentials::{CredentialStore, MemoryCredentialStore};
    use crate::models::{LoginResponse, fixtures};
    use crate::navigation::{RecordingNavigator, Route};

    struct Harness {
        api: Arc<MockBankApi>,
        store: Arc<MemoryCredentialStore>,
        navigator: Arc<RecordingNavigator>,
        session: SessionCore,
        flow: LoginFlow,
    }

    fn harness() -> Harness {
        let api = Arc::new(MockBankApi::new());
        let store = Arc::new(MemoryCredentialStore::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let session = SessionCore::new(store.clone(), api.clone(), navigator.clone());
        let flow = LoginFlow::new(api.clone());
        Harness {
            api,
            store,
            navigator,
            session,
            flow,
        }
    }

    #[test]
    fn test_form_rules() {
        assert!(LoginForm::new("john@example.com", "secret").check().is_ok());

        let errors = LoginForm::new("not-an-email", "12345").check().unwrap_err();
        assert_eq!(errors.email.as_deref(), Some(INVALID_EMAIL));
        assert_eq!(errors.password.as_deref(), Some(PASSWORD_TOO_SHORT));

        let errors = LoginForm::new("john@example.com", "12345").check().unwrap_err();
        assert_eq!(errors.email, None);
        assert!(!errors.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_form_skips_network() {
        let h = harness();
        let err = h
            .flow
            .submit(&LoginForm::new("bad", "x"), &h.session)
            .await
            .unwrap_err();

        assert!(matches!(err, LoginError::Invalid(_)));
        assert_eq!(err.code(), "LOGIN_INVALID");
        assert!(h.api.login_requests().is_empty());
        assert!(h.navigator.history().is_empty());
    }

    #[tokio::test]
    async fn test_successful_login_stores_token() {
        let h = harness();
        h.api.set_login_response(LoginResponse {
            token: "T".to_string(),
            user: fixtures::user(),
        });

        let user = h
            .flow
            .submit(&LoginForm::new("john@example.com", "secret"), &h.session)
            .await
            .unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(h.store.get().as_deref(), Some("T"));
        assert_eq!(h.navigator.last(), Some(Route::Dashboard));
        assert_eq!(h.session.user(), None);
        assert_eq!(h.api.login_requests()[0].email, "john@example.com");
    }

    #[tokio::test]
    async fn test_rejected_login_uses_server_message() {
        let h = harness();
        h.api.fail_login(ApiError::from_status(
            401,
            Some("Invalid credentials".to_string()),
        ));

        let err = h
            .flow
            .submit(&LoginForm::new("john@example.com", "secret"), &h.session)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(h.store.get(), None);
        assert!(h.navigator.history().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_login_without_message() {
        let h = harness();
        h.api.fail_login(ApiError::Network("refused".to_string()));

        let err = h
            .flow
            .submit(&LoginForm::new("john@example.com", "secret"), &h.session)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), LOGIN_FAILED);
    }
}
