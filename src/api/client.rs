//! reqwest-backed [`BankApi`]
//!
//! Stateless apart from the injected credential store: the token is read per
//! request, so a logout between two calls simply sends the next one
//! unauthenticated and the server answers 401.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::BankApi;
use super::error::ApiError;
use crate::credentials::CredentialStore;
use crate::models::{
    Account, AccountId, LoginRequest, LoginResponse, Transaction, TransferRequest,
    TransferResponse, User, UserId,
};

/// Path prefix every endpoint lives under
pub const API_PREFIX: &str = "/api/v1";

/// `{"message": "..."}` error body
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Append [`API_PREFIX`] unless the URL already ends with it
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.ends_with(API_PREFIX) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, API_PREFIX)
    }
}

#[derive(Clone)]
pub struct HttpBankApi {
    client: Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
}

impl HttpBankApi {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token if one is stored right now
    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.store.get() {
            Some(token) if !token.is_empty() => builder.bearer_auth(token),
            _ => builder,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!("GET {}", path);
        let builder = self.authorized(self.client.get(self.url(path)));
        let body = Self::execute(builder).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send and return the raw body of a successful response
    async fn execute(builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);
        debug!("Request rejected: {} {:?}", status, message);
        Err(ApiError::from_status(status.as_u16(), message))
    }
}

#[async_trait]
impl BankApi for HttpBankApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        debug!("POST /auth/login for {}", request.email);
        // Never authenticated, even if a stale token is stored
        let builder = self.client.post(self.url("/auth/login")).json(request);
        let body = Self::execute(builder).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.get("/users/me").await
    }

    async fn accounts(&self) -> Result<Vec<Account>, ApiError> {
        self.get("/accounts").await
    }

    async fn account(&self, id: AccountId) -> Result<Account, ApiError> {
        self.get(&format!("/accounts/{}", id)).await
    }

    async fn accounts_by_user(&self, user_id: UserId) -> Result<Vec<Account>, ApiError> {
        self.get(&format!("/accounts/user/{}", user_id)).await
    }

    async fn transactions(&self) -> Result<Vec<Transaction>, ApiError> {
        self.get("/transactions").await
    }

    async fn transactions_by_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, ApiError> {
        self.get(&format!("/transactions/account/{}", account_id))
            .await
    }

    async fn transfer(&self, request: &TransferRequest) -> Result<TransferResponse, ApiError> {
        debug!(
            "POST /transactions/transfer {} -> {}",
            request.from_account_id, request.to_account_id
        );
        let builder = self.authorized(
            self.client
                .post(self.url("/transactions/transfer"))
                .json(request),
        );
        let body = Self::execute(builder).await?;
        // Success payload is implementation-defined; anything non-JSON is still success
        Ok(serde_json::from_str(&body).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("http://localhost:8080"),
            "http://localhost:8080/api/v1"
        );
        assert_eq!(
            normalize_base_url("http://localhost:8080/"),
            "http://localhost:8080/api/v1"
        );
        assert_eq!(
            normalize_base_url("https://bank.example/api/v1"),
            "https://bank.example/api/v1"
        );
        assert_eq!(
            normalize_base_url("https://bank.example/api/v1/"),
            "https://bank.example/api/v1"
        );
    }
}
