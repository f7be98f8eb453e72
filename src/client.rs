//! HTTP access to the balance-checker backend.

use std::future::Future;

use serde::Deserialize;

use crate::error::ApiError;
use crate::model::{AddressRecord, BalanceSnapshot, ChainSummary, GlobalStats, TokenSummary};

/// The backend surface the poller and the TUI depend on. Kept as a trait so
/// tests can script responses without a server.
pub trait BalanceApi: Send + Sync {
    fn fetch_balance(&self) -> impl Future<Output = Result<BalanceSnapshot, ApiError>> + Send;
    fn fetch_addresses(&self) -> impl Future<Output = Result<Vec<AddressRecord>, ApiError>> + Send;
    fn stop_server(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Wire shape of `/api/balance` before validation. `globalStats` may be
/// absent in a malformed payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResponse {
    global_stats: Option<GlobalStats>,
    #[serde(default)]
    top_tokens: Vec<TokenSummary>,
    #[serde(default)]
    chains: Vec<ChainSummary>,
}

#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        HttpApi {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        Ok(response.json().await?)
    }
}

impl BalanceApi for HttpApi {
    async fn fetch_balance(&self) -> Result<BalanceSnapshot, ApiError> {
        let raw: BalanceResponse = self.get_json("/api/balance").await?;
        let global_stats = raw
            .global_stats
            .ok_or(ApiError::MalformedPayload("globalStats"))?;
        Ok(BalanceSnapshot {
            global_stats,
            top_tokens: raw.top_tokens,
            chains: raw.chains,
        })
    }

    async fn fetch_addresses(&self) -> Result<Vec<AddressRecord>, ApiError> {
        self.get_json("/api/addresses").await
    }

    /// Best-effort shutdown signal; callers surface the outcome once and
    /// never retry.
    async fn stop_server(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .post(format!("{}/api/stop", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        Ok(())
    }
}
