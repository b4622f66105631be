//! Ledger REST API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, RequestBuilder};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::dto::{SnapshotsResponse, TransferRequestDto, TransferResponse};
use super::settings::{LedgerConfig, LEDGER_TOKEN_ENV};
use crate::domain::{Transfer, TxId};
use crate::error::{LedgerError, Result};
use crate::port::{LedgerClient, RefundRequest};

/// HTTP client for the ledger's snapshot and transfer endpoints.
pub struct HttpLedgerClient {
    http: HttpClient,
    base_url: String,
    token: Option<String>,
    fetch_limit: usize,
    retry_max_attempts: u32,
    retry_backoff_ms: u64,
}

impl HttpLedgerClient {
    /// Build a client from configuration; the bearer token is read from
    /// the environment.
    #[must_use]
    pub fn from_config(config: &LedgerConfig) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_millis(config.http.timeout_ms))
            .connect_timeout(Duration::from_millis(config.http.connect_timeout_ms))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        let token = std::env::var(LEDGER_TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty());
        if token.is_none() {
            warn!(env = LEDGER_TOKEN_ENV, "No ledger token set; requests are unauthenticated");
        }

        Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token,
            fetch_limit: config.fetch_limit,
            retry_max_attempts: config.http.retry_max_attempts,
            retry_backoff_ms: config.http.retry_backoff_ms,
        }
    }

    fn snapshots_url(&self) -> String {
        format!("{}/snapshots?limit={}", self.base_url, self.fetch_limit)
    }

    fn transfers_url(&self) -> String {
        format!("{}/transfers", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send the request built by `build`, retrying timeouts and connect
    /// failures. Refund posts are safe to retry: the ledger deduplicates on
    /// their idempotency key.
    async fn send_with_retry<T, F>(&self, build: F) -> std::result::Result<T, reqwest::Error>
    where
        T: serde::de::DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        let max_attempts = self.retry_max_attempts.max(1);

        loop {
            attempt += 1;
            let response = match self.authorize(build()).send().await {
                Ok(response) => response,
                Err(err) => {
                    if attempt >= max_attempts || !Self::should_retry(&err) {
                        return Err(err);
                    }
                    self.backoff(attempt, max_attempts, &err).await;
                    continue;
                }
            };

            let response = response.error_for_status()?;

            match response.json::<T>().await {
                Ok(parsed) => return Ok(parsed),
                Err(err) => {
                    if attempt >= max_attempts || !Self::should_retry(&err) {
                        return Err(err);
                    }
                    self.backoff(attempt, max_attempts, &err).await;
                }
            }
        }
    }

    fn should_retry(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }

    async fn backoff(&self, attempt: u32, max_attempts: u32, err: &reqwest::Error) {
        warn!(
            attempt,
            max_attempts,
            error = %err,
            "Ledger request failed, retrying"
        );
        if self.retry_backoff_ms > 0 {
            sleep(Duration::from_millis(self.retry_backoff_ms)).await;
        }
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn fetch_incoming_transfers(&self) -> Result<Vec<Transfer>> {
        let url = self.snapshots_url();
        debug!(url = %url, "Fetching snapshots");

        let page: SnapshotsResponse = self
            .send_with_retry(|| self.http.get(&url))
            .await
            .map_err(|e| LedgerError::Fetch(e.to_string()))?;

        let fetched = page.data.len();
        let transfers = page.into_transfers();
        debug!(fetched, parsed = transfers.len(), "Fetched snapshots");
        Ok(transfers)
    }

    async fn refund(&self, request: &RefundRequest) -> Result<TxId> {
        let url = self.transfers_url();
        let body = TransferRequestDto::from(request);

        let response: TransferResponse = self
            .send_with_retry(|| self.http.post(&url).json(&body))
            .await
            .map_err(|e| LedgerError::Refund(e.to_string()))?;

        info!(
            recipient = %request.recipient_id,
            asset_id = %request.asset_id,
            amount = %request.amount,
            snapshot_id = %response.data.snapshot_id,
            "Refund transfer accepted"
        );
        Ok(TxId::from(response.data.snapshot_id))
    }
}
