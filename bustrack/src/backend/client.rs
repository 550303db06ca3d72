//! HTTP client for the backend.
//!
//! [`BackendClient`] implements [`LocationStore`], [`AttendanceSink`] and
//! [`NotificationSink`] against the endpoints served by
//! [`super::BackendServer`]. It uses a single reusable `reqwest::Client`.

use std::time::Duration;

use reqwest::StatusCode;

use super::wire::{BusUpdate, MessageBody};
use crate::attendance::{AttendanceRecord, AttendanceSink, Notification, NotificationSink, SinkError};
use crate::journey::JourneyState;
use crate::store::{BusId, BusSnapshot, LocationStore, StoreError};

/// Default HTTP timeout for backend requests.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the backend HTTP API.
#[derive(Debug, Clone)]
pub struct BackendClient {
    /// Base URL without trailing slash, e.g. `http://127.0.0.1:3000`.
    base_url: String,

    /// Reusable HTTP client with connection pooling.
    http: reqwest::Client,

    timeout: Duration,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn store_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::timeout(self.timeout)
        } else if e.is_decode() {
            StoreError::Decode(e.to_string())
        } else {
            StoreError::Transport(e.to_string())
        }
    }

    /// Whether the backend answers its health check.
    pub async fn health(&self) -> Result<(), StoreError> {
        let response = self
            .http
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| self.store_error(e))?;
        expect_success(response).await.map(|_| ())
    }

    async fn post_log<T: serde::Serialize>(&self, path: &str, body: &T) -> Result<(), SinkError> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        match expect_success(response).await {
            Ok(_) => Ok(()),
            Err(StoreError::Status { code, message }) => Err(SinkError::Status { code, message }),
            Err(e) => Err(SinkError::Transport(e.to_string())),
        }
    }
}

/// Turn a non-2xx response into `StoreError::Status`, preferring the body's
/// `message` field.
async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<MessageBody>(&text)
        .map(|body| body.message)
        .unwrap_or(text);

    Err(StoreError::Status {
        code: status.as_u16(),
        message,
    })
}

impl LocationStore for BackendClient {
    async fn upsert(&self, bus: &BusId, state: &JourneyState) -> Result<(), StoreError> {
        let body = BusUpdate {
            bus_number: Some(bus.to_string()),
            state: Some(state.clone()),
        };
        let response = self
            .http
            .post(self.url("/bus/update"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.store_error(e))?;

        expect_success(response).await?;
        Ok(())
    }

    async fn get(&self, bus: &BusId) -> Result<Option<JourneyState>, StoreError> {
        let response = self
            .http
            .get(self.url("/bus/status"))
            .query(&[("busNumber", bus.as_str())])
            .send()
            .await
            .map_err(|e| self.store_error(e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = expect_success(response).await?;
        let state = response
            .json::<JourneyState>()
            .await
            .map_err(|e| self.store_error(e))?;
        Ok(Some(state))
    }

    async fn fleet(&self) -> Result<Vec<BusSnapshot>, StoreError> {
        let response = self
            .http
            .get(self.url("/buses"))
            .send()
            .await
            .map_err(|e| self.store_error(e))?;

        let response = expect_success(response).await?;
        response
            .json::<Vec<BusSnapshot>>()
            .await
            .map_err(|e| self.store_error(e))
    }
}

impl AttendanceSink for BackendClient {
    async fn append(&self, record: &AttendanceRecord) -> Result<(), SinkError> {
        self.post_log("/attendance", record).await
    }
}

impl NotificationSink for BackendClient {
    async fn enqueue(&self, notification: &Notification) -> Result<(), SinkError> {
        self.post_log("/notification", notification).await
    }
}
