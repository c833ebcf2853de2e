//! Things Cloud history transport over HTTPS.
//!
//! Three endpoints under `{api_base}/history/{key}`: the history head, pages
//! of items, and commits. Nothing is retried here.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use things_sync_core::{
    CommitAck, CommitRequest, HistoryBatch, HistoryPage, HistoryTransport, TransportError,
};
use tracing::debug;

/// Wire schema version sent with every request.
const SCHEMA_VERSION: &str = "301";

#[derive(Debug, Deserialize)]
struct HistoryInfo {
    #[serde(rename = "latest-server-index")]
    latest_server_index: u64,
}

/// HTTP implementation of [`HistoryTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    history_url: String,
}

impl HttpTransport {
    pub fn new(
        api_base: &str,
        history_key: &str,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=UTF-8"),
        );
        headers.insert(
            HeaderName::from_static("schema"),
            HeaderValue::from_static(SCHEMA_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("things-sync/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            client,
            history_url: Self::build_history_url(api_base, history_key),
        })
    }

    fn build_history_url(api_base: &str, history_key: &str) -> String {
        format!("{}/history/{}", api_base.trim_end_matches('/'), history_key)
    }

    pub fn history_url(&self) -> &str {
        &self.history_url
    }

    fn items_url(&self, start_index: u64) -> String {
        format!("{}/items?start-index={}", self.history_url, start_index)
    }

    fn commit_url(&self, ancestor: u64, count: usize) -> String {
        format!(
            "{}/commit?ancestor-index={}&_cnt={}",
            self.history_url, ancestor, count
        )
    }

    async fn read_json<R: DeserializeOwned>(response: Response) -> Result<R, TransportError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        debug!(%status, body = %body, "response");

        if status == StatusCode::CONFLICT {
            return Err(TransportError::Rejected(body));
        }
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn get<R: DeserializeOwned>(&self, url: &str) -> Result<R, TransportError> {
        debug!(method = "GET", url, "request");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::read_json(response).await
    }
}

impl HistoryTransport for HttpTransport {
    async fn head_index(&mut self) -> Result<u64, TransportError> {
        let info: HistoryInfo = self.get(&self.history_url).await?;
        Ok(info.latest_server_index)
    }

    async fn fetch_history(&mut self, since: u64) -> Result<HistoryBatch, TransportError> {
        let page: HistoryPage = self.get(&self.items_url(since)).await?;
        Ok(HistoryBatch::from_page(since, page))
    }

    async fn send_commit(&mut self, request: &CommitRequest) -> Result<CommitAck, TransportError> {
        let url = self.commit_url(request.ancestor, request.items.len());
        let body = request.body();
        debug!(method = "POST", url = %url, body = %body, "request");
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::read_json(response).await
    }
}
