//! The boundary to the remote history service.
//!
//! The core never talks to the network itself: a [`HistoryTransport`] fetches
//! pages and posts commits, and the session decides what to do with them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TransportError;
use crate::history::{HistoryItem, HistoryPage};

/// Operations fetched starting at some offset.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBatch {
    /// In log order. The first item sits at the requested offset.
    pub operations: Vec<HistoryItem>,
    /// Where the next fetch should start.
    pub next_offset: u64,
    /// Head of the log when this batch was served.
    pub end_of_log: u64,
}

impl HistoryBatch {
    /// Interprets a page fetched with `start-index = since`.
    pub fn from_page(since: u64, page: HistoryPage) -> Self {
        let next_offset = since + page.items.len() as u64;
        Self {
            operations: page.items,
            next_offset,
            end_of_log: page.current_item_index,
        }
    }
}

/// A write claiming `ancestor` as its base.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRequest {
    pub ancestor: u64,
    pub items: Vec<HistoryItem>,
}

impl CommitRequest {
    pub fn new(ancestor: u64, item: HistoryItem) -> Self {
        Self {
            ancestor,
            items: vec![item],
        }
    }

    /// Request body: one key per entity id.
    pub fn body(&self) -> Value {
        let map: Map<String, Value> = self.items.iter().map(HistoryItem::to_wire).collect();
        Value::Object(map)
    }
}

/// Server acknowledgment of a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAck {
    #[serde(rename = "server-head-index")]
    pub server_head_index: u64,
}

/// Access to one account's history log.
///
/// Implementations do no retrying. A commit whose ancestor is stale must fail
/// with [`TransportError::Rejected`].
#[allow(async_fn_in_trait)]
pub trait HistoryTransport {
    /// Current head of the log, read once at session start.
    async fn head_index(&mut self) -> Result<u64, TransportError>;

    /// Operations at offsets `since` and later, possibly only the first page.
    async fn fetch_history(&mut self, since: u64) -> Result<HistoryBatch, TransportError>;

    async fn send_commit(&mut self, request: &CommitRequest) -> Result<CommitAck, TransportError>;
}
