use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::news::NewsItem;

/// High private-use codepoint that sorts after ordinary text. Appending it
/// to a query string turns "starts with q" into the range `[q, q + U+F8FF)`
/// on a lexicographically ordered index.
pub const PREFIX_SENTINEL: char = '\u{f8ff}';

/// Exclusive upper bound of the prefix range for `q`.
pub fn prefix_upper_bound(q: &str) -> String {
    let mut high = q.to_string();
    high.push(PREFIX_SENTINEL);
    high
}

/// Store-assigned document id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentId(pub String);

/// Result of an append-only create.
#[derive(Debug, Clone)]
pub struct CreatedDocument {
    pub id: DocumentId,
    pub create_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Network failure or a non-2xx status from the store.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The store answered but signalled a failure, or the payload could not
    /// be decoded.
    #[error("store error: {0}")]
    Api(String),
}

/// One delivery from a live listener: the full replacement result set, or
/// the failure that interrupted it.
pub type Snapshot = Result<Vec<NewsItem>, StoreError>;

/// Live prefix-query listener. `recv` yields snapshots until the listener is
/// cancelled; dropping the subscription releases it too.
pub struct Subscription {
    receiver: mpsc::Receiver<Snapshot>,
    abort: AbortHandle,
}

impl Subscription {
    pub fn new(receiver: mpsc::Receiver<Snapshot>, abort: AbortHandle) -> Self {
        Self { receiver, abort }
    }

    /// Next snapshot, or `None` once the listener has stopped.
    pub async fn recv(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }

    /// Stop delivery and release the listener.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

/// Seam over the "News" document collection.
#[async_trait]
pub trait NewsStore: Send + Sync {
    /// Unconditional append; the store assigns the document id.
    async fn add(&self, item: &NewsItem) -> Result<CreatedDocument, StoreError>;

    /// One-shot range query selecting documents whose title lies in
    /// `[q, q + U+F8FF)`.
    async fn query_prefix(&self, q: &str) -> Result<Vec<NewsItem>, StoreError>;

    /// Live listener over the same range. Delivers a full replacement
    /// snapshot on every change until cancelled.
    fn subscribe_prefix(&self, q: &str) -> Subscription;

    /// Reachability probe for the health endpoint.
    async fn health_check(&self) -> bool;
}
