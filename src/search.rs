use std::sync::Arc;

use dashmap::DashMap;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::debug;

use crate::store::NewsStore;

/// Per-client live-search registry.
///
/// At most one listener per client: activating cancels any previous
/// subscription for that client before establishing the new one, so a
/// re-activated search can never deliver twice.
#[derive(Default)]
pub struct SearchSessions {
    active: DashMap<String, tokio::task::AbortHandle>,
}

impl SearchSessions {
    pub fn new() -> Self {
        Self {
            active: DashMap::new(),
        }
    }

    /// Subscribe `client_uid` to the prefix query `q`, forwarding snapshots
    /// and errors as JSON messages on `out`. Replaces any prior listener.
    pub fn activate(
        &self,
        client_uid: &str,
        store: Arc<dyn NewsStore>,
        q: &str,
        out: mpsc::Sender<serde_json::Value>,
    ) {
        self.deactivate(client_uid);

        let mut subscription = store.subscribe_prefix(q);
        let query = q.to_string();
        let task = tokio::spawn(async move {
            while let Some(snapshot) = subscription.recv().await {
                let message = match snapshot {
                    Ok(items) => json!({
                        "type": "search-results",
                        "q": query,
                        "items": items,
                    }),
                    Err(e) => json!({
                        "type": "search-error",
                        "q": query,
                        "message": e.to_string(),
                    }),
                };
                if out.send(message).await.is_err() {
                    break;
                }
            }
        });

        self.active.insert(client_uid.to_string(), task.abort_handle());
        debug!("Activated search {:?} for client {}", q, client_uid);
    }

    /// Cancel the client's listener, if any. Aborting the forwarding task
    /// drops the subscription, which releases the store-side listener.
    pub fn deactivate(&self, client_uid: &str) {
        if let Some((_, handle)) = self.active.remove(client_uid) {
            handle.abort();
            debug!("Deactivated search for client {}", client_uid);
        }
    }

    pub fn is_active(&self, client_uid: &str) -> bool {
        self.active.contains_key(client_uid)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::NewsItem;
    use crate::store::MemoryStore;
    use std::time::Duration;
    use tokio::time::timeout;

    fn item(title: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            content: String::new(),
            author: "Ada".to_string(),
            date: "2024-05-01".to_string(),
        }
    }

    #[tokio::test]
    async fn snapshots_are_forwarded_as_messages() {
        let sessions = SearchSessions::new();
        let store = Arc::new(MemoryStore::new());
        let (tx, mut rx) = mpsc::channel(32);

        sessions.activate("c1", store.clone(), "Alph", tx);
        let initial = rx.recv().await.unwrap();
        assert_eq!(initial["type"], "search-results");
        assert_eq!(initial["items"].as_array().unwrap().len(), 0);

        store.add(&item("Alpha")).await.unwrap();
        let update = rx.recv().await.unwrap();
        assert_eq!(update["items"][0]["newsTitle"], "Alpha");
    }

    #[tokio::test]
    async fn reactivation_leaves_exactly_one_listener() {
        let sessions = SearchSessions::new();
        let store = Arc::new(MemoryStore::new());
        let (tx, mut rx) = mpsc::channel(32);

        sessions.activate("c1", store.clone(), "Alph", tx.clone());
        sessions.activate("c1", store.clone(), "Alph", tx.clone());
        assert_eq!(sessions.active_count(), 1);

        // Drain whatever initial (empty) snapshots made it out.
        while let Ok(Some(msg)) = timeout(Duration::from_millis(200), rx.recv()).await {
            assert_eq!(msg["items"].as_array().unwrap().len(), 0);
        }

        // One change must produce exactly one delivery.
        store.add(&item("Alpha")).await.unwrap();
        let first = rx.recv().await.unwrap();
        assert_eq!(first["items"].as_array().unwrap().len(), 1);
        let extra = timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(extra.is_err(), "duplicate delivery from a stale listener");
    }

    #[tokio::test]
    async fn deactivate_stops_delivery() {
        let sessions = SearchSessions::new();
        let store = Arc::new(MemoryStore::new());
        let (tx, mut rx) = mpsc::channel(32);

        sessions.activate("c1", store.clone(), "", tx);
        let _ = rx.recv().await.unwrap();

        sessions.deactivate("c1");
        assert!(!sessions.is_active("c1"));

        store.add(&item("Alpha")).await.unwrap();
        let extra = timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(matches!(extra, Err(_) | Ok(None)));
    }
}
