use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

use super::interface::{
    prefix_upper_bound, CreatedDocument, DocumentId, NewsStore, StoreError, Subscription,
};
use crate::news::NewsItem;

/// In-process implementation of [`NewsStore`], used by dev mode and tests.
/// Subscriptions are push-driven off a broadcast change signal instead of
/// polling.
#[derive(Clone)]
pub struct MemoryStore {
    documents: Arc<RwLock<Vec<NewsItem>>>,
    changed: broadcast::Sender<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changed, _) = broadcast::channel(16);
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
            changed,
        }
    }

    async fn matching(&self, q: &str) -> Vec<NewsItem> {
        let high = prefix_upper_bound(q);
        self.documents
            .read()
            .await
            .iter()
            .filter(|item| item.title.as_str() >= q && item.title.as_str() < high.as_str())
            .cloned()
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NewsStore for MemoryStore {
    async fn add(&self, item: &NewsItem) -> Result<CreatedDocument, StoreError> {
        self.documents.write().await.push(item.clone());
        let _ = self.changed.send(());
        Ok(CreatedDocument {
            id: DocumentId(Uuid::new_v4().as_simple().to_string()),
            create_time: Some(Utc::now()),
        })
    }

    async fn query_prefix(&self, q: &str) -> Result<Vec<NewsItem>, StoreError> {
        Ok(self.matching(q).await)
    }

    fn subscribe_prefix(&self, q: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(16);
        let store = self.clone();
        let q = q.to_string();
        let mut changed = self.changed.subscribe();

        let task = tokio::spawn(async move {
            let mut last = store.matching(&q).await;
            if tx.send(Ok(last.clone())).await.is_err() {
                return;
            }
            loop {
                match changed.recv().await {
                    // A lagged receiver still wants the latest snapshot.
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
                let current = store.matching(&q).await;
                if current != last {
                    if tx.send(Ok(current.clone())).await.is_err() {
                        break;
                    }
                    last = current;
                }
            }
        });

        Subscription::new(rx, task.abort_handle())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            content: format!("{} content", title),
            author: "Ada".to_string(),
            date: "2024-05-01".to_string(),
        }
    }

    #[tokio::test]
    async fn prefix_query_selects_the_half_open_range() {
        let store = MemoryStore::new();
        for title in ["Alpha", "Alphabet", "Beta"] {
            store.add(&item(title)).await.unwrap();
        }

        let mut titles: Vec<String> = store
            .query_prefix("Alph")
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.title)
            .collect();
        titles.sort();
        assert_eq!(titles, ["Alpha", "Alphabet"]);
    }

    #[tokio::test]
    async fn query_is_case_sensitive_lexicographic() {
        let store = MemoryStore::new();
        store.add(&item("alpha")).await.unwrap();
        store.add(&item("Alpha")).await.unwrap();

        let items = store.query_prefix("Alph").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Alpha");
    }

    #[tokio::test]
    async fn subscription_delivers_initial_and_changed_snapshots() {
        let store = MemoryStore::new();
        store.add(&item("Alpha")).await.unwrap();

        let mut sub = store.subscribe_prefix("Alph");
        let first = sub.recv().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);

        store.add(&item("Alphabet")).await.unwrap();
        let second = sub.recv().await.unwrap().unwrap();
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn out_of_range_writes_do_not_redeliver() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe_prefix("Alph");
        let first = sub.recv().await.unwrap().unwrap();
        assert!(first.is_empty());

        // "Beta" falls outside [Alph, Alph+U+F8FF); the snapshot is unchanged
        // so nothing further is delivered.
        store.add(&item("Beta")).await.unwrap();
        store.add(&item("Alpha")).await.unwrap();
        let next = sub.recv().await.unwrap().unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].title, "Alpha");
    }

    #[tokio::test]
    async fn cancel_stops_delivery() {
        let store = MemoryStore::new();
        let sub = store.subscribe_prefix("");
        sub.cancel();
        store.add(&item("Alpha")).await.unwrap();
        // The listener task is gone; nothing to assert beyond not hanging.
    }
}
