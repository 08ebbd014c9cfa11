use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::interface::{
    prefix_upper_bound, CreatedDocument, DocumentId, NewsStore, StoreError, Subscription,
};
use crate::news::NewsItem;

/// Client for the Firestore REST surface.
///
/// Creates go through `POST {parent}/{collection}`, range queries through
/// `POST {parent}:runQuery` with a structured query. The REST surface has no
/// listen channel, so live subscriptions poll the query and deliver a
/// snapshot whenever the result set changes.
#[derive(Clone)]
pub struct FirestoreClient {
    client: Client,
    base_url: String,
    parent: String,
    collection: String,
    api_key: String,
    poll_interval: Duration,
}

impl FirestoreClient {
    pub fn new(
        base_url: String,
        project_id: &str,
        database_id: &str,
        collection: String,
        api_key: String,
        poll_interval: Duration,
    ) -> Self {
        let parent = format!("projects/{}/databases/{}/documents", project_id, database_id);
        Self {
            client: Client::new(),
            base_url,
            parent,
            collection,
            api_key,
            poll_interval,
        }
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, StoreError> {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        classify_response(status, &text)
    }
}

#[async_trait]
impl NewsStore for FirestoreClient {
    async fn add(&self, item: &NewsItem) -> Result<CreatedDocument, StoreError> {
        let url = format!("{}/{}/{}", self.base_url, self.parent, self.collection);
        let body = json!({ "fields": encode_fields(item) });
        let created = self.post_json(&url, &body).await?;

        let id = created
            .get("name")
            .and_then(|n| n.as_str())
            .and_then(|n| n.rsplit('/').next())
            .map(|s| DocumentId(s.to_string()))
            .ok_or_else(|| StoreError::Api("create response missing document name".to_string()))?;

        let create_time = created
            .get("createTime")
            .and_then(|t| t.as_str())
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc));

        debug!("Created document {} in {}", id.0, self.collection);
        Ok(CreatedDocument { id, create_time })
    }

    async fn query_prefix(&self, q: &str) -> Result<Vec<NewsItem>, StoreError> {
        let url = format!("{}/{}:runQuery", self.base_url, self.parent);
        let body = build_prefix_query(&self.collection, q);
        let rows = self.post_json(&url, &body).await?;

        let rows = rows
            .as_array()
            .ok_or_else(|| StoreError::Api("unexpected runQuery response shape".to_string()))?;

        let mut items = Vec::new();
        for row in rows {
            if let Some(doc) = row.get("document") {
                items.push(decode_document(doc)?);
            }
        }
        Ok(items)
    }

    fn subscribe_prefix(&self, q: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(16);
        let store = self.clone();
        let q = q.to_string();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(store.poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut last: Option<Vec<NewsItem>> = None;

            loop {
                interval.tick().await;
                match store.query_prefix(&q).await {
                    Ok(current) => {
                        if last.as_ref() != Some(&current) {
                            if tx.send(Ok(current.clone())).await.is_err() {
                                break;
                            }
                            last = Some(current);
                        }
                    }
                    Err(e) => {
                        warn!("Live query for {:?} failed: {}", q, e);
                        if tx.send(Err(e)).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Subscription::new(rx, task.abort_handle())
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/{}/{}", self.base_url, self.parent, self.collection);
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("pageSize", "1")])
            .send()
            .await;
        matches!(response, Ok(r) if r.status().is_success())
    }
}

/// Structured query for `title ∈ [q, q + U+F8FF)` on the collection.
fn build_prefix_query(collection: &str, q: &str) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "where": {
                "compositeFilter": {
                    "op": "AND",
                    "filters": [
                        {
                            "fieldFilter": {
                                "field": { "fieldPath": "newsTitle" },
                                "op": "GREATER_THAN_OR_EQUAL",
                                "value": { "stringValue": q }
                            }
                        },
                        {
                            "fieldFilter": {
                                "field": { "fieldPath": "newsTitle" },
                                "op": "LESS_THAN",
                                "value": { "stringValue": prefix_upper_bound(q) }
                            }
                        }
                    ]
                }
            },
            "orderBy": [
                { "field": { "fieldPath": "newsTitle" }, "direction": "ASCENDING" }
            ]
        }
    })
}

fn encode_fields(item: &NewsItem) -> Value {
    json!({
        "newsTitle": { "stringValue": item.title },
        "newsContent": { "stringValue": item.content },
        "newsAuthor": { "stringValue": item.author },
        "newsDate": { "stringValue": item.date },
    })
}

fn decode_document(doc: &Value) -> Result<NewsItem, StoreError> {
    let fields = doc
        .get("fields")
        .ok_or_else(|| StoreError::Api("document missing fields".to_string()))?;

    let string_field = |name: &str| {
        fields
            .pointer(&format!("/{}/stringValue", name))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    Ok(NewsItem {
        title: string_field("newsTitle"),
        content: string_field("newsContent"),
        author: string_field("newsAuthor"),
        date: string_field("newsDate"),
    })
}

fn classify_response(status: StatusCode, body: &str) -> Result<Value, StoreError> {
    if !status.is_success() {
        return Err(StoreError::Transport(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body
        )));
    }

    let payload: Value = serde_json::from_str(body)
        .map_err(|_| StoreError::Api("empty or malformed response".to_string()))?;

    if let Some(message) = payload.pointer("/error/message").and_then(|m| m.as_str()) {
        return Err(StoreError::Api(message.to_string()));
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn prefix_query_carries_both_bounds() {
        let query = build_prefix_query("News", "Alph");
        let filters = query
            .pointer("/structuredQuery/where/compositeFilter/filters")
            .and_then(|f| f.as_array())
            .unwrap();
        assert_eq!(
            filters[0].pointer("/fieldFilter/value/stringValue").unwrap(),
            "Alph"
        );
        assert_eq!(
            filters[1].pointer("/fieldFilter/value/stringValue").unwrap(),
            "Alph\u{f8ff}"
        );
        assert_eq!(filters[1].pointer("/fieldFilter/op").unwrap(), "LESS_THAN");
    }

    #[test]
    fn document_round_trips_through_store_fields() {
        let item = NewsItem {
            title: "Alpha".to_string(),
            content: "Body".to_string(),
            author: "Ada".to_string(),
            date: "2024-05-01".to_string(),
        };
        let doc = json!({ "fields": encode_fields(&item) });
        assert_eq!(decode_document(&doc).unwrap(), item);
    }

    #[test]
    fn missing_fields_decode_as_empty_strings() {
        let doc = json!({ "fields": { "newsTitle": { "stringValue": "Alpha" } } });
        let item = decode_document(&doc).unwrap();
        assert_eq!(item.title, "Alpha");
        assert_eq!(item.content, "");
    }

    #[test]
    fn non_2xx_is_transport_error() {
        let result = classify_response(StatusCode::SERVICE_UNAVAILABLE, "down");
        assert_matches!(result, Err(StoreError::Transport(msg)) => {
            assert!(msg.contains("503"));
        });
    }

    #[test]
    fn error_body_is_api_error() {
        let body = r#"{"error":{"message":"permission denied","status":"PERMISSION_DENIED"}}"#;
        let result = classify_response(StatusCode::OK, body);
        assert_matches!(result, Err(StoreError::Api(msg)) => {
            assert_eq!(msg, "permission denied");
        });
    }
}
