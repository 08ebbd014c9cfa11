use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{DocumentId, NewsStore, StoreError};

/// One news document as stored in the "News" collection. Field names on the
/// wire match the store schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(rename = "newsTitle", default)]
    pub title: String,
    #[serde(rename = "newsContent", default)]
    pub content: String,
    #[serde(rename = "newsAuthor", default)]
    pub author: String,
    #[serde(rename = "newsDate", default)]
    pub date: String,
}

/// Raw user input for the submission form. Validated before any write.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsSubmission {
    pub title: String,
    pub content: String,
    pub author: String,
    pub date: String,
}

/// Local validation failure. Lists every missing field so the caller can
/// report all of them at once.
#[derive(Debug, Clone, Error)]
#[error("missing required fields: {}", missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Returned only when the write succeeded. Callers clear their form state on
/// receipt, never before.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub document_id: DocumentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
}

impl NewsSubmission {
    /// All four fields are required; whitespace-only counts as empty.
    pub fn validate(&self) -> Result<NewsItem, ValidationError> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.content.trim().is_empty() {
            missing.push("content");
        }
        if self.author.trim().is_empty() {
            missing.push("author");
        }
        if self.date.trim().is_empty() {
            missing.push("date");
        }

        if !missing.is_empty() {
            return Err(ValidationError { missing });
        }

        Ok(NewsItem {
            title: self.title.clone(),
            content: self.content.clone(),
            author: self.author.clone(),
            date: self.date.clone(),
        })
    }
}

/// Validate and issue exactly one create against the store. A validation
/// failure performs zero writes.
pub async fn submit(
    store: &dyn NewsStore,
    submission: &NewsSubmission,
) -> Result<SubmissionReceipt, SubmitError> {
    let item = submission.validate()?;
    let created = store.add(&item).await?;
    tracing::info!("Created news document {}", created.id.0);
    Ok(SubmissionReceipt {
        document_id: created.id,
        create_time: created.create_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;

    fn submission() -> NewsSubmission {
        NewsSubmission {
            title: "Alpha".to_string(),
            content: "Body".to_string(),
            author: "Ada".to_string(),
            date: "2024-05-01".to_string(),
        }
    }

    #[tokio::test]
    async fn empty_field_blocks_the_write() {
        let store = MemoryStore::new();
        let mut sub = submission();
        sub.author = "  ".to_string();

        let result = submit(&store, &sub).await;
        assert_matches!(result, Err(SubmitError::Validation(e)) => {
            assert_eq!(e.missing, ["author"]);
        });
        assert!(store.query_prefix("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn every_missing_field_is_reported() {
        let sub = NewsSubmission {
            title: String::new(),
            content: "x".to_string(),
            author: String::new(),
            date: String::new(),
        };
        let err = sub.validate().unwrap_err();
        assert_eq!(err.missing, ["title", "author", "date"]);
    }

    #[tokio::test]
    async fn valid_submission_writes_exactly_once() {
        let store = MemoryStore::new();
        let receipt = submit(&store, &submission()).await.unwrap();
        assert!(!receipt.document_id.0.is_empty());

        let items = store.query_prefix("").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Alpha");
        assert_eq!(items[0].content, "Body");
        assert_eq!(items[0].author, "Ada");
        assert_eq!(items[0].date, "2024-05-01");
    }
}
