use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One outbound translation call. Exists only for the duration of the call;
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Error)]
pub enum TranslateError {
    /// Network failure or a non-2xx status from the endpoint. Carries the
    /// response body (or the connection error) verbatim.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A well-formed response signalling an application-level failure, or a
    /// missing/unparseable body.
    #[error("api error: {0}")]
    Api(String),
}

/// Translation service seam. The production implementation is
/// [`GoogleTranslateClient`](super::google::GoogleTranslateClient).
#[async_trait]
pub trait TranslateInterface: Send + Sync {
    /// Translate `request.text` from `source_lang` to `target_lang`,
    /// returning the translated text.
    async fn translate(&self, request: &TranslateRequest) -> Result<String, TranslateError>;
}
