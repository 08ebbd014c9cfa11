use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

use super::interface::{TranslateError, TranslateInterface, TranslateRequest};

/// Client for the Google Translate v2 REST endpoint.
///
/// One POST per call: `{base_url}?key={api_key}` with a JSON body
/// `{"q", "source", "target", "format": "text"}`.
pub struct GoogleTranslateClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoogleTranslateClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl TranslateInterface for GoogleTranslateClient {
    async fn translate(&self, request: &TranslateRequest) -> Result<String, TranslateError> {
        let body = json!({
            "q": request.text,
            "source": request.source_lang,
            "target": request.target_lang,
            "format": "text",
        });

        debug!(
            "Sending translate request: source={}, target={}, chars={}",
            request.source_lang,
            request.target_lang,
            request.text.len()
        );

        let response = self
            .client
            .post(&self.base_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| TranslateError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TranslateError::Transport(e.to_string()))?;

        classify_response(status, &body)
    }
}

/// Maps one endpoint response to translated text or a [`TranslateError`].
///
/// Non-2xx is a transport failure carrying the response. A 2xx body with an
/// `error.message` field is an API failure; so is a body that cannot be
/// parsed or is missing `data.translations[0].translatedText`.
pub fn classify_response(status: StatusCode, body: &str) -> Result<String, TranslateError> {
    if !status.is_success() {
        return Err(TranslateError::Transport(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body
        )));
    }

    let payload: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return Err(TranslateError::Api("empty or malformed response".to_string())),
    };

    if let Some(message) = payload.pointer("/error/message").and_then(|m| m.as_str()) {
        return Err(TranslateError::Api(message.to_string()));
    }

    payload
        .pointer("/data/translations/0/translatedText")
        .and_then(|t| t.as_str())
        .map(|t| t.to_string())
        .ok_or_else(|| TranslateError::Api("empty or malformed response".to_string()))
}
