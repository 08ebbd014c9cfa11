use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::news::{self, NewsSubmission, SubmitError};
use crate::state::AppState;
use crate::translate::{TranslateError, TranslateRequest};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // WebSocket for live search
        .route("/client-ws", get(websocket_handler))
        // Health check
        .route("/api/health", get(health_check))
        // REST API routes
        .route("/api/translate", post(translate))
        .route("/api/translate/history/:client_uid", get(translation_history))
        .route("/api/news", post(submit_news))
}

async fn websocket_handler(
    ws: axum::extract::ws::WebSocketUpgrade,
    State(state): State<AppState>,
) -> axum::response::Response {
    crate::websocket::websocket_handler(ws, State(state)).await
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let store_healthy = state.store.health_check().await;
    Json(json!({
        "status": "ok",
        "store": store_healthy
    }))
}

#[derive(Debug, Deserialize)]
struct TranslateBody {
    text: String,
    source_lang: String,
    target_lang: String,
    /// Histories are per caller session; omit to start a fresh one.
    client_uid: Option<String>,
}

async fn translate(
    State(state): State<AppState>,
    Json(body): Json<TranslateBody>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let client_uid = body
        .client_uid
        .clone()
        .unwrap_or_else(|| state.generate_client_uid());

    let request = TranslateRequest {
        text: body.text.clone(),
        source_lang: body.source_lang,
        target_lang: body.target_lang,
    };

    match state.translator.translate(&request).await {
        Ok(translated) => {
            // History is only touched on success; failures leave it unchanged.
            let entry = state
                .histories
                .entry(client_uid.clone())
                .or_default()
                .record(&body.text, &translated)
                .to_string();
            Ok(Json(json!({
                "client_uid": client_uid,
                "translated_text": translated,
                "history_entry": entry,
            })))
        }
        Err(e @ TranslateError::Transport(_)) => Err((
            StatusCode::BAD_GATEWAY,
            Json(json!({"error": e.to_string()})),
        )),
        Err(e @ TranslateError::Api(_)) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": e.to_string()})),
        )),
    }
}

async fn translation_history(
    State(state): State<AppState>,
    Path(client_uid): Path<String>,
) -> Json<Value> {
    let entries: Vec<String> = state
        .histories
        .get(&client_uid)
        .map(|h| h.entries().to_vec())
        .unwrap_or_default();
    Json(json!({ "client_uid": client_uid, "entries": entries }))
}

async fn submit_news(
    State(state): State<AppState>,
    Json(submission): Json<NewsSubmission>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    match news::submit(state.store.as_ref(), &submission).await {
        Ok(receipt) => Ok((
            StatusCode::CREATED,
            Json(json!({
                "document_id": receipt.document_id.0,
                "create_time": receipt.create_time,
            })),
        )),
        Err(SubmitError::Validation(e)) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": e.to_string(), "missing": e.missing})),
        )),
        Err(SubmitError::Store(e)) => Err((
            StatusCode::BAD_GATEWAY,
            Json(json!({"error": e.to_string()})),
        )),
    }
}
