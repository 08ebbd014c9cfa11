use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;

use crate::state::AppState;

pub async fn handle_message(
    state: &AppState,
    client_uid: &str,
    text: &str,
    out: &mpsc::Sender<Value>,
) -> anyhow::Result<()> {
    let msg: Value = serde_json::from_str(text)?;
    let msg_type = msg.get("type").and_then(|v| v.as_str());

    match msg_type {
        Some("search-activate") => {
            handle_search_activate(state, client_uid, &msg, out).await?;
        }
        Some("search-deactivate") => {
            state.search_sessions.deactivate(client_uid);
        }
        _ => {
            warn!("Unknown message type: {:?}", msg_type);
        }
    }

    Ok(())
}

async fn handle_search_activate(
    state: &AppState,
    client_uid: &str,
    msg: &Value,
    out: &mpsc::Sender<Value>,
) -> anyhow::Result<()> {
    let q = msg
        .get("q")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("search-activate requires a \"q\" field"))?;

    state
        .search_sessions
        .activate(client_uid, state.store.clone(), q, out.clone());
    Ok(())
}
