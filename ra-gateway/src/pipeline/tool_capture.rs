use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    cache::fingerprint::tool_hash, store::UserDataStorageConnector,
    types::agent::Tool,
};

/// Records each tool declared in the request once per agent, keyed by a
/// deterministic hash of the tool JSON. Fire-and-forget: runs on its own
/// task and never blocks or fails response emission.
pub fn spawn_capture(
    store: Arc<dyn UserDataStorageConnector>,
    agent_id: Uuid,
    body: &serde_json::Map<String, Value>,
) {
    let Some(tools) = body.get("tools").and_then(Value::as_array) else {
        return;
    };
    let tools: Vec<Value> = tools.clone();
    tokio::spawn(async move {
        for definition in tools {
            let name = definition
                .pointer("/function/name")
                .and_then(Value::as_str)
                .unwrap_or("unnamed")
                .to_string();
            let tool = Tool {
                id: Uuid::now_v7(),
                agent_id,
                name,
                hash: tool_hash(&definition),
                definition,
                created_at: Utc::now(),
            };
            if let Err(error) = store.upsert_tool(tool).await {
                tracing::warn!(error = %error, "tool capture failed");
            }
        }
    });
}
