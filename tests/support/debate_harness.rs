#![allow(dead_code)]

use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;

use axon_console::axon::{AxonAdapter, create_adapter};
use axon_console::config::{AxonConfig, AxonMode};
use axon_console::debate::{
    DebateConfig, DebateRunner, DebateSession, DebateView, Participant, SqliteDebateStore,
};

pub fn axon_config(mode: AxonMode, base_url: &str) -> AxonConfig {
    AxonConfig {
        mode,
        base_url: base_url.to_string(),
        timeout_secs: 5,
        ..AxonConfig::default()
    }
}

pub fn adapter(mode: AxonMode, base_url: &str) -> Arc<AxonAdapter> {
    Arc::new(create_adapter(&axon_config(mode, base_url)).expect("adapter"))
}

pub fn runner(adapter: Arc<AxonAdapter>) -> DebateRunner {
    DebateRunner::new(adapter, "integration").with_language(Some("en".into()))
}

pub fn new_view(names: &[&str], max_rounds: u32) -> DebateView {
    let session = DebateSession::create(DebateConfig {
        title: "Public transport".into(),
        topic: "Should public transport be free?".into(),
        description: "City budget debate".into(),
        participants: names.iter().map(|n| Participant::parse(n)).collect(),
        max_rounds,
    })
    .expect("valid debate config");
    DebateView::editable(session)
}

pub async fn memory_store() -> SqliteDebateStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    SqliteDebateStore::new(pool).await.expect("store")
}

pub fn chat_envelope(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-live",
        "created": 1_700_000_000,
        "model": "axon-live-1",
        "choices": [{ "message": { "role": "assistant", "content": content } }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20 }
    })
}
