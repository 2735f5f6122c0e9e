#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use recipe_state::notify::TracingSink;
use recipe_state::storage::JsonFileStore;
use recipe_state::{ApiResponse, ApiTransport, AppState, ClientConfig, TransportError};
use serde_json::Value;
use tempfile::TempDir;

/// Transport answering from a fixed table, 404 for anything else.
#[derive(Default)]
pub struct StubTransport {
    replies: Mutex<HashMap<String, Result<ApiResponse, TransportError>>>,
    calls: Mutex<Vec<String>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, status: u16, body: Value) {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), Ok(ApiResponse::new(status, body)));
    }

    pub fn fail(&self, path: &str, err: TransportError) {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), Err(err));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiTransport for StubTransport {
    async fn get(&self, path: &str) -> Result<ApiResponse, TransportError> {
        self.calls.lock().unwrap().push(path.to_string());
        self.replies
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| Ok(ApiResponse::new(404, Value::Null)))
    }
}

/// App state over a JSON file store in `dir`, so a second call simulates a
/// process restart.
pub fn app_state(dir: &TempDir, transport: Arc<StubTransport>) -> AppState {
    let storage = Arc::new(JsonFileStore::open(&dir.path().join("storage.json")).unwrap());
    AppState::with_parts(
        ClientConfig::default(),
        storage,
        transport,
        Arc::new(TracingSink),
    )
    .unwrap()
}
