//! Durable key-value storage used for identity and meal plan persistence.
//!
//! All backends are synchronous: reads and writes complete before the call
//! returns, so in-memory state and storage never drift after a mutation.

pub mod json_file;
pub mod memory;
pub mod sqlite;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage key for the signed-in username.
pub const USERNAME_KEY: &str = "username";
/// Storage key for the profile picture URL.
pub const PROFILE_PIC_KEY: &str = "profilePic";
/// Storage key for the JSON-serialized meal plan.
pub const MEAL_PLAN_KEY: &str = "mealPlan";

/// String-keyed, string-valued synchronous storage.
pub trait DurableStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Which storage backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    Json,
    Sqlite,
}

/// Open the configured backend inside `data_dir`.
pub fn open_store(backend: StorageBackend, data_dir: &Path) -> Result<Arc<dyn DurableStore>> {
    let store: Arc<dyn DurableStore> = match backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Json => Arc::new(JsonFileStore::open(&data_dir.join("storage.json"))?),
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(&data_dir.join("storage.db"))?),
    };
    info!("Opened {:?} storage backend in {:?}", backend, data_dir);
    Ok(store)
}
