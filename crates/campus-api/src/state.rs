//! Shared application state for the API server.

use std::sync::Arc;

use campus_registry::{CampusStore, MemoryStore};

/// State shared by every handler: the storage backend.
#[derive(Clone)]
pub struct AppState {
    /// The backend serving every event, registration and account call.
    pub store: Arc<dyn CampusStore>,
}

impl AppState {
    /// Serve requests from `store`.
    pub fn new(store: Arc<dyn CampusStore>) -> Self {
        Self { store }
    }

    /// Serve requests from a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
