use std::sync::Arc;

use crate::db::FavoritesStore;
use crate::services::{CollectionService, MovieLookup};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub collection: Arc<CollectionService>,
}

impl AppState {
    /// Wires the collection manager to a storage backend and a lookup
    /// provider
    pub fn new(store: Arc<dyn FavoritesStore>, lookup: Arc<dyn MovieLookup>) -> Self {
        Self {
            collection: Arc::new(CollectionService::new(store, lookup)),
        }
    }
}
