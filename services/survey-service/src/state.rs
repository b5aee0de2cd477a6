use std::sync::Arc;

use crate::storage::AppendStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<AppendStore>,
}

impl AppState {
    pub fn new(store: AppendStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}
