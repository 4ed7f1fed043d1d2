//! Shared application state for all routes.

use crate::repository::CountryStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CountryStore>,
    /// Capability required by mutating routes. `None` refuses all mutations.
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(store: Arc<dyn CountryStore>, admin_token: Option<String>) -> Self {
        AppState {
            store,
            admin_token: admin_token.map(Arc::from),
        }
    }
}
