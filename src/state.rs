//! Shared application state for all routes.

use crate::config::{ResolvedModel, Settings};
use crate::storage::ObjectStore;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub model: Arc<ResolvedModel>,
    pub storage: Arc<dyn ObjectStore>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(pool: PgPool, model: ResolvedModel, storage: Arc<dyn ObjectStore>, settings: Settings) -> Self {
        AppState {
            pool,
            model: Arc::new(model),
            storage,
            settings: Arc::new(settings),
        }
    }
}
