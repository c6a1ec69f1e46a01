use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::Table;
use crate::services::RandomSource;

/// Shared application state
///
/// The table is loaded once before the server starts and never mutated, so
/// handlers read it without locking.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<Table>,
    pub rng: RandomSource,
    pub loaded_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(table: Table, rng: RandomSource) -> Self {
        Self {
            table: Arc::new(table),
            rng,
            loaded_at: Utc::now(),
        }
    }
}
