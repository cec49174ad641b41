//! Shared application state.

use std::sync::Arc;

use dealer_core::NumberingPolicy;
use dealer_db::{Coordinator, Database};

use crate::config::ApiConfig;

/// Handed to every handler through axum's `State` extractor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
    policy: NumberingPolicy,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig, policy: NumberingPolicy) -> Self {
        AppState {
            db,
            config: Arc::new(config),
            policy,
        }
    }

    pub fn policy(&self) -> NumberingPolicy {
        self.policy
    }

    pub fn coordinator(&self) -> Coordinator {
        self.db.coordinator(self.policy)
    }
}
