//! Server state management

use kisan_core::{AdvisoryService, KisanConfig};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AdvisoryService>,
}

impl AppState {
    pub fn new(service: AdvisoryService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Build the advisory service from configuration
    pub fn from_config(config: KisanConfig) -> kisan_core::Result<Self> {
        Ok(Self::new(AdvisoryService::new(config)?))
    }
}
