use axum::extract::FromRef;
use std::sync::Arc;

use crate::{application::services::StorageService, domain::config::relay::RelayConfig};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub storage_service: Arc<dyn StorageService>,
}
