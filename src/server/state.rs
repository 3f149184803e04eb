use axum::extract::FromRef;

use crate::catalog::CatalogStore;
use crate::ingestion::IngestionOrchestrator;
use crate::projection::ProjectionDefaults;
use std::sync::Arc;
use std::time::Instant;

use super::session::AdminAuth;
use super::ServerConfig;

pub type GuardedCatalogStore = Arc<dyn CatalogStore>;
pub type GuardedOrchestrator = Arc<IngestionOrchestrator>;
pub type GuardedAdminAuth = Arc<AdminAuth>;
pub type GuardedProjectionDefaults = Arc<ProjectionDefaults>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub catalog_store: GuardedCatalogStore,
    pub orchestrator: GuardedOrchestrator,
    pub admin_auth: GuardedAdminAuth,
    pub projection_defaults: GuardedProjectionDefaults,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedCatalogStore {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog_store.clone()
    }
}

impl FromRef<ServerState> for GuardedOrchestrator {
    fn from_ref(input: &ServerState) -> Self {
        input.orchestrator.clone()
    }
}

impl FromRef<ServerState> for GuardedAdminAuth {
    fn from_ref(input: &ServerState) -> Self {
        input.admin_auth.clone()
    }
}

impl FromRef<ServerState> for GuardedProjectionDefaults {
    fn from_ref(input: &ServerState) -> Self {
        input.projection_defaults.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
