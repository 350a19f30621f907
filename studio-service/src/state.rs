//! Application state for the studio service.

use std::sync::Arc;

use tokio::sync::RwLock;

use common::config::AppConfig;
use common::registry::{ConnectionRegistry, FileStorage};

use crate::service::StudioService;
use crate::session::{MySqlConnector, SessionConnector, SessionResolver};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    /// Saved connections and the active name.
    pub registry: Arc<RwLock<ConnectionRegistry>>,
    pub resolver: SessionResolver,
}

impl AppState {
    /// File-backed registry and MySQL sessions, both taken from config.
    pub fn new(config: AppConfig) -> Self {
        let registry = ConnectionRegistry::new(FileStorage::new(config.registry_path.clone()));
        let connector = Arc::new(MySqlConnector::from_config(&config));
        Self::with_parts(config, registry, connector)
    }

    pub fn with_parts(
        config: AppConfig,
        registry: ConnectionRegistry,
        connector: Arc<dyn SessionConnector>,
    ) -> Self {
        Self {
            config,
            registry: Arc::new(RwLock::new(registry)),
            resolver: SessionResolver::new(connector),
        }
    }

    pub fn service(&self) -> StudioService {
        StudioService::new(self.resolver.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::ConnectionString;

    #[tokio::test]
    async fn test_registry_is_backed_by_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        let config = AppConfig::from_lookup("studio-service", |key| {
            (key == "STUDIO_REGISTRY_PATH").then(|| path.display().to_string())
        });

        let state = AppState::new(config.clone());
        {
            let mut registry = state.registry.write().await;
            registry.upsert(ConnectionString::new("local", "mysql://root@localhost/shop"));
            registry.set_active("local");
        }
        assert!(path.exists());

        let reopened = AppState::new(config);
        let registry = reopened.registry.read().await;
        assert_eq!(registry.get_active().as_deref(), Some("local"));
        assert_eq!(registry.list().len(), 1);
    }
}
