//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::engine::{EngineOptions, MetricsEngine};
use crate::mercadolibre::{MarketplaceError, MercadoLibreClient};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DashboardConfig,
    engine: MetricsEngine<MercadoLibreClient>,
}

impl AppState {
    /// Build the state from configuration.
    ///
    /// # Errors
    ///
    /// Returns `MarketplaceError` if the HTTP client cannot be created.
    pub fn new(config: DashboardConfig) -> Result<Self, MarketplaceError> {
        let client = MercadoLibreClient::new(&config.marketplace)?;
        let engine = MetricsEngine::new(client, EngineOptions::from_config(&config));

        Ok(Self {
            inner: Arc::new(AppStateInner { config, engine }),
        })
    }

    /// Loaded configuration.
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    /// The metrics engine.
    #[must_use]
    pub fn engine(&self) -> &MetricsEngine<MercadoLibreClient> {
        &self.inner.engine
    }

    /// The marketplace client.
    #[must_use]
    pub fn marketplace(&self) -> &MercadoLibreClient {
        self.inner.engine.api()
    }
}
