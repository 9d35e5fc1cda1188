//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ProxyConfig;
use crate::shipments::{ShipmentApiError, ShipmentClient};
use crate::shopify::{ShopifyClient, ShopifyError};

/// Error building the upstream clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("shipment client: {0}")]
    Shipments(#[from] ShipmentApiError),
    #[error("shopify client: {0}")]
    Shopify(#[from] ShopifyError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The shipment client owns the
/// process-wide token cache, so every handler shares one bearer token.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ProxyConfig,
    shipments: ShipmentClient,
    shopify: Option<ShopifyClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The Shopify client is only built when its credentials are configured.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client cannot be created.
    pub fn new(config: ProxyConfig) -> Result<Self, StateError> {
        let shipments = ShipmentClient::new(&config.shipment_api)?;
        let shopify = config.shopify().map(ShopifyClient::new).transpose()?;

        if shopify.is_none() {
            tracing::info!("Shopify not configured, fulfillment cancellation disabled");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                shipments,
                shopify,
            }),
        })
    }

    /// Get a reference to the proxy configuration.
    #[must_use]
    pub fn config(&self) -> &ProxyConfig {
        &self.inner.config
    }

    /// Get a reference to the shipment API client.
    #[must_use]
    pub fn shipments(&self) -> &ShipmentClient {
        &self.inner.shipments
    }

    /// Get the Shopify Admin API client, if configured.
    #[must_use]
    pub fn shopify(&self) -> Option<&ShopifyClient> {
        self.inner.shopify.as_ref()
    }
}
