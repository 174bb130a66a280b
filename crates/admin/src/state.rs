//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AdminConfig;
use crate::services::{VariantUpdater, WebhookLog};
use crate::shopify::AdminClient;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    shopify: AdminClient,
    updater: VariantUpdater,
    webhook_log: WebhookLog,
}

impl AppState {
    /// Build state around an already-configured Admin API client.
    #[must_use]
    pub fn new(config: AdminConfig, shopify: AdminClient) -> Self {
        let webhook_log = WebhookLog::new(config.log_dir.clone());
        let updater = VariantUpdater::new(shopify.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                shopify,
                updater,
                webhook_log,
            }),
        }
    }

    /// Build state with an HTTP client for the configured store.
    #[must_use]
    pub fn from_config(config: AdminConfig) -> Self {
        let shopify = AdminClient::from_config(&config.shopify);
        Self::new(config, shopify)
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn shopify(&self) -> &AdminClient {
        &self.inner.shopify
    }

    #[must_use]
    pub fn updater(&self) -> &VariantUpdater {
        &self.inner.updater
    }

    #[must_use]
    pub fn webhook_log(&self) -> &WebhookLog {
        &self.inner.webhook_log
    }
}
