//! Webhook subscription management.

use serde::Serialize;
use tracing::instrument;
use url::Url;

use super::{
    AdminClient, AdminShopifyError, check_user_errors, missing_payload,
    queries::{CreateWebhookSubscription, create_webhook_subscription},
};

/// A created webhook subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookSubscription {
    pub id: String,
    pub topic: String,
}

impl AdminClient {
    /// Subscribe `callback_url` to a webhook topic (e.g. `PRODUCTS_DELETE`).
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::UserErrors` when Shopify rejects the
    /// subscription (duplicate address, invalid URL).
    #[instrument(skip(self), fields(topic = %topic, callback_url = %callback_url))]
    pub async fn register_webhook(
        &self,
        topic: &str,
        callback_url: &Url,
    ) -> Result<WebhookSubscription, AdminShopifyError> {
        let variables = create_webhook_subscription::Variables {
            topic: topic.to_string(),
            webhook_subscription: create_webhook_subscription::WebhookSubscriptionInput {
                callback_url: callback_url.to_string(),
                format: "JSON".to_string(),
            },
        };

        let response = self.execute::<CreateWebhookSubscription>(variables).await?;
        let payload = response
            .webhook_subscription_create
            .ok_or_else(|| missing_payload("webhookSubscriptionCreate"))?;
        check_user_errors(payload.user_errors)?;

        let subscription = payload
            .webhook_subscription
            .ok_or_else(|| missing_payload("webhookSubscriptionCreate"))?;

        Ok(WebhookSubscription {
            id: subscription.id,
            topic: subscription.topic,
        })
    }
}
