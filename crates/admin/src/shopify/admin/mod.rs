//! Shopify Admin API GraphQL client.
//!
//! [`AdminClient`] turns typed operations from [`queries`] into
//! [`GraphQLRequest`]s and hands them to an [`AdminGateway`]. The gateway owns
//! the authenticated session; the client only shapes variables and decodes
//! responses.

use std::sync::Arc;

use graphql_client::{GraphQLQuery, QueryBody};
use serde::de::DeserializeOwned;

use crate::config::ShopifyAdminConfig;

use super::AdminShopifyError;

mod conversions;
pub mod gateway;
mod inventory;
mod products;
pub mod queries;
mod webhooks;

pub use gateway::{AdminGateway, GraphQLRequest, HttpGateway};
pub use inventory::{INVENTORY_CORRECTION_REASON, INVENTORY_QUANTITY_NAME};
pub use products::{METAFIELD_NAMESPACE, METAFIELD_TYPE};
pub use queries::UserError;
pub use webhooks::WebhookSubscription;

/// Shopify Admin API GraphQL client.
///
/// Cheap to clone; all clones share one gateway.
///
/// # Security
///
/// The gateway carries an access token with write access to products and
/// inventory. The client never logs variables or response bodies.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    gateway: Arc<dyn AdminGateway>,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient").finish_non_exhaustive()
    }
}

impl AdminClient {
    /// Create a client over an existing gateway.
    #[must_use]
    pub fn new(gateway: Arc<dyn AdminGateway>) -> Self {
        Self {
            inner: Arc::new(AdminClientInner { gateway }),
        }
    }

    /// Create a client that talks to Shopify over HTTPS.
    #[must_use]
    pub fn from_config(config: &ShopifyAdminConfig) -> Self {
        let gateway = HttpGateway::new(
            &config.store,
            &config.api_version,
            config.access_token.clone(),
        );
        Self::new(Arc::new(gateway))
    }

    // =========================================================================
    // GraphQL Execution
    // =========================================================================

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, AdminShopifyError>
    where
        Q::ResponseData: DeserializeOwned,
    {
        let body = Q::build_query(variables);
        let request: GraphQLRequest = QueryBody {
            variables: serde_json::to_value(&body.variables)?,
            query: body.query,
            operation_name: body.operation_name,
        };

        tracing::debug!(operation = request.operation_name, "Executing Admin API operation");
        let data = self.inner.gateway.execute(request).await?;
        Ok(serde_json::from_value(data)?)
    }
}

/// Fail with [`AdminShopifyError::UserErrors`] when a payload reports any.
fn check_user_errors(user_errors: Vec<UserError>) -> Result<(), AdminShopifyError> {
    if user_errors.is_empty() {
        Ok(())
    } else {
        Err(AdminShopifyError::UserErrors(user_errors))
    }
}

/// Error for a mutation whose payload came back `null`.
fn missing_payload(mutation: &str) -> AdminShopifyError {
    AdminShopifyError::GraphQL(vec![super::GraphQLError::message(format!(
        "No payload returned from {mutation}"
    ))])
}
