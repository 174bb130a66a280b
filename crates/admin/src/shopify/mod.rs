//! Shopify Admin API client.
//!
//! # Security
//!
//! The Admin API access token grants write access to products and
//! inventory. It is supplied by the host platform's authenticated session and
//! passed explicitly into [`AdminClient::new`]; nothing in this module reads
//! ambient credentials.
//!
//! # Architecture
//!
//! - Every GraphQL document is a `const` in [`admin::queries`]; user input
//!   only ever reaches Shopify as a variable value, never as document text
//! - [`AdminGateway`] is the transport seam: [`HttpGateway`] talks to Shopify,
//!   tests substitute an in-memory implementation
//! - No caching layer and no automatic retries
//!
//! # Example
//!
//! ```rust,ignore
//! use shopdesk_admin::shopify::AdminClient;
//!
//! let client = AdminClient::from_config(&config.shopify);
//!
//! let variables = ListRequest::first_page("shirt", SortConfig::default()).variables(5)?;
//! let page = client.list_products(variables).await?;
//! let detail = client.get_product(ProductGid::new(123)).await?;
//! ```

pub mod admin;
pub mod types;

pub use admin::gateway::{AdminGateway, GraphQLRequest, HttpGateway};
pub use admin::{AdminClient, UserError, WebhookSubscription};
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with Shopify Admin API.
#[derive(Debug, Error)]
pub enum AdminShopifyError {
    /// HTTP request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Shopify answered with a non-success HTTP status.
    #[error("API request failed with status {status}: {reason}")]
    Transport {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase or response excerpt.
        reason: String,
    },

    /// GraphQL query returned top-level errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// Response body was not the expected JSON shape.
    #[error("Failed to parse API response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Field-level errors from a mutation payload (`userErrors`).
    #[error("User error: {}", format_user_errors(.0))]
    UserErrors(Vec<UserError>),
}

impl AdminShopifyError {
    /// Whether the failure happened below GraphQL (network, HTTP status, body).
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::Transport { .. }
                | Self::Parse(_)
                | Self::RateLimited(_)
                | Self::Unauthorized(_)
        )
    }
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

impl GraphQLError {
    /// Error carrying only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }
    }
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
