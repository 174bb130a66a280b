//! Unified error handling for the admin HTTP surface.
//!
//! Every error renders as JSON `{ "error": "<message>" }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::{ListError, UpdateError, WebhookError};
use crate::shopify::AdminShopifyError;

/// Application-level error type for admin handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Product list action failed.
    #[error(transparent)]
    List(#[from] ListError),

    /// Variant update failed, before or after reaching Shopify.
    #[error(transparent)]
    Update(#[from] UpdateError),

    /// Webhook could not be handled.
    #[error(transparent)]
    Webhook(#[from] WebhookError),

    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] AdminShopifyError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Webhook(WebhookError::MissingId | WebhookError::InvalidBody(_))
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Webhook(WebhookError::InvalidSignature) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::List(_)
            | Self::Update(_)
            | Self::Webhook(WebhookError::Io(_))
            | Self::Shopify(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error originates on our side or upstream rather than in
    /// the request.
    const fn is_server_error(&self) -> bool {
        match self {
            Self::List(e) => matches!(e, ListError::Shopify(_)),
            Self::Update(e) => !e.is_validation(),
            Self::Webhook(e) => matches!(e, WebhookError::Io(_)),
            Self::Shopify(_) | Self::Internal(_) => true,
            Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }

    /// Message shown to the caller.
    fn public_message(&self) -> String {
        match self {
            Self::List(ListError::Shopify(_)) => "Failed to fetch products".to_string(),
            // Field errors stay readable; upstream failures do not leak.
            Self::Update(UpdateError::Price(e))
                if !matches!(e, AdminShopifyError::UserErrors(_)) =>
            {
                "Failed to update price".to_string()
            }
            Self::Shopify(_) => "External service error".to_string(),
            Self::Internal(_) | Self::Webhook(WebhookError::Io(_)) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        } else {
            tracing::debug!(error = %self, "Rejected admin request");
        }

        let status = self.status();
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
