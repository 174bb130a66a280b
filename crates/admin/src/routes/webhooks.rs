//! Shopify webhook receiver and subscription registration.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument, warn};
use url::Url;

use crate::error::AppError;
use crate::services::webhooks::{PRODUCTS_DELETE_TOPIC, deleted_product_id, verify_hmac};
use crate::services::WebhookError;
use crate::shopify::{AdminShopifyError, WebhookSubscription};
use crate::state::AppState;

/// Receiver path, relative to the public base URL.
pub const PRODUCTS_DELETE_PATH: &str = "webhooks/app/products-delete";

/// Header carrying the base64 HMAC-SHA256 of the raw body.
pub const HMAC_HEADER: &str = "X-Shopify-Hmac-Sha256";

/// Record a product deletion.
///
/// Any failure is also appended to the webhook error log.
#[instrument(skip(state, headers, body))]
pub async fn products_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    match record_deletion(&state, &headers, &body).await {
        Ok(product_id) => Ok(Json(json!({ "success": true, "productId": product_id }))),
        Err(e) => {
            if let Err(log_error) = state.webhook_log().record_error(&e.to_string()).await {
                warn!(error = %log_error, "Failed to write webhook error log");
            }
            Err(e.into())
        }
    }
}

async fn record_deletion(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<String, WebhookError> {
    if let Some(secret) = &state.config().webhook_secret {
        let signature = headers.get(HMAC_HEADER).and_then(|v| v.to_str().ok());
        verify_hmac(secret, body, signature)?;
    }

    let payload: Value = serde_json::from_slice(body)?;
    let product_id = deleted_product_id(&payload).ok_or(WebhookError::MissingId)?;
    state.webhook_log().record_deletion(&product_id).await?;

    info!(product_id = %product_id, "Product deletion recorded");
    Ok(product_id)
}

/// Registration request; the callback defaults to this app's receiver.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub callback_url: Option<String>,
}

/// Subscribe the receiver to `PRODUCTS_DELETE`.
#[instrument(skip(state))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<WebhookSubscription>, AppError> {
    let callback_url = match request.callback_url.filter(|u| !u.is_empty()) {
        Some(raw) => Url::parse(&raw)
            .map_err(|e| AppError::BadRequest(format!("Invalid callbackUrl: {e}")))?,
        None => default_callback(state.config().base_url.as_ref())?,
    };

    let subscription = state
        .shopify()
        .register_webhook(PRODUCTS_DELETE_TOPIC, &callback_url)
        .await
        .map_err(|e| match e {
            AdminShopifyError::UserErrors(_) => AppError::BadRequest(e.to_string()),
            other => AppError::Shopify(other),
        })?;

    info!(id = %subscription.id, callback_url = %callback_url, "Webhook registered");
    Ok(Json(subscription))
}

/// Receiver URL under `base_url`.
///
/// # Errors
///
/// Returns `AppError::BadRequest` when no base URL is configured.
pub fn default_callback(base_url: Option<&Url>) -> Result<Url, AppError> {
    let base = base_url.ok_or_else(|| {
        AppError::BadRequest("callbackUrl is required when SHOPDESK_BASE_URL is not set".to_string())
    })?;
    base.join(PRODUCTS_DELETE_PATH)
        .map_err(|e| AppError::Internal(format!("Invalid base URL: {e}")))
}
