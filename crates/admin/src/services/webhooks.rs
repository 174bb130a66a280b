//! Product-deletion webhook handling.
//!
//! Deletions are recorded as one line each in `product-delete.log`; failures
//! while handling a webhook go to `product-delete-error.log` in the same
//! directory.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Topic registered for product deletions.
pub const PRODUCTS_DELETE_TOPIC: &str = "PRODUCTS_DELETE";

/// Log of deleted products.
pub const DELETE_LOG_FILE: &str = "product-delete.log";

/// Log of webhook handling failures.
pub const ERROR_LOG_FILE: &str = "product-delete-error.log";

type HmacSha256 = Hmac<Sha256>;

/// Errors from webhook handling.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Missing productId")]
    MissingId,

    #[error("Invalid webhook body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Failed to write webhook log: {0}")]
    Io(#[from] std::io::Error),
}

/// Product identifier from a deletion payload: `webhookId`, else `id`.
///
/// Numeric and string identifiers are both accepted.
#[must_use]
pub fn deleted_product_id(payload: &serde_json::Value) -> Option<String> {
    ["webhookId", "id"]
        .into_iter()
        .filter_map(|key| payload.get(key))
        .find_map(|value| match value {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Check `X-Shopify-Hmac-Sha256` against the raw request body.
///
/// # Errors
///
/// Returns `WebhookError::InvalidSignature` on a missing or wrong signature.
pub fn verify_hmac(
    secret: &SecretString,
    body: &[u8],
    signature: Option<&str>,
) -> Result<(), WebhookError> {
    let signature = signature.ok_or(WebhookError::InvalidSignature)?;
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(body);
    let expected = BASE64.encode(mac.finalize().into_bytes());

    if constant_time_compare(&expected, signature.trim()) {
        Ok(())
    } else {
        Err(WebhookError::InvalidSignature)
    }
}

/// Constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

/// Append-only webhook log files under one directory.
#[derive(Debug, Clone)]
pub struct WebhookLog {
    dir: PathBuf,
}

impl WebhookLog {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record a deleted product.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Io` if the log cannot be written.
    #[instrument(skip(self))]
    pub async fn record_deletion(&self, product_id: &str) -> Result<(), WebhookError> {
        let line = format!("Product deleted: {product_id} at {}\n", timestamp(Utc::now()));
        self.append(DELETE_LOG_FILE, &line).await
    }

    /// Record a webhook handling failure.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Io` if the log cannot be written.
    #[instrument(skip(self))]
    pub async fn record_error(&self, message: &str) -> Result<(), WebhookError> {
        let line = format!("Webhook error: {message} at {}\n", timestamp(Utc::now()));
        self.append(ERROR_LOG_FILE, &line).await
    }

    async fn append(&self, file: &str, line: &str) -> Result<(), WebhookError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file);
        let mut handle = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        handle.write_all(line.as_bytes()).await?;
        handle.flush().await?;
        debug!(path = %path.display(), "Appended webhook log line");
        Ok(())
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
