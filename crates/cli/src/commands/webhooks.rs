//! Webhook subscription commands.

use shopdesk_admin::config::AdminConfig;
use shopdesk_admin::routes::webhooks::PRODUCTS_DELETE_PATH;
use shopdesk_admin::services::webhooks::PRODUCTS_DELETE_TOPIC;
use shopdesk_admin::shopify::AdminClient;
use url::Url;

use super::{CliError, emit};

/// Subscribe `url` (or the receiver under `SHOPDESK_BASE_URL`) to
/// `PRODUCTS_DELETE`.
///
/// # Errors
///
/// Returns `CliError` for a missing or invalid URL, or when Shopify rejects
/// the subscription.
pub async fn register(config: &AdminConfig, url: Option<&str>) -> Result<(), CliError> {
    let callback_url = callback_url(config.base_url.as_ref(), url)?;
    let client = AdminClient::from_config(&config.shopify);
    let subscription = client
        .register_webhook(PRODUCTS_DELETE_TOPIC, &callback_url)
        .await?;

    emit(&format!(
        "Registered {} for {} -> {callback_url}",
        subscription.id, subscription.topic
    ));
    Ok(())
}

fn callback_url(base_url: Option<&Url>, explicit: Option<&str>) -> Result<Url, CliError> {
    match (explicit, base_url) {
        (Some(raw), _) => {
            Url::parse(raw).map_err(|e| CliError::InvalidArgument(format!("{raw}: {e}")))
        }
        (None, Some(base)) => base
            .join(PRODUCTS_DELETE_PATH)
            .map_err(|e| CliError::InvalidArgument(format!("SHOPDESK_BASE_URL: {e}"))),
        (None, None) => Err(CliError::InvalidArgument(
            "pass a callback URL or set SHOPDESK_BASE_URL".to_string(),
        )),
    }
}
