//! Product commands: list, show, update.

use shopdesk_admin::config::AdminConfig;
use shopdesk_admin::services::{ListRequest, PageAction, SyncController};
use shopdesk_admin::shopify::{AdminClient, Variant};
use shopdesk_core::{LocationGid, ProductGid, SortConfig, VariantGid};
use tracing::info;

use super::{CliError, emit, render};

/// List one page of products.
///
/// # Errors
///
/// Returns `CliError` for an invalid sort option or a failed request.
pub async fn list(
    config: &AdminConfig,
    search: &str,
    sort: &str,
    after: Option<String>,
    before: Option<String>,
) -> Result<(), CliError> {
    let sort = SortConfig::parse_option(sort).map_err(|e| CliError::InvalidArgument(e.to_string()))?;
    let (action, cursor) = match (after, before) {
        (Some(cursor), _) => (PageAction::LoadMore, Some(cursor)),
        (None, Some(cursor)) => (PageAction::LoadPrevious, Some(cursor)),
        (None, None) => (PageAction::Search, None),
    };
    let request = ListRequest {
        action,
        search_query: search.to_string(),
        cursor,
        sort,
    };

    let client = AdminClient::from_config(&config.shopify);
    let page = client
        .list_products(request.variables(config.page_size)?)
        .await?;
    emit(&render::page(&page));
    Ok(())
}

/// Show one product.
///
/// # Errors
///
/// Returns `CliError` for an invalid ID, a missing product or a failed request.
pub async fn show(config: &AdminConfig, id: &str) -> Result<(), CliError> {
    let id = ProductGid::parse(id)?;
    let client = AdminClient::from_config(&config.shopify);
    let mut controller = SyncController::new(client, config.page_size, config.debounce);
    let snapshot = controller.open_product(id).await?;
    emit(&render::product(snapshot));
    Ok(())
}

/// Requested changes to one variant. Unset values keep their current value.
#[derive(Debug, Clone, Default)]
pub struct VariantEdit {
    pub variant: String,
    pub price: Option<String>,
    pub inventory: Option<String>,
    pub location: Option<String>,
    /// `key=value` pairs.
    pub metafields: Vec<String>,
}

/// Apply a variant edit through the same form the admin UI submits.
///
/// # Errors
///
/// Returns `CliError` for invalid arguments, validation failures and upstream
/// errors. A partial update is reported after the product is re-fetched.
pub async fn update(config: &AdminConfig, id: &str, edit: VariantEdit) -> Result<(), CliError> {
    let client = AdminClient::from_config(&config.shopify);
    let mut controller = SyncController::new(client, config.page_size, config.debounce);
    apply(&mut controller, ProductGid::parse(id)?, edit).await?;

    if let Some(snapshot) = controller.product() {
        emit(&render::product(snapshot));
    }
    Ok(())
}

/// Open the product, fill the edit form and submit it.
///
/// # Errors
///
/// See [`update`].
pub async fn apply(
    controller: &mut SyncController,
    product_id: ProductGid,
    edit: VariantEdit,
) -> Result<(), CliError> {
    let variant_id = VariantGid::parse(&edit.variant)?.to_gid();
    let metafields = parse_metafields(&edit.metafields)?;

    let snapshot = controller.open_product(product_id).await?;
    let location_id = match edit.location.as_deref() {
        Some(raw) => LocationGid::parse(raw)?.to_gid(),
        None => snapshot
            .product
            .variant(&variant_id)
            .and_then(first_location)
            .ok_or_else(|| {
                CliError::InvalidArgument(format!("{variant_id} has no stocking location; pass --location"))
            })?,
    };

    let form = controller.begin_edit(&variant_id, &location_id)?;
    if let Some(price) = edit.price {
        form.price = price;
    }
    if let Some(inventory) = edit.inventory {
        form.inventory = inventory;
    }
    form.metafields.extend(metafields);

    controller.submit_edit().await?;
    info!(product_id = %product_id, variant_id = %variant_id, "Variant updated");
    Ok(())
}

fn first_location(variant: &Variant) -> Option<String> {
    variant
        .inventory_item
        .inventory_levels
        .first()
        .map(|level| level.location.id.clone())
}

fn parse_metafields(pairs: &[String]) -> Result<Vec<(String, String)>, CliError> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .ok_or_else(|| CliError::InvalidArgument(format!("metafield must be key=value: {pair}")))
        })
        .collect()
}
