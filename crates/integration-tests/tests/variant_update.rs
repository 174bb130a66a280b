//! Variant edit scenarios: validation, the price/inventory/metafield write
//! sequence, partial failures and concurrent inventory changes.
//!
//! Run with: cargo test -p shopdesk-integration-tests --test variant_update

use std::collections::HashMap;
use std::sync::Arc;

use shopdesk_admin::services::{
    SyncController, SyncError, UpdateError, UpdateRequest, UpdateStep, VariantUpdater,
};
use shopdesk_core::ProductGid;
use shopdesk_integration_tests::{FakeShop, MAIN_LOCATION, SEEDED_QUANTITY, STALE_CODE};

const PRODUCT: u64 = 1;
const VARIANT: u64 = 101;
const ITEM: u64 = 201;

fn location_gid() -> String {
    format!("gid://shopify/Location/{MAIN_LOCATION}")
}

fn variant_gid() -> String {
    format!("gid://shopify/ProductVariant/{VARIANT}")
}

fn updater(shop: FakeShop) -> (Arc<FakeShop>, VariantUpdater) {
    let (shop, client) = shop.into_client();
    (shop, VariantUpdater::new(client))
}

/// Open product 1 and start editing its variant at the main location.
async fn editing(shop: FakeShop) -> (Arc<FakeShop>, SyncController) {
    let (shop, client) = shop.into_client();
    let mut controller = SyncController::new(client, 5, std::time::Duration::from_millis(500));
    controller.open_product(ProductGid::new(PRODUCT)).await.unwrap();
    controller.begin_edit(&variant_gid(), &location_gid()).unwrap();
    (shop, controller)
}

fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn valid_form(inventory: &str, expected: &str) -> HashMap<String, String> {
    let variant = variant_gid();
    let location = location_gid();
    form(&[
        ("variantId", &variant),
        ("variantItemId", &format!("gid://shopify/InventoryItem/{ITEM}")),
        ("price", "19.9"),
        ("inventory", inventory),
        ("inventoryQuantity", expected),
        ("location", &location),
    ])
}

// =============================================================================
// Successful edits
// =============================================================================

#[tokio::test]
async fn test_edit_form_prefills_from_product() {
    let (_shop, controller) = editing(FakeShop::seeded(&["Linen Shirt"])).await;

    let edit = controller.edit().unwrap();
    assert_eq!(edit.price, "10.00");
    assert_eq!(edit.inventory, SEEDED_QUANTITY.to_string());
    assert_eq!(edit.expected_quantity, SEEDED_QUANTITY.to_string());
    assert_eq!(edit.location_id, location_gid());
}

#[tokio::test]
async fn test_submit_writes_price_inventory_and_metafields() {
    let (shop, mut controller) = editing(FakeShop::seeded(&["Linen Shirt"])).await;

    let edit = controller.edit_mut().unwrap();
    edit.price = "19.9".to_string();
    edit.inventory = "12".to_string();
    edit.metafields
        .insert("material".to_string(), "linen".to_string());

    controller.submit_edit().await.unwrap();

    let variant = shop.variant(VARIANT).unwrap();
    assert_eq!(variant.price, "19.90");
    assert_eq!(variant.available(MAIN_LOCATION), Some(12));
    assert_eq!(
        shop.product(PRODUCT).unwrap().metafields.get("material").map(String::as_str),
        Some("linen")
    );

    assert_eq!(
        shop.operations(),
        [
            "GetProduct",
            "UpdateVariantPrice",
            "SetInventoryQuantity",
            "SetMetafields",
            "GetProduct",
        ]
    );

    // The open product reflects the write and the edit is closed.
    let snapshot = controller.product().unwrap();
    assert_eq!(snapshot.product.variants[0].price, "19.90");
    assert_eq!(snapshot.product.total_inventory, 12);
    assert!(controller.edit().is_none());
    assert!(controller.notice().is_none());
}

#[tokio::test]
async fn test_inventory_write_sends_compare_quantity() {
    let (shop, updater) = updater(FakeShop::seeded(&["Linen Shirt"]));
    let request = UpdateRequest::from_form(&valid_form("12.0", "10")).unwrap();

    updater.update(ProductGid::new(PRODUCT), request).await.unwrap();

    let write = shop
        .requests()
        .into_iter()
        .find(|r| r.operation_name == "SetInventoryQuantity")
        .unwrap();
    let quantity = &write.variables["input"]["quantities"][0];
    assert_eq!(quantity["quantity"], 12);
    assert_eq!(quantity["compareQuantity"], 10);
    assert_eq!(write.variables["input"]["name"], "available");
}

#[tokio::test]
async fn test_no_metafield_write_without_metafields() {
    let (shop, mut controller) = editing(FakeShop::seeded(&["Linen Shirt"])).await;
    controller.edit_mut().unwrap().inventory = "4".to_string();

    controller.submit_edit().await.unwrap();

    assert!(!shop.operations().contains(&"SetMetafields"));
    assert_eq!(shop.variant(VARIANT).unwrap().available(MAIN_LOCATION), Some(4));
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_invalid_price_makes_no_calls() {
    let (shop, mut controller) = editing(FakeShop::seeded(&["Linen Shirt"])).await;
    controller.edit_mut().unwrap().price = "abc".to_string();
    let before = shop.requests().len();

    let err = controller.submit_edit().await.unwrap_err();

    assert!(matches!(err, SyncError::Update(UpdateError::InvalidPrice(_))));
    assert_eq!(shop.requests().len(), before);
    assert!(controller.notice().is_some());
    // The edit stays open for correction.
    assert_eq!(controller.edit().unwrap().price, "abc");
}

// =============================================================================
// Partial failures and concurrency
// =============================================================================

#[tokio::test]
async fn test_stale_inventory_reports_concurrent_modification() {
    let (shop, mut controller) = editing(FakeShop::seeded(&["Linen Shirt"])).await;
    let edit = controller.edit_mut().unwrap();
    edit.price = "19.9".to_string();
    edit.inventory = "12".to_string();

    // Someone else sells three units after the form was opened.
    shop.set_available(ITEM, MAIN_LOCATION, 7);

    let err = controller.submit_edit().await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Update(UpdateError::ConcurrentModification { expected: 10 })
    ));

    // The price step had already gone through; inventory is untouched.
    let variant = shop.variant(VARIANT).unwrap();
    assert_eq!(variant.price, "19.90");
    assert_eq!(variant.available(MAIN_LOCATION), Some(7));

    // The open product is re-fetched so the editor sees live values.
    assert_eq!(shop.operations().last(), Some(&"GetProduct"));
    let snapshot = controller.product().unwrap();
    assert_eq!(snapshot.product.variants[0].price, "19.90");
    assert_eq!(snapshot.product.total_inventory, 7);
    assert!(controller.notice().is_some());

    // The edit survives with the typed values, now compared against the
    // live level, so resubmitting goes through.
    let edit = controller.edit().unwrap();
    assert_eq!(edit.inventory, "12");
    assert_eq!(edit.expected_quantity, "7");

    controller.submit_edit().await.unwrap();
    assert_eq!(shop.variant(VARIANT).unwrap().available(MAIN_LOCATION), Some(12));
    assert!(controller.edit().is_none());
}

#[tokio::test]
async fn test_replayed_request_is_rejected() {
    let (shop, updater) = updater(FakeShop::seeded(&["Linen Shirt"]));
    let request = UpdateRequest::from_form(&valid_form("12", "10")).unwrap();

    updater
        .update(ProductGid::new(PRODUCT), request.clone())
        .await
        .unwrap();
    let err = updater
        .update(ProductGid::new(PRODUCT), request)
        .await
        .unwrap_err();

    assert!(matches!(err, UpdateError::ConcurrentModification { expected: 10 }));
    assert_eq!(shop.variant(VARIANT).unwrap().available(MAIN_LOCATION), Some(12));
}

#[tokio::test]
async fn test_stale_code_is_recognised_without_message_match() {
    let (shop, updater) = updater(FakeShop::seeded(&["Linen Shirt"]));
    shop.reject_next_inventory_write("Quantity changed", STALE_CODE);
    let request = UpdateRequest::from_form(&valid_form("12", "10")).unwrap();

    let err = updater.update(ProductGid::new(PRODUCT), request).await.unwrap_err();
    assert!(matches!(err, UpdateError::ConcurrentModification { .. }));
}

#[tokio::test]
async fn test_inventory_rejection_is_partial_update() {
    let (shop, updater) = updater(FakeShop::seeded(&["Linen Shirt"]));
    shop.reject_next_inventory_write(
        "The item is not stocked at the location.",
        "ITEM_NOT_STOCKED_AT_LOCATION",
    );
    let request = UpdateRequest::from_form(&valid_form("12", "10")).unwrap();

    let err = updater.update(ProductGid::new(PRODUCT), request).await.unwrap_err();

    assert!(matches!(
        err,
        UpdateError::PartialUpdate {
            step: UpdateStep::Inventory,
            ..
        }
    ));
    assert!(err.is_partial());
    assert_eq!(shop.variant(VARIANT).unwrap().price, "19.90");
    assert_eq!(
        shop.variant(VARIANT).unwrap().available(MAIN_LOCATION),
        Some(SEEDED_QUANTITY)
    );
}

#[tokio::test]
async fn test_price_failure_skips_inventory() {
    let (shop, updater) = updater(FakeShop::seeded(&["Linen Shirt"]));
    let mut fields = valid_form("12", "10");
    fields.insert(
        "variantId".to_string(),
        "gid://shopify/ProductVariant/999".to_string(),
    );
    let request = UpdateRequest::from_form(&fields).unwrap();

    let err = updater.update(ProductGid::new(PRODUCT), request).await.unwrap_err();

    assert!(matches!(err, UpdateError::Price(_)));
    assert!(!err.is_partial());
    assert_eq!(shop.operations(), ["UpdateVariantPrice"]);
    assert_eq!(
        shop.variant(VARIANT).unwrap().available(MAIN_LOCATION),
        Some(SEEDED_QUANTITY)
    );
}

#[tokio::test]
async fn test_cancel_edit_discards_form() {
    let (shop, mut controller) = editing(FakeShop::seeded(&["Linen Shirt"])).await;
    controller.edit_mut().unwrap().price = "99".to_string();

    controller.cancel_edit();

    assert!(matches!(controller.submit_edit().await, Err(SyncError::NoEdit)));
    assert_eq!(shop.operations(), ["GetProduct"]);
}
