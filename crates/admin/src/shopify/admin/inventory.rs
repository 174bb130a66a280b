//! Inventory writes for the Admin API.

use shopdesk_core::{InventoryItemGid, LocationGid};
use tracing::instrument;

use super::{
    AdminClient, AdminShopifyError, check_user_errors, missing_payload,
    queries::{SetInventoryQuantity, set_inventory_quantity},
};

/// Quantity name written by inventory edits.
pub const INVENTORY_QUANTITY_NAME: &str = "available";

/// Adjustment reason recorded for inventory edits.
pub const INVENTORY_CORRECTION_REASON: &str = "correction";

impl AdminClient {
    /// Set the "available" quantity of an item at a location.
    ///
    /// `compare_quantity` is the quantity the caller last saw. Shopify applies
    /// the write only if the live value still equals it.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::UserErrors` when Shopify rejects the write,
    /// including a stale `compare_quantity`.
    #[instrument(skip(self), fields(inventory_item_id = %inventory_item_id, location_id = %location_id))]
    pub async fn set_available_quantity(
        &self,
        inventory_item_id: InventoryItemGid,
        location_id: LocationGid,
        quantity: i64,
        compare_quantity: i64,
    ) -> Result<(), AdminShopifyError> {
        use set_inventory_quantity::{InventoryQuantityInput, InventorySetQuantitiesInput};

        let variables = set_inventory_quantity::Variables {
            input: InventorySetQuantitiesInput {
                name: INVENTORY_QUANTITY_NAME.to_string(),
                reason: INVENTORY_CORRECTION_REASON.to_string(),
                quantities: vec![InventoryQuantityInput {
                    inventory_item_id: inventory_item_id.to_gid(),
                    location_id: location_id.to_gid(),
                    quantity,
                    compare_quantity,
                }],
            },
        };

        let response = self.execute::<SetInventoryQuantity>(variables).await?;
        let payload = response
            .inventory_set_quantities
            .ok_or_else(|| missing_payload("inventorySetQuantities"))?;
        check_user_errors(payload.user_errors)
    }
}
