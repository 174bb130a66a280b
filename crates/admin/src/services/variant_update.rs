//! Variant price and inventory update.
//!
//! An edit is validated in full before anything is sent. The writes then run
//! in order: price, inventory at one location, metafields. They are separate
//! Admin API mutations with no rollback, so a failure after the price write
//! leaves the price applied. Callers re-fetch the product after any outcome.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use shopdesk_core::{
    InventoryItemGid, LocationGid, Price, PriceError, ProductGid, VariantGid,
};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::shopify::{AdminClient, AdminShopifyError, UserError};

/// Form field names of the variant edit form.
pub mod fields {
    pub const VARIANT_ID: &str = "variantId";
    pub const INVENTORY_ITEM_ID: &str = "variantItemId";
    pub const PRICE: &str = "price";
    pub const INVENTORY: &str = "inventory";
    pub const EXPECTED_QUANTITY: &str = "inventoryQuantity";
    pub const LOCATION: &str = "location";
    /// Prefix of metafield form fields (`metafield_<key>`).
    pub const METAFIELD_PREFIX: &str = "metafield_";

    /// Fields that must be present and non-empty, in check order.
    pub const REQUIRED: [&str; 6] = [
        VARIANT_ID,
        INVENTORY_ITEM_ID,
        PRICE,
        INVENTORY,
        EXPECTED_QUANTITY,
        LOCATION,
    ];
}

/// Write step of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStep {
    Price,
    Inventory,
    Metafields,
}

impl std::fmt::Display for UpdateStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Price => "price",
            Self::Inventory => "inventory",
            Self::Metafields => "metafields",
        })
    }
}

/// Errors from a variant update.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// One or more required form fields are absent or blank.
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingField(Vec<&'static str>),

    /// Price is not a non-negative decimal.
    #[error("{0}")]
    InvalidPrice(#[from] PriceError),

    /// A global ID whose suffix is not an integer.
    #[error("Invalid {field}: {value}")]
    InvalidIdentifier { field: &'static str, value: String },

    /// A quantity that is not a whole number.
    #[error("{field} must be a whole number, got {value:?}")]
    InvalidQuantity { field: &'static str, value: String },

    /// A `metafield_<key>` field whose key is empty or has invalid characters.
    #[error("Invalid metafield key: {0:?}")]
    InvalidMetafield(String),

    /// Price write failed; nothing was changed.
    #[error("Failed to update price: {0}")]
    Price(#[source] AdminShopifyError),

    /// A write after the price failed; the price change has been applied.
    #[error("Failed to update product")]
    PartialUpdate {
        step: UpdateStep,
        #[source]
        source: AdminShopifyError,
    },

    /// Live inventory no longer matched the expected quantity. The price
    /// change has been applied.
    #[error("Failed to update product: inventory changed since it was loaded (expected {expected})")]
    ConcurrentModification { expected: i64 },
}

impl UpdateError {
    /// Rejected before any upstream call.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_)
                | Self::InvalidPrice(_)
                | Self::InvalidIdentifier { .. }
                | Self::InvalidQuantity { .. }
                | Self::InvalidMetafield(_)
        )
    }

    /// Some writes may have been applied.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        matches!(
            self,
            Self::PartialUpdate { .. } | Self::ConcurrentModification { .. }
        )
    }
}

/// Metafield values keyed by metafield key, collected from `metafield_<key>`
/// form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetafieldEdits(BTreeMap<String, String>);

impl MetafieldEdits {
    /// Collect and validate metafield fields from a form.
    ///
    /// # Errors
    ///
    /// Returns `UpdateError::InvalidMetafield` for an empty key or a key with
    /// characters other than ASCII letters, digits, `_` and `-`.
    pub fn from_form(form: &HashMap<String, String>) -> Result<Self, UpdateError> {
        let mut edits = Self::default();
        for (name, value) in form {
            if let Some(key) = name.strip_prefix(fields::METAFIELD_PREFIX) {
                edits.insert(key, value)?;
            }
        }
        Ok(edits)
    }

    /// Add or replace one metafield value.
    ///
    /// # Errors
    ///
    /// Returns `UpdateError::InvalidMetafield` for an invalid key.
    pub fn insert(&mut self, key: &str, value: &str) -> Result<(), UpdateError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(UpdateError::InvalidMetafield(key.to_string()));
        }
        self.0.insert(key.to_string(), value.to_string());
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Key/value pairs in key order.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, String)> {
        self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// A validated variant edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub variant_id: VariantGid,
    pub inventory_item_id: InventoryItemGid,
    pub price: Price,
    pub inventory: i64,
    /// Quantity the editor last saw; the inventory write is rejected if the
    /// live quantity differs.
    pub expected_prior_quantity: i64,
    pub location_id: LocationGid,
    pub metafields: MetafieldEdits,
}

impl UpdateRequest {
    /// Validate a submitted edit form.
    ///
    /// Checks run in order and stop at the first failure: required fields,
    /// price, identifiers, quantities, metafield keys.
    ///
    /// # Errors
    ///
    /// Returns the validation `UpdateError` of the first failing check.
    pub fn from_form(form: &HashMap<String, String>) -> Result<Self, UpdateError> {
        let value = |name: &str| form.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

        let missing: Vec<&'static str> = fields::REQUIRED
            .into_iter()
            .filter(|name| value(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(UpdateError::MissingField(missing));
        }
        let field = |name: &str| value(name).unwrap_or_default();

        let price = Price::parse(field(fields::PRICE))?;

        let variant_id = parse_gid::<VariantGid>(fields::VARIANT_ID, field(fields::VARIANT_ID))?;
        let inventory_item_id =
            parse_gid::<InventoryItemGid>(fields::INVENTORY_ITEM_ID, field(fields::INVENTORY_ITEM_ID))?;
        let location_id = parse_gid::<LocationGid>(fields::LOCATION, field(fields::LOCATION))?;

        let inventory = parse_whole(fields::INVENTORY, field(fields::INVENTORY))?;
        let expected_prior_quantity =
            parse_whole(fields::EXPECTED_QUANTITY, field(fields::EXPECTED_QUANTITY))?;

        let metafields = MetafieldEdits::from_form(form)?;

        Ok(Self {
            variant_id,
            inventory_item_id,
            price,
            inventory,
            expected_prior_quantity,
            location_id,
            metafields,
        })
    }
}

fn parse_gid<T: FromStr>(field: &'static str, value: &str) -> Result<T, UpdateError> {
    value.parse().map_err(|_| UpdateError::InvalidIdentifier {
        field,
        value: value.to_string(),
    })
}

/// Parse an integer, accepting a decimal form with a zero fraction (`"12.0"`).
fn parse_whole(field: &'static str, value: &str) -> Result<i64, UpdateError> {
    let invalid = || UpdateError::InvalidQuantity {
        field,
        value: value.to_string(),
    };
    if let Ok(n) = value.parse::<i64>() {
        return Ok(n);
    }
    let decimal = Decimal::from_str(value).map_err(|_| invalid())?;
    if !decimal.fract().is_zero() {
        return Err(invalid());
    }
    decimal.to_i64().ok_or_else(invalid)
}

/// Whether inventory user errors report a stale compare quantity.
fn is_stale_compare(errors: &[UserError]) -> bool {
    errors.iter().any(|e| {
        e.code.as_deref() == Some("COMPARE_QUANTITY_STALE")
            || e.message.to_ascii_lowercase().contains("compare quantity")
            || e.message.contains("compareQuantity")
    })
}

/// Applies [`UpdateRequest`]s through the Admin API.
#[derive(Debug, Clone)]
pub struct VariantUpdater {
    client: AdminClient,
}

impl VariantUpdater {
    #[must_use]
    pub const fn new(client: AdminClient) -> Self {
        Self { client }
    }

    /// Apply one edit to a variant of `product_id`.
    ///
    /// # Errors
    ///
    /// - `UpdateError::Price` if the price write fails; inventory is untouched
    /// - `UpdateError::ConcurrentModification` if inventory changed since the
    ///   edit was loaded
    /// - `UpdateError::PartialUpdate` if a later write fails
    #[instrument(
        skip(self, request),
        fields(product_id = %product_id, variant_id = %request.variant_id)
    )]
    pub async fn update(
        &self,
        product_id: ProductGid,
        request: UpdateRequest,
    ) -> Result<(), UpdateError> {
        self.client
            .update_variant_price(product_id, request.variant_id, &request.price)
            .await
            .map_err(|e| {
                warn!(error = %e, "Price update failed");
                UpdateError::Price(e)
            })?;

        let inventory = self
            .client
            .set_available_quantity(
                request.inventory_item_id,
                request.location_id,
                request.inventory,
                request.expected_prior_quantity,
            )
            .await;

        if let Err(e) = inventory {
            warn!(error = %e, "Inventory update failed after price was applied");
            return Err(match e {
                AdminShopifyError::UserErrors(ref errors) if is_stale_compare(errors) => {
                    UpdateError::ConcurrentModification {
                        expected: request.expected_prior_quantity,
                    }
                }
                source => UpdateError::PartialUpdate {
                    step: UpdateStep::Inventory,
                    source,
                },
            });
        }

        if !request.metafields.is_empty() {
            self.client
                .set_metafields(product_id, &request.metafields.entries())
                .await
                .map_err(|source| {
                    warn!(error = %source, "Metafield update failed after price and inventory were applied");
                    UpdateError::PartialUpdate {
                        step: UpdateStep::Metafields,
                        source,
                    }
                })?;
        }

        info!(
            price = %request.price,
            inventory = request.inventory,
            metafields = request.metafields.len(),
            "Variant updated"
        );
        Ok(())
    }
}
