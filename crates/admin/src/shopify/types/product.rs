//! Product domain types for Shopify Admin API.
//!
//! Snapshots returned by a query are never patched in place; after an edit
//! the caller fetches the product again.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shopdesk_core::ProductStatus;

use super::common::{Image, Money, PageInfo};

// =============================================================================
// Product Types
// =============================================================================

/// A product row in the paginated list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    /// Product global ID.
    pub id: String,
    /// Product title.
    pub title: String,
    /// Creation timestamp (ISO 8601).
    pub created_at: String,
    /// Featured image, if any.
    pub featured_image: Option<Image>,
}

/// Minimum and maximum variant prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub min_variant_price: Money,
    pub max_variant_price: Money,
}

/// Full product as shown on the detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    /// Product global ID.
    pub id: String,
    /// Product title.
    pub title: String,
    /// HTML description.
    pub description_html: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
    /// Product status.
    pub status: ProductStatus,
    /// Featured image.
    pub featured_image: Option<Image>,
    /// Price range across variants.
    pub price_range: PriceRange,
    /// Total inventory quantity across all variants.
    pub total_inventory: i64,
    /// Variants in Shopify's order.
    pub variants: Vec<Variant>,
}

impl ProductDetail {
    /// Look up a variant by global ID.
    #[must_use]
    pub fn variant(&self, id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == id)
    }

    /// Image media attached to variants, in variant order.
    ///
    /// Media without an image URL is skipped; missing alt text falls back to
    /// `Product image <n>`.
    #[must_use]
    pub fn gallery(&self) -> Vec<Image> {
        let mut images: Vec<Image> = Vec::new();
        for media in self.variants.iter().flat_map(|v| &v.media) {
            if media.media_content_type != "IMAGE" {
                continue;
            }
            let Some(url) = media.image_url.clone() else {
                continue;
            };
            let alt_text = media
                .alt
                .clone()
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| format!("Product image {}", images.len() + 1));
            images.push(Image {
                url,
                alt_text: Some(alt_text),
            });
        }
        images
    }

    /// Distinct values of the `color` option across variants, first seen first.
    #[must_use]
    pub fn color_options(&self) -> Vec<String> {
        let mut colors: Vec<String> = Vec::new();
        for variant in &self.variants {
            let color = variant
                .selected_options
                .iter()
                .find(|o| o.name.eq_ignore_ascii_case("color"));
            if let Some(option) = color
                && !colors.contains(&option.value)
            {
                colors.push(option.value.clone());
            }
        }
        colors
    }
}

/// A product variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    /// Variant global ID.
    pub id: String,
    /// Variant title (combination of option values).
    pub title: String,
    /// Current price as a decimal string.
    pub price: String,
    /// Cached "available" quantity. `inventory_item.inventory_levels` is the
    /// authoritative per-location source.
    pub inventory_quantity: i64,
    /// SKU code.
    pub sku: Option<String>,
    /// Weight value, when the inventory item has a measurement.
    pub weight: Option<Weight>,
    /// Option name/value pairs that identify this variant.
    pub selected_options: Vec<SelectedOption>,
    /// Inventory item and its per-location levels.
    pub inventory_item: InventoryItem,
    /// Media attached to the variant.
    pub media: Vec<VariantMedia>,
    /// Creation timestamp.
    pub created_at: Option<String>,
    /// Last update timestamp.
    pub updated_at: Option<String>,
}

impl Variant {
    /// Inventory level at a location.
    #[must_use]
    pub fn level_at(&self, location_id: &str) -> Option<&InventoryLevel> {
        self.inventory_item
            .inventory_levels
            .iter()
            .find(|l| l.location.id == location_id)
    }

    /// "available" quantity at a location.
    #[must_use]
    pub fn available_at(&self, location_id: &str) -> Option<i64> {
        self.level_at(location_id).and_then(InventoryLevel::available)
    }
}

/// Variant weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub value: f64,
    /// `GRAMS`, `KILOGRAMS`, `OUNCES` or `POUNDS`.
    pub unit: String,
}

/// A selected product option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    pub name: String,
    pub value: String,
}

/// Media attached to a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantMedia {
    /// `IMAGE`, `VIDEO`, `EXTERNAL_VIDEO` or `MODEL_3D`.
    pub media_content_type: String,
    pub alt: Option<String>,
    pub image_url: Option<String>,
}

/// Inventory item backing a variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    /// Inventory item global ID.
    pub id: String,
    /// Levels at each stocking location.
    pub inventory_levels: Vec<InventoryLevel>,
}

/// Inventory at a single location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryLevel {
    /// Inventory level global ID.
    pub id: String,
    /// Stocking location.
    pub location: Location,
    /// Named quantities (`available`, `on_hand`, `committed`, ...).
    pub quantities: Vec<NamedQuantity>,
}

impl InventoryLevel {
    /// Quantity with the given name.
    #[must_use]
    pub fn quantity(&self, name: &str) -> Option<i64> {
        self.quantities
            .iter()
            .find(|q| q.name == name)
            .map(|q| q.quantity)
    }

    /// The "available" quantity.
    #[must_use]
    pub fn available(&self) -> Option<i64> {
        self.quantity("available")
    }
}

/// A stocking location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
}

/// A named inventory quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedQuantity {
    pub name: String,
    pub quantity: i64,
}

/// A product together with its metafields flattened to `key -> value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product: ProductDetail,
    pub metafields: BTreeMap<String, String>,
}

// =============================================================================
// Dashboard Types
// =============================================================================

/// Product with the pricing fields the dashboard aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedProduct {
    pub id: String,
    pub title: String,
    pub total_inventory: i64,
    pub variants: Vec<PricedVariant>,
}

/// Variant price and compare-at price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedVariant {
    pub id: String,
    pub price: String,
    pub compare_at_price: Option<String>,
}

// =============================================================================
// Pagination Types
// =============================================================================

/// One page of the product list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    /// Products in this page.
    pub products: Vec<ProductSummary>,
    /// Pagination info.
    pub page_info: PageInfo,
}
