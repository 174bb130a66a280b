//! Product type conversion functions.

use std::collections::BTreeMap;

use crate::shopify::types::{
    Image, InventoryItem, InventoryLevel, Metafield, PriceRange, ProductDetail, ProductPage,
    ProductSummary, Variant, VariantMedia, Weight,
};

use super::super::queries::{Connection, get_product, list_products};

// =============================================================================
// ListProducts conversions
// =============================================================================

pub fn convert_product_page(connection: list_products::ProductConnection) -> ProductPage {
    ProductPage {
        products: connection
            .edges
            .into_iter()
            .map(|e| ProductSummary {
                id: e.node.id,
                title: e.node.title,
                created_at: e.node.created_at,
                featured_image: e.node.featured_image,
            })
            .collect(),
        page_info: connection.page_info,
    }
}

// =============================================================================
// GetProduct conversions
// =============================================================================

/// Convert a product node, returning the product and its raw metafields.
pub fn convert_product(product: get_product::ProductNode) -> (ProductDetail, Vec<Metafield>) {
    let metafields = product.metafields.into_nodes().collect();
    let detail = ProductDetail {
        id: product.id,
        title: product.title,
        description_html: product.description_html,
        created_at: product.created_at,
        updated_at: product.updated_at,
        status: product.status,
        featured_image: product.featured_image,
        price_range: PriceRange {
            min_variant_price: product.price_range_v2.min_variant_price,
            max_variant_price: product.price_range_v2.max_variant_price,
        },
        total_inventory: product.total_inventory,
        variants: product.variants.into_nodes().map(convert_variant).collect(),
    };
    (detail, metafields)
}

/// Flatten metafields into a key -> value mapping. Later keys win.
pub fn convert_metafields(metafields: Vec<Metafield>) -> BTreeMap<String, String> {
    metafields.into_iter().map(|m| (m.key, m.value)).collect()
}

fn convert_variant(v: get_product::VariantNode) -> Variant {
    let weight = v
        .inventory_item
        .measurement
        .and_then(|m| m.weight)
        .map(|w| Weight {
            value: w.value,
            unit: w.unit,
        });

    Variant {
        id: v.id,
        title: v.title,
        price: v.price,
        inventory_quantity: v.inventory_quantity.unwrap_or(0),
        sku: v.sku.filter(|s| !s.is_empty()),
        weight,
        selected_options: v.selected_options,
        inventory_item: InventoryItem {
            id: v.inventory_item.id,
            inventory_levels: v
                .inventory_item
                .inventory_levels
                .into_nodes()
                .map(|l| InventoryLevel {
                    id: l.id,
                    location: l.location,
                    quantities: l.quantities,
                })
                .collect(),
        },
        media: v
            .media
            .map(convert_media)
            .unwrap_or_default(),
        created_at: v.created_at,
        updated_at: v.updated_at,
    }
}

fn convert_media(media: Connection<get_product::MediaNode>) -> Vec<VariantMedia> {
    media
        .into_nodes()
        .map(|m| VariantMedia {
            media_content_type: m.media_content_type,
            alt: m.alt,
            image_url: m.image.map(|i| i.url),
        })
        .collect()
}
