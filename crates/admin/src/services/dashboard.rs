//! Store-wide product statistics.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use crate::shopify::{AdminClient, AdminShopifyError, PricedProduct, PricedVariant};

/// Products sampled for the dashboard.
pub const DASHBOARD_SAMPLE: i64 = 250;

/// Aggregated counts over the sampled products.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: usize,
    pub total_variants: usize,
    pub total_inventory: i64,
    /// Products with at least one variant on sale.
    pub products_on_sale: usize,
    pub variants_on_sale: usize,
}

impl DashboardStats {
    #[must_use]
    pub fn from_products(products: &[PricedProduct]) -> Self {
        let mut stats = Self {
            total_products: products.len(),
            ..Self::default()
        };
        for product in products {
            let on_sale = product.variants.iter().filter(|v| is_on_sale(v)).count();
            stats.total_variants += product.variants.len();
            stats.total_inventory += product.total_inventory;
            stats.variants_on_sale += on_sale;
            if on_sale > 0 {
                stats.products_on_sale += 1;
            }
        }
        stats
    }
}

/// A variant is on sale when it has a positive compare-at price above its
/// price. Unparseable amounts count as zero.
#[must_use]
pub fn is_on_sale(variant: &PricedVariant) -> bool {
    let amount = |s: &str| Decimal::from_str(s.trim()).unwrap_or(Decimal::ZERO);
    let price = amount(&variant.price);
    let compare_at = variant.compare_at_price.as_deref().map_or(Decimal::ZERO, amount);
    compare_at > Decimal::ZERO && price < compare_at
}

/// Fetch the sample and aggregate it.
///
/// # Errors
///
/// Returns the Admin API error if the fetch fails.
#[instrument(skip(client))]
pub async fn load_stats(client: &AdminClient) -> Result<DashboardStats, AdminShopifyError> {
    let products = client.dashboard_products(DASHBOARD_SAMPLE).await?;
    Ok(DashboardStats::from_products(&products))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(price: &str, compare_at: Option<&str>) -> PricedVariant {
        PricedVariant {
            id: "gid://shopify/ProductVariant/1".to_string(),
            price: price.to_string(),
            compare_at_price: compare_at.map(str::to_string),
        }
    }

    fn product(inventory: i64, variants: Vec<PricedVariant>) -> PricedProduct {
        PricedProduct {
            id: "gid://shopify/Product/1".to_string(),
            title: "Mug".to_string(),
            total_inventory: inventory,
            variants,
        }
    }

    #[test]
    fn test_on_sale_rules() {
        assert!(is_on_sale(&variant("8.00", Some("10.00"))));
        assert!(!is_on_sale(&variant("10.00", Some("10.00"))));
        assert!(!is_on_sale(&variant("8.00", None)));
        assert!(!is_on_sale(&variant("8.00", Some("0.00"))));
        assert!(!is_on_sale(&variant("12.00", Some("10.00"))));
    }

    #[test]
    fn test_stats_aggregate() {
        let stats = DashboardStats::from_products(&[
            product(
                5,
                vec![variant("8.00", Some("10.00")), variant("9.00", Some("10.00"))],
            ),
            product(3, vec![variant("4.00", None)]),
            product(0, vec![]),
        ]);

        assert_eq!(
            stats,
            DashboardStats {
                total_products: 3,
                total_variants: 3,
                total_inventory: 8,
                products_on_sale: 1,
                variants_on_sale: 2,
            }
        );
    }

    #[test]
    fn test_stats_json_is_camel_case() {
        let json = serde_json::to_value(DashboardStats::default()).unwrap();
        assert_eq!(json["productsOnSale"], 0);
        assert_eq!(json["totalVariants"], 0);
    }
}
