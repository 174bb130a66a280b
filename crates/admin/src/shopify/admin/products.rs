//! Product reads and writes for the Admin API.

use shopdesk_core::{Price, ProductGid, VariantGid};
use tracing::instrument;

use super::{
    AdminClient, AdminShopifyError, check_user_errors,
    conversions::{convert_metafields, convert_product, convert_product_page},
    missing_payload,
    queries::{
        DashboardProducts, GetProduct, ListProducts, SetMetafields, UpdateVariantPrice,
        dashboard_products, get_product, list_products, set_metafields, update_variant_price,
    },
};
use crate::shopify::types::{PricedProduct, PricedVariant, ProductPage, ProductSnapshot};

/// Namespace for metafields written from the edit form.
pub const METAFIELD_NAMESPACE: &str = "custom";

/// Type for metafields written from the edit form.
pub const METAFIELD_TYPE: &str = "single_line_text_field";

impl AdminClient {
    /// Fetch one page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self, variables), fields(query = ?variables.query, sort_key = variables.sort_key.as_str()))]
    pub async fn list_products(
        &self,
        variables: list_products::Variables,
    ) -> Result<ProductPage, AdminShopifyError> {
        let response = self.execute::<ListProducts>(variables).await?;
        Ok(convert_product_page(response.products))
    }

    /// Fetch a product with variants, inventory levels and metafields.
    ///
    /// Returns `Ok(None)` when no product has this ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(
        &self,
        id: ProductGid,
    ) -> Result<Option<ProductSnapshot>, AdminShopifyError> {
        let variables = get_product::Variables { id: id.to_gid() };
        let response = self.execute::<GetProduct>(variables).await?;

        Ok(response.product.map(|node| {
            let (product, metafields) = convert_product(node);
            ProductSnapshot {
                product,
                metafields: convert_metafields(metafields),
            }
        }))
    }

    /// Set a single variant's price.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::UserErrors` when Shopify rejects the input,
    /// or any transport/GraphQL error.
    #[instrument(skip(self), fields(product_id = %product_id, variant_id = %variant_id, price = %price))]
    pub async fn update_variant_price(
        &self,
        product_id: ProductGid,
        variant_id: VariantGid,
        price: &Price,
    ) -> Result<(), AdminShopifyError> {
        let variables = update_variant_price::Variables {
            product_id: product_id.to_gid(),
            variants: vec![update_variant_price::VariantPriceInput {
                id: variant_id.to_gid(),
                price: price.to_fixed_2(),
            }],
        };

        let response = self.execute::<UpdateVariantPrice>(variables).await?;
        let payload = response
            .product_variants_bulk_update
            .ok_or_else(|| missing_payload("productVariantsBulkUpdate"))?;
        check_user_errors(payload.user_errors)
    }

    /// Write text metafields on a product.
    ///
    /// An empty `entries` slice issues no request.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::UserErrors` when Shopify rejects any entry.
    #[instrument(skip(self, entries), fields(product_id = %owner, count = entries.len()))]
    pub async fn set_metafields(
        &self,
        owner: ProductGid,
        entries: &[(String, String)],
    ) -> Result<(), AdminShopifyError> {
        if entries.is_empty() {
            return Ok(());
        }

        let owner_id = owner.to_gid();
        let variables = set_metafields::Variables {
            metafields: entries
                .iter()
                .map(|(key, value)| set_metafields::MetafieldsSetInput {
                    owner_id: owner_id.clone(),
                    namespace: METAFIELD_NAMESPACE.to_string(),
                    key: key.clone(),
                    value: value.clone(),
                    kind: METAFIELD_TYPE.to_string(),
                })
                .collect(),
        };

        let response = self.execute::<SetMetafields>(variables).await?;
        let payload = response
            .metafields_set
            .ok_or_else(|| missing_payload("metafieldsSet"))?;
        check_user_errors(payload.user_errors)
    }

    /// Fetch the first `first` products with variant pricing.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self))]
    pub async fn dashboard_products(
        &self,
        first: i64,
    ) -> Result<Vec<PricedProduct>, AdminShopifyError> {
        let response = self
            .execute::<DashboardProducts>(dashboard_products::Variables { first })
            .await?;

        Ok(response
            .products
            .into_nodes()
            .map(|p| PricedProduct {
                id: p.id,
                title: p.title,
                total_inventory: p.total_inventory.unwrap_or(0),
                variants: p
                    .variants
                    .into_nodes()
                    .map(|v| PricedVariant {
                        id: v.id,
                        price: v.price,
                        compare_at_price: v.compare_at_price,
                    })
                    .collect(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use shopdesk_core::SortKey;

    use super::*;
    use crate::shopify::admin::gateway::testing::ScriptedGateway;

    fn client(gateway: &Arc<ScriptedGateway>) -> AdminClient {
        AdminClient::new(gateway.clone())
    }

    #[tokio::test]
    async fn test_list_products_sends_variables_verbatim() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_data(json!({
            "products": {
                "edges": [],
                "pageInfo": {"hasNextPage": false, "hasPreviousPage": false}
            }
        }));

        let page = client(&gateway)
            .list_products(list_products::Variables {
                first: Some(5),
                last: None,
                after: Some("abc".to_string()),
                before: None,
                query: Some("title:*shirt*".to_string()),
                sort_key: SortKey::CreatedAt,
                reverse: true,
            })
            .await
            .unwrap();

        assert!(page.products.is_empty());
        let requests = gateway.requests();
        assert_eq!(requests[0].operation_name, "ListProducts");
        // Search input travels only in variables; the document is fixed.
        assert_eq!(requests[0].query, crate::shopify::admin::queries::LIST_PRODUCTS);
        assert!(!requests[0].query.contains("shirt"));
        assert_eq!(
            requests[0].variables,
            json!({
                "first": 5,
                "after": "abc",
                "query": "title:*shirt*",
                "sortKey": "CREATED_AT",
                "reverse": true
            })
        );
    }

    #[tokio::test]
    async fn test_get_product_missing_is_none() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_data(json!({"product": null}));

        let result = client(&gateway).get_product(ProductGid::new(9)).await.unwrap();

        assert!(result.is_none());
        assert_eq!(
            gateway.requests()[0].variables,
            json!({"id": "gid://shopify/Product/9"})
        );
    }

    #[tokio::test]
    async fn test_update_price_formats_two_decimals() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_data(json!({
            "productVariantsBulkUpdate": {
                "productVariants": [{"id": "gid://shopify/ProductVariant/2", "price": "19.90"}],
                "userErrors": []
            }
        }));

        client(&gateway)
            .update_variant_price(
                ProductGid::new(1),
                VariantGid::new(2),
                &Price::parse("19.9").unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            gateway.requests()[0].variables,
            json!({
                "productId": "gid://shopify/Product/1",
                "variants": [{"id": "gid://shopify/ProductVariant/2", "price": "19.90"}]
            })
        );
    }

    #[tokio::test]
    async fn test_update_price_surfaces_user_errors() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_data(json!({
            "productVariantsBulkUpdate": {
                "productVariants": null,
                "userErrors": [{"field": ["variants", "0", "price"], "message": "Price is too big", "code": "INVALID"}]
            }
        }));

        let err = client(&gateway)
            .update_variant_price(ProductGid::new(1), VariantGid::new(2), &Price::parse("1").unwrap())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "User error: variants.0.price: Price is too big"
        );
    }

    #[tokio::test]
    async fn test_set_metafields_empty_is_noop() {
        let gateway = Arc::new(ScriptedGateway::new());
        client(&gateway).set_metafields(ProductGid::new(1), &[]).await.unwrap();
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn test_set_metafields_uses_text_type() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_data(json!({"metafieldsSet": {"metafields": [], "userErrors": []}}));

        client(&gateway)
            .set_metafields(
                ProductGid::new(1),
                &[("material".to_string(), "linen".to_string())],
            )
            .await
            .unwrap();

        assert_eq!(
            gateway.requests()[0].variables["metafields"][0],
            json!({
                "ownerId": "gid://shopify/Product/1",
                "namespace": "custom",
                "key": "material",
                "value": "linen",
                "type": "single_line_text_field"
            })
        );
    }

    #[tokio::test]
    async fn test_dashboard_products_defaults_missing_inventory() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_data(json!({
            "products": {"edges": [{"node": {
                "id": "gid://shopify/Product/1",
                "title": "Gift card",
                "totalInventory": null,
                "variants": {"edges": [{"node": {
                    "id": "gid://shopify/ProductVariant/1",
                    "price": "25.00",
                    "compareAtPrice": null
                }}]}
            }}]}
        }));

        let products = client(&gateway).dashboard_products(250).await.unwrap();

        assert_eq!(products[0].total_inventory, 0);
        assert_eq!(products[0].variants[0].compare_at_price, None);
        assert_eq!(gateway.requests()[0].variables, json!({"first": 250}));
    }
}
