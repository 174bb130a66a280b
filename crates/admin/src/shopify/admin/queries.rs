//! GraphQL operations for the Shopify Admin API.
//!
//! Every document is a `const` string. Request-specific data is only ever
//! passed as a variable value, so no client-controlled text becomes part of a
//! document. Each operation implements [`graphql_client::GraphQLQuery`] with
//! hand-written `Variables`/`ResponseData` types in a module named after it.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Deserializer, Serialize};

/// Implement `GraphQLQuery` for an operation backed by a static document.
macro_rules! operation {
    ($name:ident, $module:ident, $document:ident, $operation_name:literal) => {
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $document,
                    operation_name: $operation_name,
                }
            }
        }
    };
}

// =============================================================================
// Shared response shapes
// =============================================================================

/// Relay connection reduced to its nodes.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
}

impl<T> Connection<T> {
    /// Consume the connection, yielding nodes in order.
    pub fn into_nodes(self) -> impl Iterator<Item = T> {
        self.edges.into_iter().map(|e| e.node)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

/// `userErrors` entry on a mutation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    /// Path to the offending input field.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub field: Vec<String>,
    /// Human-readable message.
    pub message: String,
    /// Machine-readable code, when the payload type exposes one.
    #[serde(default)]
    pub code: Option<String>,
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.field.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.field.join("."), self.message)
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// Product queries
// =============================================================================

pub const LIST_PRODUCTS: &str = r"query ListProducts($first: Int, $last: Int, $after: String, $before: String, $query: String, $sortKey: ProductSortKeys, $reverse: Boolean) {
  products(first: $first, last: $last, after: $after, before: $before, query: $query, sortKey: $sortKey, reverse: $reverse) {
    edges {
      node {
        id
        title
        createdAt
        featuredImage { url altText }
      }
      cursor
    }
    pageInfo {
      hasNextPage
      hasPreviousPage
      startCursor
      endCursor
    }
  }
}";

operation!(ListProducts, list_products, LIST_PRODUCTS, "ListProducts");

pub mod list_products {
    use serde::{Deserialize, Serialize};
    use shopdesk_core::SortKey;

    use crate::shopify::types::{Image, PageInfo};

    /// Variables for one page request. Absent cursors and limits are omitted
    /// from the JSON entirely.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub first: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub last: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub after: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub before: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub query: Option<String>,
        pub sort_key: SortKey,
        pub reverse: bool,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: ProductConnection,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductConnection {
        pub edges: Vec<super::Edge<ProductNode>>,
        pub page_info: PageInfo,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductNode {
        pub id: String,
        pub title: String,
        pub created_at: String,
        pub featured_image: Option<Image>,
    }
}

pub const GET_PRODUCT: &str = r#"query GetProduct($id: ID!) {
  product(id: $id) {
    id
    title
    descriptionHtml
    createdAt
    updatedAt
    status
    featuredImage { url altText }
    priceRangeV2 {
      minVariantPrice { amount currencyCode }
      maxVariantPrice { amount currencyCode }
    }
    totalInventory
    variants(first: 250) {
      edges {
        node {
          id
          title
          price
          inventoryQuantity
          sku
          createdAt
          updatedAt
          selectedOptions { name value }
          media(first: 10) {
            edges {
              node {
                mediaContentType
                alt
                ... on MediaImage { image { url } }
              }
            }
          }
          inventoryItem {
            id
            measurement { weight { value unit } }
            inventoryLevels(first: 10) {
              edges {
                node {
                  id
                  quantities(names: ["available", "incoming", "committed", "damaged", "on_hand", "quality_control", "reserved", "safety_stock"]) {
                    name
                    quantity
                  }
                  location { id name }
                }
              }
            }
          }
        }
      }
    }
    metafields(first: 10) {
      edges {
        node { id namespace key value type }
      }
    }
  }
}"#;

operation!(GetProduct, get_product, GET_PRODUCT, "GetProduct");

pub mod get_product {
    use serde::{Deserialize, Serialize};
    use shopdesk_core::ProductStatus;

    use super::Connection;
    use crate::shopify::types::{Image, Location, Metafield, Money, NamedQuantity, SelectedOption};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<ProductNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductNode {
        pub id: String,
        pub title: String,
        #[serde(default)]
        pub description_html: String,
        pub created_at: String,
        pub updated_at: String,
        pub status: ProductStatus,
        pub featured_image: Option<Image>,
        pub price_range_v2: PriceRangeNode,
        #[serde(default)]
        pub total_inventory: i64,
        pub variants: Connection<VariantNode>,
        pub metafields: Connection<Metafield>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PriceRangeNode {
        pub min_variant_price: Money,
        pub max_variant_price: Money,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VariantNode {
        pub id: String,
        pub title: String,
        pub price: String,
        pub inventory_quantity: Option<i64>,
        pub sku: Option<String>,
        pub created_at: Option<String>,
        pub updated_at: Option<String>,
        #[serde(default)]
        pub selected_options: Vec<SelectedOption>,
        pub media: Option<Connection<MediaNode>>,
        pub inventory_item: InventoryItemNode,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MediaNode {
        pub media_content_type: String,
        pub alt: Option<String>,
        pub image: Option<MediaImage>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct MediaImage {
        pub url: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InventoryItemNode {
        pub id: String,
        pub measurement: Option<MeasurementNode>,
        pub inventory_levels: Connection<InventoryLevelNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct MeasurementNode {
        pub weight: Option<WeightNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct WeightNode {
        pub value: f64,
        pub unit: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct InventoryLevelNode {
        pub id: String,
        #[serde(default)]
        pub quantities: Vec<NamedQuantity>,
        pub location: Location,
    }
}

pub const DASHBOARD_PRODUCTS: &str = r"query DashboardProducts($first: Int!) {
  products(first: $first) {
    edges {
      node {
        id
        title
        totalInventory
        variants(first: 250) {
          edges {
            node { id price compareAtPrice }
          }
        }
      }
    }
  }
}";

operation!(DashboardProducts, dashboard_products, DASHBOARD_PRODUCTS, "DashboardProducts");

pub mod dashboard_products {
    use serde::{Deserialize, Serialize};

    use super::Connection;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: Connection<ProductNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductNode {
        pub id: String,
        pub title: String,
        pub total_inventory: Option<i64>,
        pub variants: Connection<VariantNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VariantNode {
        pub id: String,
        pub price: String,
        pub compare_at_price: Option<String>,
    }
}

// =============================================================================
// Product mutations
// =============================================================================

pub const UPDATE_VARIANT_PRICE: &str = r"mutation UpdateVariantPrice($productId: ID!, $variants: [ProductVariantsBulkInput!]!) {
  productVariantsBulkUpdate(productId: $productId, variants: $variants) {
    product { id }
    productVariants { id price }
    userErrors { field message code }
  }
}";

operation!(UpdateVariantPrice, update_variant_price, UPDATE_VARIANT_PRICE, "UpdateVariantPrice");

pub mod update_variant_price {
    use serde::{Deserialize, Serialize};

    use super::UserError;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub product_id: String,
        pub variants: Vec<VariantPriceInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct VariantPriceInput {
        pub id: String,
        /// Decimal string with two places.
        pub price: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub product_variants_bulk_update: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub product_variants: Option<Vec<UpdatedVariant>>,
        #[serde(default)]
        pub user_errors: Vec<UserError>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct UpdatedVariant {
        pub id: String,
        pub price: String,
    }
}

pub const SET_INVENTORY_QUANTITY: &str = r"mutation SetInventoryQuantity($input: InventorySetQuantitiesInput!) {
  inventorySetQuantities(input: $input) {
    inventoryAdjustmentGroup {
      createdAt
      reason
      changes { name delta }
    }
    userErrors { field message code }
  }
}";

operation!(SetInventoryQuantity, set_inventory_quantity, SET_INVENTORY_QUANTITY, "SetInventoryQuantity");

pub mod set_inventory_quantity {
    use serde::{Deserialize, Serialize};

    use super::UserError;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: InventorySetQuantitiesInput,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct InventorySetQuantitiesInput {
        /// Quantity name being set (`available`).
        pub name: String,
        pub reason: String,
        pub quantities: Vec<InventoryQuantityInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InventoryQuantityInput {
        pub inventory_item_id: String,
        pub location_id: String,
        pub quantity: i64,
        /// Expected live quantity; Shopify rejects the write on mismatch.
        pub compare_quantity: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub inventory_set_quantities: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub inventory_adjustment_group: Option<AdjustmentGroup>,
        #[serde(default)]
        pub user_errors: Vec<UserError>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AdjustmentGroup {
        pub created_at: String,
        pub reason: String,
        #[serde(default)]
        pub changes: Vec<Change>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Change {
        pub name: String,
        pub delta: i64,
    }
}

pub const SET_METAFIELDS: &str = r"mutation SetMetafields($metafields: [MetafieldsSetInput!]!) {
  metafieldsSet(metafields: $metafields) {
    metafields { key value }
    userErrors { field message code }
  }
}";

operation!(SetMetafields, set_metafields, SET_METAFIELDS, "SetMetafields");

pub mod set_metafields {
    use serde::{Deserialize, Serialize};

    use super::UserError;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub metafields: Vec<MetafieldsSetInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MetafieldsSetInput {
        pub owner_id: String,
        pub namespace: String,
        pub key: String,
        pub value: String,
        #[serde(rename = "type")]
        pub kind: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub metafields_set: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        #[serde(default)]
        pub user_errors: Vec<UserError>,
    }
}

// =============================================================================
// Webhook subscriptions
// =============================================================================

pub const CREATE_WEBHOOK_SUBSCRIPTION: &str = r"mutation CreateWebhookSubscription($topic: WebhookSubscriptionTopic!, $webhookSubscription: WebhookSubscriptionInput!) {
  webhookSubscriptionCreate(topic: $topic, webhookSubscription: $webhookSubscription) {
    webhookSubscription {
      id
      topic
      format
    }
    userErrors { field message }
  }
}";

operation!(
    CreateWebhookSubscription,
    create_webhook_subscription,
    CREATE_WEBHOOK_SUBSCRIPTION,
    "CreateWebhookSubscription"
);

pub mod create_webhook_subscription {
    use serde::{Deserialize, Serialize};

    use super::UserError;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub topic: String,
        pub webhook_subscription: WebhookSubscriptionInput,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WebhookSubscriptionInput {
        pub callback_url: String,
        pub format: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub webhook_subscription_create: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub webhook_subscription: Option<Subscription>,
        #[serde(default)]
        pub user_errors: Vec<UserError>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Subscription {
        pub id: String,
        pub topic: String,
    }
}
