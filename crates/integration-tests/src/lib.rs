//! Integration tests for shopdesk.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopdesk-integration-tests
//! ```
//!
//! No network access is needed: [`FakeShop`] implements the Admin API
//! gateway in memory. It interprets each operation's variables the way
//! Shopify does for the subset shopdesk uses (title search, sort keys,
//! cursor windows, compare-and-swap inventory writes), so scenarios can check
//! the store's state after a sequence of calls.
//!
//! # Test Categories
//!
//! - `pagination` - Paginator and sync controller list behaviour
//! - `variant_update` - Update transaction, partial failures, concurrency
//! - `http` - Router end to end, including webhooks

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use serde_json::{Value, json};
use shopdesk_admin::shopify::{
    AdminClient, AdminGateway, AdminShopifyError, GraphQLError, GraphQLRequest,
};
use shopdesk_core::numeric_suffix;

/// Location every seeded variant is stocked at.
pub const MAIN_LOCATION: u64 = 1;

/// Quantity every seeded variant starts with.
pub const SEEDED_QUANTITY: i64 = 10;

/// Shopify's code for a rejected compare-and-swap inventory write.
pub const STALE_CODE: &str = "COMPARE_QUANTITY_STALE";

/// A product held by [`FakeShop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeProduct {
    pub id: u64,
    pub title: String,
    pub created_at: String,
    pub variants: Vec<FakeVariant>,
    pub metafields: BTreeMap<String, String>,
}

impl FakeProduct {
    /// Total available quantity across variants and locations.
    #[must_use]
    pub fn total_inventory(&self) -> i64 {
        self.variants.iter().map(FakeVariant::total).sum()
    }
}

/// A variant held by [`FakeShop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeVariant {
    pub id: u64,
    pub title: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub inventory_item_id: u64,
    /// Available quantity per location ID.
    pub levels: BTreeMap<u64, i64>,
}

impl FakeVariant {
    fn total(&self) -> i64 {
        self.levels.values().sum()
    }

    /// Available quantity at a location.
    #[must_use]
    pub fn available(&self, location: u64) -> Option<i64> {
        self.levels.get(&location).copied()
    }
}

/// A request observed by [`FakeShop`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub operation_name: &'static str,
    pub variables: Value,
}

/// Subscription created through the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeWebhook {
    pub topic: String,
    pub callback_url: String,
}

#[derive(Default)]
struct ShopState {
    products: Vec<FakeProduct>,
    requests: Vec<RecordedRequest>,
    webhooks: Vec<FakeWebhook>,
    inventory_rejection: Option<Value>,
    offline: bool,
}

/// In-memory Shopify store behind the [`AdminGateway`] seam.
#[derive(Default)]
pub struct FakeShop {
    state: Mutex<ShopState>,
}

impl FakeShop {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A shop with one product per title, IDs from 1, created one day apart
    /// in title order. Product `n` has variant `100 + n` on inventory item
    /// `200 + n`, priced `10.00`, with [`SEEDED_QUANTITY`] at
    /// [`MAIN_LOCATION`].
    #[must_use]
    pub fn seeded(titles: &[&str]) -> Self {
        let shop = Self::new();
        for (n, title) in (1_u64..).zip(titles) {
            shop.add_product(FakeProduct {
                id: n,
                title: (*title).to_string(),
                created_at: format!("2024-01-{n:02}T00:00:00Z"),
                variants: vec![FakeVariant {
                    id: 100 + n,
                    title: "Default Title".to_string(),
                    price: "10.00".to_string(),
                    compare_at_price: None,
                    inventory_item_id: 200 + n,
                    levels: BTreeMap::from([(MAIN_LOCATION, SEEDED_QUANTITY)]),
                }],
                metafields: BTreeMap::new(),
            });
        }
        shop
    }

    /// Shared handle plus an [`AdminClient`] talking to it.
    #[must_use]
    pub fn into_client(self) -> (Arc<Self>, AdminClient) {
        let shop = Arc::new(self);
        let client = AdminClient::new(shop.clone());
        (shop, client)
    }

    pub fn add_product(&self, product: FakeProduct) {
        self.lock().products.push(product);
    }

    #[must_use]
    pub fn product(&self, id: u64) -> Option<FakeProduct> {
        self.lock().products.iter().find(|p| p.id == id).cloned()
    }

    #[must_use]
    pub fn variant(&self, id: u64) -> Option<FakeVariant> {
        self.lock()
            .products
            .iter()
            .flat_map(|p| &p.variants)
            .find(|v| v.id == id)
            .cloned()
    }

    /// Change stock behind the admin's back, as another editor would.
    pub fn set_available(&self, inventory_item_id: u64, location: u64, quantity: i64) {
        let mut state = self.lock();
        if let Some(variant) = state.variant_by_item(inventory_item_id) {
            variant.levels.insert(location, quantity);
        }
    }

    /// Reject the next inventory write with this user error.
    pub fn reject_next_inventory_write(&self, message: &str, code: &str) {
        self.lock().inventory_rejection = Some(json!({
            "field": ["input", "quantities", "0", "quantity"],
            "message": message,
            "code": code,
        }));
    }

    /// Fail every request at the transport level while set.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Operation names of all requests so far, in order.
    #[must_use]
    pub fn operations(&self) -> Vec<&'static str> {
        self.lock().requests.iter().map(|r| r.operation_name).collect()
    }

    #[must_use]
    pub fn webhooks(&self) -> Vec<FakeWebhook> {
        self.lock().webhooks.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ShopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, request: GraphQLRequest) -> Result<Value, AdminShopifyError> {
        let mut state = self.lock();
        state.requests.push(RecordedRequest {
            operation_name: request.operation_name,
            variables: request.variables.clone(),
        });
        if state.offline {
            return Err(AdminShopifyError::Transport {
                status: 503,
                reason: "Service Unavailable".to_string(),
            });
        }

        let variables = &request.variables;
        match request.operation_name {
            "ListProducts" => Ok(state.list_products(variables)),
            "GetProduct" => Ok(state.get_product(variables)),
            "DashboardProducts" => Ok(state.dashboard_products(variables)),
            "UpdateVariantPrice" => Ok(state.update_variant_price(variables)),
            "SetInventoryQuantity" => Ok(state.set_inventory_quantity(variables)),
            "SetMetafields" => Ok(state.set_metafields(variables)),
            "CreateWebhookSubscription" => Ok(state.create_webhook(variables)),
            other => Err(AdminShopifyError::GraphQL(vec![GraphQLError::message(
                format!("Unknown operation {other}"),
            )])),
        }
    }
}

impl AdminGateway for FakeShop {
    fn execute(&self, request: GraphQLRequest) -> BoxFuture<'_, Result<Value, AdminShopifyError>> {
        let result = self.handle(request);
        Box::pin(async move { result })
    }
}

fn gid(resource: &str, id: u64) -> String {
    format!("gid://shopify/{resource}/{id}")
}

fn cursor(product: &FakeProduct) -> String {
    format!("cursor-{}", product.id)
}

fn suffix(value: &Value) -> Option<u64> {
    value.as_str().and_then(numeric_suffix)
}

fn limit(value: &Value) -> usize {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0)
}

fn price_value(price: &str) -> f64 {
    price.parse().unwrap_or(0.0)
}

impl ShopState {
    fn variant_by_item(&mut self, inventory_item_id: u64) -> Option<&mut FakeVariant> {
        self.products
            .iter_mut()
            .flat_map(|p| p.variants.iter_mut())
            .find(|v| v.inventory_item_id == inventory_item_id)
    }

    fn list_products(&self, variables: &Value) -> Value {
        let term = variables["query"]
            .as_str()
            .and_then(|q| q.strip_prefix("title:*"))
            .and_then(|q| q.strip_suffix('*'))
            .map(str::to_lowercase);

        let mut items: Vec<&FakeProduct> = self
            .products
            .iter()
            .filter(|p| {
                term.as_deref()
                    .is_none_or(|t| p.title.to_lowercase().contains(t))
            })
            .collect();
        match variables["sortKey"].as_str() {
            Some("CREATED_AT") => items.sort_by(|a, b| {
                a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))
            }),
            _ => items.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id))),
        }
        if variables["reverse"].as_bool() == Some(true) {
            items.reverse();
        }

        let position = |c: &str| items.iter().position(|p| cursor(p) == c);
        let (start, end) = if let Some(before) = variables["before"].as_str() {
            let end = position(before).unwrap_or(0);
            (end.saturating_sub(limit(&variables["last"])), end)
        } else {
            let start = variables["after"]
                .as_str()
                .and_then(position)
                .map_or(0, |i| i + 1);
            (start, (start + limit(&variables["first"])).min(items.len()))
        };
        let window = items.get(start..end).unwrap_or_default();

        let edges: Vec<Value> = window
            .iter()
            .map(|p| {
                json!({
                    "node": {
                        "id": gid("Product", p.id),
                        "title": p.title,
                        "createdAt": p.created_at,
                        "featuredImage": null
                    },
                    "cursor": cursor(p)
                })
            })
            .collect();

        json!({
            "products": {
                "edges": edges,
                "pageInfo": {
                    "hasNextPage": end < items.len(),
                    "hasPreviousPage": start > 0,
                    "startCursor": window.first().map(|p| cursor(p)),
                    "endCursor": window.last().map(|p| cursor(p))
                }
            }
        })
    }

    fn get_product(&self, variables: &Value) -> Value {
        let product = suffix(&variables["id"])
            .and_then(|id| self.products.iter().find(|p| p.id == id));
        let Some(product) = product else {
            return json!({ "product": null });
        };

        let prices: Vec<&str> = product.variants.iter().map(|v| v.price.as_str()).collect();
        let min = prices
            .iter()
            .copied()
            .min_by(|a, b| price_value(a).total_cmp(&price_value(b)))
            .unwrap_or("0.00");
        let max = prices
            .iter()
            .copied()
            .max_by(|a, b| price_value(a).total_cmp(&price_value(b)))
            .unwrap_or("0.00");

        let variants: Vec<Value> = product
            .variants
            .iter()
            .map(|v| {
                let levels: Vec<Value> = v
                    .levels
                    .iter()
                    .map(|(location, quantity)| {
                        json!({"node": {
                            "id": format!("gid://shopify/InventoryLevel/{}{location}", v.inventory_item_id),
                            "quantities": [{"name": "available", "quantity": quantity}],
                            "location": {"id": gid("Location", *location), "name": format!("Location {location}")}
                        }})
                    })
                    .collect();
                json!({"node": {
                    "id": gid("ProductVariant", v.id),
                    "title": v.title,
                    "price": v.price,
                    "inventoryQuantity": v.total(),
                    "sku": null,
                    "createdAt": null,
                    "updatedAt": null,
                    "selectedOptions": [{"name": "Title", "value": v.title}],
                    "media": {"edges": []},
                    "inventoryItem": {
                        "id": gid("InventoryItem", v.inventory_item_id),
                        "measurement": null,
                        "inventoryLevels": {"edges": levels}
                    }
                }})
            })
            .collect();

        let metafields: Vec<Value> = product
            .metafields
            .iter()
            .map(|(key, value)| {
                json!({"node": {
                    "id": null,
                    "namespace": "custom",
                    "key": key,
                    "value": value,
                    "type": "single_line_text_field"
                }})
            })
            .collect();

        json!({
            "product": {
                "id": gid("Product", product.id),
                "title": product.title,
                "descriptionHtml": "",
                "createdAt": product.created_at,
                "updatedAt": product.created_at,
                "status": "ACTIVE",
                "featuredImage": null,
                "priceRangeV2": {
                    "minVariantPrice": {"amount": min, "currencyCode": "USD"},
                    "maxVariantPrice": {"amount": max, "currencyCode": "USD"}
                },
                "totalInventory": product.total_inventory(),
                "variants": {"edges": variants},
                "metafields": {"edges": metafields}
            }
        })
    }

    fn dashboard_products(&self, variables: &Value) -> Value {
        let edges: Vec<Value> = self
            .products
            .iter()
            .take(limit(&variables["first"]))
            .map(|p| {
                let variants: Vec<Value> = p
                    .variants
                    .iter()
                    .map(|v| {
                        json!({"node": {
                            "id": gid("ProductVariant", v.id),
                            "price": v.price,
                            "compareAtPrice": v.compare_at_price
                        }})
                    })
                    .collect();
                json!({"node": {
                    "id": gid("Product", p.id),
                    "title": p.title,
                    "totalInventory": p.total_inventory(),
                    "variants": {"edges": variants}
                }})
            })
            .collect();
        json!({ "products": { "edges": edges } })
    }

    fn update_variant_price(&mut self, variables: &Value) -> Value {
        let product = suffix(&variables["productId"])
            .and_then(|id| self.products.iter_mut().find(|p| p.id == id));
        let Some(product) = product else {
            return json!({"productVariantsBulkUpdate": {
                "productVariants": null,
                "userErrors": [{"field": ["productId"], "message": "Product does not exist", "code": "PRODUCT_DOES_NOT_EXIST"}]
            }});
        };

        let mut updated = Vec::new();
        for input in variables["variants"].as_array().into_iter().flatten() {
            let id = suffix(&input["id"]);
            let Some(variant) = product.variants.iter_mut().find(|v| Some(v.id) == id) else {
                return json!({"productVariantsBulkUpdate": {
                    "productVariants": null,
                    "userErrors": [{"field": ["variants", "0", "id"], "message": "Product variant does not exist", "code": "PRODUCT_VARIANT_DOES_NOT_EXIST"}]
                }});
            };
            if let Some(price) = input["price"].as_str() {
                variant.price = price.to_string();
            }
            updated.push(json!({"id": gid("ProductVariant", variant.id), "price": variant.price}));
        }

        json!({"productVariantsBulkUpdate": {"productVariants": updated, "userErrors": []}})
    }

    fn set_inventory_quantity(&mut self, variables: &Value) -> Value {
        let rejected = |error: Value| {
            json!({"inventorySetQuantities": {"inventoryAdjustmentGroup": null, "userErrors": [error]}})
        };
        if let Some(error) = self.inventory_rejection.take() {
            return rejected(error);
        }

        let input = &variables["input"];
        let mut changes = Vec::new();
        for (i, quantity) in input["quantities"].as_array().into_iter().flatten().enumerate() {
            let location = suffix(&quantity["locationId"]).unwrap_or_default();
            let target = quantity["quantity"].as_i64().unwrap_or_default();
            let expected = quantity["compareQuantity"].as_i64();

            let Some(variant) = suffix(&quantity["inventoryItemId"])
                .and_then(|item| self.variant_by_item(item))
            else {
                return rejected(json!({
                    "field": ["input", "quantities", i.to_string(), "inventoryItemId"],
                    "message": "The specified inventory item could not be found.",
                    "code": "INVALID_INVENTORY_ITEM"
                }));
            };

            let live = variant.available(location).unwrap_or(0);
            if expected.is_some_and(|e| e != live) {
                return rejected(json!({
                    "field": ["input", "quantities", i.to_string(), "compareQuantity"],
                    "message": "The specified compare quantity does not match the current quantity.",
                    "code": STALE_CODE
                }));
            }
            variant.levels.insert(location, target);
            changes.push(json!({"name": "available", "delta": target - live}));
        }

        json!({"inventorySetQuantities": {
            "inventoryAdjustmentGroup": {
                "createdAt": "2024-06-01T00:00:00Z",
                "reason": input["reason"],
                "changes": changes
            },
            "userErrors": []
        }})
    }

    fn set_metafields(&mut self, variables: &Value) -> Value {
        let mut written = Vec::new();
        for input in variables["metafields"].as_array().into_iter().flatten() {
            let owner = suffix(&input["ownerId"]);
            let (Some(key), Some(value)) = (input["key"].as_str(), input["value"].as_str()) else {
                continue;
            };
            if let Some(product) = self.products.iter_mut().find(|p| Some(p.id) == owner) {
                product.metafields.insert(key.to_string(), value.to_string());
                written.push(json!({"key": key, "value": value}));
            }
        }
        json!({"metafieldsSet": {"metafields": written, "userErrors": []}})
    }

    fn create_webhook(&mut self, variables: &Value) -> Value {
        let webhook = FakeWebhook {
            topic: variables["topic"].as_str().unwrap_or_default().to_string(),
            callback_url: variables["webhookSubscription"]["callbackUrl"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
        };
        if self.webhooks.contains(&webhook) {
            return json!({"webhookSubscriptionCreate": {
                "webhookSubscription": null,
                "userErrors": [{"field": ["webhookSubscription", "callbackUrl"], "message": "Address for this topic has already been taken"}]
            }});
        }
        self.webhooks.push(webhook.clone());
        let id = u64::try_from(self.webhooks.len()).unwrap_or_default();
        json!({"webhookSubscriptionCreate": {
            "webhookSubscription": {"id": gid("WebhookSubscription", id), "topic": webhook.topic, "format": "JSON"},
            "userErrors": []
        }})
    }
}
