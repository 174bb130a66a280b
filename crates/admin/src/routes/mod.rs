//! HTTP route handlers for the embedded admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//!
//! # Products
//! GET  /app/products                   - First page (title ascending)
//! POST /app/products                   - Search, sort, loadMore, loadPrevious
//! GET  /app/products/{id}              - Product detail with metafields
//! POST /app/products/{id}              - Variant edit (price, inventory, metafields)
//!
//! # Dashboard
//! GET  /app/dashboard                  - Store statistics
//!
//! # Webhooks
//! POST /webhooks/app/products-delete   - PRODUCTS_DELETE receiver
//! POST /webhooks/register              - Subscribe the receiver
//! ```

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub mod dashboard;
pub mod product_detail;
pub mod products;
pub mod webhooks;

/// All admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        // Products
        .route("/app/products", get(products::index).post(products::action))
        .route(
            "/app/products/{id}",
            get(product_detail::show).post(product_detail::update),
        )
        // Dashboard
        .route("/app/dashboard", get(dashboard::index))
        // Webhooks
        .route(
            "/webhooks/app/products-delete",
            post(webhooks::products_delete),
        )
        .route("/webhooks/register", post(webhooks::register))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check Shopify.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use hmac::{Hmac, Mac};
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use sha2::Sha256;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{AdminConfig, ShopifyAdminConfig};
    use crate::services::webhooks::{DELETE_LOG_FILE, ERROR_LOG_FILE};
    use crate::shopify::AdminClient;
    use crate::shopify::admin::gateway::testing::ScriptedGateway;

    fn config(log_dir: &Path, webhook_secret: Option<&str>) -> AdminConfig {
        AdminConfig {
            host: [127, 0, 0, 1].into(),
            port: 3000,
            base_url: None,
            shopify: ShopifyAdminConfig {
                store: "demo-shop.myshopify.com".to_string(),
                api_version: "2025-01".to_string(),
                access_token: SecretString::from("shpat_test"),
            },
            webhook_secret: webhook_secret.map(SecretString::from),
            log_dir: log_dir.to_path_buf(),
            log_json: false,
            page_size: 5,
            debounce: Duration::from_millis(500),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        }
    }

    fn app(gateway: &Arc<ScriptedGateway>, config: AdminConfig) -> Router {
        let state = AppState::new(config, AdminClient::new(gateway.clone()));
        routes().with_state(state)
    }

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn product_list(cursor: &str, has_next: bool) -> Value {
        json!({
            "products": {
                "edges": [{"node": {
                    "id": "gid://shopify/Product/1",
                    "title": "Linen shirt",
                    "createdAt": "2024-03-01T00:00:00Z",
                    "featuredImage": null
                }, "cursor": cursor}],
                "pageInfo": {
                    "hasNextPage": has_next,
                    "hasPreviousPage": false,
                    "startCursor": cursor,
                    "endCursor": cursor
                }
            }
        })
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new());
        let response = app(&gateway, config(dir.path(), None))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_initial_loader_returns_first_page() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_data(product_list("c1", true));

        let (status, body) = send(
            app(&gateway, config(dir.path(), None)),
            Request::get("/app/products").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["products"][0]["title"], "Linen shirt");
        assert_eq!(body["pageInfo"]["hasNextPage"], true);
        assert_eq!(
            gateway.requests()[0].variables,
            json!({"first": 5, "sortKey": "TITLE", "reverse": false})
        );
    }

    #[tokio::test]
    async fn test_search_with_sort_sends_combined_variables() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_data(product_list("c1", false));

        let (status, body) = send(
            app(&gateway, config(dir.path(), None)),
            form_post(
                "/app/products",
                "searchQuery=shirt&actionType=search&sortKey=CREATED_AT&reverse=true&cursor=stale",
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            gateway.requests()[0].variables,
            json!({
                "first": 5,
                "query": "title:*shirt*",
                "sortKey": "CREATED_AT",
                "reverse": true
            })
        );
        assert_eq!(body["searchQuery"], "shirt");
        assert_eq!(body["actionType"], "search");
        assert_eq!(
            body["sortConfig"],
            json!({"key": "CREATED_AT", "direction": "DESC"})
        );
    }

    #[tokio::test]
    async fn test_load_previous_sends_last_and_before() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_data(product_list("c0", true));

        let (status, _) = send(
            app(&gateway, config(dir.path(), None)),
            form_post("/app/products", "actionType=loadPrevious&cursor=c1"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            gateway.requests()[0].variables,
            json!({"last": 5, "before": "c1", "sortKey": "TITLE", "reverse": false})
        );
    }

    #[tokio::test]
    async fn test_load_more_without_cursor_fails_without_upstream_call() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new());

        let (status, body) = send(
            app(&gateway, config(dir.path(), None)),
            form_post("/app/products", "actionType=loadMore"),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Cursor is required for loadMore");
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn test_list_upstream_failure_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_error(crate::shopify::AdminShopifyError::Transport {
            status: 502,
            reason: "Bad Gateway".to_string(),
        });

        let (status, body) = send(
            app(&gateway, config(dir.path(), None)),
            form_post("/app/products", "actionType=search"),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch products");
    }

    #[tokio::test]
    async fn test_detail_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_data(json!({"product": null}));

        let (status, body) = send(
            app(&gateway, config(dir.path(), None)),
            Request::get("/app/products/42").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found: Product gid://shopify/Product/42");
        assert_eq!(
            gateway.requests()[0].variables,
            json!({"id": "gid://shopify/Product/42"})
        );
    }

    #[tokio::test]
    async fn test_detail_rejects_malformed_id() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new());

        let (status, _) = send(
            app(&gateway, config(dir.path(), None)),
            Request::get("/app/products/abc").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_location_makes_no_call() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new());

        let (status, body) = send(
            app(&gateway, config(dir.path(), None)),
            form_post(
                "/app/products/1",
                "variantId=2&variantItemId=3&price=19.9&inventory=4&inventoryQuantity=5",
            ),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Missing required fields: location");
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn test_update_success() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new());
        gateway
            .push_data(json!({
                "productVariantsBulkUpdate": {
                    "productVariants": [{"id": "gid://shopify/ProductVariant/2", "price": "19.90"}],
                    "userErrors": []
                }
            }))
            .push_data(json!({
                "inventorySetQuantities": {"inventoryAdjustmentGroup": null, "userErrors": []}
            }));

        let (status, body) = send(
            app(&gateway, config(dir.path(), None)),
            form_post(
                "/app/products/1",
                "variantId=gid%3A%2F%2Fshopify%2FProductVariant%2F2&variantItemId=3&price=19.9\
                 &inventory=4&inventoryQuantity=5&location=6",
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));

        let requests = gateway.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].variables["variants"][0]["price"], "19.90");
        assert_eq!(
            requests[1].variables["input"]["quantities"][0],
            json!({
                "inventoryItemId": "gid://shopify/InventoryItem/3",
                "locationId": "gid://shopify/Location/6",
                "quantity": 4,
                "compareQuantity": 5
            })
        );
    }

    #[tokio::test]
    async fn test_webhook_records_deletion() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new());
        let logs = dir.path().join("logs");

        let (status, body) = send(
            app(&gateway, config(&logs, None)),
            json_post("/webhooks/app/products-delete", r#"{"id": 788032119674292922}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"success": true, "productId": "788032119674292922"})
        );
        let log = std::fs::read_to_string(logs.join(DELETE_LOG_FILE)).unwrap();
        assert!(log.starts_with("Product deleted: 788032119674292922 at "));
    }

    #[tokio::test]
    async fn test_webhook_missing_id_is_400_and_logged() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new());

        let (status, body) = send(
            app(&gateway, config(dir.path(), None)),
            json_post("/webhooks/app/products-delete", r#"{"title": "gone"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing productId");
        assert!(!dir.path().join(DELETE_LOG_FILE).exists());
        let errors = std::fs::read_to_string(dir.path().join(ERROR_LOG_FILE)).unwrap();
        assert!(errors.contains("Missing productId"));
    }

    #[tokio::test]
    async fn test_webhook_signature_checked_when_secret_set() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new());
        let secret = "9c1e5b7a3d2f4e60";
        let body = r#"{"id": 1}"#;

        let (status, _) = send(
            app(&gateway, config(dir.path(), Some(secret))),
            json_post("/webhooks/app/products-delete", body),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        let mut request = json_post("/webhooks/app/products-delete", body);
        request
            .headers_mut()
            .insert("X-Shopify-Hmac-Sha256", signature.parse().unwrap());
        let (status, body) = send(app(&gateway, config(dir.path(), Some(secret))), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["productId"], "1");
    }

    #[tokio::test]
    async fn test_register_requires_callback_without_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new());

        let (status, _) = send(
            app(&gateway, config(dir.path(), None)),
            json_post("/webhooks/register", "{}"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn test_register_with_explicit_callback() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_data(json!({
            "webhookSubscriptionCreate": {
                "webhookSubscription": {
                    "id": "gid://shopify/WebhookSubscription/7",
                    "topic": "PRODUCTS_DELETE",
                    "format": "JSON"
                },
                "userErrors": []
            }
        }));

        let (status, body) = send(
            app(&gateway, config(dir.path(), None)),
            json_post(
                "/webhooks/register",
                r#"{"callbackUrl": "https://admin.example.com/webhooks/app/products-delete"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["topic"], "PRODUCTS_DELETE");
        assert_eq!(gateway.requests()[0].variables["topic"], "PRODUCTS_DELETE");
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_data(json!({
            "products": {"edges": [{"node": {
                "id": "gid://shopify/Product/1",
                "title": "Shirt",
                "totalInventory": 7,
                "variants": {"edges": [
                    {"node": {"id": "gid://shopify/ProductVariant/1", "price": "8.00", "compareAtPrice": "10.00"}},
                    {"node": {"id": "gid://shopify/ProductVariant/2", "price": "10.00", "compareAtPrice": null}}
                ]}
            }}]}
        }));

        let (status, body) = send(
            app(&gateway, config(dir.path(), None)),
            Request::get("/app/dashboard").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["stats"],
            json!({
                "totalProducts": 1,
                "totalVariants": 2,
                "totalInventory": 7,
                "productsOnSale": 1,
                "variantsOnSale": 1
            })
        );
    }
}
