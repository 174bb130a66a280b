//! Transport seam between the Admin API client and Shopify.
//!
//! [`AdminGateway`] executes one prepared GraphQL request and returns the
//! response's `data` member. [`HttpGateway`] is the production implementation;
//! tests plug in an in-memory one.

use futures::future::BoxFuture;
use graphql_client::QueryBody;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use super::super::{AdminShopifyError, GraphQLError, GraphQLErrorLocation};

/// A GraphQL request with variables already serialized.
pub type GraphQLRequest = QueryBody<serde_json::Value>;

/// Executes static GraphQL documents against an authenticated admin session.
///
/// Implementations must not alter the document text. Failures map to
/// [`AdminShopifyError::Transport`]/[`AdminShopifyError::Http`]/
/// [`AdminShopifyError::Parse`] below the GraphQL layer and to
/// [`AdminShopifyError::GraphQL`] when the response carries `errors`.
pub trait AdminGateway: Send + Sync {
    fn execute(
        &self,
        request: GraphQLRequest,
    ) -> BoxFuture<'_, Result<serde_json::Value, AdminShopifyError>>;
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse {
    data: Option<serde_json::Value>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    locations: Vec<GraphQLErrorLocationResponse>,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorLocationResponse {
    line: i64,
    column: i64,
}

/// Decode a successful HTTP response body into its `data` member.
///
/// # Errors
///
/// Returns `AdminShopifyError::Parse` for a malformed body and
/// `AdminShopifyError::GraphQL` for a non-empty `errors` array or missing data.
pub fn decode_response(body: &[u8]) -> Result<serde_json::Value, AdminShopifyError> {
    let response: GraphQLResponse = serde_json::from_slice(body)?;

    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        let converted_errors: Vec<GraphQLError> = errors
            .into_iter()
            .map(|e| GraphQLError {
                message: e.message,
                locations: e
                    .locations
                    .into_iter()
                    .map(|l| GraphQLErrorLocation {
                        line: l.line,
                        column: l.column,
                    })
                    .collect(),
                path: e.path,
            })
            .collect();
        return Err(AdminShopifyError::GraphQL(converted_errors));
    }

    match response.data {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(AdminShopifyError::GraphQL(vec![GraphQLError::message(
            "No data in response",
        )])),
    }
}

/// Shopify Admin API over HTTPS.
pub struct HttpGateway {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
}

impl HttpGateway {
    /// Create a gateway for `https://<store>/admin/api/<version>/graphql.json`.
    ///
    /// `access_token` is the offline token of the authenticated admin
    /// session; it is only ever sent in the `X-Shopify-Access-Token` header.
    #[must_use]
    pub fn new(store: &str, api_version: &str, access_token: SecretString) -> Self {
        Self::with_endpoint(
            format!("https://{store}/admin/api/{api_version}/graphql.json"),
            access_token,
        )
    }

    /// Create a gateway for an explicit endpoint URL.
    #[must_use]
    pub fn with_endpoint(endpoint: String, access_token: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            access_token,
        }
    }

    /// The GraphQL endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[instrument(skip(self, request), fields(operation = %request.operation_name))]
    async fn post(&self, request: GraphQLRequest) -> Result<serde_json::Value, AdminShopifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Shopify-Access-Token", self.access_token.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<f64>().ok())
                .map_or(2, |secs| secs.ceil() as u64);
            return Err(AdminShopifyError::RateLimited(retry_after));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AdminShopifyError::Unauthorized(
                "Invalid or expired access token".to_string(),
            ));
        }

        if !status.is_success() {
            return Err(AdminShopifyError::Transport {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.bytes().await?;
        decode_response(&body)
    }
}

impl AdminGateway for HttpGateway {
    fn execute(
        &self,
        request: GraphQLRequest,
    ) -> BoxFuture<'_, Result<serde_json::Value, AdminShopifyError>> {
        Box::pin(self.post(request))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted gateway for unit tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// A request observed by [`ScriptedGateway`].
    #[derive(Debug, Clone)]
    pub struct Recorded {
        pub operation_name: &'static str,
        pub query: &'static str,
        pub variables: serde_json::Value,
    }

    /// Replays queued responses in order and records every request.
    #[derive(Default)]
    pub struct ScriptedGateway {
        responses: Mutex<VecDeque<Result<serde_json::Value, AdminShopifyError>>>,
        requests: Mutex<Vec<Recorded>>,
    }

    impl ScriptedGateway {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_data(&self, data: serde_json::Value) -> &Self {
            self.responses.lock().unwrap().push_back(Ok(data));
            self
        }

        pub fn push_error(&self, error: AdminShopifyError) -> &Self {
            self.responses.lock().unwrap().push_back(Err(error));
            self
        }

        pub fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl AdminGateway for ScriptedGateway {
        fn execute(
            &self,
            request: GraphQLRequest,
        ) -> BoxFuture<'_, Result<serde_json::Value, AdminShopifyError>> {
            self.requests.lock().unwrap().push(Recorded {
                operation_name: request.operation_name,
                query: request.query,
                variables: request.variables,
            });
            let next = self.responses.lock().unwrap().pop_front().unwrap_or_else(|| {
                Err(AdminShopifyError::Transport {
                    status: 599,
                    reason: "no scripted response".to_string(),
                })
            });
            Box::pin(async move { next })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_returns_data() {
        let data = decode_response(br#"{"data": {"products": {"edges": []}}}"#).unwrap();
        assert!(data["products"]["edges"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_decode_joins_graphql_errors() {
        let err = decode_response(
            br#"{"data": null, "errors": [{"message": "Throttled"}, {"message": "Access denied", "locations": [{"line": 2, "column": 3}]}]}"#,
        )
        .unwrap_err();

        match &err {
            AdminShopifyError::GraphQL(errors) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[1].locations[0].line, 2);
            }
            other => panic!("expected GraphQL error, got {other:?}"),
        }
        assert_eq!(err.to_string(), "GraphQL errors: Throttled, Access denied");
    }

    #[test]
    fn test_decode_malformed_body_is_transport_failure() {
        let err = decode_response(b"<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, AdminShopifyError::Parse(_)));
        assert!(err.is_transport());
    }

    #[test]
    fn test_decode_missing_data() {
        let err = decode_response(br#"{"data": null}"#).unwrap_err();
        assert_eq!(err.to_string(), "GraphQL errors: No data in response");
    }

    #[test]
    fn test_empty_errors_array_is_success() {
        let data = decode_response(br#"{"data": {"ok": true}, "errors": []}"#).unwrap();
        assert_eq!(data["ok"], true);
    }

    #[test]
    fn test_endpoint_format() {
        let gateway = HttpGateway::new(
            "demo.myshopify.com",
            "2025-01",
            SecretString::from("shpat_test".to_string()),
        );
        assert_eq!(
            gateway.endpoint(),
            "https://demo.myshopify.com/admin/api/2025-01/graphql.json"
        );
    }
}
