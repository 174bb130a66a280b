//! Product list loader and list actions.

use axum::{Form, Json, extract::State};
use serde::{Deserialize, Serialize};
use shopdesk_core::{SortConfig, SortDirection, SortKey};
use tracing::instrument;

use crate::error::AppError;
use crate::services::{ListError, ListRequest, PageAction};
use crate::shopify::{PageInfo, ProductPage, ProductSummary};
use crate::state::AppState;

/// Form posted by the list view (`application/x-www-form-urlencoded`).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListForm {
    #[serde(default)]
    pub search_query: String,
    pub action_type: Option<String>,
    pub cursor: Option<String>,
    pub sort_key: Option<String>,
    pub reverse: Option<String>,
}

impl ListForm {
    /// Interpret the form as a list action.
    ///
    /// A missing `actionType` is a search; a missing `sortKey` sorts by title.
    /// `reverse` is true only for the literal `"true"`.
    ///
    /// # Errors
    ///
    /// Returns `ListError` for an unknown action or sort key.
    pub fn into_request(self) -> Result<ListRequest, ListError> {
        let action = match non_empty(self.action_type.as_deref()) {
            Some(action) => action.parse()?,
            None => PageAction::Search,
        };
        let key = match non_empty(self.sort_key.as_deref()) {
            Some(key) => key.parse()?,
            None => SortKey::Title,
        };
        let direction = SortDirection::from_reverse(self.reverse.as_deref() == Some("true"));

        Ok(ListRequest {
            action,
            search_query: self.search_query,
            cursor: self.cursor,
            sort: SortConfig::new(key, direction),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Result of a list action, echoing the action's inputs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub products: Vec<ProductSummary>,
    pub page_info: PageInfo,
    pub search_query: String,
    pub action_type: PageAction,
    pub sort_config: SortConfig,
}

/// Initial page: no search, title ascending.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<ProductPage>, AppError> {
    let variables = ListRequest::first_page("", SortConfig::default())
        .variables(state.config().page_size)?;
    let page = state
        .shopify()
        .list_products(variables)
        .await
        .map_err(ListError::from)?;
    Ok(Json(page))
}

/// Search, sort or page through the product list.
#[instrument(skip(state, form), fields(action = ?form.action_type, sort_key = ?form.sort_key))]
pub async fn action(
    State(state): State<AppState>,
    Form(form): Form<ListForm>,
) -> Result<Json<ListResponse>, AppError> {
    let request = form.into_request()?;
    let variables = request.variables(state.config().page_size)?;
    let page = state
        .shopify()
        .list_products(variables)
        .await
        .map_err(ListError::from)?;

    Ok(Json(ListResponse {
        products: page.products,
        page_info: page.page_info,
        search_query: request.search_query,
        action_type: request.action,
        sort_config: request.sort,
    }))
}
