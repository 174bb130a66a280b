//! Product detail loader and variant edit action.

use std::collections::HashMap;

use axum::{
    Form, Json,
    extract::{Path, State},
};
use serde_json::{Value, json};
use shopdesk_core::ProductGid;
use tracing::instrument;

use crate::error::AppError;
use crate::services::UpdateRequest;
use crate::shopify::ProductSnapshot;
use crate::state::AppState;

/// Accepts a bare numeric ID or a full product GID.
fn product_id(raw: &str) -> Result<ProductGid, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid product ID: {raw}")))
}

/// Product with its variants, inventory levels and metafields.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductSnapshot>, AppError> {
    let id = product_id(&id)?;
    let snapshot = state
        .shopify()
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id}")))?;
    Ok(Json(snapshot))
}

/// Apply a variant edit: price, then inventory, then metafields.
#[instrument(skip(state, form))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    let id = product_id(&id)?;
    let request = UpdateRequest::from_form(&form)?;
    state.updater().update(id, request).await?;

    tracing::info!(product_id = %id, "Variant updated");
    Ok(Json(json!({ "success": true })))
}
