//! Store overview statistics.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::error::AppError;
use crate::services::{DashboardStats, load_stats};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
}

/// Aggregate counts over the first page of products.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<DashboardResponse>, AppError> {
    let stats = load_stats(state.shopify()).await?;
    Ok(Json(DashboardResponse { stats }))
}
