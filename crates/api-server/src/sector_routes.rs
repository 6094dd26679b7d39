use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use health_core::FinancialRecord;
use sector_benchmark::{compare, SectorAggregate, SectorComparison};
use serde::Deserialize;

use crate::{analysis_err, ApiResponse, AppError, AppState};

#[derive(Deserialize)]
pub struct SectorRecordsRequest {
    pub records: Vec<FinancialRecord>,
}

pub fn sector_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/sectors/:sector",
            get(get_sector_aggregate).put(put_sector_records),
        )
        .route("/api/sectors/:sector/compare", post(compare_to_sector))
}

/// Score the peer group and replace the cached aggregate.
async fn put_sector_records(
    State(state): State<AppState>,
    Path(sector): Path<String>,
    Json(req): Json<SectorRecordsRequest>,
) -> Result<Json<ApiResponse<SectorAggregate>>, AppError> {
    let aggregate = SectorAggregate::from_records(&sector, &req.records, &state.scorer)
        .map_err(|e| analysis_err("Sector aggregation failed", e))?;

    tracing::info!(
        "Cached sector {} ({} companies, mean overall {:.1})",
        aggregate.sector,
        aggregate.company_count,
        aggregate.mean.overall
    );
    state.sector_cache.insert(aggregate.clone());

    Ok(Json(ApiResponse::success(aggregate)))
}

async fn get_sector_aggregate(
    State(state): State<AppState>,
    Path(sector): Path<String>,
) -> Result<Json<ApiResponse<SectorAggregate>>, AppError> {
    let aggregate = state
        .sector_cache
        .get(&sector)
        .ok_or_else(|| AppError::not_found(format!("No sector data for {}", sector)))?;
    Ok(Json(ApiResponse::success(aggregate)))
}

async fn compare_to_sector(
    State(state): State<AppState>,
    Path(sector): Path<String>,
    Json(record): Json<FinancialRecord>,
) -> Result<Json<ApiResponse<SectorComparison>>, AppError> {
    let aggregate = state
        .sector_cache
        .get(&sector)
        .ok_or_else(|| AppError::not_found(format!("No sector data for {}", sector)))?;

    let scores = state.scorer.compute_subscores(&record);
    Ok(Json(ApiResponse::success(compare(&scores, &aggregate))))
}
