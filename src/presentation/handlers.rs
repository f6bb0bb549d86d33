// HTTP request handlers
use crate::domain::geometry::Point;
use crate::domain::raster_query::Dataset;
use crate::domain::responses::{
    PixelResponse, StatsResponse, StatusResponse, TileResponse, TimeseriesResponse,
};
use crate::presentation::api_error::ApiError;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct RangeQuery {
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub aoi: Option<String>,
}

#[derive(Deserialize)]
pub struct PixelQuery {
    pub lat: f64,
    pub lng: f64,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Deserialize)]
pub struct PointQuery {
    pub lat: f64,
    pub lng: f64,
}

/// Liveness endpoint
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "LST/NDVI backend is running".to_string(),
    })
}

pub async fn tiles_lst(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<TileResponse>, ApiError> {
    tiles(&state, Dataset::Lst, query?.0).await
}

pub async fn tiles_ndvi(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<TileResponse>, ApiError> {
    tiles(&state, Dataset::Ndvi, query?.0).await
}

/// Single-month tile layer, `/tiles_lst/{month}`
pub async fn tiles_lst_for_month(
    State(state): State<Arc<AppState>>,
    Path(month): Path<String>,
) -> Result<Json<TileResponse>, ApiError> {
    tiles(&state, Dataset::Lst, single_month(month)).await
}

/// Single-month tile layer, `/tiles_ndvi/{month}`
pub async fn tiles_ndvi_for_month(
    State(state): State<Arc<AppState>>,
    Path(month): Path<String>,
) -> Result<Json<TileResponse>, ApiError> {
    tiles(&state, Dataset::Ndvi, single_month(month)).await
}

pub async fn pixel_value(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PixelQuery>, QueryRejection>,
) -> Result<Json<PixelResponse>, ApiError> {
    let Query(query) = query?;
    let response = state
        .raster_service
        .pixel_value(
            Point::new(query.lat, query.lng),
            &query.start_date,
            &query.end_date,
        )
        .await?;
    Ok(Json(response))
}

pub async fn legend_stats_lst(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<StatsResponse>, ApiError> {
    legend_stats(&state, Dataset::Lst, query?.0).await
}

pub async fn legend_stats_ndvi(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<StatsResponse>, ApiError> {
    legend_stats(&state, Dataset::Ndvi, query?.0).await
}

/// Twelve months of LST and NDVI at a point; failed months are null
pub async fn timeseries(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PointQuery>, QueryRejection>,
) -> Result<Json<TimeseriesResponse>, ApiError> {
    let Query(query) = query?;
    let response = state
        .raster_service
        .timeseries(Point::new(query.lat, query.lng))
        .await;
    Ok(Json(response))
}

async fn tiles(
    state: &AppState,
    dataset: Dataset,
    query: RangeQuery,
) -> Result<Json<TileResponse>, ApiError> {
    let response = state
        .raster_service
        .tiles(
            dataset,
            &query.start_date,
            &query.end_date,
            query.aoi.as_deref(),
        )
        .await?;
    Ok(Json(response))
}

async fn legend_stats(
    state: &AppState,
    dataset: Dataset,
    query: RangeQuery,
) -> Result<Json<StatsResponse>, ApiError> {
    let response = state
        .raster_service
        .legend_stats(
            dataset,
            &query.start_date,
            &query.end_date,
            query.aoi.as_deref(),
        )
        .await?;
    Ok(Json(response))
}

fn single_month(month: String) -> RangeQuery {
    RangeQuery {
        start_date: month.clone(),
        end_date: month,
        aoi: None,
    }
}
