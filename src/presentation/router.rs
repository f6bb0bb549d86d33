// Route table and middleware stack
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    legend_stats_lst, legend_stats_ndvi, pixel_value, root, tiles_lst, tiles_lst_for_month,
    tiles_ndvi, tiles_ndvi_for_month, timeseries,
};
use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Endpoints are served at the root and again under `/api`.
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/tiles_lst", get(tiles_lst))
        .route("/tiles_lst/:month", get(tiles_lst_for_month))
        .route("/tiles_ndvi", get(tiles_ndvi))
        .route("/tiles_ndvi/:month", get(tiles_ndvi_for_month))
        .route("/pixel_value", get(pixel_value))
        .route("/legend_stats_lst", get(legend_stats_lst))
        .route("/legend_stats_ndvi", get(legend_stats_ndvi))
        .route("/timeseries", get(timeseries));

    Router::new()
        .route("/", get(root))
        .merge(api.clone())
        .nest("/api", api)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
