// Client trait for the remote imagery-processing service
use crate::domain::raster_query::RasterQuery;
use async_trait::async_trait;
use thiserror::Error;

/// A rendered layer servable through the `{z}/{x}/{y}` tile scheme.
#[derive(Debug, Clone, PartialEq)]
pub struct TileDescriptor {
    pub map_name: String,
    pub url_format: String,
}

/// Result of executing a `RasterQuery`, shaped by its reduction.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Tiles(TileDescriptor),
    Sample(Option<f64>),
    MinMax { min: Option<f64>, max: Option<f64> },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ImageryError {
    /// The remote service rejected or failed the computation
    #[error("{0}")]
    Remote(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("authentication failed: {0}")]
    Auth(String),
}

#[async_trait]
pub trait ImageryClient: Send + Sync {
    /// Evaluate one query remotely
    async fn execute(&self, query: &RasterQuery) -> Result<QueryOutcome, ImageryError>;
}
