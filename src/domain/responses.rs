// Response payloads returned by the HTTP surface
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileResponse {
    pub tile_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsResponse {
    pub min: f64,
    pub max: f64,
}

impl StatsResponse {
    /// Both bounds rounded to two decimals.
    pub fn rounded(min: f64, max: f64) -> Self {
        Self {
            min: round2(min),
            max: round2(max),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PixelResponse {
    pub lst_value: Option<f64>,
    pub ndvi_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyValue {
    pub month: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeseriesResponse {
    pub lst: Vec<MonthlyValue>,
    pub ndvi: Vec<MonthlyValue>,
}

/// Two-decimal rounding; exact halves go to the even neighbour.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
