// Raster service - Use cases behind the tile, pixel, legend and timeseries endpoints
use crate::application::errors::ServiceError;
use crate::application::imagery_client::{ImageryClient, ImageryError, QueryOutcome};
use crate::domain::geometry::{AreaOfInterest, Point};
use crate::domain::month::{DateBounds, DateRange, EndBound, Month, last_12_months};
use crate::domain::raster_query::{Dataset, RasterQuery};
use crate::domain::responses::{
    MonthlyValue, PixelResponse, StatsResponse, TileResponse, TimeseriesResponse,
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream;
use std::sync::Arc;

#[derive(Clone)]
pub struct RasterService {
    client: Arc<dyn ImageryClient>,
    end_bound: EndBound,
    timeseries_concurrency: usize,
}

impl RasterService {
    pub fn new(
        client: Arc<dyn ImageryClient>,
        end_bound: EndBound,
        timeseries_concurrency: usize,
    ) -> Self {
        Self {
            client,
            end_bound,
            timeseries_concurrency: timeseries_concurrency.max(1),
        }
    }

    /// Tile layer for a dataset over a month range, optionally clipped.
    pub async fn tiles(
        &self,
        dataset: Dataset,
        start: &str,
        end: &str,
        aoi: Option<&str>,
    ) -> Result<TileResponse, ServiceError> {
        let bounds = self.bounds(start, end)?;
        let aoi = parse_aoi(aoi)?;

        let query = RasterQuery::tiles(dataset, bounds, aoi);
        match self.client.execute(&query).await? {
            QueryOutcome::Tiles(tiles) => {
                tracing::debug!("Created {} map {}", dataset.name(), tiles.map_name);
                Ok(TileResponse {
                    tile_url: tiles.url_format,
                })
            }
            other => Err(unexpected("tiles", other).into()),
        }
    }

    /// LST and NDVI at a single point. A point without data fails the request.
    pub async fn pixel_value(
        &self,
        point: Point,
        start: &str,
        end: &str,
    ) -> Result<PixelResponse, ServiceError> {
        let bounds = self.bounds(start, end)?;

        let (lst_value, ndvi_value) = futures::try_join!(
            self.sample(Dataset::Lst, bounds.clone(), point),
            self.sample(Dataset::Ndvi, bounds, point),
        )?;

        Ok(PixelResponse {
            lst_value,
            ndvi_value,
        })
    }

    /// Min/max of a dataset over the (clipped) composite, rounded to two decimals.
    pub async fn legend_stats(
        &self,
        dataset: Dataset,
        start: &str,
        end: &str,
        aoi: Option<&str>,
    ) -> Result<StatsResponse, ServiceError> {
        let bounds = self.bounds(start, end)?;
        let aoi = parse_aoi(aoi)?;

        let query = RasterQuery::min_max(dataset, bounds, aoi);
        match self.client.execute(&query).await? {
            QueryOutcome::MinMax {
                min: Some(min),
                max: Some(max),
            } => Ok(StatsResponse::rounded(min, max)),
            QueryOutcome::MinMax { .. } => Err(ImageryError::Remote(format!(
                "no valid {} pixels in region",
                dataset.band()
            ))
            .into()),
            other => Err(unexpected("min/max statistics", other).into()),
        }
    }

    pub async fn timeseries(&self, point: Point) -> TimeseriesResponse {
        self.timeseries_at(point, Utc::now()).await
    }

    /// Monthly samples for the twelve months up to `now`. Failed samples become null.
    pub async fn timeseries_at(&self, point: Point, now: DateTime<Utc>) -> TimeseriesResponse {
        let months = last_12_months(now);
        tracing::info!(
            "Sampling {} months at ({}, {})",
            months.len(),
            point.lat,
            point.lng
        );

        // buffered() keeps month order while queries run concurrently
        let rows: Vec<(Month, Option<f64>, Option<f64>)> = stream::iter(months)
            .map(|month| async move {
                let bounds = DateRange::single(month).bounds(self.end_bound);
                let (lst, ndvi) = futures::join!(
                    self.sample(Dataset::Lst, bounds.clone(), point),
                    self.sample(Dataset::Ndvi, bounds, point),
                );
                (
                    month,
                    value_or_null(Dataset::Lst, month, lst),
                    value_or_null(Dataset::Ndvi, month, ndvi),
                )
            })
            .buffered(self.timeseries_concurrency)
            .collect()
            .await;

        let mut lst = Vec::with_capacity(rows.len());
        let mut ndvi = Vec::with_capacity(rows.len());
        for (month, lst_value, ndvi_value) in rows {
            lst.push(MonthlyValue {
                month: month.to_string(),
                value: lst_value,
            });
            ndvi.push(MonthlyValue {
                month: month.to_string(),
                value: ndvi_value,
            });
        }

        TimeseriesResponse { lst, ndvi }
    }

    fn bounds(&self, start: &str, end: &str) -> Result<DateBounds, ServiceError> {
        Ok(DateRange::parse(start, end)?.bounds(self.end_bound))
    }

    async fn sample(
        &self,
        dataset: Dataset,
        bounds: DateBounds,
        point: Point,
    ) -> Result<Option<f64>, ImageryError> {
        let query = RasterQuery::sample(dataset, bounds, point);
        match self.client.execute(&query).await? {
            QueryOutcome::Sample(value) => Ok(value),
            other => Err(unexpected("a sample", other)),
        }
    }
}

/// Empty strings count as "no AOI".
fn parse_aoi(raw: Option<&str>) -> Result<Option<AreaOfInterest>, ServiceError> {
    match raw.filter(|s| !s.is_empty()) {
        Some(raw) => Ok(Some(AreaOfInterest::parse(raw)?)),
        None => Ok(None),
    }
}

fn value_or_null(
    dataset: Dataset,
    month: Month,
    sample: Result<Option<f64>, ImageryError>,
) -> Option<f64> {
    match sample {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("No {} sample for {}: {}", dataset.name(), month, e);
            None
        }
    }
}

fn unexpected(expected: &str, outcome: QueryOutcome) -> ImageryError {
    ImageryError::Decode(format!("expected {}, got {:?}", expected, outcome))
}
