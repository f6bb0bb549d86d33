// Earth Engine REST client implementing ImageryClient
use crate::application::imagery_client::{
    ImageryClient, ImageryError, QueryOutcome, TileDescriptor,
};
use crate::domain::raster_query::{RasterQuery, Reduction};
use crate::infrastructure::config::EarthEngineSettings;
use crate::infrastructure::credentials::{ServiceAccountCredentials, TokenProvider};
use crate::infrastructure::expression_encoding::encode_expression;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value as Json, json};
use std::time::Duration;

const API_VERSION: &str = "v1";

#[derive(Debug, Deserialize)]
struct ComputeValueResponse {
    #[serde(default)]
    result: Json,
}

#[derive(Debug, Deserialize)]
struct CreateMapResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    error: RemoteErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorDetail {
    message: String,
}

pub struct EarthEngineClient {
    http: reqwest::Client,
    base_url: String,
    project: String,
    tokens: TokenProvider,
}

impl EarthEngineClient {
    pub fn new(
        settings: &EarthEngineSettings,
        credentials: ServiceAccountCredentials,
    ) -> anyhow::Result<Self> {
        let project = settings
            .project
            .clone()
            .or_else(|| credentials.project_id().map(str::to_string))
            .context("No Earth Engine project configured and the key has no project_id")?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: settings.base_url.clone(),
            project,
            tokens: TokenProvider::new(credentials, http.clone()),
            http,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    async fn post(&self, url: &str, body: &Json) -> Result<reqwest::Response, ImageryError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| ImageryError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Earth Engine request to {} failed with status {}", url, status);
            return Err(remote_error(status, &body));
        }

        Ok(response)
    }

    async fn compute_value(&self, expression: Json) -> Result<Json, ImageryError> {
        let response = self
            .post(
                &project_url(&self.base_url, &self.project, "value:compute"),
                &json!({ "expression": expression }),
            )
            .await?;
        let data: ComputeValueResponse = response
            .json()
            .await
            .map_err(|e| ImageryError::Decode(e.to_string()))?;
        Ok(data.result)
    }

    async fn create_map(&self, expression: Json) -> Result<TileDescriptor, ImageryError> {
        let response = self
            .post(
                &project_url(&self.base_url, &self.project, "maps"),
                &json!({
                    "expression": expression,
                    "fileFormat": "AUTO_JPEG_PNG",
                    "bandIds": [],
                }),
            )
            .await?;
        let data: CreateMapResponse = response
            .json()
            .await
            .map_err(|e| ImageryError::Decode(e.to_string()))?;
        Ok(TileDescriptor {
            url_format: tile_url_format(&self.base_url, &data.name),
            map_name: data.name,
        })
    }
}

#[async_trait]
impl ImageryClient for EarthEngineClient {
    async fn execute(&self, query: &RasterQuery) -> Result<QueryOutcome, ImageryError> {
        let expression = encode_expression(&query.to_expression());
        tracing::debug!("Encoded {} expression: {}", query.dataset.name(), expression);

        match &query.reduction {
            Reduction::Visualize(_) => {
                tracing::info!(
                    "Creating {} map for {}..{}",
                    query.dataset.name(),
                    query.bounds.start,
                    query.bounds.end
                );
                Ok(QueryOutcome::Tiles(self.create_map(expression).await?))
            }
            Reduction::Sample { point, .. } => {
                tracing::info!(
                    "Sampling {} at ({}, {}) for {}..{}",
                    query.dataset.name(),
                    point.lat,
                    point.lng,
                    query.bounds.start,
                    query.bounds.end
                );
                let result = self.compute_value(expression).await?;
                Ok(QueryOutcome::Sample(decode_sample(&result)?))
            }
            Reduction::MinMax { .. } => {
                tracing::info!(
                    "Computing {} min/max for {}..{}",
                    query.dataset.name(),
                    query.bounds.start,
                    query.bounds.end
                );
                let result = self.compute_value(expression).await?;
                let (min, max) = decode_min_max(&result, query.dataset.band())?;
                Ok(QueryOutcome::MinMax { min, max })
            }
        }
    }
}

/// `{base}/v1/projects/{project}/{method}`
fn project_url(base_url: &str, project: &str, method: &str) -> String {
    format!(
        "{}/{}/projects/{}/{}",
        base_url.trim_end_matches('/'),
        API_VERSION,
        urlencoding::encode(project),
        method
    )
}

/// Tile URL template for a map resource name.
fn tile_url_format(base_url: &str, map_name: &str) -> String {
    format!(
        "{}/{}/{}/tiles/{{z}}/{{x}}/{{y}}",
        base_url.trim_end_matches('/'),
        API_VERSION,
        map_name
    )
}

fn remote_error(status: reqwest::StatusCode, body: &str) -> ImageryError {
    match serde_json::from_str::<RemoteErrorBody>(body) {
        Ok(parsed) => ImageryError::Remote(parsed.error.message),
        Err(_) if body.is_empty() => ImageryError::Remote(format!("HTTP {}", status)),
        Err(_) => ImageryError::Remote(format!("HTTP {}: {}", status, body)),
    }
}

fn decode_sample(result: &Json) -> Result<Option<f64>, ImageryError> {
    match result {
        Json::Null => Ok(None),
        Json::Number(n) => Ok(n.as_f64()),
        other => Err(ImageryError::Decode(format!(
            "expected a number, got {}",
            other
        ))),
    }
}

/// Read `{band}_min` / `{band}_max` from a reduceRegion dictionary.
fn decode_min_max(result: &Json, band: &str) -> Result<(Option<f64>, Option<f64>), ImageryError> {
    let stats = result.as_object().ok_or_else(|| {
        ImageryError::Decode(format!("expected a dictionary, got {}", result))
    })?;
    let read = |suffix: &str| {
        stats
            .get(&format!("{}_{}", band, suffix))
            .and_then(Json::as_f64)
    };
    Ok((read("min"), read("max")))
}
