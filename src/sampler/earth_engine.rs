//! Earth Engine client for Sentinel-2 band sampling.
//!
//! Each sample builds an expression graph that filters the surface
//! reflectance collection to one clear image over the point on the
//! requested day, then samples its raw bands with `value:compute`.

use crate::error::SampleError;
use crate::models::{BandReading, Coordinate, DATE_FORMAT};
use crate::sampler::{BandSampler, ServiceAccountCredentials, TokenSource};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Raw Sentinel-2 bands requested from the service.
pub const RAW_BANDS: [&str; 11] = [
    "B1", "B2", "B3", "B4", "B5", "B6", "B7", "B8", "B9", "B11", "B12",
];

/// Error fragments Earth Engine reports when the filtered collection is empty.
const EMPTY_COLLECTION_MARKERS: [&str; 3] = [
    "Parameter 'input' is required",
    "Parameter 'image' is required",
    "Collection.first: Empty collection",
];

/// Settings for [`EarthEngineSampler`].
#[derive(Debug, Clone)]
pub struct EarthEngineConfig {
    /// REST API root, e.g. `https://earthengine.googleapis.com`.
    pub api_base: String,
    /// Cloud project billed for compute.
    pub project: String,
    /// Image collection id.
    pub collection: String,
    /// Images at or above this cloudy pixel percentage are ignored.
    pub max_cloud_percentage: f64,
    /// Sampling scale in meters.
    pub scale_meters: f64,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for EarthEngineConfig {
    fn default() -> Self {
        Self {
            api_base: "https://earthengine.googleapis.com".to_string(),
            project: String::new(),
            collection: "COPERNICUS/S2_SR_HARMONIZED".to_string(),
            max_cloud_percentage: 20.0,
            scale_meters: 10.0,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ComputeResponse {
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Band sampler backed by the Earth Engine REST API.
pub struct EarthEngineSampler {
    config: EarthEngineConfig,
    http_client: reqwest::Client,
    tokens: TokenSource,
}

impl EarthEngineSampler {
    /// Create a sampler. The project falls back to the credential's project.
    pub fn new(
        mut config: EarthEngineConfig,
        credentials: ServiceAccountCredentials,
    ) -> Result<Self, reqwest::Error> {
        if config.project.is_empty() {
            config.project = credentials.project_id.clone().unwrap_or_default();
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        info!(
            "Earth Engine sampler for project '{}' over {} (cloud < {}%)",
            config.project, config.collection, config.max_cloud_percentage
        );

        Ok(Self {
            tokens: TokenSource::new(credentials, http_client.clone()),
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &EarthEngineConfig {
        &self.config
    }

    fn compute_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/value:compute",
            self.config.api_base.trim_end_matches('/'),
            self.config.project
        )
    }
}

#[async_trait]
impl BandSampler for EarthEngineSampler {
    async fn sample(
        &self,
        coordinate: Coordinate,
        date: NaiveDate,
    ) -> Result<BandReading, SampleError> {
        let expression = build_expression(&self.config, coordinate, date)?;
        let token = self.tokens.access_token().await?;

        debug!(
            "Sampling {} at ({}, {})",
            date, coordinate.latitude, coordinate.longitude
        );

        let response = self
            .http_client
            .post(self.compute_url())
            .bearer_auth(token)
            .json(&json!({ "expression": expression }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &body));
        }

        let body: ComputeResponse = response.json().await?;
        reading_from_result(&body.result)
    }
}

fn invoke(function: &str, arguments: Value) -> Value {
    json!({
        "functionInvocationValue": {
            "functionName": function,
            "arguments": arguments,
        }
    })
}

fn constant(value: Value) -> Value {
    json!({ "constantValue": value })
}

fn filtered(collection: Value, filter: Value) -> Value {
    invoke(
        "Collection.filter",
        json!({ "collection": collection, "filter": filter }),
    )
}

/// Expression graph sampling the first clear image of `date` at `coordinate`.
pub fn build_expression(
    config: &EarthEngineConfig,
    coordinate: Coordinate,
    date: NaiveDate,
) -> Result<Value, SampleError> {
    let end = date
        .checked_add_days(Days::new(1))
        .ok_or_else(|| SampleError::service(format!("date {} out of range", date)))?;

    let point = invoke(
        "GeometryConstructors.Point",
        json!({ "coordinates": constant(json!([coordinate.longitude, coordinate.latitude])) }),
    );

    let collection = invoke(
        "ImageCollection.load",
        json!({ "id": constant(json!(config.collection)) }),
    );
    let over_point = filtered(
        collection,
        invoke(
            "Filter.intersects",
            json!({ "leftField": constant(json!(".all")), "rightValue": point.clone() }),
        ),
    );
    let on_day = filtered(
        over_point,
        invoke(
            "Filter.dateRangeContains",
            json!({
                "leftValue": invoke("DateRange", json!({
                    "start": constant(json!(date.format(DATE_FORMAT).to_string())),
                    "end": constant(json!(end.format(DATE_FORMAT).to_string())),
                })),
                "rightField": constant(json!("system:time_start")),
            }),
        ),
    );
    let clear = filtered(
        on_day,
        invoke(
            "Filter.lessThan",
            json!({
                "leftField": constant(json!("CLOUDY_PIXEL_PERCENTAGE")),
                "rightValue": constant(json!(config.max_cloud_percentage)),
            }),
        ),
    );

    let image = invoke("Collection.first", json!({ "collection": clear }));
    let bands = invoke(
        "Image.select",
        json!({ "input": image, "bandSelectors": constant(json!(RAW_BANDS)) }),
    );
    let samples = invoke(
        "Image.sample",
        json!({
            "image": bands,
            "region": point,
            "scale": constant(json!(config.scale_meters)),
        }),
    );
    let feature = invoke("Collection.first", json!({ "collection": samples }));

    Ok(json!({ "result": "0", "values": { "0": feature } }))
}

/// Map a non-success response to a sample error.
pub fn classify_error(status: u16, body: &str) -> SampleError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    if EMPTY_COLLECTION_MARKERS.iter().any(|m| message.contains(m)) {
        SampleError::not_found("no valid image for location and date")
    } else {
        SampleError::service(format!("Earth Engine error {}: {}", status, message))
    }
}

/// Extract band values from a sampled feature.
pub fn reading_from_result(result: &Value) -> Result<BandReading, SampleError> {
    if result.is_null() {
        return Err(SampleError::not_found(
            "no valid image for location and date",
        ));
    }

    let properties = result
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.iter())
        .ok_or_else(|| SampleError::service("sampled feature has no properties"))?;

    let reading: BandReading = properties
        .filter_map(|(band, value)| value.as_f64().map(|v| (band.clone(), v)))
        .collect();

    if reading.is_empty() {
        return Err(SampleError::not_found("no data at the given point"));
    }

    Ok(reading)
}
