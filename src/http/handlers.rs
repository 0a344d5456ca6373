use axum::extract::State;
use axum::Json;
use tracing::{info, warn};

use crate::analysis::{compute_indices, SeriesAggregator};
use crate::http::{ApiError, AppState};
use crate::models::{
    parse_date, Coordinate, NdviTimeSeriesRequest, SamplePoint, SatelliteFeatures,
    SatelliteFeaturesRequest,
};
use crate::sampler::BandSampler;

pub async fn ndvi_timeseries_handler(
    State(state): State<AppState>,
    Json(req): Json<NdviTimeSeriesRequest>,
) -> Result<Json<Vec<SamplePoint>>, ApiError> {
    let aggregator = SeriesAggregator::new(state.sampler.as_ref(), state.call_timeout);
    let series = aggregator
        .compute_series(req.latitude, req.longitude, &req.reference_date)
        .await
        .map_err(|e| {
            info!("Rejected series request: {}", e);
            ApiError::from(e)
        })?;

    Ok(Json(series))
}

pub async fn satellite_features_handler(
    State(state): State<AppState>,
    Json(req): Json<SatelliteFeaturesRequest>,
) -> Result<Json<SatelliteFeatures>, ApiError> {
    let date = parse_date(&req.date)?;
    let coordinate = Coordinate {
        latitude: req.latitude,
        longitude: req.longitude,
    };

    let call = state.sampler.sample(coordinate, date);
    let bands = match tokio::time::timeout(state.call_timeout, call).await {
        Ok(result) => result?,
        Err(_) => {
            warn!("Feature sampling on {} timed out", date);
            return Err(ApiError::Upstream(format!(
                "sampling timed out after {}s",
                state.call_timeout.as_secs()
            )));
        }
    };

    Ok(Json(SatelliteFeatures {
        latitude: req.latitude,
        longitude: req.longitude,
        date,
        indices: compute_indices(&bands),
        bands,
    }))
}

pub async fn healthz_handler() -> &'static str {
    "ok"
}
