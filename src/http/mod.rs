//! HTTP surface.
//!
//! Routes, shared state and request tracing for the axum server.

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::{healthz_handler, ndvi_timeseries_handler, satellite_features_handler};

use axum::body::Body;
use axum::http::Request;
use axum::middleware::{from_fn, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, Instrument};

use crate::sampler::BandSampler;

/// State shared by every request. Immutable once built.
#[derive(Clone)]
pub struct AppState {
    pub sampler: Arc<dyn BandSampler>,
    /// Bound on each outbound sampling call.
    pub call_timeout: Duration,
}

impl AppState {
    pub fn new(sampler: Arc<dyn BandSampler>, call_timeout: Duration) -> Self {
        Self {
            sampler,
            call_timeout,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/api/ndvi-timeseries", post(ndvi_timeseries_handler))
        .route("/api/satellite-features", post(satellite_features_handler))
        .layer(from_fn(request_tracing_middleware))
        .with_state(state)
}

async fn request_tracing_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request.uri().path().to_string();
    let span = tracing::info_span!("http.request", method = %method, route = %route);

    let started = Instant::now();
    let response = next.run(request).instrument(span.clone()).await;

    span.in_scope(|| {
        info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "{} {}",
            method,
            route
        );
    });
    response
}
