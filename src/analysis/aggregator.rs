//! Weekly NDVI series aggregation.
//!
//! Walks the 52 weeks preceding a reference date, samples the band
//! service once per week, and keeps every date with a computable index.
//! Per-date failures never abort the series.

use crate::error::{SampleError, SeriesError};
use crate::models::{BandReading, Coordinate, SamplePoint, SampleRequest};
use crate::sampler::BandSampler;
use chrono::{Days, NaiveDate};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Length of the series window: 52 weeks.
pub const SERIES_SPAN_DAYS: u64 = 52 * 7;

/// Distance between consecutive sample dates.
pub const STRIDE_DAYS: u64 = 7;

/// Why a date produced no sample point.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The service found no usable image.
    NoImage(String),
    /// A band required by the index is absent.
    MissingBand(&'static str),
    /// `nir + red` is zero.
    ZeroDenominator,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoImage(reason) => write!(f, "{}", reason),
            SkipReason::MissingBand(band) => write!(f, "band {} missing", band),
            SkipReason::ZeroDenominator => write!(f, "nir + red is zero"),
        }
    }
}

/// Result of sampling a single date.
#[derive(Debug, Clone, PartialEq)]
pub enum DateOutcome {
    Point(SamplePoint),
    Unavailable(SkipReason),
    Failed(String),
}

/// Dates sampled for a reference date, oldest first, reference date last.
pub fn sample_dates(reference_date: NaiveDate) -> Result<Vec<NaiveDate>, SeriesError> {
    let start = reference_date
        .checked_sub_days(Days::new(SERIES_SPAN_DAYS))
        .ok_or(SeriesError::DateOutOfRange(reference_date))?;

    let mut dates = Vec::with_capacity((SERIES_SPAN_DAYS / STRIDE_DAYS + 1) as usize);
    let mut current = Some(start);
    while let Some(date) = current.filter(|d| *d <= reference_date) {
        dates.push(date);
        current = date.checked_add_days(Days::new(STRIDE_DAYS));
    }

    Ok(dates)
}

/// `(a - b) / (a + b)`, undefined when the sum is zero.
pub fn normalized_difference(a: f64, b: f64) -> Option<f64> {
    let sum = a + b;
    if sum == 0.0 {
        None
    } else {
        Some((a - b) / sum)
    }
}

/// Round to 4 decimal places.
///
/// Rounds the exact binary value, so ties such as `0.03125` go to the
/// even digit (`0.0312`).
pub fn round4(value: f64) -> f64 {
    format!("{:.4}", value).parse().unwrap_or(value)
}

/// Turn one band reading into a sample point.
pub fn evaluate_reading(date: NaiveDate, reading: &BandReading) -> Result<SamplePoint, SkipReason> {
    let nir = reading.nir().ok_or(SkipReason::MissingBand("B8"))?;
    let red = reading.red().ok_or(SkipReason::MissingBand("B4"))?;
    let ndvi = normalized_difference(nir, red).ok_or(SkipReason::ZeroDenominator)?;

    Ok(SamplePoint {
        date,
        index_value: round4(ndvi),
    })
}

/// Drives the per-date sampling loop against a [`BandSampler`].
pub struct SeriesAggregator<'a> {
    sampler: &'a dyn BandSampler,
    call_timeout: Duration,
}

impl<'a> SeriesAggregator<'a> {
    pub fn new(sampler: &'a dyn BandSampler, call_timeout: Duration) -> Self {
        Self {
            sampler,
            call_timeout,
        }
    }

    /// Parse the reference date and compute the series.
    ///
    /// Fails only on an unparseable date, before any sampling call.
    pub async fn compute_series(
        &self,
        latitude: f64,
        longitude: f64,
        reference_date: &str,
    ) -> Result<Vec<SamplePoint>, SeriesError> {
        let request = SampleRequest {
            coordinate: Coordinate {
                latitude,
                longitude,
            },
            reference_date: crate::models::parse_date(reference_date)?,
        };
        self.compute(&request).await
    }

    /// Compute the series for an already validated request.
    pub async fn compute(&self, request: &SampleRequest) -> Result<Vec<SamplePoint>, SeriesError> {
        let dates = sample_dates(request.reference_date)?;
        let total = dates.len();
        let mut points = Vec::new();
        let mut failed = 0usize;

        // Strictly sequential: one outstanding call at a time.
        for date in dates {
            match self.sample_date(request.coordinate, date).await {
                DateOutcome::Point(point) => points.push(point),
                DateOutcome::Unavailable(reason) => {
                    debug!("Skipping {}: {}", date, reason);
                }
                DateOutcome::Failed(message) => {
                    failed += 1;
                    warn!("Error on {}: {}", date, message);
                }
            }
        }

        info!(
            "Computed {} of {} weekly samples at ({}, {}), {} failed",
            points.len(),
            total,
            request.coordinate.latitude,
            request.coordinate.longitude,
            failed
        );

        Ok(points)
    }

    /// Sample a single date, bounded by the per-call timeout.
    pub async fn sample_date(&self, coordinate: Coordinate, date: NaiveDate) -> DateOutcome {
        let call = self.sampler.sample(coordinate, date);
        let result = match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                return DateOutcome::Failed(format!(
                    "timed out after {}ms",
                    self.call_timeout.as_millis()
                ))
            }
        };

        match result {
            Ok(reading) => match evaluate_reading(date, &reading) {
                Ok(point) => DateOutcome::Point(point),
                Err(reason) => DateOutcome::Unavailable(reason),
            },
            Err(SampleError::NotFound(reason)) => {
                DateOutcome::Unavailable(SkipReason::NoImage(reason))
            }
            Err(SampleError::Service(message)) => DateOutcome::Failed(message),
        }
    }
}
