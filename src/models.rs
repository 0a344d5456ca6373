//! Data models for the NDVI series service.
//!
//! This module contains the request/response shapes exchanged over HTTP
//! and the band readings returned by the sampling service.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::SeriesError;

/// Textual date format accepted on the wire.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Sentinel-2 near-infrared band, with its zero-padded alias.
pub const NIR_BANDS: [&str; 2] = ["B8", "B08"];

/// Sentinel-2 red band, with its zero-padded alias.
pub const RED_BANDS: [&str; 2] = ["B4", "B04"];

/// A point on the earth's surface. No range validation is performed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, SeriesError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| SeriesError::InvalidDate(raw.to_string()))
}

/// Body of `POST /api/ndvi-timeseries`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NdviTimeSeriesRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Format: YYYY-MM-DD
    pub reference_date: String,
}

/// A validated time series request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRequest {
    pub coordinate: Coordinate,
    pub reference_date: NaiveDate,
}

/// One entry of the weekly NDVI series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    /// Sample date, serialized as YYYY-MM-DD.
    pub date: NaiveDate,
    /// NDVI rounded to 4 decimal places.
    #[serde(rename = "ndvi")]
    pub index_value: f64,
}

/// Band values sampled at one location and date.
///
/// Bands the service returned as null are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BandReading {
    values: BTreeMap<String, f64>,
}

impl BandReading {
    /// Creates an empty reading.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a band value.
    pub fn insert(&mut self, band: impl Into<String>, value: f64) {
        self.values.insert(band.into(), value);
    }

    /// Builder-style variant of [`BandReading::insert`].
    pub fn with(mut self, band: impl Into<String>, value: f64) -> Self {
        self.insert(band, value);
        self
    }

    /// Returns the value of a band.
    pub fn get(&self, band: &str) -> Option<f64> {
        self.values.get(band).copied()
    }

    /// Returns the value of the first band name present.
    pub fn first_of(&self, names: &[&str]) -> Option<f64> {
        names.iter().find_map(|name| self.get(name))
    }

    /// Near-infrared reflectance.
    pub fn nir(&self) -> Option<f64> {
        self.first_of(&NIR_BANDS)
    }

    /// Red reflectance.
    pub fn red(&self) -> Option<f64> {
        self.first_of(&RED_BANDS)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl FromIterator<(String, f64)> for BandReading {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Body of `POST /api/satellite-features`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatelliteFeaturesRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Format: YYYY-MM-DD
    pub date: String,
}

/// Raw bands plus derived spectral indices for one location and date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatelliteFeatures {
    pub latitude: f64,
    pub longitude: f64,
    pub date: NaiveDate,
    /// Raw surface reflectance bands.
    pub bands: BandReading,
    /// Derived indices keyed by name; undefined indices are omitted.
    pub indices: BTreeMap<String, f64>,
}
