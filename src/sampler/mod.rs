//! Band sampling service clients.
//!
//! The aggregator only depends on [`BandSampler`]; the Earth Engine
//! client is the production implementation.

pub mod credentials;
pub mod earth_engine;

pub use credentials::{ServiceAccountCredentials, TokenSource};
pub use earth_engine::{EarthEngineConfig, EarthEngineSampler};

use crate::error::SampleError;
use crate::models::{BandReading, Coordinate};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Samples surface reflectance bands at a location and date.
#[async_trait]
pub trait BandSampler: Send + Sync {
    async fn sample(&self, coordinate: Coordinate, date: NaiveDate)
        -> Result<BandReading, SampleError>;
}

#[cfg(test)]
pub mod testing {
    //! Scripted sampler for tests.

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Returns scripted results per date; unscripted dates are `NotFound`.
    #[derive(Default)]
    pub struct ScriptedSampler {
        results: HashMap<NaiveDate, Result<BandReading, SampleError>>,
        delays: HashMap<NaiveDate, Duration>,
        calls: Mutex<Vec<NaiveDate>>,
    }

    impl ScriptedSampler {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_reading(mut self, date: NaiveDate, reading: BandReading) -> Self {
            self.results.insert(date, Ok(reading));
            self
        }

        pub fn with_error(mut self, date: NaiveDate, error: SampleError) -> Self {
            self.results.insert(date, Err(error));
            self
        }

        pub fn with_delay(mut self, date: NaiveDate, delay: Duration) -> Self {
            self.delays.insert(date, delay);
            self
        }

        /// Dates requested so far, in call order.
        pub fn calls(&self) -> Vec<NaiveDate> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BandSampler for ScriptedSampler {
        async fn sample(
            &self,
            _coordinate: Coordinate,
            date: NaiveDate,
        ) -> Result<BandReading, SampleError> {
            self.calls.lock().unwrap().push(date);
            if let Some(delay) = self.delays.get(&date) {
                tokio::time::sleep(*delay).await;
            }
            self.results
                .get(&date)
                .cloned()
                .unwrap_or_else(|| Err(SampleError::not_found("no scripted image")))
        }
    }
}
