//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// NDVI Series - weekly vegetation index time series over HTTP
///
/// Serves `POST /api/ndvi-timeseries`, sampling Sentinel-2 imagery through
/// Google Earth Engine once per week for the year before a reference date.
///
/// Examples:
///   GOOGLE_SERVICE_ACCOUNT_JSON="$(cat key.json)" ndvi-series
///   ndvi-series --port 9000 --timeout 30
///   ndvi-series --config deploy/.ndvi-series.toml --verbose
///   ndvi-series --init-config
#[derive(Parser, Debug, Clone)]
#[cfg_attr(test, derive(Default))]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .ndvi-series.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(long, value_name = "ADDR", env = "NDVI_BIND")]
    pub bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, value_name = "PORT", env = "PORT")]
    pub port: Option<u16>,

    /// Earth Engine REST API root URL
    #[arg(long, value_name = "URL", env = "EARTH_ENGINE_URL")]
    pub earth_engine_url: Option<String>,

    /// Cloud project used for Earth Engine compute
    ///
    /// Defaults to the project of the service account.
    #[arg(long, value_name = "ID", env = "EARTH_ENGINE_PROJECT")]
    pub project: Option<String>,

    /// Timeout for each outbound sampling call, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Ignore images with this cloudy pixel percentage or more
    #[arg(long, value_name = "PERCENT")]
    pub max_cloud: Option<f64>,

    /// Service account key JSON (contents, not a path)
    #[arg(
        long,
        value_name = "JSON",
        env = "GOOGLE_SERVICE_ACCOUNT_JSON",
        hide_env_values = true
    )]
    pub service_account_json: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .ndvi-series.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.earth_engine_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Earth Engine URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.port == Some(0) {
            return Err("Port must be between 1 and 65535".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(max_cloud) = self.max_cloud {
            if !(0.0..=100.0).contains(&max_cloud) {
                return Err("Max cloud percentage must be between 0 and 100".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
