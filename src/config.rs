//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ndvi-series.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::sampler::EarthEngineConfig;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".ndvi-series.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Band sampling service settings.
    #[serde(default)]
    pub sampler: SamplerConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Earth Engine sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Earth Engine REST API root.
    #[serde(default = "default_earth_engine_url")]
    pub earth_engine_url: String,

    /// Cloud project for compute calls. Defaults to the service account's project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Image collection sampled for bands.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Skip images with this cloudy pixel percentage or more.
    #[serde(default = "default_max_cloud")]
    pub max_cloud_percentage: f64,

    /// Sampling scale in meters.
    #[serde(default = "default_scale")]
    pub scale_meters: f64,

    /// Timeout for each outbound call, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            earth_engine_url: default_earth_engine_url(),
            project: None,
            collection: default_collection(),
            max_cloud_percentage: default_max_cloud(),
            scale_meters: default_scale(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_earth_engine_url() -> String {
    "https://earthengine.googleapis.com".to_string()
}

fn default_collection() -> String {
    "COPERNICUS/S2_SR_HARMONIZED".to_string()
}

fn default_max_cloud() -> f64 {
    20.0
}

fn default_scale() -> f64 {
    10.0
}

fn default_timeout() -> u64 {
    60
}

impl SamplerConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl From<&SamplerConfig> for EarthEngineConfig {
    fn from(config: &SamplerConfig) -> Self {
        Self {
            api_base: config.earth_engine_url.clone(),
            project: config.project.clone().unwrap_or_default(),
            collection: config.collection.clone(),
            max_cloud_percentage: config.max_cloud_percentage,
            scale_meters: config.scale_meters,
            timeout: config.call_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given explicitly on the command line (or via their
    /// environment variables) override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref bind) = args.bind {
            self.server.bind = bind.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }

        if let Some(ref url) = args.earth_engine_url {
            self.sampler.earth_engine_url = url.clone();
        }
        if let Some(ref project) = args.project {
            self.sampler.project = Some(project.clone());
        }
        if let Some(timeout) = args.timeout {
            self.sampler.timeout_seconds = timeout;
        }
        if let Some(max_cloud) = args.max_cloud {
            self.sampler.max_cloud_percentage = max_cloud;
        }
    }

    /// Check values that would otherwise fail every request at runtime.
    pub fn validate(&self) -> Result<()> {
        let sampler = &self.sampler;

        if self.server.port == 0 {
            bail!("server.port must be between 1 and 65535");
        }
        if !sampler.earth_engine_url.starts_with("http://")
            && !sampler.earth_engine_url.starts_with("https://")
        {
            bail!("sampler.earth_engine_url must start with 'http://' or 'https://'");
        }
        if sampler.timeout_seconds == 0 {
            bail!("sampler.timeout_seconds must be at least 1");
        }
        if !(0.0..=100.0).contains(&sampler.max_cloud_percentage) {
            bail!(
                "sampler.max_cloud_percentage must be between 0 and 100, got {}",
                sampler.max_cloud_percentage
            );
        }
        if !(sampler.scale_meters > 0.0 && sampler.scale_meters.is_finite()) {
            bail!(
                "sampler.scale_meters must be positive, got {}",
                sampler.scale_meters
            );
        }

        Ok(())
    }

    /// Address the HTTP server listens on.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
