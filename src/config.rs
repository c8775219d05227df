//! Configuration management for the `skycast` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::SkycastError;
use crate::models::Location;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `skycast` application
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SkycastConfig {
    /// Weather API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Default lookup location when none is given
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Web serve mode configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for the forecast API
    #[serde(default = "default_forecast_base_url")]
    pub forecast_base_url: String,
    /// Base URL for the geocoding API
    #[serde(default = "default_geocoding_base_url")]
    pub geocoding_base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_weather_max_retries")]
    pub max_retries: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL for current-conditions readings, in minutes
    #[serde(default = "default_reading_ttl")]
    pub reading_ttl_minutes: u32,
    /// TTL for geocoding results, in hours
    #[serde(default = "default_geocode_ttl")]
    pub geocode_ttl_hours: u32,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default lookup location, used when no query is given.
/// Ships pointing at Berlin, the fallback when no position is available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Latitude of the default location
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    /// Longitude of the default location
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    /// Display label for the default location
    #[serde(default = "default_label")]
    pub label: String,
    /// Measurement units (metric only)
    #[serde(default = "default_units")]
    pub units: String,
}

/// Web serve mode settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// TLS certificate path (PEM); plain HTTP when unset
    #[serde(default)]
    pub cert_path: Option<String>,
    /// TLS private key path (PEM)
    #[serde(default)]
    pub key_path: Option<String>,
}

// Default value functions
fn default_forecast_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_geocoding_base_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_weather_max_retries() -> u32 {
    3
}

fn default_reading_ttl() -> u32 {
    15
}

fn default_geocode_ttl() -> u32 {
    24 * 7
}

fn default_cache_location() -> String {
    "~/.cache/skycast".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_latitude() -> f64 {
    52.52
}

fn default_longitude() -> f64 {
    13.41
}

fn default_label() -> String {
    "Berlin, Germany".to_string()
}

fn default_units() -> String {
    "metric".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            forecast_base_url: default_forecast_base_url(),
            geocoding_base_url: default_geocoding_base_url(),
            timeout_seconds: default_weather_timeout(),
            max_retries: default_weather_max_retries(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            reading_ttl_minutes: default_reading_ttl(),
            geocode_ttl_hours: default_geocode_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
            label: default_label(),
            units: default_units(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            cert_path: None,
            key_path: None,
        }
    }
}

impl DefaultsConfig {
    /// The default location as a domain `Location`.
    /// The label splits into name and country on the first comma.
    #[must_use]
    pub fn location(&self) -> Location {
        match self.label.split_once(',') {
            Some((name, country)) => Location::with_country(
                self.latitude,
                self.longitude,
                name.trim().to_string(),
                country.trim().to_string(),
            ),
            None => Location::new(self.latitude, self.longitude, self.label.clone()),
        }
    }
}

impl SkycastConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Add environment variable overrides with SKYCAST_ prefix
        builder = builder.add_source(
            Environment::with_prefix("SKYCAST")
                .separator("_")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: SkycastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("skycast").join("config.toml"))
    }

    /// Resolve the cache directory, expanding a leading `~`
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        if let Some(rest) = self.cache.location.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(&self.cache.location)
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds == 0 || self.weather.timeout_seconds > 300 {
            return Err(SkycastError::config(
                "Weather API timeout must be between 1 and 300 seconds",
            )
            .into());
        }

        if self.weather.max_retries > 10 {
            return Err(SkycastError::config("Weather API max retries cannot exceed 10").into());
        }

        if self.cache.reading_ttl_minutes > 24 * 60 {
            return Err(
                SkycastError::config("Reading cache TTL cannot exceed 1440 minutes (1 day)").into(),
            );
        }

        if self.cache.geocode_ttl_hours > 24 * 30 {
            return Err(
                SkycastError::config("Geocode cache TTL cannot exceed 720 hours (30 days)").into(),
            );
        }

        if !(-90.0..=90.0).contains(&self.defaults.latitude) {
            return Err(
                SkycastError::config("Default latitude must be between -90 and 90").into(),
            );
        }

        if !(-180.0..=180.0).contains(&self.defaults.longitude) {
            return Err(
                SkycastError::config("Default longitude must be between -180 and 180").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SkycastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(SkycastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if self.defaults.units != "metric" {
            return Err(SkycastError::config(format!(
                "Invalid units '{}'. Only 'metric' is supported",
                self.defaults.units
            ))
            .into());
        }

        for url in [
            &self.weather.forecast_base_url,
            &self.weather.geocoding_base_url,
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(SkycastError::config(
                    "Weather API base URLs must be valid HTTP or HTTPS URLs",
                )
                .into());
            }
        }

        if self.server.cert_path.is_some() != self.server.key_path.is_some() {
            return Err(SkycastError::config(
                "TLS requires both cert_path and key_path to be set",
            )
            .into());
        }

        Ok(())
    }

    /// Create configuration directory if it doesn't exist
    pub fn ensure_config_dir() -> Result<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            let skycast_config_dir = config_dir.join("skycast");
            std::fs::create_dir_all(&skycast_config_dir).with_context(|| {
                format!(
                    "Failed to create config directory: {}",
                    skycast_config_dir.display()
                )
            })?;
            Ok(skycast_config_dir)
        } else {
            Err(SkycastError::config("Unable to determine config directory").into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SkycastConfig::default();
        assert_eq!(config.weather.forecast_base_url, "https://api.open-meteo.com/v1");
        assert_eq!(
            config.weather.geocoding_base_url,
            "https://geocoding-api.open-meteo.com/v1"
        );
        assert_eq!(config.weather.timeout_seconds, 30);
        assert_eq!(config.cache.reading_ttl_minutes, 15);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.port, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_location_is_berlin() {
        let config = SkycastConfig::default();
        let location = config.defaults.location();
        assert_eq!(location.latitude, 52.52);
        assert_eq!(location.longitude, 13.41);
        assert_eq!(location.label(), "Berlin, Germany");
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = SkycastConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = SkycastConfig::default();
        config.weather.timeout_seconds = 500; // Invalid - too high
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout"));

        let mut config = SkycastConfig::default();
        config.defaults.latitude = 95.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_units() {
        let mut config = SkycastConfig::default();
        config.defaults.units = "imperial".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("units"));
    }

    #[test]
    fn test_config_validation_tls_pairing() {
        let mut config = SkycastConfig::default();
        config.server.cert_path = Some("cert.pem".to_string());
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("TLS"));
    }

    #[test]
    fn test_config_path_generation() {
        let path = SkycastConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("skycast"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
