//! Weather API client for Open-Meteo integration
//!
//! HTTP client functionality for the two upstream services: the forecast
//! API (current conditions) and the geocoding API (forward search and
//! reverse lookup). Both are key-free and consumed as-is.

use crate::SkycastError;
use crate::config::SkycastConfig;
use crate::models::WeatherReading;
use crate::models::open_meteo::{ForecastResponse, GeocodingResponse, GeocodingResult};
use anyhow::{Context, Result};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

const USER_AGENT: &str = "skycast/0.1.0";

/// Client for the Open-Meteo forecast and geocoding APIs
pub struct WeatherApiClient {
    /// HTTP client with transient-error retry middleware
    client: ClientWithMiddleware,
    /// Forecast API base URL
    forecast_base: String,
    /// Geocoding API base URL
    geocoding_base: String,
}

impl WeatherApiClient {
    /// Create a new weather API client from configuration
    pub fn new(config: &SkycastConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.weather.timeout_seconds.into());

        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.weather.max_retries);
        let client = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            forecast_base: config.weather.forecast_base_url.trim_end_matches('/').to_string(),
            geocoding_base: config
                .weather
                .geocoding_base_url
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// Get current conditions for a coordinate pair
    #[instrument(skip(self))]
    pub async fn current_weather(&self, lat: f64, lon: f64) -> Result<WeatherReading> {
        info!("Getting current weather for coordinates: {:.4}, {:.4}", lat, lon);

        let url = format!(
            "{}/forecast?latitude={}&longitude={}&current=temperature_2m,rain,cloud_cover&timezone=auto",
            self.forecast_base, lat, lon
        );

        let response: ForecastResponse = self.get_json(&url).await?;

        let Some(current) = response.current else {
            return Err(SkycastError::api(format!(
                "No current weather data available for {lat:.4}, {lon:.4}"
            ))
            .into());
        };

        Ok(current.into_reading(response.utc_offset_seconds))
    }

    /// Forward geocode a location name into candidates
    #[instrument(skip(self), fields(location = name))]
    pub async fn geocode(&self, name: &str) -> Result<Vec<GeocodingResult>> {
        if name.trim().is_empty() {
            return Err(SkycastError::validation("Location cannot be empty").into());
        }

        info!("Geocoding location: '{}'", name);

        let url = format!(
            "{}/search?name={}&count=5&language=en&format=json",
            self.geocoding_base,
            urlencoding::encode(name)
        );

        let response: GeocodingResponse = self.get_json(&url).await?;
        let results = response.results.unwrap_or_default();

        if results.is_empty() {
            warn!("No results found for location '{}'", name);
        } else {
            debug!(
                "Geocoding results: {:?}",
                results.iter().map(GeocodingResult::summary).collect::<Vec<_>>()
            );
        }

        Ok(results)
    }

    /// Reverse geocode coordinates into nearby place candidates.
    /// An empty candidate list is not an error; callers fall back to a
    /// coordinate label.
    #[instrument(skip(self))]
    pub async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<Vec<GeocodingResult>> {
        info!("Reverse geocoding coordinates: {:.4}, {:.4}", lat, lon);

        let url = format!(
            "{}/reverse?latitude={}&longitude={}&language=en&format=json",
            self.geocoding_base, lat, lon
        );

        let response: GeocodingResponse = self.get_json(&url).await?;
        Ok(response.results.unwrap_or_default())
    }

    /// Issue a GET request and parse the JSON body, with request timing
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("API request URL: {}", url);
        let start_time = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| "Weather API request failed")?;

        let status = response.status();
        if !status.is_success() {
            warn!("API request failed with status {}", status);
            return Err(SkycastError::api(format!(
                "API request failed with status: {} - {}",
                status,
                status.canonical_reason().unwrap_or("Unknown error")
            ))
            .into());
        }

        let parsed = response
            .json::<T>()
            .await
            .with_context(|| "Failed to parse weather API response")?;

        let total_duration = start_time.elapsed();
        info!("API request completed in {:.3}s", total_duration.as_secs_f64());
        if total_duration.as_secs() > 5 {
            warn!("Slow API response detected: {:.3}s", total_duration.as_secs_f64());
        }

        Ok(parsed)
    }
}

/// Types of location input
#[derive(Debug, Clone)]
pub enum LocationInput {
    /// Coordinates (latitude, longitude)
    Coordinates(f64, f64),
    /// Location name (city, postal code, etc.)
    Name(String),
}

/// Location input parsing utilities
pub struct LocationParser;

impl LocationParser {
    /// Parse a query string into a location input. A valid "lat,lon" pair
    /// parses as coordinates; anything else is a name for the geocoder
    /// (postal codes included, the search endpoint resolves them).
    pub fn parse(input: &str) -> Result<LocationInput> {
        let input = input.trim();

        if input.is_empty() {
            return Err(SkycastError::validation("Location cannot be empty").into());
        }

        if let Some(coords) = Self::parse_coordinates(input) {
            return Ok(LocationInput::Coordinates(coords.0, coords.1));
        }

        Ok(LocationInput::Name(input.to_string()))
    }

    /// Parse coordinates from a string like "52.52,13.41" or "52.52 13.41".
    /// Returns `None` when the input is not a valid in-range pair.
    fn parse_coordinates(input: &str) -> Option<(f64, f64)> {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() != 2 {
            return None;
        }

        let lat = parts[0].parse::<f64>().ok()?;
        let lon = parts[1].parse::<f64>().ok()?;

        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }

        Some((lat, lon))
    }
}
