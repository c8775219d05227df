//! Current-conditions lookup service
//!
//! One lookup: resolve the input to a place, consult the cache, fetch on
//! miss, store on success. A failed refresh never overwrites cached state.

use crate::api::{LocationInput, LocationParser, WeatherApiClient};
use crate::cache;
use crate::config::{DefaultsConfig, SkycastConfig};
use crate::location_resolver::LocationResolver;
use crate::models::open_meteo::GeocodingResult;
use crate::models::{CurrentReport, Location, WeatherReading};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Service answering "what is the weather right now at X"
pub struct CurrentWeatherService {
    client: WeatherApiClient,
    defaults: DefaultsConfig,
    reading_ttl: Duration,
    geocode_ttl: Duration,
}

impl CurrentWeatherService {
    /// Create a new lookup service from configuration
    pub fn new(config: &SkycastConfig) -> Result<Self> {
        let client = WeatherApiClient::new(config)?;
        Ok(Self {
            client,
            defaults: config.defaults.clone(),
            reading_ttl: Duration::from_secs(u64::from(config.cache.reading_ttl_minutes) * 60),
            geocode_ttl: Duration::from_secs(u64::from(config.cache.geocode_ttl_hours) * 3600),
        })
    }

    /// Look up current conditions. `None` uses the configured default
    /// location, the stand-in when no position was provided.
    #[instrument(skip(self))]
    pub async fn lookup(&self, query: Option<&str>) -> Result<CurrentReport> {
        match query {
            Some(query) => self.lookup_input(LocationParser::parse(query)?).await,
            None => {
                info!(
                    "No location given, falling back to default location: {}",
                    self.defaults.label
                );
                let location = self.defaults.location();
                let reading = self.reading_for(&location).await?;
                Ok(CurrentReport { location, reading })
            }
        }
    }

    /// Forward-geocode a name and return the raw candidate list
    pub async fn search(&self, name: &str) -> Result<Vec<GeocodingResult>> {
        self.client.geocode(name).await
    }

    async fn lookup_input(&self, input: LocationInput) -> Result<CurrentReport> {
        match input {
            LocationInput::Name(name) => {
                let location = self.resolve_name_cached(&name).await?;
                let reading = self.reading_for(&location).await?;
                Ok(CurrentReport { location, reading })
            }
            LocationInput::Coordinates(lat, lon) => {
                // The reading and the place label are independent; fetch both
                // at once, the way the original display fires its two calls.
                let (location, reading) = tokio::join!(
                    LocationResolver::resolve(&self.client, LocationInput::Coordinates(lat, lon)),
                    self.reading_at(lat, lon)
                );
                Ok(CurrentReport {
                    location: location?,
                    reading: reading?,
                })
            }
        }
    }

    /// Cached name resolution; geocoding results are stable, so they cache
    /// for days with jitter.
    async fn resolve_name_cached(&self, name: &str) -> Result<Location> {
        let key = format!("geocode:{}", name.trim().to_lowercase());

        if cache::is_initialized() {
            if let Some(cached) = cache::get::<Location>(&key).await? {
                debug!("Geocode cache hit for '{}'", name);
                return Ok(cached);
            }
        }

        let location =
            LocationResolver::resolve(&self.client, LocationInput::Name(name.to_string())).await?;

        if cache::is_initialized() {
            cache::put(&key, location.clone(), cache::jittered(self.geocode_ttl))
                .await
                .with_context(|| "Failed to store geocode result in cache")?;
        }

        Ok(location)
    }

    async fn reading_for(&self, location: &Location) -> Result<WeatherReading> {
        self.reading_at(location.latitude, location.longitude).await
    }

    /// Cached current-conditions fetch. The cache entry is only replaced on
    /// a successful fetch; errors leave the previous state alone.
    async fn reading_at(&self, lat: f64, lon: f64) -> Result<WeatherReading> {
        let key = Location::new(lat, lon, String::new()).cache_key();

        if cache::is_initialized() {
            if let Some(cached) = cache::get::<WeatherReading>(&key).await? {
                debug!("Reading cache hit for {:.2}, {:.2}", lat, lon);
                return Ok(cached);
            }
        }

        let reading = self.client.current_weather(lat, lon).await?;

        if cache::is_initialized() {
            cache::put(&key, reading.clone(), self.reading_ttl)
                .await
                .with_context(|| "Failed to store weather reading in cache")?;
        }

        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_service(server_uri: &str) -> CurrentWeatherService {
        let mut config = SkycastConfig::default();
        config.weather.forecast_base_url = format!("{server_uri}/v1");
        config.weather.geocoding_base_url = format!("{server_uri}/v1");
        config.weather.max_retries = 0;
        CurrentWeatherService::new(&config).unwrap()
    }

    const FORECAST_BODY: &str = r#"{
        "latitude": 52.52,
        "longitude": 13.419998,
        "utc_offset_seconds": 7200,
        "timezone": "Europe/Berlin",
        "current": {
            "time": "2026-08-07T14:15",
            "interval": 900,
            "temperature_2m": 18.4,
            "rain": 0.0,
            "cloud_cover": 85
        }
    }"#;

    const GEOCODING_BODY: &str = r#"{
        "results": [
            {
                "name": "Berlin",
                "latitude": 52.52437,
                "longitude": 13.41053,
                "country": "Germany",
                "country_code": "DE",
                "admin1": "Berlin"
            }
        ]
    }"#;

    async fn mount_forecast(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(FORECAST_BODY, "application/json"),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_lookup_by_name() {
        let server = MockServer::start().await;
        mount_forecast(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "Berlin"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(GEOCODING_BODY, "application/json"),
            )
            .mount(&server)
            .await;

        let report = test_service(&server.uri())
            .lookup(Some("Berlin"))
            .await
            .unwrap();

        assert_eq!(report.location.label(), "Berlin, Germany");
        assert_eq!(report.reading.temperature_c, 18.4);
        assert_eq!(report.reading.condition().description(), "Cloudy");
    }

    #[tokio::test]
    async fn test_lookup_by_coordinates_labels_from_reverse() {
        let server = MockServer::start().await;
        mount_forecast(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/reverse"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(GEOCODING_BODY, "application/json"),
            )
            .mount(&server)
            .await;

        let report = test_service(&server.uri())
            .lookup(Some("52.52,13.41"))
            .await
            .unwrap();

        assert_eq!(report.location.label(), "Berlin, Germany");
        assert_eq!(report.location.latitude, 52.52);
    }

    #[tokio::test]
    async fn test_lookup_default_location_without_query() {
        let server = MockServer::start().await;
        mount_forecast(&server).await;

        let report = test_service(&server.uri()).lookup(None).await.unwrap();

        // Default location label comes from config, no geocoding involved
        assert_eq!(report.location.label(), "Berlin, Germany");
        assert_eq!(report.reading.cloud_cover_pct, 85);
    }

    #[tokio::test]
    async fn test_lookup_unknown_name_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
            .mount(&server)
            .await;

        let result = test_service(&server.uri()).lookup(Some("Nowhereville")).await;
        assert!(result.is_err());
    }
}
