//! Open-Meteo API response structures and conversion utilities

use chrono::{FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Location, WeatherReading};

/// Forecast response envelope from the Open-Meteo forecast API
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub latitude: f64,
    pub longitude: f64,
    /// Offset of the location's timezone from UTC, in seconds
    #[serde(default)]
    pub utc_offset_seconds: i32,
    pub timezone: Option<String>,
    pub current: Option<CurrentData>,
}

/// Current conditions block from the Open-Meteo forecast API
#[derive(Debug, Deserialize)]
pub struct CurrentData {
    /// Observation time as a local ISO minute, e.g. "2026-08-07T14:15"
    pub time: String,
    #[serde(rename = "temperature_2m")]
    pub temperature: f32,
    pub rain: f32,
    pub cloud_cover: u8,
}

impl CurrentData {
    /// Convert the wire block into a domain reading, re-attaching the
    /// envelope's UTC offset so the timestamp stays location-local.
    /// Unparseable times fall back to the current time in that offset.
    #[must_use]
    pub fn into_reading(self, utc_offset_seconds: i32) -> WeatherReading {
        let offset = FixedOffset::east_opt(utc_offset_seconds)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());

        let timestamp = NaiveDateTime::parse_from_str(&self.time, "%Y-%m-%dT%H:%M")
            .ok()
            .and_then(|dt| dt.and_local_timezone(offset).earliest())
            .unwrap_or_else(|| Utc::now().with_timezone(&offset));

        WeatherReading {
            timestamp,
            temperature_c: self.temperature,
            rain_mm: self.rain,
            cloud_cover_pct: self.cloud_cover,
        }
    }
}

/// Geocoding response from the Open-Meteo geocoding API.
/// Both the forward search and the reverse endpoint use this shape.
#[derive(Debug, Deserialize)]
pub struct GeocodingResponse {
    pub results: Option<Vec<GeocodingResult>>,
}

/// A single geocoding candidate
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeocodingResult {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub admin1: Option<String>,
    pub timezone: Option<String>,
}

impl GeocodingResult {
    /// One-line summary for candidate listings
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![self.name.clone()];
        if let Some(admin1) = &self.admin1 {
            parts.push(admin1.clone());
        }
        if let Some(country) = &self.country {
            parts.push(country.clone());
        }
        format!(
            "{} ({:.4}, {:.4})",
            parts.join(", "),
            self.latitude,
            self.longitude
        )
    }
}

impl From<GeocodingResult> for Location {
    fn from(result: GeocodingResult) -> Self {
        let country = result.country.or(result.country_code);
        match country {
            Some(country) => {
                Location::with_country(result.latitude, result.longitude, result.name, country)
            }
            None => Location::new(result.latitude, result.longitude, result.name),
        }
    }
}
