//! `skycast` - Current weather lookup and display
//!
//! This library provides the core functionality for resolving a place
//! (coordinates, city name, or a configured default), fetching current
//! conditions from the Open-Meteo APIs, and formatting them for display.

pub mod api;
pub mod cache;
pub mod config;
pub mod current;
pub mod error;
pub mod location_resolver;
pub mod models;
pub mod web;

// Re-export core types for public API
pub use api::{LocationInput, LocationParser, WeatherApiClient};
pub use config::SkycastConfig;
pub use current::CurrentWeatherService;
pub use error::SkycastError;
pub use location_resolver::LocationResolver;
pub use models::{Condition, CurrentReport, Location, WeatherReading};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SkycastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
