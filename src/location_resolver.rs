//! Location resolution
//!
//! Turns a parsed location input (coordinates or a name) into a structured
//! `Location` via the geocoding API. Geocoding failures for coordinate
//! lookups degrade to a coordinate-string label instead of failing the
//! whole lookup.

use crate::api::{LocationInput, WeatherApiClient};
use crate::models::Location;
use crate::models::open_meteo::GeocodingResult;
use anyhow::Result;
use haversine::{Location as HaversineLocation, Units, distance};
use tracing::{debug, warn};

/// Service for resolving location inputs
pub struct LocationResolver;

impl LocationResolver {
    /// Resolve a location input into a structured Location
    pub async fn resolve(
        api_client: &WeatherApiClient,
        location_input: LocationInput,
    ) -> Result<Location> {
        debug!("Resolving location input: {:?}", location_input);

        let location = match location_input {
            LocationInput::Coordinates(lat, lon) => {
                Self::resolve_coordinates(api_client, lat, lon).await
            }
            LocationInput::Name(name) => Self::resolve_name(api_client, &name).await?,
        };

        debug!(
            "Resolved location: {} at ({}, {})",
            location.name, location.latitude, location.longitude
        );

        Ok(location)
    }

    /// Resolve coordinates to a location with a proper name via reverse
    /// geocoding. Empty results and API failures fall back to the formatted
    /// coordinates as the label.
    async fn resolve_coordinates(api_client: &WeatherApiClient, lat: f64, lon: f64) -> Location {
        match api_client.reverse_geocode(lat, lon).await {
            Ok(results) if !results.is_empty() => {
                let nearest = Self::nearest_candidate(lat, lon, results);
                // Keep the requested coordinates; the candidate only names them
                Location {
                    latitude: lat,
                    longitude: lon,
                    ..Location::from(nearest)
                }
            }
            Ok(_) => {
                debug!("No reverse geocoding results found, using coordinates as name");
                Location::new(lat, lon, format!("{lat:.4}, {lon:.4}"))
            }
            Err(e) => {
                warn!("Reverse geocoding failed: {}, using coordinates as name", e);
                Location::new(lat, lon, format!("{lat:.4}, {lon:.4}"))
            }
        }
    }

    /// Resolve a location name to coordinates via geocoding
    async fn resolve_name(api_client: &WeatherApiClient, name: &str) -> Result<Location> {
        debug!("Geocoding location name: {}", name);

        let geocoding_results = api_client.geocode(name).await?;
        if geocoding_results.is_empty() {
            return Err(anyhow::anyhow!("Location not found: {}", name));
        }

        // Use the first (best) result
        let geocoding = geocoding_results.into_iter().next().unwrap();
        debug!(
            "Found location: {} ({:.4}, {:.4})",
            geocoding.name, geocoding.latitude, geocoding.longitude
        );

        Ok(Location::from(geocoding))
    }

    /// Pick the candidate closest to the requested point
    fn nearest_candidate(
        lat: f64,
        lon: f64,
        candidates: Vec<GeocodingResult>,
    ) -> GeocodingResult {
        candidates
            .into_iter()
            .map(|candidate| {
                let km = distance(
                    HaversineLocation {
                        latitude: lat,
                        longitude: lon,
                    },
                    HaversineLocation {
                        latitude: candidate.latitude,
                        longitude: candidate.longitude,
                    },
                    Units::Kilometers,
                );
                (candidate, km)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(candidate, _)| candidate)
            .unwrap()
    }
}
