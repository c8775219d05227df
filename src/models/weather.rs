//! Weather reading model and display methods

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use sunrise::{Coordinates, SolarDay, SolarEvent};

use super::Location;

/// Condition summary derived from cloud cover
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Clear,
    Cloudy,
}

impl Condition {
    /// Derive the condition from a cloud cover percentage.
    /// More than half the sky covered counts as cloudy.
    #[must_use]
    pub fn from_cloud_cover(cloud_cover_pct: u8) -> Self {
        if cloud_cover_pct > 50 {
            Self::Cloudy
        } else {
            Self::Clear
        }
    }

    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Cloudy => "Cloudy",
        }
    }

    /// Icon name for display surfaces. Clear skies get a sun during the
    /// day and a moon at night.
    #[must_use]
    pub fn icon_name(&self, daytime: bool) -> &'static str {
        match self {
            Self::Cloudy => "cloud",
            Self::Clear if daytime => "sun",
            Self::Clear => "moon",
        }
    }
}

/// A single current-conditions reading, overwritten on the next successful fetch
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WeatherReading {
    /// Observation time in the location's local offset
    pub timestamp: DateTime<FixedOffset>,
    /// Temperature in Celsius
    pub temperature_c: f32,
    /// Rain amount in mm
    pub rain_mm: f32,
    /// Cloud cover percentage (0-100)
    pub cloud_cover_pct: u8,
}

impl WeatherReading {
    /// Condition summary for this reading
    #[must_use]
    pub fn condition(&self) -> Condition {
        Condition::from_cloud_cover(self.cloud_cover_pct)
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.2}°C", self.temperature_c)
    }

    /// Format the observation time with its local offset
    #[must_use]
    pub fn format_observed(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M %:z").to_string()
    }

    /// Whether the reading falls between sunrise and sunset at the given
    /// coordinates. Falls back to daytime when the coordinates are invalid.
    #[must_use]
    pub fn is_daytime(&self, latitude: f64, longitude: f64) -> bool {
        let Some(coordinates) = Coordinates::new(latitude, longitude) else {
            return true;
        };

        let solar_day = SolarDay::new(coordinates, self.timestamp.date_naive());
        let sunrise = solar_day.event_time(SolarEvent::Sunrise);
        let sunset = solar_day.event_time(SolarEvent::Sunset);

        let observed = self.timestamp.with_timezone(&Utc);
        match (sunrise, sunset) {
            (Some(sunrise), Some(sunset)) => observed >= sunrise && observed <= sunset,
            _ => true,
        }
    }

    /// Icon name for this reading at the given coordinates
    #[must_use]
    pub fn icon_name(&self, latitude: f64, longitude: f64) -> &'static str {
        self.condition()
            .icon_name(self.is_daytime(latitude, longitude))
    }
}

/// What both display surfaces render: a resolved place plus its reading
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CurrentReport {
    /// Resolved location for the lookup
    pub location: Location,
    /// Current conditions at that location
    pub reading: WeatherReading,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn reading(cloud_cover_pct: u8) -> WeatherReading {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        WeatherReading {
            timestamp: offset.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap(),
            temperature_c: 18.416,
            rain_mm: 0.0,
            cloud_cover_pct,
        }
    }

    #[rstest]
    #[case(0, Condition::Clear)]
    #[case(50, Condition::Clear)]
    #[case(51, Condition::Cloudy)]
    #[case(100, Condition::Cloudy)]
    fn test_condition_threshold(#[case] cloud_cover: u8, #[case] expected: Condition) {
        assert_eq!(Condition::from_cloud_cover(cloud_cover), expected);
    }

    #[test]
    fn test_format_temperature_two_decimals() {
        assert_eq!(reading(20).format_temperature(), "18.42°C");
    }

    #[test]
    fn test_icon_names() {
        assert_eq!(Condition::Cloudy.icon_name(true), "cloud");
        assert_eq!(Condition::Cloudy.icon_name(false), "cloud");
        assert_eq!(Condition::Clear.icon_name(true), "sun");
        assert_eq!(Condition::Clear.icon_name(false), "moon");
    }

    #[test]
    fn test_daytime_in_berlin_summer() {
        // Noon local time in Berlin on June 1st is well inside daylight
        let noon = reading(20);
        assert!(noon.is_daytime(52.52, 13.41));

        // Half past midnight is not
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let night = WeatherReading {
            timestamp: offset.with_ymd_and_hms(2026, 6, 1, 0, 30, 0).unwrap(),
            ..noon
        };
        assert!(!night.is_daytime(52.52, 13.41));
    }

    #[test]
    fn test_format_observed_keeps_offset() {
        let formatted = reading(20).format_observed();
        assert!(formatted.contains("2026-06-01 12:00"));
        assert!(formatted.contains("+02:00"));
    }
}
