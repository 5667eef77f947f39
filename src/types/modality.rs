//! Defines the observed quantities (modalities) and the upstream feeds (sources)
//! the observations come from.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A physical quantity reported by the weather stations.
///
/// Categorical weather state (cloud cover, rain codes) is not a modality; only
/// continuous quantities are interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// Air temperature in °C.
    Temperature,
    /// Air pressure reduced to sea level in hPa.
    Pressure,
    /// Relative humidity in %.
    Humidity,
    /// Precipitation in mm during the last hour.
    Precipitation,
    /// Mean wind speed in m/s.
    WindSpeed,
    /// Peak wind gust in m/s.
    WindGust,
    /// Wind direction in degrees (meteorological, 0° = from North).
    WindDirection,
}

impl Modality {
    /// All modalities, in the order they appear in a weather report.
    pub const ALL: [Modality; 7] = [
        Modality::Temperature,
        Modality::Pressure,
        Modality::Humidity,
        Modality::Precipitation,
        Modality::WindSpeed,
        Modality::WindGust,
        Modality::WindDirection,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Modality::Temperature => "temperature",
            Modality::Pressure => "pressure",
            Modality::Humidity => "humidity",
            Modality::Precipitation => "precipitation",
            Modality::WindSpeed => "wind_speed",
            Modality::WindGust => "wind_gust",
            Modality::WindDirection => "wind_direction",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Modality::Temperature => "°C",
            Modality::Pressure => "hPa",
            Modality::Humidity => "%",
            Modality::Precipitation => "mm",
            Modality::WindSpeed | Modality::WindGust => "m/s",
            Modality::WindDirection => "°",
        }
    }

    /// Circular quantities are interpolated as unit vectors and never clamped.
    pub fn is_circular(&self) -> bool {
        matches!(self, Modality::WindDirection)
    }
}

/// Formats a `Modality` using its snake_case name.
///
/// # Examples
///
/// ```
/// use dwd_weather::Modality;
///
/// assert_eq!(Modality::WindGust.to_string(), "wind_gust");
/// ```
impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The upstream feed an observation was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// German stations, published every 30 minutes.
    Domestic,
    /// European stations, published every few hours.
    Continental,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::Domestic, Source::Continental];

    pub fn name(&self) -> &'static str {
        match self {
            Source::Domestic => "domestic",
            Source::Continental => "continental",
        }
    }

    /// Default staleness window matching the publication cadence of the feed.
    pub fn default_staleness(&self) -> TimeDelta {
        match self {
            Source::Domestic => TimeDelta::minutes(30),
            Source::Continental => TimeDelta::hours(3),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
