//! Tunables for the observation cache and the interpolator.
//!
//! Every struct derives a `bon` builder whose unset fields fall back to the
//! documented defaults, so `DwdWeatherConfig::default()` and
//! `DwdWeatherConfig::builder().build()` are equivalent.

use crate::interpolation::kernel::Kernel;
use crate::types::modality::{Modality, Source};
use bon::Builder;
use chrono::TimeDelta;

#[derive(Debug, Clone, Default, Builder)]
pub struct DwdWeatherConfig {
    #[builder(default)]
    pub cache: CacheConfig,
    #[builder(default)]
    pub interpolation: InterpolationConfig,
}

/// Refresh policy of the [`crate::ObservationCache`].
#[derive(Debug, Clone, Builder)]
pub struct CacheConfig {
    /// Age after which the domestic feed is refreshed.
    #[builder(default = Source::Domestic.default_staleness())]
    pub domestic_staleness: TimeDelta,
    /// Age after which the continental feed is refreshed.
    #[builder(default = Source::Continental.default_staleness())]
    pub continental_staleness: TimeDelta,
    /// First delay before retrying a source whose fetch failed or returned nothing.
    #[builder(default = TimeDelta::seconds(60))]
    pub min_backoff: TimeDelta,
    /// Upper bound of the retry delay.
    #[builder(default = TimeDelta::seconds(600))]
    pub max_backoff: TimeDelta,
    /// Growth factor applied to the retry delay after each consecutive failure.
    #[builder(default = 1.5)]
    pub backoff_factor: f64,
    /// Readings older than this are dropped from the interpolation input,
    /// station by station.
    #[builder(default = TimeDelta::hours(4))]
    pub max_observation_age: TimeDelta,
}

impl CacheConfig {
    pub fn staleness(&self, source: Source) -> TimeDelta {
        match source {
            Source::Domestic => self.domestic_staleness,
            Source::Continental => self.continental_staleness,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Parameters of the radial-basis-function fit.
#[derive(Debug, Clone, Builder)]
pub struct InterpolationConfig {
    #[builder(default)]
    pub kernel: Kernel,
    #[builder(default)]
    pub altitude_weights: AltitudeWeights,
    /// Fewer usable stations than this make a modality unavailable.
    #[builder(default = 2)]
    pub min_stations: usize,
    /// Ridge term added to the kernel matrix diagonal. Zero gives exact interpolation.
    #[builder(default = 0.0)]
    pub smoothing: f64,
    /// Stations closer than this (in metric space, meters) are merged before the fit.
    #[builder(default = 1.0)]
    pub coincidence_tolerance_m: f64,
    /// Clamp scalar estimates to the range of the observed inputs.
    #[builder(default = true)]
    pub clamp_to_observed: bool,
    /// Number of fitted models kept by [`crate::DwdWeather`].
    #[builder(default = 1024)]
    pub model_cache_capacity: usize,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Multiplier applied to the vertical separation (in meters) before it is combined
/// with the horizontal great-circle distance (in meters).
///
/// A weight of 100 makes a station 1 km higher as "far" as one 100 km away.
#[derive(Debug, Clone, Copy, PartialEq, Builder)]
pub struct AltitudeWeights {
    #[builder(default = 100.0)]
    pub temperature: f64,
    #[builder(default = 0.0)]
    pub pressure: f64,
    #[builder(default = 100.0)]
    pub humidity: f64,
    #[builder(default = 10.0)]
    pub precipitation: f64,
    #[builder(default = 50.0)]
    pub wind_speed: f64,
    #[builder(default = 50.0)]
    pub wind_gust: f64,
    #[builder(default = 10.0)]
    pub wind_direction: f64,
}

impl AltitudeWeights {
    /// The same weight for every modality.
    pub fn uniform(weight: f64) -> Self {
        Self {
            temperature: weight,
            pressure: weight,
            humidity: weight,
            precipitation: weight,
            wind_speed: weight,
            wind_gust: weight,
            wind_direction: weight,
        }
    }

    pub fn get(&self, modality: Modality) -> f64 {
        match modality {
            Modality::Temperature => self.temperature,
            Modality::Pressure => self.pressure,
            Modality::Humidity => self.humidity,
            Modality::Precipitation => self.precipitation,
            Modality::WindSpeed => self.wind_speed,
            Modality::WindGust => self.wind_gust,
            Modality::WindDirection => self.wind_direction,
        }
    }
}

impl Default for AltitudeWeights {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DwdWeatherConfig::default();
        assert_eq!(config.cache.staleness(Source::Domestic), TimeDelta::minutes(30));
        assert_eq!(config.cache.staleness(Source::Continental), TimeDelta::hours(3));
        assert_eq!(config.interpolation.kernel, Kernel::Linear);
        assert_eq!(config.interpolation.min_stations, 2);
        assert_eq!(config.interpolation.altitude_weights.get(Modality::Temperature), 100.0);
        assert_eq!(config.interpolation.altitude_weights.get(Modality::Pressure), 0.0);
    }

    #[test]
    fn test_builder_overrides() {
        let config = DwdWeatherConfig::builder()
            .interpolation(
                InterpolationConfig::builder()
                    .min_stations(5)
                    .altitude_weights(AltitudeWeights::uniform(1.0))
                    .build(),
            )
            .build();
        assert_eq!(config.interpolation.min_stations, 5);
        assert!(Modality::ALL
            .iter()
            .all(|m| config.interpolation.altitude_weights.get(*m) == 1.0));
        assert_eq!(config.cache.min_backoff, TimeDelta::seconds(60));
    }
}
