//! This module provides the main entry point: current weather estimates for an
//! arbitrary point, interpolated from the latest DWD station observations.

use crate::altitude::AltitudeLookup;
use crate::config::DwdWeatherConfig;
use crate::dataset::builder::DatasetBuilder;
use crate::error::DwdWeatherError;
use crate::interpolation::interpolator::Interpolator;
use crate::interpolation::model_cache::ModelCache;
use crate::observations::cache::{ObservationCache, RefreshOutcome};
use crate::observations::fetcher::ObservationFetcher;
use crate::stations::catalog::StationCatalog;
use crate::types::modality::{Modality, Source};
use crate::types::station::{GeoPoint, Station, StationId, StationSummary};
use crate::types::weather_report::{Coord, StationMeta, StationReport, StationValue, WeatherReport};
use crate::utils::{round2, Clock};
use bon::bon;
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use dwd_weather::LatLon;
///
/// let frankfurt = LatLon(50.11, 8.68);
/// assert_eq!(frankfurt.0, 50.11); // Latitude
/// assert_eq!(frankfurt.1, 8.68); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

/// The main client for current-weather queries.
///
/// Holds the station catalog, the observation cache (which refreshes itself on
/// demand) and the fitted-model cache. A single instance is meant to be shared by
/// all request handlers, e.g. behind an `Arc`.
///
/// # Examples
///
/// ```rust
/// # use dwd_weather::{DwdWeather, DwdWeatherError, ObservationFetcher};
/// # use std::path::Path;
/// # use std::sync::Arc;
/// # async fn run(fetcher: Arc<dyn ObservationFetcher>) -> Result<(), DwdWeatherError> {
/// let client = DwdWeather::from_station_file(Path::new("stations.xml"), fetcher).await?;
/// let report = client
///     .weather()
///     .latitude(50.11)
///     .longitude(8.68)
///     .altitude(112.0)
///     .call()
///     .await?;
/// println!("{}", serde_json::to_string_pretty(&report).unwrap());
/// # Ok(())
/// # }
/// ```
pub struct DwdWeather {
    catalog: Arc<StationCatalog>,
    observations: ObservationCache,
    models: ModelCache,
    altitude_lookup: Option<Arc<dyn AltitudeLookup>>,
    config: DwdWeatherConfig,
}

#[bon]
impl DwdWeather {
    /// Creates a client from an already loaded catalog.
    ///
    /// # Arguments
    ///
    /// * `.catalog(Arc<StationCatalog>)`: **Required.** Station reference table.
    /// * `.fetcher(Arc<dyn ObservationFetcher>)`: **Required.** Download layer for the observation feeds.
    /// * `.config(DwdWeatherConfig)`: Optional. Defaults to [`DwdWeatherConfig::default`].
    /// * `.altitude_lookup(Arc<dyn AltitudeLookup>)`: Optional. Used when a query gives no altitude.
    /// * `.clock(Arc<dyn Clock>)`: Optional. Defaults to the system clock.
    #[builder]
    pub fn new(
        catalog: Arc<StationCatalog>,
        fetcher: Arc<dyn ObservationFetcher>,
        config: Option<DwdWeatherConfig>,
        altitude_lookup: Option<Arc<dyn AltitudeLookup>>,
        clock: Option<Arc<dyn Clock>>,
    ) -> Self {
        let config = config.unwrap_or_default();
        let observations = ObservationCache::builder()
            .fetcher(fetcher)
            .config(config.cache.clone())
            .maybe_clock(clock)
            .build();
        let models = ModelCache::new(
            Interpolator::new(config.interpolation.clone()),
            config.interpolation.model_cache_capacity,
        );
        Self {
            catalog,
            observations,
            models,
            altitude_lookup,
            config,
        }
    }

    /// Loads the station table from `path` and creates a client with default
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DwdWeatherError::Catalog`] if the station table cannot be read or
    /// fails validation.
    pub async fn from_station_file(
        path: &Path,
        fetcher: Arc<dyn ObservationFetcher>,
    ) -> Result<Self, DwdWeatherError> {
        let catalog = StationCatalog::load(path).await?;
        Ok(Self::builder()
            .catalog(Arc::new(catalog))
            .fetcher(fetcher)
            .build())
    }

    pub fn catalog(&self) -> &StationCatalog {
        &self.catalog
    }

    pub fn observations(&self) -> &ObservationCache {
        &self.observations
    }

    pub fn config(&self) -> &DwdWeatherConfig {
        &self.config
    }

    /// Estimates the current weather at a point.
    ///
    /// Each modality is interpolated independently from the stations that report
    /// it. A modality without enough usable stations is left out of the report
    /// rather than failing the request. `dt` is the timestamp of the most recent
    /// observation that went into any of the estimates.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.latitude(f64)`: **Required.** Decimal degrees, north positive.
    /// * `.longitude(f64)`: **Required.** Decimal degrees, east positive.
    /// * `.altitude(f64)`: Optional. Meters above sea level. Resolved through the
    ///   altitude lookup when omitted.
    ///
    /// # Errors
    ///
    /// Returns [`DwdWeatherError::InvalidQuery`] for out-of-range or non-finite input,
    /// [`DwdWeatherError::AltitudeUnavailable`] if no altitude was given and none
    /// can be looked up, and [`DwdWeatherError::NoDataAvailable`] if no modality
    /// could be estimated.
    #[builder]
    pub async fn weather(
        &self,
        latitude: f64,
        longitude: f64,
        altitude: Option<f64>,
    ) -> Result<WeatherReport, DwdWeatherError> {
        validate_coordinate(latitude, longitude)?;
        let (query_altitude, reported_altitude) = match altitude {
            Some(alt) if alt.is_finite() => (alt, alt),
            Some(alt) => {
                return Err(DwdWeatherError::InvalidQuery(format!(
                    "altitude must be finite, got {}",
                    alt
                )))
            }
            None => {
                let alt = self
                    .altitude_lookup
                    .as_ref()
                    .and_then(|lookup| lookup.altitude(latitude, longitude))
                    .filter(|a| a.is_finite())
                    .ok_or(DwdWeatherError::AltitudeUnavailable {
                        latitude,
                        longitude,
                    })?;
                (alt, round2(alt))
            }
        };
        let query = GeoPoint::new(latitude, longitude, query_altitude);

        let observations = self.observations.merged().await;
        let min_timestamp = self.min_timestamp();
        let datasets = DatasetBuilder::new(&self.catalog, &observations);

        let mut report = WeatherReport::new(Coord {
            lat: latitude,
            lon: longitude,
            alt: reported_altitude,
        });
        let mut latest: Option<DateTime<Utc>> = None;

        for modality in Modality::ALL {
            let dataset = datasets.build(modality, min_timestamp);
            let estimate = match self.models.get_or_fit(&dataset).await {
                Ok(model) => model
                    .evaluate(&query)
                    .map(|value| (value, model.latest_timestamp())),
                Err(reason) => Err(reason),
            };
            match estimate {
                Ok((value, observed_at)) => {
                    report.set(modality, rounded(modality, value));
                    latest = latest.max(observed_at);
                }
                Err(reason) => debug!(
                    "No {} estimate for ({}, {}): {}",
                    modality, latitude, longitude, reason
                ),
            }
        }

        if report.is_empty() {
            return Err(DwdWeatherError::NoDataAvailable {
                latitude,
                longitude,
            });
        }
        report.dt = latest.map_or(0, |t| t.timestamp());
        Ok(report)
    }

    /// Latest observed values of the given stations.
    ///
    /// Unknown ids are skipped. Stations without a recent observation are listed
    /// with empty data.
    pub async fn station_reports(&self, ids: &[StationId]) -> Vec<StationReport> {
        let observations = self.observations.merged().await;
        let min_timestamp = self.min_timestamp();

        ids.iter()
            .filter_map(|id| {
                let Some(station) = self.catalog.get(*id) else {
                    debug!("Station {} is not in the catalog", id);
                    return None;
                };
                let data: BTreeMap<Modality, StationValue> = observations
                    .get(id)
                    .filter(|obs| obs.timestamp >= min_timestamp)
                    .map(|obs| {
                        obs.values
                            .iter()
                            .map(|(modality, value)| {
                                (
                                    modality,
                                    StationValue {
                                        value,
                                        dt: obs.timestamp.timestamp(),
                                        src: obs.source,
                                    },
                                )
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Some(StationReport {
                    id: *id,
                    meta: StationMeta {
                        names: station.names.clone(),
                        lat: station.location.map(|l| l.latitude),
                        lon: station.location.map(|l| l.longitude),
                        alt: station.location.and_then(|l| l.altitude),
                    },
                    data,
                })
            })
            .collect()
    }

    /// One row per station in the catalog, sorted by name.
    pub fn station_summaries(&self) -> Vec<StationSummary> {
        self.catalog.summaries()
    }

    /// Finds stations near a location, closest first, with their distance in km.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.location(LatLon)`: **Required.** The search center.
    /// * `.max_distance_km(f64)`: Optional. Defaults to `50.0`.
    /// * `.station_limit(usize)`: Optional. Defaults to `5`.
    #[builder]
    pub fn find_stations(
        &self,
        location: LatLon,
        max_distance_km: Option<f64>,
        station_limit: Option<usize>,
    ) -> Vec<(Station, f64)> {
        let max_distance_km = max_distance_km.unwrap_or(50.0);
        let station_limit = station_limit.unwrap_or(5);
        self.catalog
            .nearest(location.0, location.1, station_limit, max_distance_km)
            .into_iter()
            .map(|(station, km)| (station.clone(), km))
            .collect()
    }

    /// Refreshes one feed immediately, e.g. from a background task.
    ///
    /// # Errors
    ///
    /// Returns [`DwdWeatherError::Fetch`] if the download or parse fails. The
    /// previous observations stay in use.
    pub async fn refresh(&self, source: Source) -> Result<RefreshOutcome, DwdWeatherError> {
        Ok(self.observations.refresh(source).await?)
    }

    fn min_timestamp(&self) -> DateTime<Utc> {
        self.observations.now() - self.config.cache.max_observation_age
    }
}

fn validate_coordinate(latitude: f64, longitude: f64) -> Result<(), DwdWeatherError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(DwdWeatherError::InvalidQuery(format!(
            "latitude must be within [-90, 90], got {}",
            latitude
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(DwdWeatherError::InvalidQuery(format!(
            "longitude must be within [-180, 180], got {}",
            longitude
        )));
    }
    Ok(())
}

fn rounded(modality: Modality, value: f64) -> f64 {
    let value = round2(value);
    if modality.is_circular() && value >= 360.0 {
        0.0
    } else {
        value
    }
}
