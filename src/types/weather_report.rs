//! The JSON shapes handed to the HTTP layer.
//!
//! Modalities that could not be estimated are left out of their sub-object
//! instead of being filled with a sentinel.

use crate::types::modality::{Modality, Source};
use crate::types::station::StationId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Interpolated conditions at a single point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Unix timestamp of the most recent observation that contributed to any value.
    pub dt: i64,
    pub coord: Coord,
    pub main: MainConditions,
    pub wind: WindConditions,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
    /// The resolved altitude, either supplied by the caller or looked up.
    pub alt: f64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MainConditions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindConditions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl WeatherReport {
    pub(crate) fn new(coord: Coord) -> Self {
        Self {
            dt: 0,
            coord,
            main: MainConditions::default(),
            wind: WindConditions::default(),
        }
    }

    /// Stores an estimate in the field that corresponds to `modality`.
    pub(crate) fn set(&mut self, modality: Modality, value: f64) {
        let slot = match modality {
            Modality::Temperature => &mut self.main.temp,
            Modality::Pressure => &mut self.main.pressure,
            Modality::Humidity => &mut self.main.humidity,
            Modality::Precipitation => &mut self.main.precipitation,
            Modality::WindSpeed => &mut self.wind.speed,
            Modality::WindGust => &mut self.wind.max,
            Modality::WindDirection => &mut self.wind.deg,
        };
        *slot = Some(value);
    }

    pub fn get(&self, modality: Modality) -> Option<f64> {
        match modality {
            Modality::Temperature => self.main.temp,
            Modality::Pressure => self.main.pressure,
            Modality::Humidity => self.main.humidity,
            Modality::Precipitation => self.main.precipitation,
            Modality::WindSpeed => self.wind.speed,
            Modality::WindGust => self.wind.max,
            Modality::WindDirection => self.wind.deg,
        }
    }

    pub fn is_empty(&self) -> bool {
        Modality::ALL.iter().all(|m| self.get(*m).is_none())
    }
}

/// Latest raw reading of a single modality at a station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationValue {
    pub value: f64,
    /// Unix timestamp of the observation.
    pub dt: i64,
    pub src: Source,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationMeta {
    pub names: Vec<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub alt: Option<f64>,
}

/// Raw, non-interpolated data of one station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationReport {
    pub id: StationId,
    pub meta: StationMeta,
    pub data: BTreeMap<Modality, StationValue>,
}
