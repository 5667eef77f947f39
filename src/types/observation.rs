use crate::types::modality::{Modality, Source};
use crate::types::station::StationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sparse set of measured values; any modality may be missing.
#[derive(Debug, Default, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct ObservationValues {
    pub temperature: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
    pub precipitation: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
    pub wind_direction: Option<f64>,
}

impl ObservationValues {
    pub fn get(&self, modality: Modality) -> Option<f64> {
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

    pub fn set(&mut self, modality: Modality, value: Option<f64>) {
        let slot = match modality {
            Modality::Temperature => &mut self.temperature,
            Modality::Pressure => &mut self.pressure,
            Modality::Humidity => &mut self.humidity,
            Modality::Precipitation => &mut self.precipitation,
            Modality::WindSpeed => &mut self.wind_speed,
            Modality::WindGust => &mut self.wind_gust,
            Modality::WindDirection => &mut self.wind_direction,
        };
        *slot = value;
    }

    /// Builder-style variant of [`ObservationValues::set`].
    pub fn with(mut self, modality: Modality, value: f64) -> Self {
        self.set(modality, Some(value));
        self
    }

    pub fn is_empty(&self) -> bool {
        Modality::ALL.iter().all(|m| self.get(*m).is_none())
    }

    /// Iterates over the modalities that carry a value.
    pub fn iter(&self) -> impl Iterator<Item = (Modality, f64)> + '_ {
        Modality::ALL
            .iter()
            .filter_map(|m| self.get(*m).map(|v| (*m, v)))
    }
}

/// A record as delivered by a fetcher, before it is attributed to a source.
#[derive(Debug, PartialEq, Clone)]
pub struct RawObservation {
    pub station_id: StationId,
    pub timestamp: DateTime<Utc>,
    pub values: ObservationValues,
}

/// The most recent reading of one station from one source.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub station_id: StationId,
    pub source: Source,
    pub timestamp: DateTime<Utc>,
    pub values: ObservationValues,
}

impl Observation {
    pub fn from_raw(raw: RawObservation, source: Source) -> Self {
        Self {
            station_id: raw.station_id,
            source,
            timestamp: raw.timestamp,
            values: raw.values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_cover_every_modality() {
        let mut values = ObservationValues::default();
        assert!(values.is_empty());
        for (i, modality) in Modality::ALL.iter().enumerate() {
            values.set(*modality, Some(i as f64));
        }
        for (i, modality) in Modality::ALL.iter().enumerate() {
            assert_eq!(values.get(*modality), Some(i as f64));
        }
        assert_eq!(values.iter().count(), Modality::ALL.len());
    }

    #[test]
    fn test_iter_skips_missing() {
        let values = ObservationValues::default()
            .with(Modality::Temperature, 12.5)
            .with(Modality::WindDirection, 270.0);
        let present: Vec<_> = values.iter().collect();
        assert_eq!(
            present,
            vec![
                (Modality::Temperature, 12.5),
                (Modality::WindDirection, 270.0)
            ]
        );
    }
}
