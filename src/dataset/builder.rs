//! Turns cached observations into per-modality interpolation inputs.

use crate::observations::cache::ObservationSet;
use crate::stations::catalog::StationCatalog;
use crate::types::modality::{Modality, Source};
use crate::types::station::{GeoPoint, StationId};
use chrono::{DateTime, Utc};
use log::trace;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// One station's contribution to a [`Dataset`].
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetEntry {
    pub station_id: StationId,
    pub position: GeoPoint,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub source: Source,
}

/// Stations with a usable value for a single modality, ordered by station id.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    modality: Modality,
    entries: Vec<DatasetEntry>,
}

impl Dataset {
    pub fn new(modality: Modality, mut entries: Vec<DatasetEntry>) -> Self {
        entries.sort_by_key(|e| e.station_id);
        Self { modality, entries }
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Timestamp of the most recent contributing observation.
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.entries.iter().map(|e| e.timestamp).max()
    }

    pub fn station_ids(&self) -> Vec<StationId> {
        self.entries.iter().map(|e| e.station_id).collect()
    }

    /// Hash over stations, timestamps and values. Two datasets with the same
    /// fingerprint produce the same fitted model.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.modality.hash(&mut hasher);
        for entry in &self.entries {
            entry.station_id.hash(&mut hasher);
            entry.timestamp.hash(&mut hasher);
            entry.value.to_bits().hash(&mut hasher);
            entry.position.latitude.to_bits().hash(&mut hasher);
            entry.position.longitude.to_bits().hash(&mut hasher);
            entry.position.altitude.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// Joins an [`ObservationSet`] with the station catalog.
///
/// Building is a pure function of the two inputs, so the same snapshot always
/// yields the same datasets.
pub struct DatasetBuilder<'a> {
    catalog: &'a StationCatalog,
    observations: &'a ObservationSet,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new(catalog: &'a StationCatalog, observations: &'a ObservationSet) -> Self {
        Self {
            catalog,
            observations,
        }
    }

    /// Collects every station that reports `modality` at or after `min_timestamp`
    /// and has a complete position (latitude, longitude and altitude).
    pub fn build(&self, modality: Modality, min_timestamp: DateTime<Utc>) -> Dataset {
        let entries = self
            .observations
            .values()
            .filter(|obs| obs.timestamp >= min_timestamp)
            .filter_map(|obs| {
                let value = obs.values.get(modality).filter(|v| v.is_finite())?;
                let Some(position) = self.catalog.get(obs.station_id).and_then(|s| s.position())
                else {
                    trace!(
                        "Station {} has no complete position, skipped for {}",
                        obs.station_id,
                        modality
                    );
                    return None;
                };
                Some(DatasetEntry {
                    station_id: obs.station_id,
                    position,
                    value,
                    timestamp: obs.timestamp,
                    source: obs.source,
                })
            })
            .collect();
        Dataset::new(modality, entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::observation::{Observation, ObservationValues};
    use chrono::{TimeDelta, TimeZone};

    fn catalog() -> StationCatalog {
        let xml = r#"<stations>
            <station id="10637" name="Frankfurt/M." lat="50.05" lon="8.6" alt="111"/>
            <station id="10384" name="Berlin-Tem." lat="52.47" lon="13.4" alt="48"/>
            <station id="10865" name="Muenchen" lat="48.13" lon="11.55" alt="515"/>
            <station id="10999" name="Irgendwo" lat="49.0" lon="9.0"/>
        </stations>"#;
        StationCatalog::from_xml_str(xml).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    fn observation(station_id: StationId, timestamp: DateTime<Utc>, values: ObservationValues) -> Observation {
        Observation {
            station_id,
            source: Source::Domestic,
            timestamp,
            values,
        }
    }

    fn observations() -> ObservationSet {
        let temp = |v| ObservationValues::default().with(Modality::Temperature, v);
        [
            observation(10865, t0(), temp(2.3).with(Modality::Pressure, 955.0)),
            observation(10637, t0(), temp(7.5)),
            observation(10384, t0() - TimeDelta::hours(5), temp(5.1)),
            // No altitude in the catalog.
            observation(10999, t0(), temp(6.0)),
            // Not in the catalog at all.
            observation(99999, t0(), temp(1.0)),
            observation(10001, t0(), ObservationValues::default().with(Modality::Temperature, f64::NAN)),
        ]
        .into_iter()
        .map(|o| (o.station_id, o))
        .collect()
    }

    #[test]
    fn test_build_filters_by_modality_age_and_position() {
        let catalog = catalog();
        let observations = observations();
        let builder = DatasetBuilder::new(&catalog, &observations);

        let temperature = builder.build(Modality::Temperature, t0() - TimeDelta::hours(4));
        assert_eq!(temperature.modality(), Modality::Temperature);
        assert_eq!(temperature.station_ids(), vec![10637, 10865]);
        assert_eq!(temperature.entries()[1].position, GeoPoint::new(48.13, 11.55, 515.0));
        assert_eq!(temperature.latest_timestamp(), Some(t0()));

        let pressure = builder.build(Modality::Pressure, t0() - TimeDelta::hours(4));
        assert_eq!(pressure.station_ids(), vec![10865]);

        let wind = builder.build(Modality::WindSpeed, t0() - TimeDelta::hours(4));
        assert!(wind.is_empty());
        assert_eq!(wind.latest_timestamp(), None);

        let all_time = builder.build(Modality::Temperature, t0() - TimeDelta::days(1));
        assert_eq!(all_time.station_ids(), vec![10384, 10637, 10865]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let catalog = catalog();
        let observations = observations();
        let builder = DatasetBuilder::new(&catalog, &observations);
        let min = t0() - TimeDelta::days(1);

        let first = builder.build(Modality::Temperature, min);
        let second = builder.build(Modality::Temperature, min);
        assert_eq!(first, second);
        assert_eq!(first.fingerprint(), second.fingerprint());

        let fewer = builder.build(Modality::Temperature, t0());
        assert_ne!(first.fingerprint(), fewer.fingerprint());
    }

    #[test]
    fn test_new_sorts_by_station() {
        let entry = |id| DatasetEntry {
            station_id: id,
            position: GeoPoint::new(50.0, 8.0, 100.0),
            value: 1.0,
            timestamp: t0(),
            source: Source::Continental,
        };
        let dataset = Dataset::new(Modality::Humidity, vec![entry(3), entry(1), entry(2)]);
        assert_eq!(dataset.station_ids(), vec![1, 2, 3]);
        assert_eq!(dataset.len(), 3);
    }
}
