//! The static station reference table: identifiers, names and positions of all
//! known stations. Loaded once and never mutated afterwards.

use crate::stations::error::CatalogError;
use crate::types::station::{IndexedStation, Location, Station, StationId, StationSummary};
use haversine::{distance, Location as HaversineLocation, Units};
use log::{debug, info};
use rstar::RTree;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct XmlStationTable {
    #[serde(rename = "station", default)]
    stations: Vec<XmlStation>,
}

#[derive(Debug, Deserialize)]
struct XmlStation {
    id: StationId,
    name: String,
    lat: Option<f64>,
    lon: Option<f64>,
    alt: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct StationCatalog {
    stations: BTreeMap<StationId, Station>,
    names: HashMap<String, StationId>,
    rtree: RTree<IndexedStation>,
}

impl StationCatalog {
    /// Parses a station table of the form
    ///
    /// ```xml
    /// <stations>
    ///   <station id="10637" name="Frankfurt/Main" lat="50.05" lon="8.6" alt="111"/>
    ///   <station id="10637" name="Frankfurt"/>
    /// </stations>
    /// ```
    ///
    /// Rows sharing an id are aliases of the same station; the coordinates may be
    /// given on any one of them.
    pub fn from_xml_str(xml: &str) -> Result<Self, CatalogError> {
        let table: XmlStationTable = serde_xml_rs::from_str(xml)?;

        let mut stations: BTreeMap<StationId, Station> = BTreeMap::new();
        for row in table.stations {
            let location = match (row.lat, row.lon) {
                (Some(latitude), Some(longitude)) => Some(Location {
                    latitude,
                    longitude,
                    altitude: row.alt,
                }),
                (None, None) => None,
                _ => return Err(CatalogError::IncompleteLocation { id: row.id }),
            };

            let station = stations.entry(row.id).or_insert_with(|| Station {
                id: row.id,
                names: Vec::new(),
                location: None,
            });
            station.names.push(row.name);
            match (station.location, location) {
                (_, None) => {}
                (None, Some(loc)) => station.location = Some(loc),
                (Some(existing), Some(loc)) if existing == loc => {}
                (Some(_), Some(_)) => {
                    return Err(CatalogError::ConflictingLocation { id: row.id })
                }
            }
        }

        Self::from_stations(stations.into_values())
    }

    /// Reads and parses the station table at `path`.
    pub async fn load(path: &Path) -> Result<Self, CatalogError> {
        let xml = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CatalogError::Read(path.to_path_buf(), e))?;
        let catalog = Self::from_xml_str(&xml)?;
        info!(
            "Loaded {} stations from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Builds a catalog from already assembled stations.
    pub fn from_stations(
        stations: impl IntoIterator<Item = Station>,
    ) -> Result<Self, CatalogError> {
        let mut by_id = BTreeMap::new();
        let mut names = HashMap::new();

        for station in stations {
            if let Some(loc) = station.location {
                let valid = (-90.0..=90.0).contains(&loc.latitude)
                    && (-180.0..=180.0).contains(&loc.longitude)
                    && loc.altitude.map_or(true, f64::is_finite);
                if !valid {
                    return Err(CatalogError::InvalidCoordinate {
                        id: station.id,
                        latitude: loc.latitude,
                        longitude: loc.longitude,
                    });
                }
            }
            for name in &station.names {
                if let Some(first) = names.insert(name.clone(), station.id) {
                    if first != station.id {
                        return Err(CatalogError::DuplicateName {
                            name: name.clone(),
                            first,
                            second: station.id,
                        });
                    }
                }
            }
            by_id.insert(station.id, station);
        }

        let without_location = by_id.values().filter(|s| s.location.is_none()).count();
        if without_location > 0 {
            debug!("{} stations have no coordinates", without_location);
        }

        let rtree = RTree::bulk_load(by_id.values().filter_map(Station::index_entry).collect());
        Ok(Self {
            stations: by_id,
            names,
            rtree,
        })
    }

    pub fn get(&self, id: StationId) -> Option<&Station> {
        self.stations.get(&id)
    }

    /// Resolves a station name as printed in the observation tables.
    pub fn id_by_name(&self, name: &str) -> Option<StationId> {
        self.names.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// All stations, ordered by identifier.
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    /// Listing of every located station under its shortest name, sorted by name.
    pub fn summaries(&self) -> Vec<StationSummary> {
        let mut summaries: Vec<StationSummary> = self
            .stations
            .values()
            .filter_map(|station| {
                let loc = station.location?;
                Some(StationSummary {
                    id: station.id,
                    name: station.display_name().to_string(),
                    latitude: loc.latitude,
                    longitude: loc.longitude,
                    altitude: loc.altitude,
                })
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        summaries
    }

    /// Finds up to `n_results` stations within `max_distance_km` of the given point,
    /// closest first, with their great-circle distance in kilometers.
    pub fn nearest(
        &self,
        latitude: f64,
        longitude: f64,
        n_results: usize,
        max_distance_km: f64,
    ) -> Vec<(&Station, f64)> {
        if n_results == 0 {
            return vec![];
        }

        // The R-tree orders by planar degree distance, which differs from the
        // great-circle order; over-fetch and re-sort.
        let candidate_limit = (n_results * 2).max(20);
        let mut with_distance: Vec<(&Station, f64)> = self
            .rtree
            .nearest_neighbor_iter(&[latitude, longitude])
            .take(candidate_limit)
            .filter_map(|entry| {
                let [lat, lon] = *entry.geom();
                let dist_km = distance(
                    HaversineLocation {
                        latitude,
                        longitude,
                    },
                    HaversineLocation {
                        latitude: lat,
                        longitude: lon,
                    },
                    Units::Kilometers,
                );
                if dist_km <= max_distance_km {
                    self.stations.get(&entry.data).map(|s| (s, dist_km))
                } else {
                    None
                }
            })
            .collect();

        with_distance.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        with_distance.truncate(n_results);
        with_distance
    }
}
