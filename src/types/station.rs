//! Defines the data structures representing DWD weather stations as listed in the
//! static station reference table: identifiers, aliases and geographic position.
//! Also includes the spatial index entry used by the `rstar` R-tree.

use rstar::primitives::GeomWithData;
use serde::{Deserialize, Serialize};

/// Numeric station identifier (WMO index, e.g. `10637` for Frankfurt/Main).
pub type StationId = u32;

/// Point type stored in the station R-tree: `[latitude, longitude]` tagged with the station id.
pub(crate) type IndexedStation = GeomWithData<[f64; 2], StationId>;

/// Represents a single weather station from the reference table.
///
/// Stations are immutable once loaded. A station may be known under several names
/// (the observation tables use abbreviated and full spellings), but it has exactly
/// one position.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Station {
    /// The station identifier.
    pub id: StationId,
    /// All names under which the station appears in the observation tables.
    pub names: Vec<String>,
    /// Geographical location, if the reference table lists one.
    pub location: Option<Location>,
}

/// Represents the geographical location of a weather station.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees (positive for North).
    pub latitude: f64,
    /// Longitude in decimal degrees (positive for East).
    pub longitude: f64,
    /// Elevation above sea level in meters, if available.
    pub altitude: Option<f64>,
}

/// A fully specified point in the interpolation space: latitude and longitude in
/// degrees, altitude in meters above sea level.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }
}

impl Station {
    /// The shortest of the station's names, used for listings.
    pub fn display_name(&self) -> &str {
        self.names
            .iter()
            .min_by_key(|name| name.len())
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Returns the full 3-D position of the station.
    ///
    /// Stations without an altitude yield `None`: altitude is a metric dimension
    /// of the interpolation, so such stations are never assumed to be at sea level.
    pub fn position(&self) -> Option<GeoPoint> {
        let location = self.location?;
        Some(GeoPoint::new(
            location.latitude,
            location.longitude,
            location.altitude?,
        ))
    }

    pub(crate) fn index_entry(&self) -> Option<IndexedStation> {
        self.location
            .map(|loc| GeomWithData::new([loc.latitude, loc.longitude], self.id))
    }
}

/// Summary row describing one station, as returned by
/// [`crate::DwdWeather::station_summaries`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StationSummary {
    pub id: StationId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}
