use crate::types::station::StationId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read station table '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse station table XML")]
    XmlParse(#[from] serde_xml_rs::Error),

    #[error("Station name \"{name}\" is used by both {first} and {second}")]
    DuplicateName {
        name: String,
        first: StationId,
        second: StationId,
    },

    #[error("Station {id} has conflicting coordinates")]
    ConflictingLocation { id: StationId },

    #[error("Station {id} has an invalid coordinate: lat={latitude}, lon={longitude}")]
    InvalidCoordinate {
        id: StationId,
        latitude: f64,
        longitude: f64,
    },

    #[error("Station {id} lists only one of latitude and longitude")]
    IncompleteLocation { id: StationId },
}
