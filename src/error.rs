use crate::observations::error::FetchError;
use crate::stations::error::CatalogError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DwdWeatherError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("No altitude known for lat={latitude}, lon={longitude}; pass one explicitly")]
    AltitudeUnavailable { latitude: f64, longitude: f64 },

    #[error("No weather data available for lat={latitude}, lon={longitude}")]
    NoDataAvailable { latitude: f64, longitude: f64 },
}
