mod altitude;
mod config;
mod dataset;
mod dwd_weather;
mod error;
mod interpolation;
mod observations;
mod stations;
mod types;
mod utils;

pub use altitude::AltitudeLookup;
pub use config::*;
pub use dwd_weather::*;
pub use error::DwdWeatherError;
pub use utils::{Clock, SystemClock};
#[cfg(any(test, feature = "test-util"))]
pub use utils::ManualClock;

pub use dataset::builder::{Dataset, DatasetBuilder, DatasetEntry};

pub use interpolation::error::{FitError, Unavailable};
pub use interpolation::interpolator::{Interpolator, ModalityModel};
pub use interpolation::kernel::Kernel;
pub use interpolation::metric::{great_circle_distance, GeoMetric};
pub use interpolation::model_cache::{ModelCache, ModelKey};
pub use interpolation::rbf::{RbfModel, RbfParams};

pub use observations::cache::{
    CachedObservations, ObservationCache, ObservationSet, RefreshOutcome, SourceSnapshot,
};
pub use observations::dwd_table::parse_observation_table;
pub use observations::error::FetchError;
pub use observations::fetcher::{DwdTableFetcher, ObservationFetcher, PublishedTable, TableSource};

pub use stations::catalog::StationCatalog;
pub use stations::error::CatalogError;

pub use types::modality::{Modality, Source};
pub use types::observation::{Observation, ObservationValues, RawObservation};
pub use types::station::{GeoPoint, Location, Station, StationId, StationSummary};
pub use types::weather_report::*;
