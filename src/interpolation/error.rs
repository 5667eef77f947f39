use crate::types::modality::Modality;
use thiserror::Error;

/// Why a modality could not be estimated.
///
/// None of these fail a whole request: the modality is left out of the report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Unavailable {
    #[error("{modality}: {found} usable stations, at least {required} needed")]
    InsufficientStations {
        modality: Modality,
        found: usize,
        required: usize,
    },

    #[error("{modality}: kernel system could not be solved")]
    IllConditioned { modality: Modality },

    #[error("{modality}: estimate is not a finite number")]
    NonFinite { modality: Modality },
}

/// Failure of a single RBF solve, before it is attributed to a modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FitError {
    #[error("no sample points")]
    Empty,
    #[error("kernel matrix is singular")]
    Singular,
    #[error("solution does not reproduce the samples")]
    Diverged,
}

impl FitError {
    pub(crate) fn for_modality(self, modality: Modality) -> Unavailable {
        match self {
            FitError::Empty => Unavailable::InsufficientStations {
                modality,
                found: 0,
                required: 1,
            },
            FitError::Singular | FitError::Diverged => Unavailable::IllConditioned { modality },
        }
    }
}
