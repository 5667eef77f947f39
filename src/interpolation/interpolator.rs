use crate::config::InterpolationConfig;
use crate::dataset::builder::Dataset;
use crate::interpolation::error::Unavailable;
use crate::interpolation::metric::GeoMetric;
use crate::interpolation::rbf::{merge_coincident, RbfModel, RbfParams};
use crate::types::modality::Modality;
use crate::types::station::GeoPoint;
use chrono::{DateTime, Utc};
use log::debug;

/// Fits one RBF surface per modality dataset.
#[derive(Debug, Clone, Default)]
pub struct Interpolator {
    config: InterpolationConfig,
}

/// A fitted surface for one modality, reusable for any number of query points.
///
/// Circular quantities (wind direction) are fitted as two surfaces, one per
/// unit-vector component, and recombined on evaluation.
#[derive(Debug, Clone)]
pub struct ModalityModel {
    modality: Modality,
    components: Vec<RbfModel>,
    observed_range: (f64, f64),
    clamp: bool,
    station_count: usize,
    latest_timestamp: Option<DateTime<Utc>>,
}

impl Interpolator {
    pub fn new(config: InterpolationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InterpolationConfig {
        &self.config
    }

    /// Never below two: a single center has no spatial structure to interpolate.
    fn required_stations(&self) -> usize {
        self.config.min_stations.max(2)
    }

    fn params(&self, modality: Modality) -> RbfParams {
        RbfParams {
            metric: GeoMetric::new(self.config.altitude_weights.get(modality)),
            kernel: self.config.kernel,
            smoothing: self.config.smoothing,
            coincidence_tolerance: self.config.coincidence_tolerance_m,
        }
    }

    pub fn fit(&self, dataset: &Dataset) -> Result<ModalityModel, Unavailable> {
        let modality = dataset.modality();
        let required = self.required_stations();
        let insufficient = |found| Unavailable::InsufficientStations {
            modality,
            found,
            required,
        };
        if dataset.len() < required {
            return Err(insufficient(dataset.len()));
        }

        let params = self.params(modality);
        let values: Vec<f64> = dataset.entries().iter().map(|e| e.value).collect();
        let channels: Vec<Vec<f64>> = if modality.is_circular() {
            vec![
                values.iter().map(|deg| deg.to_radians().cos()).collect(),
                values.iter().map(|deg| deg.to_radians().sin()).collect(),
            ]
        } else {
            vec![values.clone()]
        };

        let mut components = Vec::with_capacity(channels.len());
        for channel in channels {
            let samples: Vec<(GeoPoint, f64)> = dataset
                .entries()
                .iter()
                .zip(channel)
                .map(|(e, v)| (e.position, v))
                .collect();
            let (centers, merged) =
                merge_coincident(&samples, &params.metric, params.coincidence_tolerance);
            if centers.len() < required {
                return Err(insufficient(centers.len()));
            }
            let model = RbfModel::from_centers(centers, merged, &params)
                .map_err(|e| e.for_modality(modality))?;
            components.push(model);
        }

        let observed_range = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });

        debug!(
            "Fitted {} from {} stations ({} centers)",
            modality,
            dataset.len(),
            components.first().map_or(0, RbfModel::center_count)
        );

        Ok(ModalityModel {
            modality,
            components,
            observed_range,
            clamp: self.config.clamp_to_observed,
            station_count: dataset.len(),
            latest_timestamp: dataset.latest_timestamp(),
        })
    }

    /// Fits and evaluates in one go.
    pub fn evaluate(&self, dataset: &Dataset, query: &GeoPoint) -> Result<f64, Unavailable> {
        self.fit(dataset)?.evaluate(query)
    }
}

impl ModalityModel {
    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn station_count(&self) -> usize {
        self.station_count
    }

    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.latest_timestamp
    }

    /// Smallest and largest observed input value.
    pub fn observed_range(&self) -> (f64, f64) {
        self.observed_range
    }

    pub fn evaluate(&self, query: &GeoPoint) -> Result<f64, Unavailable> {
        let value = match self.components.as_slice() {
            [cos, sin] => {
                let degrees = sin.evaluate(query).atan2(cos.evaluate(query)).to_degrees();
                let wrapped = degrees.rem_euclid(360.0);
                if wrapped >= 360.0 {
                    0.0
                } else {
                    wrapped
                }
            }
            [surface] => {
                let v = surface.evaluate(query);
                if self.clamp {
                    v.clamp(self.observed_range.0, self.observed_range.1)
                } else {
                    v
                }
            }
            _ => f64::NAN,
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(Unavailable::NonFinite {
                modality: self.modality,
            })
        }
    }
}
