//! Radial basis function interpolation over [`GeoPoint`]s.
//!
//! The fitted surface is `f(x) = Σ wᵢ φ(d(x, cᵢ))` where the weights solve
//! `(Φ + λI) w = y` for the kernel matrix `Φᵢⱼ = φ(d(cᵢ, cⱼ))`. With `λ = 0` the
//! surface passes exactly through every sample.

use crate::interpolation::error::FitError;
use crate::interpolation::kernel::Kernel;
use crate::interpolation::metric::GeoMetric;
use crate::types::station::GeoPoint;
use nalgebra::{DMatrix, DVector};
use ordered_float::OrderedFloat;

/// Relative residual above which a solve is rejected.
const RESIDUAL_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RbfParams {
    pub metric: GeoMetric,
    pub kernel: Kernel,
    pub smoothing: f64,
    /// Samples within this metric distance of each other are merged into one
    /// center carrying their mean value.
    pub coincidence_tolerance: f64,
}

impl RbfParams {
    pub fn exact(metric: GeoMetric, kernel: Kernel) -> Self {
        Self {
            metric,
            kernel,
            smoothing: 0.0,
            coincidence_tolerance: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RbfModel {
    centers: Vec<GeoPoint>,
    weights: DVector<f64>,
    metric: GeoMetric,
    kernel: Kernel,
    epsilon: f64,
}

impl RbfModel {
    pub fn fit(samples: &[(GeoPoint, f64)], params: &RbfParams) -> Result<Self, FitError> {
        let (centers, values) =
            merge_coincident(samples, &params.metric, params.coincidence_tolerance);
        Self::from_centers(centers, values, params)
    }

    /// Fits directly on distinct centers, skipping the coincidence merge.
    pub(crate) fn from_centers(
        centers: Vec<GeoPoint>,
        values: Vec<f64>,
        params: &RbfParams,
    ) -> Result<Self, FitError> {
        if centers.is_empty() || centers.len() != values.len() {
            return Err(FitError::Empty);
        }

        let metric = params.metric;
        let kernel = params.kernel;
        let epsilon = kernel
            .epsilon()
            .filter(|e| e.is_finite() && *e > 0.0)
            .unwrap_or_else(|| mean_nearest_distance(&centers, &metric));

        let n = centers.len();
        let matrix = DMatrix::from_fn(n, n, |i, j| {
            let phi = kernel.apply(metric.distance(&centers[i], &centers[j]), epsilon);
            if i == j {
                phi + params.smoothing
            } else {
                phi
            }
        });
        let rhs = DVector::from_vec(values);

        let weights = matrix.clone().lu().solve(&rhs).ok_or(FitError::Singular)?;
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(FitError::Singular);
        }

        let residual = (&matrix * &weights - &rhs).amax();
        if !(residual <= RESIDUAL_TOLERANCE * rhs.amax().max(1.0)) {
            return Err(FitError::Diverged);
        }

        Ok(Self {
            centers,
            weights,
            metric,
            kernel,
            epsilon,
        })
    }

    pub fn evaluate(&self, point: &GeoPoint) -> f64 {
        self.centers
            .iter()
            .zip(self.weights.iter())
            .map(|(center, w)| w * self.kernel.apply(self.metric.distance(point, center), self.epsilon))
            .sum()
    }

    /// Number of distinct centers after merging coincident samples.
    pub fn center_count(&self) -> usize {
        self.centers.len()
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

pub(crate) fn merge_coincident(
    samples: &[(GeoPoint, f64)],
    metric: &GeoMetric,
    tolerance: f64,
) -> (Vec<GeoPoint>, Vec<f64>) {
    let mut centers: Vec<GeoPoint> = Vec::with_capacity(samples.len());
    let mut sums: Vec<(f64, usize)> = Vec::with_capacity(samples.len());

    for (point, value) in samples {
        match centers
            .iter()
            .position(|c| metric.distance(c, point) <= tolerance)
        {
            Some(i) => {
                sums[i].0 += value;
                sums[i].1 += 1;
            }
            None => {
                centers.push(*point);
                sums.push((*value, 1));
            }
        }
    }

    let values = sums.into_iter().map(|(sum, n)| sum / n as f64).collect();
    (centers, values)
}

/// Mean distance from each center to its nearest neighbour; 1.0 when undefined.
fn mean_nearest_distance(centers: &[GeoPoint], metric: &GeoMetric) -> f64 {
    if centers.len() < 2 {
        return 1.0;
    }
    let total: f64 = centers
        .iter()
        .enumerate()
        .filter_map(|(i, a)| {
            centers
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, b)| OrderedFloat(metric.distance(a, b)))
                .min()
                .map(|d| d.0)
        })
        .sum();
    let mean = total / centers.len() as f64;
    if mean.is_finite() && mean > 0.0 {
        mean
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<(GeoPoint, f64)> {
        vec![
            (GeoPoint::new(50.05, 8.6, 111.0), 7.5),
            (GeoPoint::new(52.47, 13.4, 48.0), 5.1),
            (GeoPoint::new(48.13, 11.55, 515.0), 2.3),
            (GeoPoint::new(53.63, 10.0, 11.0), 6.0),
            (GeoPoint::new(47.8, 11.01, 977.0), -1.4),
            (GeoPoint::new(51.3, 6.77, 37.0), 8.2),
        ]
    }

    fn all_kernels() -> Vec<Kernel> {
        vec![
            Kernel::Linear,
            Kernel::Cubic,
            Kernel::ThinPlate,
            Kernel::Multiquadric { epsilon: None },
            Kernel::InverseMultiquadric { epsilon: None },
            Kernel::Gaussian { epsilon: None },
        ]
    }

    #[test]
    fn test_interpolation_is_exact_at_samples() {
        for kernel in all_kernels() {
            let params = RbfParams::exact(GeoMetric::new(100.0), kernel);
            let model = RbfModel::fit(&samples(), &params).unwrap();
            for (point, value) in samples() {
                let estimate = model.evaluate(&point);
                assert!(
                    (estimate - value).abs() < 1e-6,
                    "{:?}: {} != {}",
                    kernel,
                    estimate,
                    value
                );
            }
        }
    }

    #[test]
    fn test_coincident_samples_are_averaged() {
        let mut input = samples();
        input.push((GeoPoint::new(50.05, 8.6, 111.0), 9.5));
        let params = RbfParams {
            coincidence_tolerance: 1.0,
            ..RbfParams::exact(GeoMetric::new(100.0), Kernel::Linear)
        };
        let model = RbfModel::fit(&input, &params).unwrap();
        assert_eq!(model.center_count(), 6);
        let estimate = model.evaluate(&GeoPoint::new(50.05, 8.6, 111.0));
        assert!((estimate - 8.5).abs() < 1e-6, "{}", estimate);
    }

    #[test]
    fn test_duplicate_points_without_merging_are_singular() {
        let p = GeoPoint::new(50.0, 8.0, 100.0);
        let input = vec![(p, 1.0), (p, 2.0), (GeoPoint::new(51.0, 8.0, 100.0), 3.0)];
        let params = RbfParams {
            coincidence_tolerance: -1.0,
            ..RbfParams::exact(GeoMetric::new(100.0), Kernel::Linear)
        };
        assert!(RbfModel::fit(&input, &params).is_err());
    }

    #[test]
    fn test_smoothing_relaxes_exactness() {
        let params = RbfParams {
            smoothing: 1e6,
            ..RbfParams::exact(GeoMetric::new(100.0), Kernel::Linear)
        };
        let model = RbfModel::fit(&samples(), &params).unwrap();
        let (point, value) = samples()[4];
        assert!((model.evaluate(&point) - value).abs() > 1e-3);
    }

    #[test]
    fn test_empty_fit() {
        let params = RbfParams::exact(GeoMetric::new(1.0), Kernel::Linear);
        assert_eq!(RbfModel::fit(&[], &params).unwrap_err(), FitError::Empty);
    }

    #[test]
    fn test_non_finite_sample_rejected() {
        let mut input = samples();
        input[0].1 = f64::NAN;
        let params = RbfParams::exact(GeoMetric::new(100.0), Kernel::Linear);
        assert!(RbfModel::fit(&input, &params).is_err());
    }

    #[test]
    fn test_default_epsilon_is_mean_neighbour_distance() {
        let metric = GeoMetric::new(0.0);
        let points = vec![
            (GeoPoint::new(0.0, 0.0, 0.0), 1.0),
            (GeoPoint::new(0.0, 1.0, 0.0), 2.0),
            (GeoPoint::new(0.0, 3.0, 0.0), 3.0),
        ];
        let one_degree = metric.distance(&points[0].0, &points[1].0);
        let model = RbfModel::fit(
            &points,
            &RbfParams::exact(metric, Kernel::Gaussian { epsilon: None }),
        )
        .unwrap();
        // Neighbour distances: 1°, 1°, 2°.
        assert!((model.epsilon() - one_degree * 4.0 / 3.0).abs() < 1.0);

        let fixed = RbfModel::fit(
            &points,
            &RbfParams::exact(metric, Kernel::Gaussian { epsilon: Some(5e4) }),
        )
        .unwrap();
        assert_eq!(fixed.epsilon(), 5e4);
    }
}
