use serde::{Deserialize, Serialize};

/// Radial basis function applied to the station distance.
///
/// Shape-parameterised kernels take an optional `epsilon` in meters. When it is
/// `None` the mean nearest-neighbour distance of the fitted stations is used.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    /// `φ(r) = r`
    #[default]
    Linear,
    /// `φ(r) = r³`
    Cubic,
    /// `φ(r) = r² ln r`
    ThinPlate,
    /// `φ(r) = sqrt((r/ε)² + 1)`
    Multiquadric { epsilon: Option<f64> },
    /// `φ(r) = 1 / sqrt((r/ε)² + 1)`
    InverseMultiquadric { epsilon: Option<f64> },
    /// `φ(r) = exp(-(r/ε)²)`
    Gaussian { epsilon: Option<f64> },
}

impl Kernel {
    /// Evaluates the kernel at distance `r`. `epsilon` is ignored by kernels
    /// without a shape parameter.
    pub fn apply(&self, r: f64, epsilon: f64) -> f64 {
        match self {
            Kernel::Linear => r,
            Kernel::Cubic => r * r * r,
            Kernel::ThinPlate => {
                if r == 0.0 {
                    0.0
                } else {
                    r * r * r.ln()
                }
            }
            Kernel::Multiquadric { .. } => ((r / epsilon).powi(2) + 1.0).sqrt(),
            Kernel::InverseMultiquadric { .. } => 1.0 / ((r / epsilon).powi(2) + 1.0).sqrt(),
            Kernel::Gaussian { .. } => (-(r / epsilon).powi(2)).exp(),
        }
    }

    /// The configured shape parameter, if the kernel has one and it was set.
    pub fn epsilon(&self) -> Option<f64> {
        match self {
            Kernel::Multiquadric { epsilon }
            | Kernel::InverseMultiquadric { epsilon }
            | Kernel::Gaussian { epsilon } => *epsilon,
            _ => None,
        }
    }

    pub fn has_shape(&self) -> bool {
        matches!(
            self,
            Kernel::Multiquadric { .. } | Kernel::InverseMultiquadric { .. } | Kernel::Gaussian { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_linear() {
        assert_eq!(Kernel::default(), Kernel::Linear);
        assert_eq!(Kernel::default().apply(1234.5, 1.0), 1234.5);
    }

    #[test]
    fn test_kernel_values() {
        assert_eq!(Kernel::Cubic.apply(2.0, 1.0), 8.0);
        assert_eq!(Kernel::ThinPlate.apply(0.0, 1.0), 0.0);
        assert!((Kernel::ThinPlate.apply(std::f64::consts::E, 1.0) - std::f64::consts::E.powi(2)).abs() < 1e-12);

        let mq = Kernel::Multiquadric { epsilon: None };
        assert_eq!(mq.apply(0.0, 10.0), 1.0);
        assert!((mq.apply(10.0, 10.0) - 2f64.sqrt()).abs() < 1e-12);

        let imq = Kernel::InverseMultiquadric { epsilon: None };
        assert!((imq.apply(10.0, 10.0) - 1.0 / 2f64.sqrt()).abs() < 1e-12);

        let gauss = Kernel::Gaussian { epsilon: Some(5.0) };
        assert_eq!(gauss.apply(0.0, 5.0), 1.0);
        assert!((gauss.apply(5.0, 5.0) - (-1f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_shape_parameter() {
        assert!(!Kernel::Linear.has_shape());
        assert_eq!(Kernel::Linear.epsilon(), None);
        assert!(Kernel::Gaussian { epsilon: None }.has_shape());
        assert_eq!(Kernel::Gaussian { epsilon: Some(3.0) }.epsilon(), Some(3.0));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Kernel::ThinPlate).unwrap();
        assert_eq!(json, "\"thin_plate\"");
        let parsed: Kernel = serde_json::from_str(r#"{"gaussian":{"epsilon":2.0}}"#).unwrap();
        assert_eq!(parsed, Kernel::Gaussian { epsilon: Some(2.0) });
    }
}
