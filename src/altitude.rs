//! Resolution of ground altitude for queries that do not specify one.

/// Looks up the terrain altitude (meters above sea level) of a location.
///
/// Returns `None` outside the covered area. Any `Fn(f64, f64) -> Option<f64>`
/// (latitude, longitude) can be used directly.
pub trait AltitudeLookup: Send + Sync {
    fn altitude(&self, latitude: f64, longitude: f64) -> Option<f64>;
}

impl<F> AltitudeLookup for F
where
    F: Fn(f64, f64) -> Option<f64> + Send + Sync,
{
    fn altitude(&self, latitude: f64, longitude: f64) -> Option<f64> {
        self(latitude, longitude)
    }
}
