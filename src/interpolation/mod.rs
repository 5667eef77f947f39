pub mod error;
pub mod interpolator;
pub mod kernel;
pub mod metric;
pub mod model_cache;
pub mod rbf;
