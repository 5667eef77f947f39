use crate::dataset::builder::Dataset;
use crate::interpolation::error::Unavailable;
use crate::interpolation::interpolator::{Interpolator, ModalityModel};
use crate::types::modality::Modality;
use chrono::{DateTime, Utc};
use log::trace;
use std::collections::{hash_map::Entry, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Identifies the input a model was fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelKey {
    pub modality: Modality,
    pub latest: Option<DateTime<Utc>>,
    pub stations: usize,
    pub fingerprint: u64,
}

impl ModelKey {
    pub fn of(dataset: &Dataset) -> Self {
        Self {
            modality: dataset.modality(),
            latest: dataset.latest_timestamp(),
            stations: dataset.len(),
            fingerprint: dataset.fingerprint(),
        }
    }
}

/// Fitted models keyed by their input, so repeated queries against an unchanged
/// snapshot skip the kernel solve. When full, the model with the oldest input is
/// evicted first.
pub struct ModelCache {
    interpolator: Interpolator,
    capacity: usize,
    models: Mutex<HashMap<ModelKey, Arc<ModalityModel>>>,
}

impl ModelCache {
    pub fn new(interpolator: Interpolator, capacity: usize) -> Self {
        Self {
            interpolator,
            capacity,
            models: Mutex::new(HashMap::new()),
        }
    }

    pub fn interpolator(&self) -> &Interpolator {
        &self.interpolator
    }

    pub async fn len(&self) -> usize {
        self.models.lock().await.len()
    }

    /// Returns the cached model for `dataset`, fitting it on a miss. Failed fits
    /// are not cached.
    pub async fn get_or_fit(&self, dataset: &Dataset) -> Result<Arc<ModalityModel>, Unavailable> {
        let key = ModelKey::of(dataset);

        {
            let models = self.models.lock().await;
            if let Some(model) = models.get(&key) {
                return Ok(Arc::clone(model));
            }
        }

        // Fit outside the lock; other modalities can be served meanwhile.
        let model = Arc::new(self.interpolator.fit(dataset)?);
        if self.capacity == 0 {
            return Ok(model);
        }

        let mut models = self.models.lock().await;
        if !models.contains_key(&key) && models.len() >= self.capacity {
            evict_oldest(&mut models);
        }
        match models.entry(key) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&model));
                Ok(model)
            }
        }
    }
}

fn evict_oldest(models: &mut HashMap<ModelKey, Arc<ModalityModel>>) {
    let oldest = models
        .keys()
        .min_by_key(|k| (k.latest, k.modality, k.stations, k.fingerprint))
        .copied();
    if let Some(key) = oldest {
        trace!("Evicting {} model fitted on data up to {:?}", key.modality, key.latest);
        models.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::builder::DatasetEntry;
    use crate::types::modality::Source;
    use crate::types::station::GeoPoint;
    use chrono::{TimeDelta, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    fn dataset(hours: i64, value: f64) -> Dataset {
        let entry = |id, lat, v| DatasetEntry {
            station_id: id,
            position: GeoPoint::new(lat, 8.0, 100.0),
            value: v,
            timestamp: t0() + TimeDelta::hours(hours),
            source: Source::Domestic,
        };
        Dataset::new(
            Modality::Temperature,
            vec![entry(1, 50.0, value), entry(2, 51.0, value + 1.0)],
        )
    }

    #[tokio::test]
    async fn test_same_input_reuses_model() {
        let cache = ModelCache::new(Interpolator::default(), 8);
        let first = cache.get_or_fit(&dataset(0, 5.0)).await.unwrap();
        let second = cache.get_or_fit(&dataset(0, 5.0)).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let changed = cache.get_or_fit(&dataset(0, 6.0)).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &changed));
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_oldest_model_is_evicted() {
        let cache = ModelCache::new(Interpolator::default(), 2);
        let oldest = cache.get_or_fit(&dataset(0, 5.0)).await.unwrap();
        cache.get_or_fit(&dataset(1, 5.0)).await.unwrap();
        cache.get_or_fit(&dataset(2, 5.0)).await.unwrap();
        assert_eq!(cache.len().await, 2);

        let refitted = cache.get_or_fit(&dataset(0, 5.0)).await.unwrap();
        assert!(!Arc::ptr_eq(&oldest, &refitted));
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = ModelCache::new(Interpolator::default(), 8);
        let lonely = Dataset::new(Modality::Humidity, vec![]);
        assert!(cache.get_or_fit(&lonely).await.is_err());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_zero_capacity_disables_caching() {
        let cache = ModelCache::new(Interpolator::default(), 0);
        let first = cache.get_or_fit(&dataset(0, 5.0)).await.unwrap();
        let second = cache.get_or_fit(&dataset(0, 5.0)).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len().await, 0);
    }
}
