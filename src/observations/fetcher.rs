use crate::observations::dwd_table::parse_observation_table;
use crate::observations::error::FetchError;
use crate::stations::catalog::StationCatalog;
use crate::types::modality::Source;
use crate::types::observation::RawObservation;
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use log::debug;
use std::sync::Arc;

/// Retrieves the latest batch of observations for one feed.
///
/// This is the seam to the download layer. The cache calls it at most once per
/// refresh and never retries on its own.
pub trait ObservationFetcher: Send + Sync {
    fn fetch(&self, source: Source) -> BoxFuture<'_, Result<Vec<RawObservation>, FetchError>>;
}

/// A published observation table as downloaded from the server.
#[derive(Debug, Clone)]
pub struct PublishedTable {
    /// Where the table came from, used in log and error messages.
    pub origin: String,
    /// Publication time of the table; every row is stamped with it.
    pub published_at: DateTime<Utc>,
    /// Raw Latin-1 encoded HTML.
    pub bytes: Vec<u8>,
}

/// Downloads the newest observation table of a feed.
pub trait TableSource: Send + Sync {
    fn newest_table(&self, source: Source) -> BoxFuture<'_, Result<PublishedTable, FetchError>>;
}

/// Adapts a [`TableSource`] into an [`ObservationFetcher`] by parsing the HTML
/// tables and resolving station names through the catalog.
pub struct DwdTableFetcher<T> {
    tables: T,
    catalog: Arc<StationCatalog>,
}

impl<T: TableSource> DwdTableFetcher<T> {
    pub fn new(tables: T, catalog: Arc<StationCatalog>) -> Self {
        Self { tables, catalog }
    }
}

impl<T: TableSource> ObservationFetcher for DwdTableFetcher<T> {
    fn fetch(&self, source: Source) -> BoxFuture<'_, Result<Vec<RawObservation>, FetchError>> {
        async move {
            let table = self.tables.newest_table(source).await?;
            let catalog = Arc::clone(&self.catalog);
            let origin = table.origin.clone();
            let records = tokio::task::spawn_blocking(move || {
                let html = decode_latin1(&table.bytes);
                parse_observation_table(&html, &catalog, table.published_at)
            })
            .await?;
            debug!(
                "Parsed {} {} records from {}",
                records.len(),
                source,
                origin
            );
            Ok(records)
        }
        .boxed()
    }
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
