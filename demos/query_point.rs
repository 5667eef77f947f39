//! Answers one weather query from observation tables saved on disk.
//!
//! ```text
//! cargo run --example query_point -- stations.xml domestic.html continental.html 50.11 8.68 112
//! ```

use chrono::{DateTime, Utc};
use dwd_weather::{
    DwdTableFetcher, DwdWeather, FetchError, PublishedTable, Source, StationCatalog, TableSource,
};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Serves the newest table of each feed from a local file.
struct LocalTables {
    domestic: PathBuf,
    continental: PathBuf,
}

impl TableSource for LocalTables {
    fn newest_table(&self, source: Source) -> BoxFuture<'_, Result<PublishedTable, FetchError>> {
        let path = match source {
            Source::Domestic => self.domestic.clone(),
            Source::Continental => self.continental.clone(),
        };
        async move {
            let bytes = tokio::fs::read(&path).await?;
            let modified: DateTime<Utc> = tokio::fs::metadata(&path).await?.modified()?.into();
            Ok(PublishedTable {
                origin: path.display().to_string(),
                published_at: modified,
                bytes,
            })
        }
        .boxed()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [stations, domestic, continental, lat, lon, rest @ ..] = args.as_slice() else {
        eprintln!("usage: query_point STATIONS.xml DOMESTIC.html CONTINENTAL.html LAT LON [ALT]");
        std::process::exit(2);
    };

    let catalog = Arc::new(StationCatalog::load(Path::new(stations)).await?);
    let tables = LocalTables {
        domestic: domestic.into(),
        continental: continental.into(),
    };
    let fetcher = DwdTableFetcher::new(tables, Arc::clone(&catalog));
    let client = DwdWeather::builder()
        .catalog(catalog)
        .fetcher(Arc::new(fetcher))
        .build();

    let report = client
        .weather()
        .latitude(lat.parse()?)
        .longitude(lon.parse()?)
        .maybe_altitude(rest.first().map(|alt| alt.parse()).transpose()?)
        .call()
        .await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
