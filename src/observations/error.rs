use thiserror::Error;

/// Failure reported by an [`crate::ObservationFetcher`].
///
/// The cache never propagates these to request handlers: it logs them and keeps
/// serving the last good snapshot.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed for {0}")]
    Network(String, #[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("No observation table published for {0}")]
    NothingPublished(String),

    #[error("Failed to parse observation table from {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("Observation download failed")]
    Io(#[from] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
