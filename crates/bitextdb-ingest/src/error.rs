use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the ingestion pipeline.
///
/// The pipeline is generic over its storage backends, so backend failures
/// are carried boxed. Malformed or unresolvable input records are not
/// errors; they are counted in the run summary instead.
#[derive(Debug, Error)]
pub enum Error {
  #[error("sentence index lookup failed: {0}")]
  Index(#[source] BoxError),

  #[error("link store operation failed: {0}")]
  Store(#[source] BoxError),
}

impl Error {
  pub fn index(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Index(Box::new(err))
  }

  pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(err))
  }
}
