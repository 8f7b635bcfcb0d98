use thiserror::Error;

/// Top-level error type for the forwarder pipeline.
///
/// No variant is retried internally: the first error aborts the remaining
/// stages, gets logged at ERROR, and the process exits non-zero. There is
/// no partial-success mode.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::app::ConfigError),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] crate::fetcher::FetchError),

    #[error("Metric shaping failed: {0}")]
    Shape(#[from] super::metric::ShapeError),

    #[error("Batch encoding failed: {0}")]
    Encode(#[from] crate::encoder::EncodeError),

    #[error("Transport failed: {0}")]
    Transport(#[from] crate::transport::TransportError),
}
