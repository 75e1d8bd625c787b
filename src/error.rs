use thiserror::Error;

/// Crate-wide result type for the pipeline stages.
pub type Result<T> = std::result::Result<T, Error>;

/// The stage a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Conversion,
    Transcription,
    Notification,
}

/// Crate-wide error type.
///
/// Internals work with `anyhow` and context chains; each stage maps its failure into the
/// matching variant at its boundary so downstream code isn't forced to adopt `anyhow`.
/// The message carries the full cause chain.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Conversion(String),

    #[error("{0}")]
    Transcription(String),

    #[error("{0}")]
    Notification(String),
}

impl Error {
    pub(crate) fn conversion(err: anyhow::Error) -> Self {
        Self::Conversion(format!("{err:#}"))
    }

    pub(crate) fn transcription(err: anyhow::Error) -> Self {
        Self::Transcription(format!("{err:#}"))
    }

    pub(crate) fn notification(err: anyhow::Error) -> Self {
        Self::Notification(format!("{err:#}"))
    }

    /// The pipeline stage that produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Conversion(_) => Stage::Conversion,
            Self::Transcription(_) => Stage::Transcription,
            Self::Notification(_) => Stage::Notification,
        }
    }
}
