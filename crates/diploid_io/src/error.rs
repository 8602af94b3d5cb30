//! Errors raised while writing or reading sweep artifacts.

use thiserror::Error;

/// Why a sweep artifact could not be saved or loaded.
#[derive(Error, Debug)]
pub enum IoError {
    /// A sweep could not be encoded to or decoded from JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An rkyv archive failed to serialize, validate or deserialize.
    #[error("Rkyv error: {0}")]
    Rkyv(String),

    /// Reading or writing the artifact file, its directory or its temp file failed.
    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    /// The gzip stream of a `.json.gz` artifact is corrupt or truncated.
    #[error("Compression error: {0}")]
    Compression(String),

    /// The artifact is empty, or its runs disagree with the header shape.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No artifact exists for the requested rule.
    #[error("Artifact not found: {0}")]
    NotFound(String),

    /// Another error tagged with the artifact path or step that failed.
    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<IoError>,
    },
}

/// Result of an artifact operation.
pub type Result<T> = std::result::Result<T, IoError>;

impl IoError {
    #[must_use]
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::Serialization(msg.into())
    }

    #[must_use]
    pub fn rkyv<S: Into<String>>(msg: S) -> Self {
        Self::Rkyv(msg.into())
    }

    #[must_use]
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    #[must_use]
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound(resource.into())
    }

    #[must_use]
    pub fn compression<S: Into<String>>(msg: S) -> Self {
        Self::Compression(msg.into())
    }

    /// Tags the error with the artifact operation that failed.
    #[must_use]
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}
