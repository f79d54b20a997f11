//! Error types for recipe-core.
//!
//! Every fallible operation in the crate returns [`Result`]. Callers that sit
//! in front of the engine (an HTTP layer, the CLI) use [`Error::kind`] to
//! decide how to report a failure: input errors are the caller's fault,
//! model-state errors mean the service is not ready, data errors abort a
//! training run, and everything else is internal.

use thiserror::Error;

/// Broad classification of an [`Error`], used for client/server error mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied an invalid value (maps to a 4xx response).
    Input,
    /// No usable model is loaded (maps to a 503 response).
    ModelState,
    /// The training data is unusable; fitting was aborted.
    Data,
    /// I/O, serialization, or configuration failure.
    Internal,
}

/// Recommender error types.
#[derive(Error, Debug)]
pub enum Error {
    /// A numeric input fell outside its accepted range or was not finite.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Name of the offending input.
        field: String,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
        /// Value that was rejected.
        value: f64,
    },

    /// An input was malformed in a way other than range.
    #[error("Invalid {field}: {message}")]
    InvalidInput {
        /// Name of the offending input.
        field: String,
        /// Human-readable explanation.
        message: String,
    },

    /// A text search was attempted with an empty or whitespace-only query.
    #[error("Search query must be a non-empty string")]
    EmptyQuery,

    /// Cluster count is below 2 or exceeds the number of data points.
    #[error("Invalid cluster count {requested}: must be at least 2 and at most {available} (number of data points)")]
    InvalidClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of data points available.
        available: usize,
    },

    /// The input table is missing a required column or has a mistyped one.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A record lacks a usable value for a required feature.
    #[error("Record {row} is missing required feature '{feature}'")]
    MissingFeature {
        /// Row index within the corpus.
        row: usize,
        /// Feature name.
        feature: &'static str,
    },

    /// Two records share an id.
    #[error("Record {row} repeats recipe id '{id}'")]
    DuplicateId {
        /// Row of the repeated occurrence.
        row: usize,
        /// The repeated id.
        id: String,
    },

    /// The corpus has no records to train on.
    #[error("Recipe corpus is empty")]
    EmptyCorpus,

    /// No trained model is available to serve the request.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Another retrain is already running against the same service.
    #[error("A retrain is already in progress")]
    RetrainInProgress,

    /// The artifact bytes could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The artifact was written by an incompatible format version.
    #[error("Incompatible artifact format: found version {found}, expected {expected}")]
    IncompatibleArtifact {
        /// Version found in the header.
        found: u16,
        /// Version this build reads.
        expected: u16,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfRange { .. }
            | Self::InvalidInput { .. }
            | Self::EmptyQuery
            | Self::InvalidClusterCount { .. }
            | Self::Schema(_) => ErrorKind::Input,
            Self::ModelUnavailable(_) | Self::RetrainInProgress => ErrorKind::ModelState,
            Self::MissingFeature { .. } | Self::DuplicateId { .. } | Self::EmptyCorpus => {
                ErrorKind::Data
            }
            Self::Serialization(_)
            | Self::IncompatibleArtifact { .. }
            | Self::Config(_)
            | Self::Csv(_)
            | Self::Io(_) => ErrorKind::Internal,
        }
    }

    /// Returns true when the caller is at fault and should not retry as-is.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::Input
    }

    pub(crate) fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<postcard::Error> for Error {
    fn from(err: postcard::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for recommender operations.
pub type Result<T> = std::result::Result<T, Error>;
