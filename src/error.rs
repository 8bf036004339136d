//! Error types for the splicing engine
//!
//! Per-candidate failures ([`BoundaryError`], [`EngineError::VerificationFailed`])
//! are meant to be recovered locally by skipping or retrying that candidate.
//! Only configuration-shape errors ([`EngineError::InvalidWeightConfiguration`])
//! should abort a run.

use thiserror::Error;

/// Failures of the boundary locator for a single candidate
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundaryError {
    /// The approximate time range does not lie within the buffer
    #[error("time range [{start_s:.3}s, {end_s:.3}s) is outside buffer of {duration_s:.3}s")]
    OutOfRange {
        /// Requested start in seconds
        start_s: f64,
        /// Requested end in seconds
        end_s: f64,
        /// Buffer duration in seconds
        duration_s: f64,
    },

    /// The trimmed result is shorter than the configured minimum
    #[error("trimmed clip is {duration_ms:.1} ms, minimum is {min_duration_ms} ms")]
    TooShort {
        /// Trimmed duration in milliseconds
        duration_ms: f64,
        /// Configured floor in milliseconds
        min_duration_ms: u32,
    },
}

/// Errors that can occur anywhere in the engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid input parameters or buffers
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Boundary location failed for a candidate
    #[error(transparent)]
    Boundary(#[from] BoundaryError),

    /// The verification oracle rejected every trimming attempt
    #[error("verification failed for '{event}' after {attempts} attempt(s)")]
    VerificationFailed {
        /// Expected event label passed to the verifier
        event: String,
        /// Number of locate/verify attempts made
        attempts: u32,
    },

    /// A scorer weight set is malformed
    #[error("invalid weight configuration: {0}")]
    InvalidWeightConfiguration(String),

    /// Audio decoding error
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Manifest or configuration (de)serialization error
    #[error("serialization error while {context}: {source}")]
    Serialization {
        /// What was being (de)serialized
        context: &'static str,
        /// Underlying serde_json error
        #[source]
        source: serde_json::Error,
    },

    /// I/O error
    #[error("I/O error while {context}: {source}")]
    Io {
        /// What was being read or written
        context: &'static str,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub(crate) fn invalid_weights(message: impl Into<String>) -> Self {
        Self::InvalidWeightConfiguration(message.into())
    }

    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Serialization { context, source }
    }

    /// True for errors that indicate a configuration defect rather than bad data
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::InvalidWeightConfiguration(_))
    }
}
