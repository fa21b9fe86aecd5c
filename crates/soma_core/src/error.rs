//! Error types for the soma engine.

use thiserror::Error;

/// Every failure a caller of the engine can observe.
///
/// The first three are per-step errors: the step is rejected and the session
/// is left exactly as it was. `Configuration` is only produced while building
/// an engine, never mid-session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SomaError {
    /// The zone id is not part of the body map.
    #[error("Unknown zone: {0}")]
    UnknownZone(String),

    /// The zone has no receptors for this modality.
    #[error("Zone {zone} does not respond to {modality}")]
    UnknownModality {
        /// Zone the stimulus was applied to.
        zone: String,
        /// Modality name.
        modality: String,
    },

    /// A stimulus parameter is missing, non-finite or out of range.
    #[error("Invalid stimulus parameter {parameter}: {reason}")]
    InvalidStimulusParameter {
        /// Parameter name as it appears in directives.
        parameter: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The configuration violates an ordering or reference constraint.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SomaError {
    pub(crate) fn invalid(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidStimulusParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, SomaError>;
