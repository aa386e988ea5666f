//! Error types for the personality engine.
//!
//! Two failure classes exist: structurally malformed input rejected before
//! any state mutation ([`ValidationError`]), and malformed configuration
//! rejected at construction ([`ConfigurationError`]). Out-of-range numeric
//! *results* are not errors anywhere in the crate — affect and style
//! arithmetic is expected to overshoot and is clamped.

use thiserror::Error;

/// Errors raised when an incoming event or state payload is structurally
/// invalid. The engine state is untouched when one of these is returned.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Event intensity outside the closed unit interval.
    #[error("event intensity {value} is outside [0.0, 1.0]")]
    IntensityOutOfRange { value: f64 },

    /// Event intensity is NaN or infinite.
    #[error("event intensity is not a finite number")]
    IntensityNotFinite,

    /// Event kind tag is empty.
    #[error("event kind tag is empty")]
    EmptyEventKind,

    /// An imported state payload failed to deserialize or validate.
    #[error("invalid state payload: {reason}")]
    InvalidStatePayload { reason: String },
}

/// Errors raised while constructing the engine from configuration.
/// These are fatal at startup and never occur mid-operation.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A trait baseline coordinate outside [0, 1] or non-finite.
    #[error("trait `{name}` value {value} is outside [0.0, 1.0]")]
    TraitOutOfRange { name: &'static str, value: f64 },

    /// Decay rate must lie in (0, 1].
    #[error("decay rate {value} is outside (0.0, 1.0]")]
    InvalidDecayRate { value: f64 },

    /// A configured setpoint outside its dimension's declared range.
    #[error("setpoint `{name}` value {value} is outside its declared range")]
    SetpointOutOfRange { name: &'static str, value: f64 },

    /// A threshold or coefficient outside [0, 1].
    #[error("parameter `{name}` value {value} is outside [0.0, 1.0]")]
    ParameterOutOfRange { name: &'static str, value: f64 },

    /// A mode template carries an unusable parameter.
    #[error("mode template `{mode}`: {reason}")]
    InvalidModeTemplate { mode: &'static str, reason: String },

    /// A boundary condition has an empty id.
    #[error("boundary condition at index {index} has an empty id")]
    EmptyConditionId { index: usize },

    /// Two boundary conditions share an id.
    #[error("duplicate boundary condition id `{id}`")]
    DuplicateConditionId { id: String },

    /// A configuration document failed to parse.
    #[error("malformed configuration document: {reason}")]
    MalformedDocument { reason: String },
}

/// Umbrella error for callers that want a single type.
#[derive(Debug, Error)]
pub enum PersonaError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
