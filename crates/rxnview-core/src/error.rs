//! Error handling for rxnview
//!
//! Provides the error types used across the canvas engine:
//! - Canvas errors (stale references, degenerate geometry, locked structure)
//! - Configuration errors (validation and TOML parsing)
//! - Event bus errors
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

use crate::event_bus::EventBusError;
use crate::types::{ElementId, ElementKind};

/// Canvas error type
///
/// Raised by scene mutations. The interaction controller recovers from all
/// of these locally, so none of them reach a pointer-event caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CanvasError {
    /// The target id is not present in the scene
    #[error("Element {id} does not exist")]
    InvalidReference {
        /// The missing element id.
        id: ElementId,
    },

    /// The mutation would produce zero-area or zero-length geometry
    #[error("Degenerate geometry: {reason}")]
    DegenerateGeometry {
        /// Why the geometry was rejected.
        reason: String,
    },

    /// An explicit setter received a value outside its valid range
    #[error("{what} value {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// The quantity being set.
        what: String,
        /// The rejected value.
        value: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// A structural edit was attempted while an interaction holds the scene
    #[error("Cannot {operation} while an interaction is in progress")]
    InteractionInProgress {
        /// The rejected operation.
        operation: String,
    },

    /// An inserted element reused an existing id
    #[error("Element {id} already exists")]
    DuplicateId {
        /// The conflicting id.
        id: ElementId,
    },

    /// The element exists but is of the wrong kind for the operation
    #[error("Element {id} is a {found}, expected {expected}")]
    KindMismatch {
        /// The element id.
        id: ElementId,
        /// The kind the operation needs.
        expected: ElementKind,
        /// The kind actually stored.
        found: ElementKind,
    },
}

impl CanvasError {
    /// Shorthand for a degenerate-geometry rejection.
    pub fn degenerate(reason: impl Into<String>) -> Self {
        CanvasError::DegenerateGeometry {
            reason: reason.into(),
        }
    }

    /// Shorthand for a locked-structure rejection.
    pub fn locked(operation: impl Into<String>) -> Self {
        CanvasError::InteractionInProgress {
            operation: operation.into(),
        }
    }
}

/// Errors related to configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration value is invalid.
    #[error("Invalid setting '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// I/O error while reading or writing a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Main error type for rxnview
///
/// Unified error type that can represent errors from any layer.
#[derive(Error, Debug)]
pub enum Error {
    /// Canvas error
    #[error(transparent)]
    Canvas(#[from] CanvasError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Event bus error
    #[error(transparent)]
    EventBus(#[from] EventBusError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a canvas error
    pub fn is_canvas_error(&self) -> bool {
        matches!(self, Error::Canvas(_))
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Check if this error came from a stale element reference
    pub fn is_invalid_reference(&self) -> bool {
        matches!(self, Error::Canvas(CanvasError::InvalidReference { .. }))
    }
}

/// Result type for rxnview operations
pub type Result<T> = std::result::Result<T, Error>;
