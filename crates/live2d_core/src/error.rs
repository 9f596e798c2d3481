//! Bridge error types

use thiserror::Error;

use crate::lifecycle::Phase;

/// Errors surfaced by the bridge
///
/// Validation and admission errors (`InvalidArgument` through `QueueFull`)
/// are returned synchronously to the control-plane caller. `LoadFailure` and
/// `RenderFault` happen on the render thread after a command was accepted and
/// only ever travel through the view event side-channel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// A call parameter is missing or has the wrong type
    #[error("Invalid argument '{field}': {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    /// The command was issued before any view exists
    #[error("Live2D view not found")]
    NoActiveView,

    /// The view is not in the `Started` phase
    #[error("Live2D view is not ready (phase: {0})")]
    NotReady(Phase),

    /// Unknown command name
    #[error("Method '{0}' is not implemented")]
    NotImplemented(String),

    /// Backpressure rejection
    #[error("Command queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// The rendering SDK failed to load a model
    #[error("Failed to load model '{path}': {message}")]
    LoadFailure { path: String, message: String },

    /// Unexpected failure inside the draw step
    #[error("Render fault: {0}")]
    RenderFault(String),

    /// The rendering framework failed to start
    #[error("Rendering framework failed to start: {0}")]
    FrameworkInit(String),

    /// Configuration could not be read or is invalid
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl BridgeError {
    /// Shorthand for a missing required argument
    pub fn missing(field: &'static str) -> Self {
        BridgeError::InvalidArgument {
            field,
            reason: "required argument is missing".to_string(),
        }
    }

    /// Shorthand for an argument that is present but unusable
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        BridgeError::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }

    /// Stable error code reported back over the host channel
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            BridgeError::NoActiveView => "NO_VIEW",
            BridgeError::NotReady(_) => "NOT_READY",
            BridgeError::NotImplemented(_) => "NOT_IMPLEMENTED",
            BridgeError::QueueFull { .. } => "QUEUE_FULL",
            BridgeError::LoadFailure { .. } => "LOAD_FAILURE",
            BridgeError::RenderFault(_) => "RENDER_FAULT",
            BridgeError::FrameworkInit(_) => "FRAMEWORK_INIT",
            BridgeError::Config(_) => "CONFIG",
        }
    }
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
