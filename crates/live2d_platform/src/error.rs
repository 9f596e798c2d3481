//! Platform error types

use thiserror::Error;

/// Platform-related errors
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Surface dimensions reported by the host are unusable
    #[error("Invalid surface size: {width}x{height}")]
    InvalidSurface { width: i32, height: i32 },

    /// Input action code not understood
    #[error("Unknown touch action: {0}")]
    UnknownTouchAction(i32),

    /// Platform not supported on this OS
    #[error("Platform not supported: {0}")]
    Unsupported(String),

    /// Generic platform error
    #[error("Platform error: {0}")]
    Other(String),
}

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;
