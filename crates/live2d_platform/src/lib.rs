//! Live2D Bridge Platform Abstraction
//!
//! Platform-agnostic types for hosting a Live2D view inside an embedded
//! native surface.
//!
//! # Architecture
//!
//! The host framework owns the drawable surface and drives it through three
//! callbacks, all delivered on the render thread:
//!
//! - `onSurfaceCreated` - one-time GL state setup
//! - `onSurfaceChanged(width, height)` - viewport change
//! - `onDrawFrame` - the render-loop schedule
//!
//! These arrive here as [`SurfaceEvent`]s and are handled by a
//! [`SurfaceHandler`]. Raw touch input arrives on the UI input thread as
//! [`TouchEvent`]s and must never touch render-owned state directly.
//!
//! # Platform Implementations
//!
//! - `live2d_platform_android` - Android `GLSurfaceView` via JNI
//! - `live2d_cli` - headless frame driver for tooling

mod error;
mod event;
mod input;
mod surface;

// Re-export all public types
pub use error::{PlatformError, Result};
pub use event::{ControlFlow, SurfaceEvent, SurfaceHandler};
pub use input::{TouchAction, TouchEvent};
pub use surface::{SurfaceConfig, SurfaceSize};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{PlatformError, Result};
    pub use crate::event::{ControlFlow, SurfaceEvent, SurfaceHandler};
    pub use crate::input::{TouchAction, TouchEvent};
    pub use crate::surface::{SurfaceConfig, SurfaceSize};
}
