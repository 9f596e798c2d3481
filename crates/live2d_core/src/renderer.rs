//! Interfaces of the external model runtime
//!
//! The vendor SDK does all model parsing, deformation and GPU work. The
//! bridge only talks to it through these two traits:
//!
//! - [`RenderFramework`] - process-wide startup and shutdown
//! - [`ModelRenderer`] - per-view model loading, animation triggers and
//!   drawing, always called from the render thread

use thiserror::Error;

use crate::command::MotionPriority;
use crate::transform::Mat4;

slotmap::new_key_type! {
    /// Handle to a model owned by a [`ModelRenderer`]
    pub struct ModelHandle;
}

/// Errors reported by the model runtime
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RendererError {
    /// Asset could not be read or parsed
    #[error("load failed: {0}")]
    Load(String),

    /// Draw call failed
    #[error("draw failed: {0}")]
    Draw(String),

    /// Motion or expression trigger refused
    #[error("animation rejected: {0}")]
    Animation(String),

    /// Framework startup failed
    #[error("framework error: {0}")]
    Framework(String),

    /// Handle does not name a live model
    #[error("unknown model handle")]
    UnknownModel,
}

/// Process-wide runtime lifecycle
///
/// Implementations may assume `startup` and `initialize` are called once,
/// in that order, before any model is loaded, and `dispose` once after the
/// last model is released. [`FrameworkScope`](crate::FrameworkScope)
/// enforces that across views.
pub trait RenderFramework: Send + Sync {
    /// Install logging hooks and allocators
    fn startup(&self) -> Result<(), RendererError>;

    /// Initialize runtime internals
    fn initialize(&self) -> Result<(), RendererError>;

    /// Tear the runtime down
    fn dispose(&self);
}

/// Per-view access to the model runtime
///
/// Called only from the render thread that owns the view.
pub trait ModelRenderer {
    /// One-time GL state for a fresh surface (blending, texture filtering)
    fn prepare_surface(&mut self) {}

    /// Set the drawing viewport
    fn set_viewport(&mut self, _width: u32, _height: u32) {}

    /// Clear the frame
    fn clear(&mut self, color: [f32; 4]);

    /// Load a model from `dir` + `file`
    fn load_assets(&mut self, dir: &str, file: &str) -> Result<ModelHandle, RendererError>;

    /// Native canvas size of a loaded model, in model units
    fn canvas_size(&self, model: ModelHandle) -> Option<(f32, f32)>;

    /// Release one model's resources
    fn release(&mut self, model: ModelHandle);

    /// Advance physics, motions and expressions by one frame
    fn update(&mut self, model: ModelHandle);

    /// Draw with the given model-view-projection matrix
    fn draw(&mut self, model: ModelHandle, transform: &Mat4) -> Result<(), RendererError>;

    /// Trigger a motion; the runtime owns its timing
    fn start_motion(
        &mut self,
        model: ModelHandle,
        group: &str,
        index: u32,
        priority: MotionPriority,
    ) -> Result<(), RendererError>;

    /// Apply an expression
    fn set_expression(&mut self, model: ModelHandle, id: &str) -> Result<(), RendererError>;

    /// Release renderer-wide resources (shaders, offscreen buffers)
    fn close(&mut self);
}
