//! Render-thread view state

use live2d_platform::SurfaceSize;
use serde::Serialize;

use crate::command::MotionPriority;
use crate::renderer::ModelHandle;

/// A motion trigger waiting for the next forward to the runtime
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MotionRequest {
    pub group: String,
    pub index: u32,
    pub priority: MotionPriority,
}

/// The model currently owned by the view
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedModel {
    pub handle: ModelHandle,
    pub path: String,
    /// Native canvas size in model units
    pub canvas: (f32, f32),
}

/// Everything the draw step reads
///
/// Owned by the render loop and only mutated on the render thread, between
/// draws of the same tick.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub model: Option<LoadedModel>,
    pub scale: f32,
    pub position: (f32, f32),
    pub surface: SurfaceSize,
    /// Latest motion trigger not yet forwarded
    pub pending_motion: Option<MotionRequest>,
    /// Latest expression not yet forwarded
    pub pending_expression: Option<String>,
    /// Sequence number of the last command applied
    pub last_applied: u64,
    /// Diagnostic of the last failed load, cleared by a successful one
    pub last_load_error: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            model: None,
            scale: 1.0,
            position: (0.0, 0.0),
            surface: SurfaceSize::default(),
            pending_motion: None,
            pending_expression: None,
            last_applied: 0,
            last_load_error: None,
        }
    }
}

impl ViewState {
    pub fn model_handle(&self) -> Option<ModelHandle> {
        self.model.as_ref().map(|m| m.handle)
    }

    /// Canvas width of the loaded model, or 0 without one
    pub fn canvas_width(&self) -> f32 {
        self.model.as_ref().map(|m| m.canvas.0).unwrap_or(0.0)
    }

    /// Serializable view of the state, for diagnostics
    pub fn summary(&self) -> ViewSummary {
        ViewSummary {
            model_path: self.model.as_ref().map(|m| m.path.clone()),
            scale: self.scale,
            position: self.position,
            surface: self.surface,
            pending_motion: self.pending_motion.clone(),
            pending_expression: self.pending_expression.clone(),
            last_applied: self.last_applied,
            last_load_error: self.last_load_error.clone(),
        }
    }
}

/// Snapshot of [`ViewState`] without renderer handles
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSummary {
    pub model_path: Option<String>,
    pub scale: f32,
    pub position: (f32, f32),
    pub surface: SurfaceSize,
    pub pending_motion: Option<MotionRequest>,
    pub pending_expression: Option<String>,
    pub last_applied: u64,
    pub last_load_error: Option<String>,
}
