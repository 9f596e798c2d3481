//! Embedded surface configuration and dimensions

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};

/// Surface size in physical pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Build from the signed dimensions hosts hand across FFI
    pub fn from_host(width: i32, height: i32) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(PlatformError::InvalidSurface { width, height });
        }
        Ok(Self::new(width as u32, height as u32))
    }

    /// Whether either dimension is zero (no surface yet)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Portrait means strictly taller than wide
    pub fn is_portrait(&self) -> bool {
        self.width < self.height
    }

    /// Width over height, or 1.0 for an empty surface
    pub fn aspect_ratio(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Configuration for the embedded drawable surface
///
/// Defaults match what the view requests from EGL: an RGBA8888 config with a
/// 16-bit depth buffer and no stencil, composited translucently above the
/// host's own content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub red_bits: u8,
    pub green_bits: u8,
    pub blue_bits: u8,
    pub alpha_bits: u8,
    pub depth_bits: u8,
    pub stencil_bits: u8,
    /// Composite with a translucent pixel format
    pub translucent: bool,
    /// Place the surface above the host window
    pub z_order_on_top: bool,
    /// GLES client version requested for the context
    pub gles_version: u8,
    /// Redraw every vsync rather than on demand
    pub continuous: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            red_bits: 8,
            green_bits: 8,
            blue_bits: 8,
            alpha_bits: 8,
            depth_bits: 16,
            stencil_bits: 0,
            translucent: true,
            z_order_on_top: true,
            gles_version: 2,
            continuous: true,
        }
    }
}

impl SurfaceConfig {
    /// Set whether the surface composites translucently
    pub fn translucent(mut self, translucent: bool) -> Self {
        self.translucent = translucent;
        self
    }

    /// Set whether to render continuously
    pub fn continuous(mut self, continuous: bool) -> Self {
        self.continuous = continuous;
        self
    }

    /// EGL config attribute tuple in `setEGLConfigChooser` argument order
    pub fn egl_bits(&self) -> [u8; 6] {
        [
            self.red_bits,
            self.green_bits,
            self.blue_bits,
            self.alpha_bits,
            self.depth_bits,
            self.stencil_bits,
        ]
    }
}
