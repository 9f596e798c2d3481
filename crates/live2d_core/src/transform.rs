//! Model-view-projection for the embedded view
//!
//! The runtime draws in a normalized square where the model canvas spans
//! `-1..1`. The view matrix squeezes that square into the surface's aspect
//! ratio, then applies the user's uniform scale and translation.

use live2d_platform::SurfaceSize;

/// Column-major 4x4 matrix, the layout the runtime's draw call expects
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        Self {
            cols: [
                [x, 0.0, 0.0, 0.0],
                [0.0, y, 0.0, 0.0],
                [0.0, 0.0, z, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// `self * rhs`: `rhs` is applied first
    pub fn mul(&self, rhs: &Mat4) -> Mat4 {
        let mut out = [[0.0f32; 4]; 4];
        for (c, col) in out.iter_mut().enumerate() {
            for (r, cell) in col.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.cols[k][r] * rhs.cols[c][k]).sum();
            }
        }
        Mat4 { cols: out }
    }

    /// Transform a 2D point (z = 0, w = 1)
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.cols[0][0] * x + self.cols[1][0] * y + self.cols[3][0],
            self.cols[0][1] * x + self.cols[1][1] * y + self.cols[3][1],
        )
    }

    /// Flat column-major array for FFI
    pub fn to_cols_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        for (c, col) in self.cols.iter().enumerate() {
            out[c * 4..c * 4 + 4].copy_from_slice(col);
        }
        out
    }
}

/// Per-axis factors that keep the model's proportions on a given surface
///
/// Wide models (canvas width above `threshold`) in portrait surfaces are
/// fitted by width at double size; everything else is fitted by height.
/// An empty surface gets no correction.
pub fn aspect_correction(surface: SurfaceSize, canvas_width: f32, threshold: f32) -> (f32, f32) {
    if surface.is_empty() {
        return (1.0, 1.0);
    }
    let (w, h) = (surface.width as f32, surface.height as f32);
    if canvas_width > threshold && surface.is_portrait() {
        (2.0, 2.0 * w / h)
    } else {
        (h / w, 1.0)
    }
}

/// Full view matrix: `aspect * translate(position) * scale(uniform)`
pub fn view_matrix(aspect: (f32, f32), scale: f32, position: (f32, f32)) -> Mat4 {
    let projection = Mat4::scale(aspect.0, aspect.1, 1.0);
    let model = Mat4::translation(position.0, position.1, 0.0).mul(&Mat4::scale(scale, scale, 1.0));
    projection.mul(&model)
}
