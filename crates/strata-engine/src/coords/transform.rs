use super::{Rect, Vec2, Viewport};

/// Column-major 4x4 matrix.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
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

    /// Translation followed by nothing else; handy for scrolling a whole frame.
    pub const fn translation(x: f32, y: f32) -> Mat4 {
        Mat4 {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, 0.0, 1.0],
            ],
        }
    }

    /// Transforms a point (w = 1) and applies the perspective divide.
    #[inline]
    pub fn transform_point(&self, p: [f32; 3]) -> [f32; 3] {
        let c = &self.cols;
        let mut out = [0.0f32; 4];
        for (row, slot) in out.iter_mut().enumerate() {
            *slot = c[0][row] * p[0] + c[1][row] * p[1] + c[2][row] * p[2] + c[3][row];
        }
        if out[3] != 0.0 && out[3] != 1.0 {
            [out[0] / out[3], out[1] / out[3], out[2] / out[3]]
        } else {
            [out[0], out[1], out[2]]
        }
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Per-frame mapping from logical to device space.
///
/// Mutated only when the window is resized or moves to a display with a
/// different scale factor.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DeviceTransform {
    /// Logical-to-device scale (the window's DPI factor).
    pub scale: f32,
    /// Framebuffer size in device pixels.
    pub viewport: Viewport,
    /// Applied to device-space vertex positions at emission time.
    pub projection: Mat4,
}

impl DeviceTransform {
    pub fn new(scale: f32, viewport: Viewport) -> Self {
        Self {
            scale: if scale.is_finite() && scale > 0.0 { scale } else { 1.0 },
            viewport,
            projection: Mat4::IDENTITY,
        }
    }

    #[inline]
    pub fn to_device(&self, logical: Rect) -> Rect {
        logical.scale(self.scale)
    }

    #[inline]
    pub fn point_to_device(&self, logical: Vec2) -> Vec2 {
        logical * self.scale
    }

    /// Logical size of the framebuffer.
    #[inline]
    pub fn logical_viewport(&self) -> Viewport {
        Viewport::new(self.viewport.width / self.scale, self.viewport.height / self.scale)
    }

    /// Projects a device-space position with the given depth.
    #[inline]
    pub fn project(&self, device: Vec2, depth: f32) -> [f32; 3] {
        self.projection.transform_point([device.x, device.y, depth])
    }
}

impl Default for DeviceTransform {
    fn default() -> Self {
        Self::new(1.0, Viewport::new(1.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_device_scales_origin_and_size() {
        let t = DeviceTransform::new(1.5, Viewport::new(300.0, 200.0));
        assert_eq!(t.to_device(Rect::new(10.0, 12.0, 80.0, 40.0)), Rect::new(15.0, 18.0, 120.0, 60.0));
    }

    #[test]
    fn invalid_scale_falls_back_to_one() {
        assert_eq!(DeviceTransform::new(0.0, Viewport::new(1.0, 1.0)).scale, 1.0);
        assert_eq!(DeviceTransform::new(f32::NAN, Viewport::new(1.0, 1.0)).scale, 1.0);
    }

    #[test]
    fn identity_projection_keeps_position() {
        let t = DeviceTransform::default();
        assert_eq!(t.project(Vec2::new(3.0, 4.0), 0.5), [3.0, 4.0, 0.5]);
    }

    #[test]
    fn translation_projection_offsets_xy_only() {
        let mut t = DeviceTransform::default();
        t.projection = Mat4::translation(10.0, -2.0);
        assert_eq!(t.project(Vec2::new(1.0, 1.0), 0.25), [11.0, -1.0, 0.25]);
    }
}
