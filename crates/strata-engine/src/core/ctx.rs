use winit::window::{Window, WindowId};

use crate::coords::Viewport;
use crate::scene::UiScene;
use crate::text::FontSystem;
use crate::time::FrameTime;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    /// Returns the logical window size as `(width, height)` in logical pixels.
    pub fn logical_size(&self) -> (f32, f32) {
        let phys = self.window.inner_size();
        let scale = self.window.scale_factor();
        let logi: winit::dpi::LogicalSize<f64> = phys.to_logical(scale);
        (logi.width as f32, logi.height as f32)
    }
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// `scene` arrives cleared; whatever the app leaves in it is drawn once the
/// callback returns.
pub struct FrameCtx<'a> {
    pub window: WindowCtx<'a>,
    pub time: FrameTime,
    /// Framebuffer size in logical pixels.
    pub viewport: Viewport,
    /// Logical-to-device scale.
    pub scale_factor: f32,
    pub scene: &'a mut UiScene,
    pub fonts: &'a mut FontSystem,
}
