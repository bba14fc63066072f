use winit::event::WindowEvent;
use winit::window::WindowId;

use crate::text::FontSystem;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
pub trait App {
    /// Called once after the window and renderer exist, before the first frame.
    fn on_start(&mut self, fonts: &mut FontSystem) {
        let _ = fonts;
    }

    /// Called for window events.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called once per frame to fill the scene.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;
}
