use crate::coords::{Rect, Vec2};

use super::{AtlasError, FontId, FontSystem, GlyphAtlas, GlyphKey};

/// A positioned glyph ready to become a glyph quad.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShapedGlyph {
    /// Glyph bitmap box in logical pixels.
    pub logical_box: Rect,
    pub uv_min: Vec2,
    pub uv_max: Vec2,
}

/// Lays out one line of text starting at `origin` (top-left, logical).
///
/// Glyphs are rasterized at `size * scale` so text stays crisp on high-DPI
/// displays. Pen x and the baseline are snapped to whole device pixels;
/// blank glyphs advance the pen without producing output. A full atlas
/// stops the run early and is reported as an error after the glyphs that
/// did fit have been appended to `out`.
#[allow(clippy::too_many_arguments)]
pub fn shape_line(
    fonts: &FontSystem,
    atlas: &mut GlyphAtlas,
    font_id: FontId,
    text: &str,
    size: f32,
    origin: Vec2,
    scale: f32,
    out: &mut Vec<ShapedGlyph>,
) -> Result<(), AtlasError> {
    let font = fonts.get(font_id).ok_or(AtlasError::UnknownFont(font_id))?;
    let scale = scale.max(0.01);
    let px = size * scale;

    let ascent = fonts.line_metrics(font_id, px).ascent;
    let baseline = (origin.y * scale + ascent + 0.5).floor();
    let mut pen_x = origin.x * scale;
    let mut prev: Option<char> = None;

    for ch in text.chars() {
        if let Some(p) = prev {
            pen_x += font.horizontal_kern(p, ch, px).unwrap_or(0.0);
        }
        prev = Some(ch);

        let glyph = atlas.glyph(fonts, GlyphKey::new(font_id, ch, px))?;
        if !glyph.is_blank() {
            let x0 = (pen_x + 0.5).floor() + glyph.xmin as f32;
            let y0 = baseline - (glyph.ymin as f32 + glyph.height as f32);
            let device = Rect::new(x0, y0, glyph.width as f32, glyph.height as f32);
            out.push(ShapedGlyph {
                logical_box: device.scale(1.0 / scale),
                uv_min: glyph.uv_min,
                uv_max: glyph.uv_max,
            });
        }
        pen_x += glyph.advance;
    }

    Ok(())
}
