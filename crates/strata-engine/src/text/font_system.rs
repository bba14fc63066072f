use std::fmt;

use crate::coords::Vec2;

/// Error returned by [`FontSystem::load_font`].
#[derive(Debug, Clone)]
pub struct FontLoadError(pub String);

impl fmt::Display for FontLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "font load error: {}", self.0)
    }
}

impl std::error::Error for FontLoadError {}

/// Opaque handle to a font loaded into a [`FontSystem`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct FontId(pub(crate) usize);

/// Vertical metrics of a font at a given size, in the caller's units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LineMetrics {
    /// Distance from the top of the line to the baseline (positive).
    pub ascent: f32,
    /// Distance from the baseline to the bottom of the line (positive).
    pub descent: f32,
    pub line_height: f32,
}

/// Owns the loaded fonts.
///
/// Shaping is single-codepoint: each `char` maps to one glyph, advanced by
/// its horizontal advance plus pair kerning. No ligatures, no bidi.
pub struct FontSystem {
    fonts: Vec<fontdue::Font>,
}

impl FontSystem {
    pub fn new() -> Self {
        Self { fonts: Vec::new() }
    }

    /// Parses and stores a TrueType or OpenType font from raw bytes.
    pub fn load_font(&mut self, bytes: &[u8]) -> Result<FontId, FontLoadError> {
        if bytes.is_empty() {
            return Err(FontLoadError("empty font data".to_string()));
        }
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError(e.to_string()))?;
        let id = FontId(self.fonts.len());
        self.fonts.push(font);
        log::info!("loaded font {:?} ({} glyphs)", id, self.fonts[id.0].glyph_count());
        Ok(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub(crate) fn get(&self, id: FontId) -> Option<&fontdue::Font> {
        self.fonts.get(id.0)
    }

    /// Line metrics at `size`; falls back to a 0.8/0.2 split when the font
    /// has no horizontal metrics table.
    pub fn line_metrics(&self, id: FontId, size: f32) -> LineMetrics {
        let fallback = LineMetrics {
            ascent: size * 0.8,
            descent: size * 0.2,
            line_height: size * 1.2,
        };
        let Some(font) = self.get(id) else {
            return fallback;
        };
        match font.horizontal_line_metrics(size) {
            Some(m) => LineMetrics {
                ascent: m.ascent,
                descent: -m.descent,
                line_height: m.new_line_size,
            },
            None => fallback,
        }
    }

    /// Horizontal advance from `prev` to the pen position after `ch`.
    pub(crate) fn advance(&self, font: &fontdue::Font, prev: Option<char>, ch: char, px: f32) -> f32 {
        let kern = prev
            .and_then(|p| font.horizontal_kern(p, ch, px))
            .unwrap_or(0.0);
        kern + font.metrics(ch, px).advance_width
    }

    /// Size of a single line of text in logical pixels.
    ///
    /// Measured at `size * scale` and divided back, so the width matches the
    /// device-space pen positions the shaper produces.
    #[must_use]
    pub fn measure_text(&self, text: &str, id: FontId, size: f32, scale: f32) -> Vec2 {
        let scale = scale.max(0.01);
        let line = self.line_metrics(id, size).line_height;
        let Some(font) = self.get(id) else {
            return Vec2::new(0.0, line);
        };

        let px = size * scale;
        let mut prev = None;
        let mut width = 0.0;
        for ch in text.chars() {
            width += self.advance(font, prev, ch, px);
            prev = Some(ch);
        }
        Vec2::new(width / scale, line)
    }
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bytes_are_rejected() {
        let mut fonts = FontSystem::new();
        assert!(fonts.load_font(&[]).is_err());
        assert!(fonts.is_empty());
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let mut fonts = FontSystem::new();
        let err = fonts.load_font(b"definitely not a font").unwrap_err();
        assert!(err.to_string().starts_with("font load error"));
    }

    #[test]
    fn unknown_font_measures_zero_width() {
        let fonts = FontSystem::new();
        let size = fonts.measure_text("hello", FontId(0), 10.0, 1.0);
        assert_eq!(size.x, 0.0);
        assert_eq!(size.y, 12.0);
    }
}
