use std::collections::HashMap;
use std::fmt;

use crate::coords::Vec2;

use super::{FontId, FontSystem};

/// Pixels left empty between neighbouring glyphs.
const GLYPH_PADDING: u32 = 1;

/// Errors from glyph rasterization or atlas placement.
#[derive(Debug, Clone, PartialEq)]
pub enum AtlasError {
    /// No shelf has room for a `width` x `height` bitmap.
    Full { width: u32, height: u32 },
    UnknownFont(FontId),
}

impl fmt::Display for AtlasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtlasError::Full { width, height } => {
                write!(f, "glyph atlas is full (no room for {width}x{height})")
            }
            AtlasError::UnknownFont(id) => write!(f, "unknown font {id:?}"),
        }
    }
}

impl std::error::Error for AtlasError {}

/// Cache key: font, codepoint and raster size in quarter pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct GlyphKey {
    pub font: FontId,
    pub ch: char,
    pub quarter_px: u32,
}

impl GlyphKey {
    pub fn new(font: FontId, ch: char, px: f32) -> Self {
        Self {
            font,
            ch,
            quarter_px: (px.max(0.0) * 4.0).round() as u32,
        }
    }

    #[inline]
    pub fn px(&self) -> f32 {
        self.quarter_px as f32 / 4.0
    }
}

/// A rasterized glyph: placement metrics in device pixels plus its atlas UVs.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AtlasGlyph {
    pub xmin: i32,
    pub ymin: i32,
    pub width: u32,
    pub height: u32,
    pub advance: f32,
    pub uv_min: Vec2,
    pub uv_max: Vec2,
}

impl AtlasGlyph {
    /// Whitespace and other glyphs without coverage.
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Region of the atlas touched since the last upload, in texels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DirtyRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl DirtyRegion {
    fn union(self, other: DirtyRegion) -> DirtyRegion {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = (self.y + self.height).max(other.y + other.height);
        DirtyRegion { x: x0, y: y0, width: x1 - x0, height: y1 - y0 }
    }
}

/// CPU-side R8 coverage atlas with shelf packing.
///
/// Glyphs are rasterized on first use and kept for the atlas' lifetime. The
/// GPU backend copies [`GlyphAtlas::take_dirty`] regions into its texture;
/// after a device rebuild it calls [`GlyphAtlas::mark_all_dirty`] to push
/// everything again.
pub struct GlyphAtlas {
    size: u32,
    pixels: Vec<u8>,
    cursor_x: u32,
    cursor_y: u32,
    row_height: u32,
    full: bool,
    glyphs: HashMap<GlyphKey, AtlasGlyph>,
    dirty: Option<DirtyRegion>,
}

impl GlyphAtlas {
    pub fn new(size: u32) -> Self {
        let size = size.max(64);
        Self {
            size,
            pixels: vec![0; (size * size) as usize],
            cursor_x: GLYPH_PADDING,
            cursor_y: GLYPH_PADDING,
            row_height: 0,
            full: false,
            glyphs: HashMap::new(),
            dirty: None,
        }
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Row-major coverage, `size * size` bytes.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Returns and clears the region changed since the last call.
    pub fn take_dirty(&mut self) -> Option<DirtyRegion> {
        self.dirty.take()
    }

    pub fn mark_all_dirty(&mut self) {
        self.dirty = Some(DirtyRegion { x: 0, y: 0, width: self.size, height: self.size });
    }

    /// Looks up `key`, rasterizing and packing it on a miss.
    pub fn glyph(&mut self, fonts: &FontSystem, key: GlyphKey) -> Result<AtlasGlyph, AtlasError> {
        if let Some(g) = self.glyphs.get(&key) {
            return Ok(*g);
        }

        let font = fonts.get(key.font).ok_or(AtlasError::UnknownFont(key.font))?;
        let (metrics, bitmap) = font.rasterize(key.ch, key.px());
        let (w, h) = (metrics.width as u32, metrics.height as u32);

        let (uv_min, uv_max) = if w == 0 || h == 0 {
            (Vec2::zero(), Vec2::zero())
        } else {
            self.place(&bitmap, w, h)?
        };

        let glyph = AtlasGlyph {
            xmin: metrics.xmin,
            ymin: metrics.ymin,
            width: w,
            height: h,
            advance: metrics.advance_width,
            uv_min,
            uv_max,
        };
        self.glyphs.insert(key, glyph);
        Ok(glyph)
    }

    /// Copies a `w` x `h` bitmap into the next free shelf slot.
    pub fn place(&mut self, bitmap: &[u8], w: u32, h: u32) -> Result<(Vec2, Vec2), AtlasError> {
        if self.full {
            return Err(AtlasError::Full { width: w, height: h });
        }

        // Advance to a new shelf row when the glyph doesn't fit horizontally.
        if self.cursor_x + w + GLYPH_PADDING > self.size {
            self.cursor_y += self.row_height + GLYPH_PADDING;
            self.cursor_x = GLYPH_PADDING;
            self.row_height = 0;
        }

        if self.cursor_y + h + GLYPH_PADDING > self.size || w + 2 * GLYPH_PADDING > self.size {
            log::warn!("glyph atlas is full ({0}x{0}); some glyphs will not be rendered", self.size);
            self.full = true;
            return Err(AtlasError::Full { width: w, height: h });
        }

        let (gx, gy) = (self.cursor_x, self.cursor_y);
        for row in 0..h {
            let src = (row * w) as usize;
            let dst = ((gy + row) * self.size + gx) as usize;
            self.pixels[dst..dst + w as usize].copy_from_slice(&bitmap[src..src + w as usize]);
        }

        self.cursor_x += w + GLYPH_PADDING;
        self.row_height = self.row_height.max(h);

        let region = DirtyRegion { x: gx, y: gy, width: w, height: h };
        self.dirty = Some(match self.dirty {
            Some(d) => d.union(region),
            None => region,
        });

        let s = self.size as f32;
        Ok((
            Vec2::new(gx as f32 / s, gy as f32 / s),
            Vec2::new((gx + w) as f32 / s, (gy + h) as f32 / s),
        ))
    }
}
