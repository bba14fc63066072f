use std::fmt;

use crate::coords::{DeviceTransform, Vec2};

use super::buffer::{GrowError, GrowableBuffer};
use super::command::{BackgroundCmd, CommandKind, GlyphCmd, RenderCommand};
use super::vertex::{TextVertex, UiVertex, Vertex, QUAD_INDICES, VERTICES_PER_QUAD};

/// Vertex buffer that failed to grow.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MeshBuffer {
    Background,
    Text,
    Merged,
}

/// Mesh building failure: which buffer, at which command.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshError {
    pub buffer: MeshBuffer,
    /// Index into the command list (or into the primitive list for `Merged`).
    pub index: usize,
    pub source: GrowError,
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} vertex buffer append failed at {}: {}", self.buffer, self.index, self.source)
    }
}

impl std::error::Error for MeshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// CPU staging for one frame: the two emission streams and the merged stream.
///
/// Each buffer grows on its own; none ever shrinks.
#[derive(Debug, Default)]
pub struct StagingArena {
    pub background: GrowableBuffer<UiVertex>,
    pub text: GrowableBuffer<TextVertex>,
    pub merged: GrowableBuffer<Vertex>,
}

impl StagingArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arena whose merged stream starts with room for `vertices`.
    pub fn with_capacity(vertices: usize) -> Self {
        let mut arena = Self::default();
        if let Err(e) = arena.merged.reserve_total(vertices) {
            log::debug!("staging arena pre-allocation of {vertices} vertices failed: {e}");
        }
        arena
    }

    pub fn clear(&mut self) {
        self.background.clear();
        self.text.clear();
        self.merged.clear();
    }

    /// The stream the GPU consumes.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        self.merged.as_slice()
    }
}

/// Per-build counters.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct MeshStats {
    pub background_quads: usize,
    pub glyph_quads: usize,
    /// Commands fully clipped away.
    pub culled: usize,
    pub vertex_count: usize,
}

#[derive(Debug, Copy, Clone)]
enum Source {
    Background(usize),
    Text(usize),
}

#[derive(Debug, Copy, Clone)]
struct Primitive {
    source: Source,
    layer: i32,
}

/// Turns sorted render commands into vertices.
///
/// Backgrounds are clipped in device space; glyphs are clipped in logical
/// space with proportional UV trimming, then snapped to device pixels with
/// a second UV correction. A final pass interleaves both streams in command
/// order and assigns each quad a depth from its layer.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    primitives: Vec<Primitive>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(
        &mut self,
        commands: &[RenderCommand],
        transform: &DeviceTransform,
        arena: &mut StagingArena,
    ) -> Result<MeshStats, MeshError> {
        arena.clear();
        self.primitives.clear();

        let mut stats = MeshStats::default();
        for (index, cmd) in commands.iter().enumerate() {
            let layer = cmd.key.layer;
            match &cmd.kind {
                CommandKind::Background(bg) => {
                    let first = arena.background.len();
                    let emitted = emit_background(bg, layer, transform, &mut arena.background)
                        .map_err(|source| MeshError { buffer: MeshBuffer::Background, index, source })?;
                    if emitted {
                        stats.background_quads += 1;
                        self.primitives.push(Primitive { source: Source::Background(first), layer });
                    } else {
                        stats.culled += 1;
                    }
                }
                CommandKind::Glyph(glyph) => {
                    let first = arena.text.len();
                    let emitted = emit_glyph(glyph, layer, transform, &mut arena.text)
                        .map_err(|source| MeshError { buffer: MeshBuffer::Text, index, source })?;
                    if emitted {
                        stats.glyph_quads += 1;
                        self.primitives.push(Primitive { source: Source::Text(first), layer });
                    } else {
                        stats.culled += 1;
                    }
                }
            }
        }

        self.merge_with_depth(commands, arena)?;
        stats.vertex_count = arena.merged.len();
        Ok(stats)
    }

    /// Interleaves both streams in command order, replacing z with depth.
    ///
    /// Depth falls as layers rise, normalized over the frame's observed
    /// layer span, minus a per-primitive step so that equal layers still
    /// resolve in emission order under a less-or-equal depth test.
    fn merge_with_depth(&self, commands: &[RenderCommand], arena: &mut StagingArena) -> Result<(), MeshError> {
        if self.primitives.is_empty() {
            return Ok(());
        }
        let (min_layer, max_layer) = commands
            .iter()
            .map(|c| c.key.layer)
            .fold((i32::MAX, i32::MIN), |(lo, hi), l| (lo.min(l), hi.max(l)));

        let span = (max_layer as f64 - min_layer as f64 + 1.0) as f32;
        let step = (1.0 / (self.primitives.len() as f32 + 1.0)) / span;

        let total = self.primitives.len() * VERTICES_PER_QUAD;
        arena
            .merged
            .reserve_total(total)
            .map_err(|source| MeshError { buffer: MeshBuffer::Merged, index: 0, source })?;

        for (i, prim) in self.primitives.iter().enumerate() {
            let rel = (prim.layer as f64 - min_layer as f64) as f32;
            let depth = (1.0 - (rel + 0.5) / span - step * i as f32).clamp(0.0, 1.0);

            for k in 0..VERTICES_PER_QUAD {
                let v = match prim.source {
                    Source::Background(first) => {
                        let s = arena.background.as_slice()[first + k];
                        Vertex {
                            position: [s.position[0], s.position[1], depth],
                            uv: [0.0, 0.0],
                            use_tex: 0.0,
                            color: s.color,
                        }
                    }
                    Source::Text(first) => {
                        let s = arena.text.as_slice()[first + k];
                        Vertex {
                            position: [s.position[0], s.position[1], depth],
                            uv: s.uv,
                            use_tex: 1.0,
                            color: s.color,
                        }
                    }
                };
                arena
                    .merged
                    .push(v)
                    .map_err(|source| MeshError { buffer: MeshBuffer::Merged, index: i, source })?;
            }
        }
        Ok(())
    }
}

fn quad_corners(min: Vec2, max: Vec2) -> [Vec2; 4] {
    [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)]
}

/// Returns `Ok(false)` when the quad is clipped away.
fn emit_background(
    bg: &BackgroundCmd,
    layer: i32,
    transform: &DeviceTransform,
    out: &mut GrowableBuffer<UiVertex>,
) -> Result<bool, GrowError> {
    let rect = match bg.device_clip {
        Some(clip) => match bg.device_box.clip_snapped(clip) {
            Some(r) => r,
            None => return Ok(false),
        },
        None => bg.device_box,
    };
    if rect.is_empty() {
        return Ok(false);
    }

    let corners = quad_corners(rect.min(), rect.max());
    let color = bg.color.to_array();
    out.reserve_total(out.len() + VERTICES_PER_QUAD)?;
    for i in QUAD_INDICES {
        out.push(UiVertex {
            position: transform.project(corners[i], layer as f32),
            color,
        })?;
    }
    Ok(true)
}

/// Returns `Ok(false)` when the glyph is clipped away or snaps to nothing.
fn emit_glyph(
    glyph: &GlyphCmd,
    layer: i32,
    transform: &DeviceTransform,
    out: &mut GrowableBuffer<TextVertex>,
) -> Result<bool, GrowError> {
    let mut bounds = glyph.logical_box;
    let (mut u0, mut v0) = (glyph.uv_min.x, glyph.uv_min.y);
    let (mut u1, mut v1) = (glyph.uv_max.x, glyph.uv_max.y);
    if bounds.is_empty() {
        return Ok(false);
    }

    // Stage 1: logical clip, UVs trimmed in proportion to the box.
    if let Some(clip) = glyph.logical_clip {
        let Some(clipped) = bounds.intersect(clip) else {
            return Ok(false);
        };
        let du = (u1 - u0) / bounds.size.x;
        let dv = (v1 - v0) / bounds.size.y;
        let (bmin, bmax) = (bounds.min(), bounds.max());
        let (cmin, cmax) = (clipped.min(), clipped.max());
        u0 += du * (cmin.x - bmin.x);
        u1 -= du * (bmax.x - cmax.x);
        v0 += dv * (cmin.y - bmin.y);
        v1 -= dv * (bmax.y - cmax.y);
        bounds = clipped;
    }

    // Stage 2: device space, each corner snapped to the nearest pixel.
    let device = transform.to_device(bounds);
    let (dmin, dmax) = (device.min(), device.max());
    let (smin, smax) = (dmin.round(), dmax.round());
    if smax.x <= smin.x || smax.y <= smin.y {
        return Ok(false);
    }

    let du = (u1 - u0) / (dmax.x - dmin.x);
    let dv = (v1 - v0) / (dmax.y - dmin.y);
    u0 += du * (smin.x - dmin.x);
    u1 += du * (smax.x - dmax.x);
    v0 += dv * (smin.y - dmin.y);
    v1 += dv * (smax.y - dmax.y);

    let corners = quad_corners(smin, smax);
    let uvs = [[u0, v0], [u1, v0], [u1, v1], [u0, v1]];
    let color = glyph.color.to_array();
    out.reserve_total(out.len() + VERTICES_PER_QUAD)?;
    for i in QUAD_INDICES {
        out.push(TextVertex {
            position: transform.project(corners[i], layer as f32),
            uv: uvs[i],
            color,
        })?;
    }
    Ok(true)
}

/// Device-space bounds of a vertex run, as `(min, max)`.
pub fn vertex_bounds<'a>(positions: impl IntoIterator<Item = &'a [f32; 3]>) -> Option<(Vec2, Vec2)> {
    positions.into_iter().fold(None, |acc, p| {
        let v = Vec2::new(p[0], p[1]);
        Some(match acc {
            None => (v, v),
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Rect, Viewport};
    use crate::paint::Color;
    use crate::render::command::RenderSortKey;
    use crate::scene::{RenderPhase, WidgetId};

    const EPS: f32 = 1e-3;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    fn transform(scale: f32) -> DeviceTransform {
        DeviceTransform::new(scale, Viewport::new(400.0, 400.0))
    }

    fn key(layer: i32, ordinal: usize) -> RenderSortKey {
        RenderSortKey { layer, widget_order: 0, phase: RenderPhase::Background, ordinal }
    }

    fn background(layer: i32, logical: Rect, clip: Option<Rect>, t: &DeviceTransform) -> RenderCommand {
        RenderCommand {
            key: key(layer, 0),
            widget: WidgetId(0),
            kind: CommandKind::Background(BackgroundCmd {
                device_box: t.to_device(logical),
                device_clip: clip.map(|c| t.to_device(c)),
                color: Color::WHITE,
            }),
        }
    }

    fn glyph(layer: i32, logical: Rect, clip: Option<Rect>) -> RenderCommand {
        RenderCommand {
            key: key(layer, 1),
            widget: WidgetId(0),
            kind: CommandKind::Glyph(GlyphCmd {
                logical_box: logical,
                logical_clip: clip,
                uv_min: Vec2::zero(),
                uv_max: Vec2::new(1.0, 1.0),
                color: Color::BLACK,
            }),
        }
    }

    fn build(cmds: &[RenderCommand], t: &DeviceTransform) -> (StagingArena, MeshStats) {
        let mut arena = StagingArena::new();
        let stats = MeshBuilder::new().build(cmds, t, &mut arena).unwrap();
        (arena, stats)
    }

    fn uv_span(arena: &StagingArena) -> (f32, f32, f32, f32) {
        let t = arena.text.as_slice();
        let us = t.iter().map(|v| v.uv[0]);
        let vs = t.iter().map(|v| v.uv[1]);
        (
            us.clone().fold(f32::MAX, f32::min),
            us.fold(f32::MIN, f32::max),
            vs.clone().fold(f32::MAX, f32::min),
            vs.fold(f32::MIN, f32::max),
        )
    }

    // ── backgrounds ───────────────────────────────────────────────────────

    #[test]
    fn background_emits_two_triangles_with_layer_as_z() {
        let t = transform(1.0);
        let (arena, stats) = build(&[background(1, r(0.0, 0.0, 10.0, 10.0), None, &t)], &t);
        assert_eq!(stats.background_quads, 1);
        let bg = arena.background.as_slice();
        assert_eq!(bg.len(), 6);
        assert!(bg.iter().all(|v| v.position[2] == 1.0));
        assert_eq!(bg[0].position, bg[3].position);
        assert_eq!(bg[2].position, bg[4].position);
        assert_eq!(bg[0].color, Color::WHITE.to_array());
    }

    #[test]
    fn empty_clip_intersection_appends_nothing() {
        let t = transform(1.0);
        let cmd = background(0, r(0.0, 0.0, 10.0, 10.0), Some(r(50.0, 50.0, 10.0, 10.0)), &t);
        let (arena, stats) = build(&[cmd], &t);
        assert!(arena.background.is_empty());
        assert!(arena.vertices().is_empty());
        assert_eq!(stats.culled, 1);
    }

    #[test]
    fn partial_clip_stays_inside_box_and_clip() {
        let t = transform(1.0);
        let (b, c) = (r(0.0, 0.0, 20.0, 20.0), r(5.5, -3.0, 40.0, 10.2));
        let (arena, _) = build(&[background(0, b, Some(c), &t)], &t);
        let (min, max) = vertex_bounds(arena.background.as_slice().iter().map(|v| &v.position)).unwrap();
        let got = Rect::from_min_max(min, max);
        assert!(b.contains_rect(got));
        assert!(c.contains_rect(got));
        assert_eq!(got, r(6.0, 0.0, 14.0, 7.0));
    }

    // ── glyphs ────────────────────────────────────────────────────────────

    #[test]
    fn glyph_clipped_to_half_width_has_half_uv_span() {
        let t = transform(1.0);
        let (arena, _) = build(&[glyph(0, r(0.0, 0.0, 10.0, 10.0), Some(r(0.0, 0.0, 5.0, 10.0)))], &t);
        let (u0, u1, v0, v1) = uv_span(&arena);
        assert!((u1 - u0 - 0.5).abs() < 1e-6);
        assert!((v1 - v0 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn glyph_fully_clipped_is_skipped() {
        let t = transform(1.0);
        let (arena, stats) = build(&[glyph(0, r(0.0, 0.0, 10.0, 10.0), Some(r(20.0, 0.0, 5.0, 5.0)))], &t);
        assert!(arena.text.is_empty());
        assert_eq!(stats.culled, 1);
    }

    #[test]
    fn glyph_snapping_corrects_uvs_by_sub_pixel_delta() {
        // At 1.5x the box [1, 3] maps to [1.5, 4.5] and snaps to [2, 5].
        let t = transform(1.5);
        let (arena, _) = build(&[glyph(0, r(1.0, 1.0, 2.0, 2.0), None)], &t);
        let bounds = vertex_bounds(arena.text.as_slice().iter().map(|v| &v.position)).unwrap();
        assert_eq!(bounds, (Vec2::new(2.0, 2.0), Vec2::new(5.0, 5.0)));
        let (u0, u1, _, _) = uv_span(&arena);
        assert!((u0 - 1.0 / 6.0).abs() < 1e-6);
        assert!((u1 - 7.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn glyph_and_background_agree_at_2x_with_fractional_clip() {
        let t = transform(2.0);
        let b = r(1.0, 2.0, 10.0, 6.0);
        let clip = r(3.5, 3.5, 5.0, 3.0);
        let (arena, _) = build(&[background(0, b, Some(clip), &t), glyph(0, b, Some(clip))], &t);

        let bg = vertex_bounds(arena.background.as_slice().iter().map(|v| &v.position)).unwrap();
        let tx = vertex_bounds(arena.text.as_slice().iter().map(|v| &v.position)).unwrap();
        assert_eq!(bg, tx);
        assert_eq!(bg, (Vec2::new(7.0, 7.0), Vec2::new(17.0, 13.0)));

        let (u0, u1, v0, v1) = uv_span(&arena);
        for (got, want) in [(u0, 0.25), (u1, 0.75), (v0, 0.25), (v1, 0.75)] {
            assert!((got - want).abs() < 1e-5, "{got} != {want}");
        }
    }

    #[test]
    fn background_and_glyph_share_bounds_under_clip() {
        for scale in [1.0, 1.5] {
            let t = transform(scale);
            let b = r(0.0, 0.0, 120.0, 70.0);
            let clip = r(10.0, 12.0, 80.0, 40.0);
            let (arena, _) = build(&[background(0, b, Some(clip), &t), glyph(0, b, Some(clip))], &t);

            let (bmin, bmax) = vertex_bounds(arena.background.as_slice().iter().map(|v| &v.position)).unwrap();
            let (gmin, gmax) = vertex_bounds(arena.text.as_slice().iter().map(|v| &v.position)).unwrap();
            for (a, g) in [(bmin.x, gmin.x), (bmin.y, gmin.y), (bmax.x, gmax.x), (bmax.y, gmax.y)] {
                assert!((a - g).abs() < EPS, "scale {scale}: {a} vs {g}");
            }
        }
    }

    // ── depth pass ────────────────────────────────────────────────────────

    #[test]
    fn merged_stream_follows_command_order_and_flags_textures() {
        let t = transform(1.0);
        let cmds = [
            background(0, r(0.0, 0.0, 10.0, 10.0), None, &t),
            glyph(1, r(0.0, 0.0, 5.0, 5.0), None),
            background(2, r(0.0, 0.0, 10.0, 10.0), None, &t),
        ];
        let (arena, stats) = build(&cmds, &t);
        let merged = arena.vertices();
        assert_eq!(stats.vertex_count, 18);
        assert_eq!(merged.len(), 18);
        let tex: Vec<_> = merged.chunks(6).map(|q| q[0].use_tex).collect();
        assert_eq!(tex, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn depth_decreases_with_layer_and_emission_index() {
        let t = transform(1.0);
        let cmds = [
            background(0, r(0.0, 0.0, 10.0, 10.0), None, &t),
            background(0, r(0.0, 0.0, 10.0, 10.0), None, &t),
            background(3, r(0.0, 0.0, 10.0, 10.0), None, &t),
        ];
        let (arena, _) = build(&cmds, &t);
        let depths: Vec<_> = arena.vertices().chunks(6).map(|q| q[0].position[2]).collect();
        assert!(depths[0] > depths[1]);
        assert!(depths[1] > depths[2]);
        assert!(depths.iter().all(|d| (0.0..=1.0).contains(d)));

        // span 4, 3 primitives: step = (1/4)/4.
        let step = 0.25 / 4.0;
        assert!((depths[0] - (1.0 - 0.5 / 4.0)).abs() < 1e-6);
        assert!((depths[2] - (1.0 - 3.5 / 4.0 - 2.0 * step)).abs() < 1e-6);
    }

    #[test]
    fn rebuild_reuses_arena_without_stale_vertices() {
        let t = transform(1.0);
        let mut arena = StagingArena::new();
        let mut mb = MeshBuilder::new();
        let two = [
            background(0, r(0.0, 0.0, 10.0, 10.0), None, &t),
            background(0, r(0.0, 0.0, 10.0, 10.0), None, &t),
        ];
        mb.build(&two, &t, &mut arena).unwrap();
        let cap = arena.merged.capacity();
        let stats = mb.build(&two[..1], &t, &mut arena).unwrap();
        assert_eq!(stats.vertex_count, 6);
        assert_eq!(arena.merged.capacity(), cap);
    }

    #[test]
    fn oversized_preallocation_leaves_a_usable_arena() {
        let t = transform(1.0);
        let mut arena = StagingArena::with_capacity(usize::MAX);
        assert_eq!(arena.merged.capacity(), 0);

        let one = [background(0, r(0.0, 0.0, 10.0, 10.0), None, &t)];
        let stats = MeshBuilder::new().build(&one, &t, &mut arena).unwrap();
        assert_eq!(stats.vertex_count, 6);
    }
}
