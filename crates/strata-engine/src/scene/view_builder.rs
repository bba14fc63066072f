use crate::coords::{DeviceTransform, Rect, Vec2};
use crate::paint::Color;
use crate::text::{shape_line, FontSystem, GlyphAtlas, ShapedGlyph};

use super::layer::{self, SubLayer};
use super::{
    ClipRegion, ClipStack, DisplayList, GlyphQuad, RenderPhase, TextRun, ViewModel, Widget,
    WidgetId, WidgetKind, ZGroup, ZIndex,
};

/// Smallest slider track, in logical pixels.
const MIN_TRACK_HEIGHT: f32 = 6.0;
/// Smallest slider knob and scrollbar thumb, in logical pixels.
const MIN_HANDLE: f32 = 12.0;

/// Expands display items into flat-color view models and glyph quads.
///
/// Clip transitions are replayed from each item's push/pop delta, so the
/// builder never re-derives full stacks. Output vectors are reused across
/// frames.
#[derive(Debug, Default)]
pub struct ViewBuilder {
    clips: ClipStack,
    shaped: Vec<ShapedGlyph>,
    view_models: Vec<ViewModel>,
    glyphs: Vec<GlyphQuad>,
}

/// Emission state for one widget.
struct Emitter<'a> {
    widget: WidgetId,
    group: ZGroup,
    z: ZIndex,
    widget_order: usize,
    ordinal: usize,
    clip: Option<ClipRegion>,
    transform: &'a DeviceTransform,
    view_models: &'a mut Vec<ViewModel>,
}

impl Emitter<'_> {
    fn quad(&mut self, rect: Rect, sub: SubLayer, phase: RenderPhase, color: Color) {
        self.quad_clipped(rect, sub, phase, color, self.clip);
    }

    fn quad_clipped(
        &mut self,
        rect: Rect,
        sub: SubLayer,
        phase: RenderPhase,
        color: Color,
        clip: Option<ClipRegion>,
    ) {
        if rect.is_empty() || color.a <= 0.0 {
            return;
        }
        let ordinal = self.next_ordinal();
        self.view_models.push(ViewModel {
            widget: self.widget,
            logical_box: rect,
            clip,
            layer: layer::pack(self.group, self.z, sub),
            phase,
            widget_order: self.widget_order,
            ordinal,
            color,
        });
    }

    fn next_ordinal(&mut self) -> usize {
        let o = self.ordinal;
        self.ordinal += 1;
        o
    }

    fn resolve_clip(&self, logical: Rect) -> ClipRegion {
        ClipRegion {
            logical,
            device: Some(self.transform.to_device(logical)),
        }
    }
}

impl ViewBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn view_models(&self) -> &[ViewModel] {
        &self.view_models
    }

    #[inline]
    pub fn glyphs(&self) -> &[GlyphQuad] {
        &self.glyphs
    }

    /// Rebuilds view models and glyph quads for `list`.
    ///
    /// Items whose widget index is out of range are skipped.
    pub fn build(
        &mut self,
        list: &DisplayList,
        widgets: &[Widget],
        fonts: &FontSystem,
        atlas: &mut GlyphAtlas,
        transform: &DeviceTransform,
    ) {
        self.clips.clear();
        self.view_models.clear();
        self.glyphs.clear();

        for (widget_order, item) in list.iter().enumerate() {
            for _ in 0..item.clip_pop_count {
                self.clips.pop();
            }
            for rect in &item.push_rects {
                self.clips.push(*rect);
            }

            let Some(widget) = widgets.get(item.widget.index()) else {
                log::debug!("view builder: display item refers to missing widget {:?}", item.widget);
                continue;
            };

            let mut emit = Emitter {
                widget: item.widget,
                group: widget.z_group,
                z: widget.z_index,
                widget_order,
                ordinal: 0,
                clip: None,
                transform,
                view_models: &mut self.view_models,
            };
            emit.clip = self.clips.active().map(|logical| emit.resolve_clip(logical));

            let content = emit_frame(&mut emit, widget);
            let text_origin = emit_kind(&mut emit, widget, content);

            if let (Some(run), Some(origin)) = (widget.text(), text_origin) {
                // Glyphs continue the widget's ordinal sequence.
                let (ordinal, clip) = (emit.ordinal, emit.clip);
                self.emit_text(
                    fonts,
                    atlas,
                    transform,
                    item.widget,
                    layer::pack(widget.z_group, widget.z_index, SubLayer::Text),
                    widget_order,
                    ordinal,
                    clip,
                    run,
                    origin,
                );
            }
        }

        log::trace!(
            "view builder: {} view models, {} glyph quads",
            self.view_models.len(),
            self.glyphs.len()
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_text(
        &mut self,
        fonts: &FontSystem,
        atlas: &mut GlyphAtlas,
        transform: &DeviceTransform,
        widget: WidgetId,
        layer: i32,
        widget_order: usize,
        first_ordinal: usize,
        clip: Option<ClipRegion>,
        run: &TextRun,
        origin: Vec2,
    ) {
        self.shaped.clear();
        if let Err(e) = shape_line(
            fonts,
            atlas,
            run.font,
            &run.text,
            run.size,
            origin,
            transform.scale,
            &mut self.shaped,
        ) {
            log::warn!("text run {:?} shaped partially: {e}", run.text);
        }

        for (i, g) in self.shaped.iter().enumerate() {
            self.glyphs.push(GlyphQuad {
                widget,
                logical_box: g.logical_box,
                uv_min: g.uv_min,
                uv_max: g.uv_max,
                clip,
                layer,
                phase: RenderPhase::Content,
                widget_order,
                ordinal: first_ordinal + i,
                color: run.color,
            });
        }
    }
}

/// Emits border and background; returns the content rectangle.
fn emit_frame(emit: &mut Emitter<'_>, widget: &Widget) -> Rect {
    let rect = widget.rect;
    let Some(border) = widget.border.filter(|b| b.thickness > 0.0) else {
        emit.quad(rect, SubLayer::Fill, RenderPhase::Background, widget.background);
        return rect;
    };

    let t = border.thickness;
    let inner = rect.inset(t);
    emit.quad(inner, SubLayer::Fill, RenderPhase::Background, widget.background);

    // Borders hug the clip edge, so they get the clip grown by their thickness.
    let border_clip = emit.clip.map(|c| emit.resolve_clip(c.logical.expand(t)));
    let (x, y, w, h) = (rect.origin.x, rect.origin.y, rect.size.x, rect.size.y);
    let edges = [
        Rect::new(x, y, w, t),
        Rect::new(x, y + h - t, w, t),
        Rect::new(x, y + t, t, h - t * 2.0),
        Rect::new(x + w - t, y + t, t, h - t * 2.0),
    ];
    for edge in edges {
        emit.quad_clipped(edge, SubLayer::Border, RenderPhase::Background, border.color, border_clip);
    }
    inner
}

/// Emits kind-specific parts; returns where text starts, if the kind has text.
fn emit_kind(emit: &mut Emitter<'_>, widget: &Widget, content: Rect) -> Option<Vec2> {
    let pad = Vec2::new(widget.padding, widget.padding);
    let (x, y, w, h) = (content.origin.x, content.origin.y, content.size.x, content.size.y);

    match &widget.kind {
        WidgetKind::Panel => None,
        WidgetKind::Label(_) | WidgetKind::Button(_) => Some(content.origin + pad),
        WidgetKind::Checkbox { checked, box_color, mark_color, .. } => {
            let side = (h - widget.padding * 2.0).max(0.0).min(h);
            let check = Rect::new(x + widget.padding, y + (h - side) * 0.5, side, side);
            emit.quad(check, SubLayer::Fill, RenderPhase::Content, *box_color);
            if *checked {
                emit.quad(check.inset(side * 0.25), SubLayer::SliderFill, RenderPhase::Content, *mark_color);
            }
            Some(Vec2::new(check.max().x + widget.padding, y + widget.padding))
        }
        WidgetKind::Slider { min, max, value, track, fill, knob } => {
            let track_h = (h * 0.35).max(MIN_TRACK_HEIGHT).min(h);
            let track_y = y + (h - track_h) * 0.5;
            let span = max - min;
            let t = if span > 0.0 { ((value - min) / span).clamp(0.0, 1.0) } else { 0.0 };

            emit.quad(Rect::new(x, track_y, w, track_h), SubLayer::SliderTrack, RenderPhase::Content, *track);
            emit.quad(Rect::new(x, track_y, w * t, track_h), SubLayer::SliderFill, RenderPhase::Content, *fill);

            let side = (track_h * 2.0).max(MIN_HANDLE).min(h);
            let knob_x = (x + w * t - side * 0.5).clamp(x, (x + w - side).max(x));
            let knob_rect = Rect::new(knob_x, y + (h - side) * 0.5, side, side);
            emit.quad(knob_rect, SubLayer::SliderKnob, RenderPhase::Content, *knob);
            None
        }
        WidgetKind::Scrollbar { content: total, visible, offset, width, track, thumb } => {
            let bar_w = width.min(w);
            let track_rect = Rect::new(x + w - bar_w, y, bar_w, h);
            emit.quad(track_rect, SubLayer::ScrollbarTrack, RenderPhase::Overlay, *track);

            let ratio = if *total > 0.0 { (visible / total).clamp(0.0, 1.0) } else { 1.0 };
            let thumb_h = (h * ratio).max(MIN_HANDLE).min(h);
            let max_offset = (total - visible).max(0.0);
            let t = if max_offset > 0.0 { (offset / max_offset).clamp(0.0, 1.0) } else { 0.0 };
            let thumb_rect = Rect::new(track_rect.origin.x, y + (h - thumb_h) * t, bar_w, thumb_h);
            emit.quad(thumb_rect, SubLayer::ScrollbarThumb, RenderPhase::Overlay, *thumb);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Viewport;
    use crate::scene::{Arrangement, Compositor, LayoutTree};

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    fn build(tree: &LayoutTree, widgets: &[Widget], scale: f32) -> ViewBuilder {
        let list = Compositor::new().build(tree, widgets);
        let mut vb = ViewBuilder::new();
        let mut atlas = GlyphAtlas::new(64);
        let t = DeviceTransform::new(scale, Viewport::new(400.0, 400.0));
        vb.build(&list, widgets, &FontSystem::new(), &mut atlas, &t);
        vb
    }

    fn single(widget: Widget) -> ViewBuilder {
        let mut t = LayoutTree::new();
        t.set_root(widget.rect, Arrangement::None);
        build(&t, &[widget], 1.0)
    }

    // ── frame ─────────────────────────────────────────────────────────────

    #[test]
    fn panel_emits_single_fill() {
        let vb = single(Widget::panel(r(0.0, 0.0, 50.0, 20.0), Color::WHITE).with_z(0, 2));
        let vms = vb.view_models();
        assert_eq!(vms.len(), 1);
        assert_eq!(vms[0].layer, 2 * layer::LAYER_STRIDE + SubLayer::Fill.offset());
        assert_eq!(vms[0].phase, RenderPhase::Background);
        assert!(vms[0].clip.is_none());
    }

    #[test]
    fn transparent_background_emits_nothing() {
        let vb = single(Widget::new(r(0.0, 0.0, 50.0, 20.0), WidgetKind::Panel));
        assert!(vb.view_models().is_empty());
    }

    #[test]
    fn border_emits_four_edges_and_inset_fill() {
        let vb = single(
            Widget::panel(r(0.0, 0.0, 50.0, 20.0), Color::WHITE).with_border(2.0, Color::BLACK),
        );
        let vms = vb.view_models();
        assert_eq!(vms.len(), 5);
        assert_eq!(vms[0].logical_box, r(2.0, 2.0, 46.0, 16.0));
        let border_layer = SubLayer::Border.offset();
        assert!(vms[1..].iter().all(|v| v.layer == border_layer));
        assert_eq!(vms[2].logical_box, r(0.0, 18.0, 50.0, 2.0));
        // Ordinals are unique and follow emission order.
        let ordinals: Vec<_> = vms.iter().map(|v| v.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn border_clip_is_grown_by_thickness() {
        let mut t = LayoutTree::new();
        let root = t.set_root(r(0.0, 0.0, 100.0, 100.0), Arrangement::Column);
        t.set_clips(root, true);
        t.add_child(root, r(10.0, 10.0, 20.0, 20.0), Arrangement::None);
        let widgets =
            vec![Widget::panel(r(10.0, 10.0, 20.0, 20.0), Color::WHITE).with_border(1.0, Color::BLACK)];

        let vb = build(&t, &widgets, 2.0);
        let vms = vb.view_models();
        let fill_clip = vms[0].clip.unwrap();
        assert_eq!(fill_clip.logical, r(0.0, 0.0, 100.0, 100.0));
        assert_eq!(fill_clip.device, Some(r(0.0, 0.0, 200.0, 200.0)));
        let edge_clip = vms[1].clip.unwrap();
        assert_eq!(edge_clip.logical, r(-1.0, -1.0, 102.0, 102.0));
    }

    // ── kinds ─────────────────────────────────────────────────────────────

    #[test]
    fn slider_parts_are_layered_track_fill_knob() {
        let slider = Widget::new(
            r(0.0, 0.0, 100.0, 20.0),
            WidgetKind::Slider {
                min: 0.0,
                max: 10.0,
                value: 5.0,
                track: Color::WHITE,
                fill: Color::BLACK,
                knob: Color::WHITE,
            },
        );
        let vb = single(slider);
        let vms = vb.view_models();
        assert_eq!(vms.len(), 3);
        assert_eq!(vms[0].logical_box, r(0.0, 6.5, 100.0, 7.0));
        assert_eq!(vms[1].logical_box.size.x, 50.0);
        assert!(vms[0].layer < vms[1].layer && vms[1].layer < vms[2].layer);
        // Knob is centred on the value and at least the minimum handle size.
        assert_eq!(vms[2].logical_box, r(43.0, 3.0, 14.0, 14.0));
    }

    #[test]
    fn scrollbar_thumb_tracks_offset_and_sits_above_content() {
        let bar = Widget::new(
            r(0.0, 0.0, 100.0, 100.0),
            WidgetKind::Scrollbar {
                content: 400.0,
                visible: 100.0,
                offset: 300.0,
                width: 8.0,
                track: Color::BLACK,
                thumb: Color::WHITE,
            },
        );
        let vb = single(bar);
        let vms = vb.view_models();
        assert_eq!(vms.len(), 2);
        assert_eq!(vms[1].logical_box, r(92.0, 75.0, 8.0, 25.0));
        assert!(vms[0].layer > layer::pack(ZGroup::CONTENT, ZIndex(500), SubLayer::Text));
        assert_eq!(vms[1].phase, RenderPhase::Overlay);
    }

    #[test]
    fn checked_checkbox_emits_box_and_mark() {
        let font = crate::text::FontId(0);
        let cb = Widget::new(
            r(0.0, 0.0, 100.0, 20.0),
            WidgetKind::Checkbox {
                label: TextRun::new("x", font, 12.0, Color::WHITE),
                checked: true,
                box_color: Color::WHITE,
                mark_color: Color::BLACK,
            },
        )
        .with_padding(2.0);
        let vb = single(cb);
        let vms = vb.view_models();
        assert_eq!(vms.len(), 2);
        assert_eq!(vms[0].logical_box, r(2.0, 2.0, 16.0, 16.0));
        assert_eq!(vms[1].logical_box, r(6.0, 6.0, 8.0, 8.0));
        // No font loaded: the label is dropped, not an error.
        assert!(vb.glyphs().is_empty());
    }

    // ── ordering inputs ───────────────────────────────────────────────────

    #[test]
    fn widget_order_follows_display_list_position() {
        let mut t = LayoutTree::new();
        let root = t.set_root(r(0.0, 0.0, 100.0, 100.0), Arrangement::Stack);
        t.add_child(root, r(0.0, 0.0, 10.0, 10.0), Arrangement::None);
        t.add_child(root, r(0.0, 0.0, 10.0, 10.0), Arrangement::None);
        let widgets = vec![
            Widget::panel(r(0.0, 0.0, 10.0, 10.0), Color::WHITE).with_z(0, 1),
            Widget::panel(r(0.0, 0.0, 10.0, 10.0), Color::BLACK),
        ];

        let vb = build(&t, &widgets, 1.0);
        let order: Vec<_> = vb.view_models().iter().map(|v| (v.widget, v.widget_order)).collect();
        assert_eq!(order, vec![(WidgetId(1), 0), (WidgetId(0), 1)]);
    }

    #[test]
    fn popup_group_paints_after_higher_content_z() {
        let mut t = LayoutTree::new();
        let root = t.set_root(r(0.0, 0.0, 200.0, 100.0), Arrangement::Row);
        t.set_clips(root, true);
        t.add_child(root, r(0.0, 0.0, 100.0, 100.0), Arrangement::None);
        t.add_child(root, r(50.0, 50.0, 150.0, 120.0), Arrangement::None);
        t.add_child(root, r(100.0, 0.0, 100.0, 100.0), Arrangement::None);
        let bar = WidgetKind::Scrollbar {
            content: 400.0,
            visible: 100.0,
            offset: 0.0,
            width: 8.0,
            track: Color::BLACK,
            thumb: Color::WHITE,
        };
        let widgets = vec![
            Widget::panel(r(0.0, 0.0, 100.0, 100.0), Color::WHITE)
                .with_border(1.0, Color::BLACK)
                .with_z(0, 3),
            Widget::panel(r(50.0, 50.0, 150.0, 120.0), Color::BLACK).with_z(1, 0),
            Widget::new(r(100.0, 0.0, 100.0, 100.0), bar).with_z(0, 7),
        ];

        let vb = build(&t, &widgets, 1.0);
        let transform = DeviceTransform::new(1.0, Viewport::new(400.0, 400.0));
        let mut composer = crate::render::RenderComposer::new();
        let commands = composer.build(vb.view_models(), vb.glyphs(), &transform).unwrap();

        let popup = WidgetId(1);
        let first_popup = commands.iter().position(|c| c.widget == popup).unwrap();
        assert_eq!(first_popup, commands.len() - 1);
        assert!(commands[..first_popup].iter().all(|c| c.key.layer < commands[first_popup].key.layer));
    }
}
