//! Strata studio: a demo window exercising composition, clipping, popups,
//! scrolling and text through the engine's renderer.

use strata_engine::coords::Rect;
use strata_engine::core::{App, AppControl, FrameCtx};
use strata_engine::device::GpuInit;
use strata_engine::logging::{init_logging, LoggingConfig};
use strata_engine::paint::Color;
use strata_engine::renderer::RendererConfig;
use strata_engine::scene::{Arrangement, NodeId, TextRun, UiScene, Widget, WidgetKind};
use strata_engine::text::{FontId, FontSystem};
use strata_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;

const ROW_HEIGHT: f32 = 28.0;
const LIST_ITEMS: usize = 14;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "Strata Studio".to_string(),
        initial_size: LogicalSize::new(820.0, 560.0),
    };
    Runtime::run(config, GpuInit::default(), RendererConfig::default(), Studio::default())
}

/// Demo app; rebuilds its scene from scratch every frame.
#[derive(Default)]
struct Studio {
    font: Option<FontId>,
    elapsed: f32,
}

struct Palette;

impl Palette {
    fn panel() -> Color { Color::from_hex(0x2a2d34ff) }
    fn header() -> Color { Color::from_hex(0x3b4252ff) }
    fn border() -> Color { Color::from_hex(0x4c566aff) }
    fn accent() -> Color { Color::from_hex(0x88c0d0ff) }
    fn text() -> Color { Color::from_hex(0xeceff4ff) }
    fn popup() -> Color { Color::from_hex(0x5e81acf0) }
}

impl Studio {
    fn text(&self, s: &str, size: f32) -> Option<TextRun> {
        self.font.map(|font| TextRun::new(s, font, size, Palette::text()))
    }

    /// Label when a font is loaded, plain panel otherwise.
    fn label(&self, rect: Rect, s: &str, background: Color) -> Widget {
        let kind = match self.text(s, 15.0) {
            Some(run) => WidgetKind::Label(run),
            None => WidgetKind::Panel,
        };
        Widget::new(rect, kind).with_background(background).with_padding(6.0)
    }

    fn build(&self, scene: &mut UiScene, width: f32, height: f32) {
        let UiScene { tree, widgets } = scene;
        let inner_w = (width - 32.0).max(0.0);

        let root = tree.set_root(Rect::new(0.0, 0.0, width, height), Arrangement::Column);
        let leaf = |tree: &mut strata_engine::scene::LayoutTree, parent: NodeId, rect: Rect| {
            tree.add_child(parent, rect, Arrangement::None)
        };

        // Header.
        let header = Rect::new(16.0, 16.0, inner_w, 40.0);
        leaf(tree, root, header);
        widgets.push(
            self.label(header, "strata studio", Palette::header())
                .with_border(1.0, Palette::border()),
        );

        // Controls row, clipped to a short strip. The popup escapes the clip.
        let row_rect = Rect::new(16.0, 72.0, inner_w, 48.0);
        let Some(row) = tree.add_child(root, row_rect, Arrangement::Row) else {
            return;
        };
        tree.set_clips(row, true);

        let button = Rect::new(16.0, 76.0, 150.0, 40.0);
        leaf(tree, row, button);
        widgets.push(match self.text("Launch", 15.0) {
            Some(run) => Widget::new(button, WidgetKind::Button(run))
                .with_background(Palette::accent().faded(0.35))
                .with_border(1.0, Palette::accent())
                .with_padding(8.0),
            None => Widget::panel(button, Palette::accent()),
        });

        if let Some(run) = self.text("Telemetry", 15.0) {
            let check = Rect::new(180.0, 76.0, 170.0, 40.0);
            leaf(tree, row, check);
            widgets.push(
                Widget::new(
                    check,
                    WidgetKind::Checkbox {
                        label: run,
                        checked: (self.elapsed as u32) % 2 == 0,
                        box_color: Palette::border(),
                        mark_color: Palette::accent(),
                    },
                )
                .with_padding(10.0),
            );
        }

        let slider = Rect::new(364.0, 76.0, 220.0, 40.0);
        leaf(tree, row, slider);
        widgets.push(Widget::new(
            slider,
            WidgetKind::Slider {
                min: 0.0,
                max: 1.0,
                value: 0.5 + 0.5 * (self.elapsed * 0.8).sin(),
                track: Palette::border(),
                fill: Palette::accent(),
                knob: Palette::text(),
            },
        ));

        let popup = Rect::new(430.0, 100.0, 240.0, 120.0);
        leaf(tree, row, popup);
        widgets.push(
            self.label(popup, "popup above the clip", Palette::popup())
                .with_z(1, 0)
                .with_border(2.0, Palette::accent()),
        );

        // Scrolling list: the container keeps its scrollbar while the rows move.
        let list_rect = Rect::new(16.0, 136.0, 380.0, (height - 152.0).max(0.0));
        let Some(list) = tree.add_child(root, list_rect, Arrangement::Stack) else {
            return;
        };
        tree.set_clips(list, true);
        tree.set_scroll_static(list, true);

        let content = LIST_ITEMS as f32 * ROW_HEIGHT;
        let max_offset = (content - list_rect.size.y).max(0.0);
        let offset = max_offset * (0.5 - 0.5 * (self.elapsed * 0.4).cos());
        widgets.push(
            Widget::new(
                list_rect,
                WidgetKind::Scrollbar {
                    content,
                    visible: list_rect.size.y,
                    offset,
                    width: 8.0,
                    track: Palette::panel(),
                    thumb: Palette::border(),
                },
            )
            .with_background(Palette::panel()),
        );

        for i in 0..LIST_ITEMS {
            let y = list_rect.origin.y + i as f32 * ROW_HEIGHT - offset;
            let rect = Rect::new(list_rect.origin.x, y, list_rect.size.x - 10.0, ROW_HEIGHT - 2.0);
            leaf(tree, list, rect);
            let shade = if i % 2 == 0 { Palette::header() } else { Palette::panel() };
            widgets.push(self.label(rect, &format!("channel {i:02}"), shade));
        }
    }
}

impl App for Studio {
    fn on_start(&mut self, fonts: &mut FontSystem) {
        let bytes = load_font();
        match fonts.load_font(&bytes) {
            Ok(id) => self.font = Some(id),
            Err(e) => log::warn!("no usable system font, text disabled: {e}"),
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        self.elapsed += ctx.time.dt;
        self.build(ctx.scene, ctx.viewport.width, ctx.viewport.height);
        AppControl::Continue
    }
}

fn load_font() -> Vec<u8> {
    [
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    ]
    .iter()
    .find_map(|p| std::fs::read(p).ok())
    .unwrap_or_default()
}
