use std::fmt;

use crate::coords::DeviceTransform;
use crate::scene::{ClipRegion, GlyphQuad, ViewModel};

use super::buffer::{GrowError, GrowableBuffer};
use super::command::{BackgroundCmd, CommandKind, GlyphCmd, RenderCommand, RenderSortKey};

/// Input stream a composition error refers to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Stream {
    Background,
    Glyph,
}

/// Composition failure. The command list is empty after any of these.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposeError {
    /// Non-finite geometry at `index` of `stream`.
    InvalidInput { stream: Stream, index: usize },
    BackgroundAppend { index: usize, source: GrowError },
    GlyphAppend { index: usize, source: GrowError },
    /// The merge scratch buffer could not hold `count` commands.
    Sort { count: usize, source: GrowError },
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComposeError::InvalidInput { stream, index } => {
                write!(f, "invalid {stream:?} input at index {index}: non-finite geometry")
            }
            ComposeError::BackgroundAppend { index, source } => {
                write!(f, "failed to append background command {index}: {source}")
            }
            ComposeError::GlyphAppend { index, source } => {
                write!(f, "failed to append glyph command {index}: {source}")
            }
            ComposeError::Sort { count, source } => {
                write!(f, "failed to sort {count} render commands: {source}")
            }
        }
    }
}

impl std::error::Error for ComposeError {}

/// Packages view models and glyph quads into one sorted command list.
///
/// Sorting is a bottom-up merge sort, so commands with equal keys keep
/// their input order (backgrounds before glyphs, then input index). Both
/// the command list and the merge scratch buffer are reused across frames.
#[derive(Debug, Default)]
pub struct RenderComposer {
    commands: GrowableBuffer<RenderCommand>,
    scratch: GrowableBuffer<RenderCommand>,
}

impl RenderComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composer whose command list refuses to grow past `limit`.
    pub fn with_command_limit(limit: usize) -> Self {
        Self {
            commands: GrowableBuffer::with_limit(limit),
            scratch: GrowableBuffer::new(),
        }
    }

    /// Sorted commands from the last successful build.
    #[inline]
    pub fn commands(&self) -> &[RenderCommand] {
        self.commands.as_slice()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Rebuilds the command list.
    ///
    /// Clips without a precomputed device rectangle are resolved through
    /// `transform`.
    pub fn build(
        &mut self,
        view_models: &[ViewModel],
        glyphs: &[GlyphQuad],
        transform: &DeviceTransform,
    ) -> Result<&[RenderCommand], ComposeError> {
        self.commands.clear();
        match self.fill_and_sort(view_models, glyphs, transform) {
            Ok(()) => Ok(self.commands.as_slice()),
            Err(e) => {
                self.commands.clear();
                Err(e)
            }
        }
    }

    fn fill_and_sort(
        &mut self,
        view_models: &[ViewModel],
        glyphs: &[GlyphQuad],
        transform: &DeviceTransform,
    ) -> Result<(), ComposeError> {
        for (index, vm) in view_models.iter().enumerate() {
            if !vm.logical_box.is_finite() || !clip_is_finite(vm.clip) {
                return Err(ComposeError::InvalidInput { stream: Stream::Background, index });
            }
            let cmd = RenderCommand {
                key: RenderSortKey {
                    layer: vm.layer,
                    widget_order: vm.widget_order,
                    phase: vm.phase,
                    ordinal: vm.ordinal,
                },
                widget: vm.widget,
                kind: CommandKind::Background(BackgroundCmd {
                    device_box: transform.to_device(vm.logical_box),
                    device_clip: vm.clip.map(|c| c.device.unwrap_or_else(|| transform.to_device(c.logical))),
                    color: vm.color,
                }),
            };
            self.commands
                .push(cmd)
                .map_err(|source| ComposeError::BackgroundAppend { index, source })?;
        }

        for (index, g) in glyphs.iter().enumerate() {
            if !g.logical_box.is_finite() || !clip_is_finite(g.clip) {
                return Err(ComposeError::InvalidInput { stream: Stream::Glyph, index });
            }
            let cmd = RenderCommand {
                key: RenderSortKey {
                    layer: g.layer,
                    widget_order: g.widget_order,
                    phase: g.phase,
                    ordinal: g.ordinal,
                },
                widget: g.widget,
                kind: CommandKind::Glyph(GlyphCmd {
                    logical_box: g.logical_box,
                    logical_clip: g.clip.map(|c| c.logical),
                    uv_min: g.uv_min,
                    uv_max: g.uv_max,
                    color: g.color,
                }),
            };
            self.commands
                .push(cmd)
                .map_err(|source| ComposeError::GlyphAppend { index, source })?;
        }

        let count = self.commands.len();
        merge_sort(self.commands.as_mut_slice(), &mut self.scratch)
            .map_err(|source| ComposeError::Sort { count, source })?;

        log::trace!(
            "composer: {} commands ({} backgrounds, {} glyphs)",
            count,
            view_models.len(),
            glyphs.len()
        );
        Ok(())
    }
}

fn clip_is_finite(clip: Option<ClipRegion>) -> bool {
    clip.is_none_or(|c| c.logical.is_finite() && c.device.is_none_or(|d| d.is_finite()))
}

/// Stable bottom-up merge sort by [`RenderSortKey`].
///
/// Runs of width 1, 2, 4, ... are merged back and forth between `cmds`
/// and `scratch`; the result is copied back if it ends in `scratch`.
pub fn merge_sort(
    cmds: &mut [RenderCommand],
    scratch: &mut GrowableBuffer<RenderCommand>,
) -> Result<(), GrowError> {
    let n = cmds.len();
    if n < 2 {
        return Ok(());
    }

    scratch.clear();
    scratch.extend_from_slice(cmds)?;

    let mut in_scratch = false;
    let mut width = 1;
    while width < n {
        if in_scratch {
            merge_pass(scratch.as_slice(), cmds, width);
        } else {
            merge_pass(cmds, scratch.as_mut_slice(), width);
        }
        in_scratch = !in_scratch;
        width *= 2;
    }

    if in_scratch {
        cmds.copy_from_slice(scratch.as_slice());
    }
    Ok(())
}

fn merge_pass(src: &[RenderCommand], dst: &mut [RenderCommand], width: usize) {
    let n = src.len();
    let mut left = 0;
    while left < n {
        let mid = (left + width).min(n);
        let right = (left + 2 * width).min(n);

        let (mut i, mut j) = (left, mid);
        for slot in &mut dst[left..right] {
            // `<=` keeps the left run first on equal keys.
            if i < mid && (j >= right || src[i].key <= src[j].key) {
                *slot = src[i];
                i += 1;
            } else {
                *slot = src[j];
                j += 1;
            }
        }
        left = right;
    }
}
