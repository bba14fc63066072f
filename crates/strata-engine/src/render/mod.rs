//! CPU side of rendering: render commands, sorting and vertex generation.
//!
//! Convention:
//! - view models arrive with logical geometry (top-left origin, +Y down)
//! - backgrounds are clipped in device space, glyphs in logical space
//! - the merged vertex stream is in device pixels; the vertex shader maps it
//!   to NDC using a viewport uniform

mod buffer;
mod command;
mod composer;
mod mesh;
mod vertex;

pub use buffer::{GrowError, GrowableBuffer};
pub use command::{BackgroundCmd, CommandKind, GlyphCmd, RenderCommand, RenderSortKey};
pub use composer::{merge_sort, ComposeError, RenderComposer, Stream};
pub use mesh::{vertex_bounds, MeshBuffer, MeshBuilder, MeshError, MeshStats, StagingArena};
pub use vertex::{TextVertex, UiVertex, Vertex, QUAD_INDICES, VERTICES_PER_QUAD};
