//! Vertex records for the two emission streams and the merged GPU stream.

use bytemuck::{Pod, Zeroable};

/// Flat-color vertex. `position.z` holds the command's layer until the
/// depth pass replaces it in the merged stream.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct UiVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// Textured glyph vertex sampling the coverage atlas.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TextVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

/// Vertex uploaded to the GPU: both streams interleaved in paint order.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    /// 1.0 samples the atlas, 0.0 draws flat color.
    pub use_tex: f32,
    pub color: [f32; 4],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x2,
        2 => Float32,
        3 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Corner order for one quad's two triangles: min, (max.x, min.y), max, (min.x, max.y).
pub const QUAD_INDICES: [usize; 6] = [0, 1, 2, 0, 2, 3];

pub const VERTICES_PER_QUAD: usize = QUAD_INDICES.len();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 40);
        assert_eq!(std::mem::size_of::<UiVertex>(), 28);
        assert_eq!(std::mem::size_of::<TextVertex>(), 36);
    }
}
