//! Vertex attribute encoding, layout sharing, and interleaving.

use std::sync::Arc;

use crate::mesh::{VertexAttributeFormat, VertexAttributeSemantic, VertexLayout};

use super::accessor::{AccessorData, ResolvedAccessor};

/// One attribute's elements encoded in the layout's storage format.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AttributeStream {
    pub semantic: VertexAttributeSemantic,
    /// Tightly packed elements, `format.size()` bytes each.
    pub data: Vec<u8>,
}

impl AttributeStream {
    /// Encode an accessor into the storage format of `semantic`.
    pub fn encode(semantic: VertexAttributeSemantic, accessor: &ResolvedAccessor) -> Self {
        let data = match semantic.format() {
            VertexAttributeFormat::Float2 => float_bytes::<2>(accessor, 0.0),
            VertexAttributeFormat::Float3 => float_bytes::<3>(accessor, 0.0),
            // Tangent handedness defaults to +1 when the source has only xyz.
            VertexAttributeFormat::Float4 if semantic == VertexAttributeSemantic::Tangent => {
                float_bytes::<4>(accessor, 1.0)
            }
            VertexAttributeFormat::Float4 => float_bytes::<4>(accessor, 0.0),
            VertexAttributeFormat::Unorm8x4 => unorm8x4(accessor).concat(),
            VertexAttributeFormat::Uint8x4 => uint8x4(accessor).concat(),
        };
        Self { semantic, data }
    }

    /// Wrap already-encoded vertex floats (e.g. synthesized normals).
    pub fn from_floats<const N: usize>(semantic: VertexAttributeSemantic, values: &[[f32; N]]) -> Self {
        Self {
            semantic,
            data: bytemuck::cast_slice(values).to_vec(),
        }
    }
}

fn float_bytes<const N: usize>(accessor: &ResolvedAccessor, fill: f32) -> Vec<u8> {
    let values = accessor.to_f32_array::<N>(fill);
    bytemuck::cast_slice(&values).to_vec()
}

/// Colors as normalized 8-bit RGBA. Three-component sources get full alpha.
fn unorm8x4(accessor: &ResolvedAccessor) -> Vec<[u8; 4]> {
    let n = accessor.components;
    let texel = |i: usize, read: &dyn Fn(usize) -> u8| -> [u8; 4] {
        std::array::from_fn(|c| match c {
            c if c < n => read(i * n + c),
            3 => 255,
            _ => 0,
        })
    };
    match &accessor.data {
        AccessorData::U8(v) => (0..accessor.count).map(|i| texel(i, &|k| v[k])).collect(),
        AccessorData::U16(v) => (0..accessor.count)
            .map(|i| texel(i, &|k| (v[k] >> 8) as u8))
            .collect(),
        _ => accessor
            .to_f32_array::<4>(1.0)
            .into_iter()
            .map(|rgba| rgba.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect(),
    }
}

/// Joint indices narrowed to 8 bits.
fn uint8x4(accessor: &ResolvedAccessor) -> Vec<[u8; 4]> {
    let flat = accessor.to_u32();
    let n = accessor.components;
    (0..accessor.count)
        .map(|i| std::array::from_fn(|c| if c < n { flat[i * n + c].min(255) as u8 } else { 0 }))
        .collect()
}

/// Interleave attribute streams into one vertex buffer laid out by `layout`.
///
/// Slots of streams shorter than `vertex_count` stay zeroed. Streams whose
/// semantic is not in the layout are ignored.
pub(crate) fn interleave_vertices(
    layout: &VertexLayout,
    streams: &[AttributeStream],
    vertex_count: usize,
) -> Vec<u8> {
    let stride = layout.stride as usize;
    let mut result = vec![0u8; vertex_count * stride];

    for stream in streams {
        let Some(attr) = layout.attribute(stream.semantic) else {
            continue;
        };
        let size = attr.format.size();
        let offset = attr.offset as usize;
        for (v, element) in stream.data.chunks_exact(size).take(vertex_count).enumerate() {
            let dst = v * stride + offset;
            result[dst..dst + size].copy_from_slice(element);
        }
    }

    result
}

/// Find or create a shared layout.
///
/// Primitives with identical attribute sets share one `Arc<VertexLayout>`.
pub(crate) fn find_or_create_layout(
    layout: VertexLayout,
    layouts: &mut Vec<Arc<VertexLayout>>,
) -> Arc<VertexLayout> {
    if let Some(existing) = layouts.iter().find(|l| ***l == layout) {
        return Arc::clone(existing);
    }
    let arc = Arc::new(layout);
    layouts.push(Arc::clone(&arc));
    arc
}
