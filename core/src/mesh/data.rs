//! CPU-side mesh data structures.
//!
//! This module provides:
//! - [`PrimitiveTopology`] - How vertices are assembled into primitives
//! - [`IndexBuffer`] - Index data stored as u16 or u32
//! - [`BoundingBox`] - Center/half-extent box
//! - [`MorphTarget`] - Per-target delta arrays
//! - [`CpuMesh`] - Interleaved vertex data, indices and bounds for one primitive

use std::sync::Arc;

use glam::Vec3;

use super::layout::VertexLayout;

/// Primitive topology describing how vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each vertex is a separate point.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Vertices form a connected strip of lines.
    LineStrip,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Vertices form a connected strip of triangles.
    TriangleStrip,
}

impl PrimitiveTopology {
    /// Map a glTF primitive `mode`.
    ///
    /// Line loops (2) and triangle fans (6) have no renderer equivalent and
    /// return `None`.
    pub fn from_gltf_mode(mode: u32) -> Option<Self> {
        match mode {
            0 => Some(Self::PointList),
            1 => Some(Self::LineList),
            3 => Some(Self::LineStrip),
            4 => Some(Self::TriangleList),
            5 => Some(Self::TriangleStrip),
            _ => None,
        }
    }
}

/// Index format for indexed drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// 16-bit unsigned integers.
    Uint16,
    /// 32-bit unsigned integers.
    Uint32,
}

impl IndexFormat {
    /// Size in bytes of each index.
    pub fn size(&self) -> usize {
        match self {
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }
}

/// Index data in its final storage width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexBuffer {
    /// 16-bit indices.
    U16(Vec<u16>),
    /// 32-bit indices.
    U32(Vec<u32>),
}

impl IndexBuffer {
    /// Pack indices into the narrowest width that can address `vertex_count`
    /// vertices: 16-bit up to 65535 vertices, 32-bit above.
    pub fn for_vertex_count(indices: Vec<u32>, vertex_count: usize) -> Self {
        if vertex_count <= u16::MAX as usize {
            Self::U16(indices.into_iter().map(|i| i as u16).collect())
        } else {
            Self::U32(indices)
        }
    }

    /// Storage format.
    pub fn format(&self) -> IndexFormat {
        match self {
            Self::U16(_) => IndexFormat::Uint16,
            Self::U32(_) => IndexFormat::Uint32,
        }
    }

    /// Number of indices.
    pub fn len(&self) -> usize {
        match self {
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    /// Whether the buffer holds no indices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw little-endian bytes, ready for upload.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::U16(v) => bytemuck::cast_slice(v),
            Self::U32(v) => bytemuck::cast_slice(v),
        }
    }

    /// Indices widened to u32.
    pub fn to_u32(&self) -> Vec<u32> {
        match self {
            Self::U16(v) => v.iter().map(|&i| i as u32).collect(),
            Self::U32(v) => v.clone(),
        }
    }
}

/// Axis-aligned bounding box stored as center and half extents.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    /// Box center.
    pub center: Vec3,
    /// Half of the box size along each axis.
    pub half_extents: Vec3,
}

impl BoundingBox {
    /// Build from min/max corners.
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            half_extents: (max - min) * 0.5,
        }
    }

    /// Minimum corner.
    pub fn min(&self) -> Vec3 {
        self.center - self.half_extents
    }

    /// Maximum corner.
    pub fn max(&self) -> Vec3 {
        self.center + self.half_extents
    }
}

/// Delta arrays for one morph target.
///
/// A channel the target does not animate is `None` rather than a zero-filled
/// array. Present channels hold exactly one delta per base vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MorphTarget {
    /// Position deltas.
    pub delta_positions: Option<Vec<[f32; 3]>>,
    /// Normal deltas.
    pub delta_normals: Option<Vec<[f32; 3]>>,
    /// Tangent deltas (xyz only, handedness is not morphed).
    pub delta_tangents: Option<Vec<[f32; 3]>>,
}

impl MorphTarget {
    /// Whether the target carries no channel at all.
    pub fn is_empty(&self) -> bool {
        self.delta_positions.is_none()
            && self.delta_normals.is_none()
            && self.delta_tangents.is_none()
    }
}

/// A CPU-side mesh holding one interleaved vertex buffer.
///
/// This is the renderer-ready form of a glTF primitive: the host uploads
/// [`vertex_data`](Self::vertex_data) with [`layout`](Self::layout) and,
/// when present, the [`indices`](Self::indices).
#[derive(Clone)]
pub struct CpuMesh {
    layout: Arc<VertexLayout>,
    topology: PrimitiveTopology,
    vertex_data: Vec<u8>,
    vertex_count: u32,
    indices: Option<IndexBuffer>,
    bounds: BoundingBox,
    morph_targets: Vec<MorphTarget>,
    label: Option<String>,
}

impl CpuMesh {
    /// Create a new empty CpuMesh with the given layout.
    pub fn new(layout: Arc<VertexLayout>) -> Self {
        Self {
            layout,
            topology: PrimitiveTopology::TriangleList,
            vertex_data: Vec::new(),
            vertex_count: 0,
            indices: None,
            bounds: BoundingBox::default(),
            morph_targets: Vec::new(),
            label: None,
        }
    }

    /// Set interleaved vertex data.
    ///
    /// Vertex count is inferred from the data length and stride.
    pub fn with_vertex_data(mut self, data: Vec<u8>) -> Self {
        let stride = self.layout.stride as usize;
        if stride > 0 {
            self.vertex_count = (data.len() / stride) as u32;
        }
        self.vertex_data = data;
        self
    }

    /// Set the index buffer.
    pub fn with_indices(mut self, indices: IndexBuffer) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Set the primitive topology.
    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Set the bounding box.
    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = bounds;
        self
    }

    /// Set the morph targets.
    pub fn with_morph_targets(mut self, targets: Vec<MorphTarget>) -> Self {
        self.morph_targets = targets;
        self
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the vertex layout.
    pub fn layout(&self) -> &Arc<VertexLayout> {
        &self.layout
    }

    /// Get the primitive topology.
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Get the interleaved vertex bytes.
    pub fn vertex_data(&self) -> &[u8] {
        &self.vertex_data
    }

    /// Get the number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Get the index buffer.
    pub fn indices(&self) -> Option<&IndexBuffer> {
        self.indices.as_ref()
    }

    /// Check if this mesh uses indexed drawing.
    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Get the bounding box.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Get the morph targets.
    pub fn morph_targets(&self) -> &[MorphTarget] {
        &self.morph_targets
    }

    /// Get the debug label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl std::fmt::Debug for CpuMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuMesh")
            .field("label", &self.label)
            .field("topology", &self.topology)
            .field("vertex_count", &self.vertex_count)
            .field("stride", &self.layout.stride)
            .field("index_count", &self.indices.as_ref().map(IndexBuffer::len))
            .field("morph_targets", &self.morph_targets.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::VertexAttributeSemantic;

    #[test]
    fn topology_from_gltf_mode() {
        assert_eq!(
            PrimitiveTopology::from_gltf_mode(4),
            Some(PrimitiveTopology::TriangleList)
        );
        assert_eq!(
            PrimitiveTopology::from_gltf_mode(0),
            Some(PrimitiveTopology::PointList)
        );
        assert_eq!(PrimitiveTopology::from_gltf_mode(2), None);
        assert_eq!(PrimitiveTopology::from_gltf_mode(6), None);
    }

    #[test]
    fn index_buffer_width_follows_vertex_count() {
        let small = IndexBuffer::for_vertex_count(vec![0, 1, 2], 3);
        assert_eq!(small.format(), IndexFormat::Uint16);
        assert_eq!(small.as_bytes().len(), 6);

        let large = IndexBuffer::for_vertex_count(vec![0, 70_000, 2], 70_001);
        assert_eq!(large.format(), IndexFormat::Uint32);
        assert_eq!(large.to_u32(), vec![0, 70_000, 2]);
    }

    #[test]
    fn bounding_box_from_min_max() {
        let b = BoundingBox::from_min_max(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(1.0, 4.0, 2.0));
        assert_eq!(b.center, Vec3::new(0.0, 2.0, 2.0));
        assert_eq!(b.half_extents, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(b.min(), Vec3::new(-1.0, 0.0, 2.0));
    }

    #[test]
    fn cpu_mesh_infers_vertex_count() {
        let layout = Arc::new(VertexLayout::from_semantics(&[
            VertexAttributeSemantic::Position,
        ]));
        let mesh = CpuMesh::new(layout)
            .with_vertex_data(vec![0u8; 36])
            .with_label("tri");

        assert_eq!(mesh.vertex_count(), 3);
        assert!(!mesh.is_indexed());
        assert_eq!(mesh.label(), Some("tri"));
    }
}
