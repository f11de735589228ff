//! Geometry builder: turns resolved attribute arrays into a [`CpuMesh`].

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Vec3;

use crate::mesh::{
    BoundingBox, CpuMesh, IndexBuffer, MorphTarget, PrimitiveTopology, VertexAttributeSemantic,
    VertexLayout,
};

use super::accessor::ResolvedAccessor;
use super::error::GltfError;
use super::vertex::{AttributeStream, find_or_create_layout, interleave_vertices};

/// Everything needed to build one primitive, already resolved.
///
/// The loader fills this from plain accessors or from a decoded compressed
/// payload; the builder does not care which.
#[derive(Debug, Clone, Default)]
pub struct GeometryInput {
    /// Mesh index, for diagnostics.
    pub mesh: usize,
    /// Primitive index within the mesh, for diagnostics.
    pub primitive: usize,
    /// glTF primitive mode.
    pub mode: u32,
    pub attributes: BTreeMap<VertexAttributeSemantic, ResolvedAccessor>,
    pub indices: Option<Vec<u32>>,
    /// Index accessor in the document, for diagnostics.
    pub index_accessor: usize,
    /// Declared `(min, max)` of the POSITION accessor.
    pub position_bounds: Option<([f32; 3], [f32; 3])>,
    pub targets: Vec<TargetInput>,
    pub label: Option<String>,
}

/// Resolved channels of one morph target.
#[derive(Debug, Clone, Default)]
pub struct TargetInput {
    pub positions: Option<ResolvedAccessor>,
    pub normals: Option<ResolvedAccessor>,
    pub tangents: Option<ResolvedAccessor>,
}

/// Builds primitives and shares identical vertex layouts between them.
#[derive(Debug, Default)]
pub struct GeometryBuilder {
    layouts: Vec<Arc<VertexLayout>>,
    generate_missing_normals: bool,
}

impl GeometryBuilder {
    pub fn new(generate_missing_normals: bool) -> Self {
        Self {
            layouts: Vec::new(),
            generate_missing_normals,
        }
    }

    /// Distinct layouts created so far.
    pub fn layouts(&self) -> &[Arc<VertexLayout>] {
        &self.layouts
    }

    /// Build a renderer-ready mesh from one primitive.
    ///
    /// Fails with [`GltfError::UnsupportedTopology`] for line loops and
    /// triangle fans, with [`GltfError::MissingRequiredAttribute`] when
    /// there are no positions, and with [`GltfError::AccessorOutOfBounds`]
    /// when an index addresses a vertex that does not exist.
    pub fn build_primitive(&mut self, input: GeometryInput) -> Result<CpuMesh, GltfError> {
        let topology = PrimitiveTopology::from_gltf_mode(input.mode)
            .ok_or(GltfError::UnsupportedTopology(input.mode))?;

        let positions = input
            .attributes
            .get(&VertexAttributeSemantic::Position)
            .filter(|p| p.count > 0)
            .ok_or(GltfError::MissingRequiredAttribute {
                mesh: input.mesh,
                primitive: input.primitive,
                attribute: "POSITION",
            })?;
        let vertex_count = positions.count;
        if let Some(&max) = input.indices.as_ref().and_then(|i| i.iter().max())
            && max as usize >= vertex_count
        {
            return Err(GltfError::AccessorOutOfBounds {
                accessor: input.index_accessor,
                reason: format!("index {max} addresses past {vertex_count} vertices"),
            });
        }

        let mut streams: Vec<AttributeStream> = input
            .attributes
            .iter()
            .map(|(&semantic, accessor)| AttributeStream::encode(semantic, accessor))
            .collect();

        let has_normals = input.attributes.contains_key(&VertexAttributeSemantic::Normal);
        if !has_normals
            && self.generate_missing_normals
            && topology == PrimitiveTopology::TriangleList
        {
            let points = positions.to_f32_array::<3>(0.0);
            let normals = match &input.indices {
                Some(indices) => generate_normals(&points, indices),
                None => {
                    let sequence: Vec<u32> = (0..vertex_count as u32).collect();
                    generate_normals(&points, &sequence)
                }
            };
            streams.push(AttributeStream::from_floats(
                VertexAttributeSemantic::Normal,
                &normals,
            ));
        }

        let semantics: Vec<_> = streams.iter().map(|s| s.semantic).collect();
        let layout = find_or_create_layout(VertexLayout::from_semantics(&semantics), &mut self.layouts);
        let vertex_data = interleave_vertices(&layout, &streams, vertex_count);

        let bounds = input
            .position_bounds
            .map(|(min, max)| BoundingBox::from_min_max(Vec3::from(min), Vec3::from(max)))
            .unwrap_or_default();

        let morph_targets = input
            .targets
            .iter()
            .map(|target| MorphTarget {
                delta_positions: align_deltas(target.positions.as_ref(), vertex_count),
                delta_normals: align_deltas(target.normals.as_ref(), vertex_count),
                delta_tangents: align_deltas(target.tangents.as_ref(), vertex_count),
            })
            .collect();

        let mut mesh = CpuMesh::new(layout)
            .with_vertex_data(vertex_data)
            .with_topology(topology)
            .with_bounds(bounds)
            .with_morph_targets(morph_targets);

        if let Some(indices) = input.indices {
            mesh = mesh.with_indices(IndexBuffer::for_vertex_count(indices, vertex_count));
        }
        if let Some(label) = input.label {
            mesh = mesh.with_label(label);
        }

        Ok(mesh)
    }
}

/// Per-vertex normals from triangle winding.
///
/// Face normals are accumulated unnormalized (area weighted) onto each
/// corner. Triangles referencing missing vertices are ignored; vertices no
/// triangle touches get a zero normal.
pub fn generate_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut accum = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (Some(pa), Some(pb), Some(pc)) = (positions.get(a), positions.get(b), positions.get(c))
        else {
            continue;
        };
        let (pa, pb, pc) = (Vec3::from(*pa), Vec3::from(*pb), Vec3::from(*pc));
        let face = (pb - pa).cross(pc - pa);
        accum[a] += face;
        accum[b] += face;
        accum[c] += face;
    }

    accum
        .into_iter()
        .map(|n| n.normalize_or_zero().to_array())
        .collect()
}

/// Morph deltas for one channel; `None` when absent or misaligned.
fn align_deltas(accessor: Option<&ResolvedAccessor>, vertex_count: usize) -> Option<Vec<[f32; 3]>> {
    let accessor = accessor?;
    if accessor.count != vertex_count {
        log::warn!(
            "Dropping morph channel with {} deltas for {vertex_count} vertices",
            accessor.count
        );
        return None;
    }
    Some(accessor.to_f32_array::<3>(0.0))
}
