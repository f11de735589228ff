//! CPU-side mesh types.
//!
//! - [`VertexLayout`] - Interleaved attribute layout derived per primitive
//! - [`CpuMesh`] - Vertex bytes, indices, bounds and morph targets
//!
//! These are the renderer-ready outputs of the geometry builder.

mod data;
mod layout;

pub use data::{BoundingBox, CpuMesh, IndexBuffer, IndexFormat, MorphTarget, PrimitiveTopology};
pub use layout::{VertexAttribute, VertexAttributeFormat, VertexAttributeSemantic, VertexLayout};
