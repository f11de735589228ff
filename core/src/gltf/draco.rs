//! Compressed-geometry (`KHR_draco_mesh_compression`) decoding.
//!
//! The actual bitstream decoder is an external collaborator reached through
//! [`DecoderBackend`]. Every object the backend hands out is wrapped in a
//! [`BackendObject`] so it is released on every return path.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::mesh::IndexBuffer;

use super::accessor::ResolvedAccessor;
use super::document::{Document, DracoExtension};
use super::error::GltfError;

/// Opaque handle to an object owned by a decoder backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendHandle(pub u64);

/// What a compressed payload contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    PointCloud,
    TriangularMesh,
    Invalid,
}

/// Status reported by a backend decode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeStatus {
    pub ok: bool,
    pub message: String,
}

impl DecodeStatus {
    pub fn ok() -> Self {
        Self {
            ok: true,
            message: String::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Result of [`DecoderBackend::decode`].
///
/// The geometry handle may be present even when the status is an error; the
/// caller still owns it and must release it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    pub status: DecodeStatus,
    pub geometry: Option<BackendHandle>,
}

/// Compressed-geometry decoder backend.
///
/// Handles returned by `create_*` and `decode` are owned by the caller and
/// must be passed to [`release`](Self::release) exactly once.
pub trait DecoderBackend {
    /// Wrap compressed bytes in a backend buffer.
    fn create_buffer(&self, data: &[u8]) -> BackendHandle;
    /// Create a decoder session.
    fn create_decoder(&self) -> BackendHandle;
    /// Inspect the buffer header.
    fn geometry_kind(&self, decoder: BackendHandle, buffer: BackendHandle) -> GeometryKind;
    /// Decode the buffer into a point cloud or mesh.
    fn decode(
        &self,
        decoder: BackendHandle,
        buffer: BackendHandle,
        kind: GeometryKind,
    ) -> DecodeOutcome;
    fn point_count(&self, geometry: BackendHandle) -> usize;
    fn face_count(&self, geometry: BackendHandle) -> usize;
    /// Read an attribute by its unique id as a typed array.
    fn read_attribute(
        &self,
        decoder: BackendHandle,
        geometry: BackendHandle,
        unique_id: u32,
    ) -> Option<ResolvedAccessor>;
    /// Triangle corner indices, three per face.
    fn read_faces(&self, geometry: BackendHandle) -> Option<Vec<u32>>;
    fn release(&self, handle: BackendHandle);
}

/// Scoped owner of a backend handle; releases it on drop.
pub struct BackendObject<'b> {
    backend: &'b dyn DecoderBackend,
    handle: BackendHandle,
}

impl<'b> BackendObject<'b> {
    pub fn new(backend: &'b dyn DecoderBackend, handle: BackendHandle) -> Self {
        Self { backend, handle }
    }

    pub fn handle(&self) -> BackendHandle {
        self.handle
    }
}

impl Drop for BackendObject<'_> {
    fn drop(&mut self) {
        self.backend.release(self.handle);
    }
}

/// Decoded attributes and indices of one compressed primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedGeometry {
    /// glTF attribute name → decoded array.
    pub attributes: BTreeMap<String, ResolvedAccessor>,
    /// Triangle indices; `None` for point clouds.
    pub indices: Option<IndexBuffer>,
    pub point_count: usize,
}

/// Bytes of the buffer view referenced by a compressed payload.
pub fn payload_bytes<'d>(
    document: &Document,
    buffers: &'d [Cow<'_, [u8]>],
    payload: &DracoExtension,
) -> Result<&'d [u8], GltfError> {
    let view = document.buffer_views.get(payload.buffer_view).ok_or_else(|| {
        GltfError::DecodeFailure(format!("buffer view {} does not exist", payload.buffer_view))
    })?;
    buffers
        .get(view.buffer)
        .and_then(|buffer| {
            let end = view.byte_offset.checked_add(view.byte_length)?;
            buffer.get(view.byte_offset..end)
        })
        .ok_or_else(|| {
            GltfError::DecodeFailure(format!(
                "buffer view {} lies outside its buffer",
                payload.buffer_view
            ))
        })
}

/// Decode a compressed primitive through `backend`.
pub fn decode(
    payload: &DracoExtension,
    data: &[u8],
    backend: &dyn DecoderBackend,
) -> Result<DecodedGeometry, GltfError> {
    let buffer = BackendObject::new(backend, backend.create_buffer(data));
    let decoder = BackendObject::new(backend, backend.create_decoder());

    let kind = backend.geometry_kind(decoder.handle(), buffer.handle());
    if kind == GeometryKind::Invalid {
        return Err(GltfError::DecodeFailure("unrecognized geometry type".into()));
    }

    let outcome = backend.decode(decoder.handle(), buffer.handle(), kind);
    let geometry = outcome
        .geometry
        .map(|handle| BackendObject::new(backend, handle));
    if !outcome.status.ok {
        return Err(GltfError::DecodeFailure(outcome.status.message));
    }
    let geometry =
        geometry.ok_or_else(|| GltfError::DecodeFailure("backend returned no geometry".into()))?;

    let point_count = backend.point_count(geometry.handle());

    let mut attributes = BTreeMap::new();
    for (name, &unique_id) in &payload.attributes {
        let array = backend
            .read_attribute(decoder.handle(), geometry.handle(), unique_id)
            .ok_or_else(|| {
                GltfError::DecodeFailure(format!("attribute {name} (id {unique_id}) not found"))
            })?;
        attributes.insert(name.clone(), array);
    }

    let indices = match kind {
        GeometryKind::TriangularMesh => {
            let faces = backend
                .read_faces(geometry.handle())
                .ok_or_else(|| GltfError::DecodeFailure("face read failed".into()))?;
            let expected = backend.face_count(geometry.handle()) * 3;
            if faces.len() != expected {
                return Err(GltfError::DecodeFailure(format!(
                    "expected {expected} face indices, got {}",
                    faces.len()
                )));
            }
            if let Some(&max) = faces.iter().max()
                && max as usize >= point_count
            {
                return Err(GltfError::DecodeFailure(format!(
                    "face index {max} addresses past {point_count} points"
                )));
            }
            Some(IndexBuffer::for_vertex_count(faces, point_count))
        }
        _ => None,
    };

    Ok(DecodedGeometry {
        attributes,
        indices,
        point_count,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::gltf::accessor::AccessorData;
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;

    /// In-memory backend that tracks live handles.
    pub(crate) struct FakeBackend {
        kind: GeometryKind,
        status: DecodeStatus,
        return_geometry: bool,
        pub positions: Vec<f32>,
        pub faces: Vec<u32>,
        live: RefCell<HashSet<u64>>,
        next: Cell<u64>,
    }

    impl FakeBackend {
        pub(crate) fn triangle() -> Self {
            Self {
                kind: GeometryKind::TriangularMesh,
                status: DecodeStatus::ok(),
                return_geometry: true,
                positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                faces: vec![0, 1, 2],
                live: RefCell::new(HashSet::new()),
                next: Cell::new(1),
            }
        }

        pub(crate) fn with_kind(mut self, kind: GeometryKind) -> Self {
            self.kind = kind;
            self
        }

        pub(crate) fn with_status(mut self, status: DecodeStatus) -> Self {
            self.status = status;
            self
        }

        pub(crate) fn without_geometry(mut self) -> Self {
            self.return_geometry = false;
            self
        }

        fn issue(&self) -> BackendHandle {
            let id = self.next.get();
            self.next.set(id + 1);
            self.live.borrow_mut().insert(id);
            BackendHandle(id)
        }

        pub(crate) fn live_handles(&self) -> usize {
            self.live.borrow().len()
        }
    }

    impl DecoderBackend for FakeBackend {
        fn create_buffer(&self, _data: &[u8]) -> BackendHandle {
            self.issue()
        }

        fn create_decoder(&self) -> BackendHandle {
            self.issue()
        }

        fn geometry_kind(&self, _: BackendHandle, _: BackendHandle) -> GeometryKind {
            self.kind
        }

        fn decode(&self, _: BackendHandle, _: BackendHandle, _: GeometryKind) -> DecodeOutcome {
            DecodeOutcome {
                status: self.status.clone(),
                geometry: self.return_geometry.then(|| self.issue()),
            }
        }

        fn point_count(&self, _: BackendHandle) -> usize {
            self.positions.len() / 3
        }

        fn face_count(&self, _: BackendHandle) -> usize {
            self.faces.len() / 3
        }

        fn read_attribute(
            &self,
            _: BackendHandle,
            _: BackendHandle,
            unique_id: u32,
        ) -> Option<ResolvedAccessor> {
            (unique_id == 0)
                .then(|| ResolvedAccessor::new(AccessorData::F32(self.positions.clone()), 3))
        }

        fn read_faces(&self, _: BackendHandle) -> Option<Vec<u32>> {
            Some(self.faces.clone())
        }

        fn release(&self, handle: BackendHandle) {
            assert!(
                self.live.borrow_mut().remove(&handle.0),
                "double release of {handle:?}"
            );
        }
    }

    fn payload(ids: &[(&str, u32)]) -> DracoExtension {
        DracoExtension {
            buffer_view: 0,
            attributes: ids.iter().map(|(n, id)| (n.to_string(), *id)).collect(),
        }
    }

    #[test]
    fn decodes_triangle_and_releases_everything() {
        let backend = FakeBackend::triangle();
        let decoded = decode(&payload(&[("POSITION", 0)]), &[], &backend).unwrap();

        assert_eq!(decoded.point_count, 3);
        assert_eq!(decoded.attributes["POSITION"].count, 3);
        assert_eq!(decoded.indices, Some(IndexBuffer::U16(vec![0, 1, 2])));
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn point_cloud_has_no_indices() {
        let backend = FakeBackend::triangle().with_kind(GeometryKind::PointCloud);
        let decoded = decode(&payload(&[("POSITION", 0)]), &[], &backend).unwrap();
        assert!(decoded.indices.is_none());
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn invalid_kind_fails_and_releases() {
        let backend = FakeBackend::triangle().with_kind(GeometryKind::Invalid);
        let err = decode(&payload(&[("POSITION", 0)]), &[], &backend).unwrap_err();
        assert!(matches!(err, GltfError::DecodeFailure(_)));
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn failed_status_releases_returned_geometry() {
        let backend = FakeBackend::triangle().with_status(DecodeStatus::error("corrupt stream"));
        let err = decode(&payload(&[("POSITION", 0)]), &[], &backend).unwrap_err();
        assert_eq!(err.to_string(), "compressed geometry decode failed: corrupt stream");
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn null_geometry_is_a_failure() {
        let backend = FakeBackend::triangle().without_geometry();
        assert!(decode(&payload(&[("POSITION", 0)]), &[], &backend).is_err());
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn missing_attribute_fails_and_releases() {
        let backend = FakeBackend::triangle();
        let err = decode(&payload(&[("POSITION", 0), ("NORMAL", 7)]), &[], &backend).unwrap_err();
        assert!(matches!(err, GltfError::DecodeFailure(_)));
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn face_past_point_count_fails_and_releases() {
        let backend = FakeBackend {
            faces: vec![0, 1, 3],
            ..FakeBackend::triangle()
        };
        let err = decode(&payload(&[("POSITION", 0)]), &[], &backend).unwrap_err();
        assert!(matches!(err, GltfError::DecodeFailure(_)));
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn large_point_count_uses_wide_indices() {
        let backend = FakeBackend {
            positions: vec![0.0; 3 * 70_000],
            faces: vec![0, 1, 69_999],
            ..FakeBackend::triangle()
        };
        let decoded = decode(&payload(&[("POSITION", 0)]), &[], &backend).unwrap();
        assert_eq!(decoded.indices, Some(IndexBuffer::U32(vec![0, 1, 69_999])));
    }
}
