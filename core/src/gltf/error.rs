//! Error types for glTF loading.

use crate::compute::Cancelled;

/// Errors that can occur while translating a glTF asset.
///
/// Container, document, buffer and extension failures abort the whole load.
/// Accessor, attribute, decode and topology failures are scoped to a single
/// primitive; the loader skips that primitive and keeps going.
#[derive(Debug, thiserror::Error)]
pub enum GltfError {
    /// The GLB header or chunk table is invalid.
    #[error("malformed container: {0}")]
    MalformedContainer(String),
    /// The JSON document failed to parse.
    #[error("glTF document error: {0}")]
    Document(#[from] serde_json::Error),
    /// A buffer could not be resolved.
    #[error("buffer error: {0}")]
    Buffer(String),
    /// An accessor read falls outside its buffer view or buffer.
    #[error("accessor {accessor} out of bounds: {reason}")]
    AccessorOutOfBounds {
        /// Accessor index in the document.
        accessor: usize,
        /// What overflowed.
        reason: String,
    },
    /// A primitive lacks a usable attribute it cannot be built without.
    #[error("mesh {mesh} primitive {primitive} is missing {attribute}")]
    MissingRequiredAttribute {
        /// Mesh index in the document.
        mesh: usize,
        /// Primitive index within the mesh.
        primitive: usize,
        /// glTF attribute name.
        attribute: &'static str,
    },
    /// The compressed-geometry backend reported a failure.
    #[error("compressed geometry decode failed: {0}")]
    DecodeFailure(String),
    /// Line loops and triangle fans are not translated.
    #[error("unsupported primitive mode {0}")]
    UnsupportedTopology(u32),
    /// An embedded image could not be decoded.
    #[error("image decode error: {0}")]
    ImageDecode(String),
    /// An extension callback rejected its payload.
    #[error("extension {name}: {message}")]
    Extension {
        /// Extension name.
        name: String,
        /// Failure description.
        message: String,
    },
    /// The load was cancelled at a checkpoint.
    #[error("load cancelled")]
    Cancelled,
}

impl GltfError {
    /// Helper for extension parsers.
    pub fn extension(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extension {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Whether the error only invalidates one primitive.
    pub fn is_primitive_scoped(&self) -> bool {
        matches!(
            self,
            Self::AccessorOutOfBounds { .. }
                | Self::MissingRequiredAttribute { .. }
                | Self::DecodeFailure(_)
                | Self::UnsupportedTopology(_)
        )
    }
}

impl From<Cancelled> for GltfError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}
