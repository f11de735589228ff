//! Binary container (GLB) reader and buffer resolution.

use std::borrow::Cow;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::document;
use super::error::GltfError;

pub(crate) const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
const GLB_VERSION: u32 = 2;
const GLB_HEADER_LEN: usize = 12;
const GLB_CHUNK_HEADER_LEN: usize = 8;
pub(crate) const GLB_CHUNK_JSON: u32 = 0x4E4F_534A; // "JSON"
pub(crate) const GLB_CHUNK_BIN: u32 = 0x004E_4942; // "BIN\0"

/// JSON document plus binary chunks, borrowed from the caller's bytes.
#[derive(Debug, Clone)]
pub struct Container<'a> {
    /// The JSON chunk (or the whole input for a `.gltf`).
    pub json: &'a [u8],
    /// `BIN\0` chunks in declaration order.
    pub binary_chunks: Vec<&'a [u8]>,
}

impl<'a> Container<'a> {
    /// Accepts either a `.gltf` JSON document or a `.glb` container.
    ///
    /// Input whose first non-whitespace byte is `{` is treated as JSON with no
    /// binary chunks. Everything else goes through [`read_container`].
    pub fn detect(bytes: &'a [u8]) -> Result<Self, GltfError> {
        let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
        if first == Some(&b'{') {
            return Ok(Self {
                json: bytes,
                binary_chunks: Vec::new(),
            });
        }
        read_container(bytes)
    }
}

/// Parse a GLB container.
///
/// Unknown chunk types are skipped. The first chunk must be JSON.
pub fn read_container(bytes: &[u8]) -> Result<Container<'_>, GltfError> {
    if bytes.len() < GLB_HEADER_LEN {
        return Err(malformed("input shorter than the GLB header"));
    }

    let magic = read_u32(bytes, 0);
    if magic != GLB_MAGIC {
        return Err(malformed(format!("bad magic 0x{magic:08X}")));
    }
    let version = read_u32(bytes, 4);
    if version != GLB_VERSION {
        return Err(malformed(format!("unsupported version {version}")));
    }
    let total = read_u32(bytes, 8) as usize;
    if total > bytes.len() {
        return Err(malformed(format!(
            "declared length {total} exceeds input of {} bytes",
            bytes.len()
        )));
    }

    let mut json = None;
    let mut binary_chunks = Vec::new();
    let mut offset = GLB_HEADER_LEN;

    while offset + GLB_CHUNK_HEADER_LEN <= total {
        let length = read_u32(bytes, offset) as usize;
        let kind = read_u32(bytes, offset + 4);
        let start = offset + GLB_CHUNK_HEADER_LEN;
        let end = start
            .checked_add(length)
            .filter(|&end| end <= total)
            .ok_or_else(|| {
                malformed(format!(
                    "chunk at offset {offset} declares {length} bytes, {} remain",
                    total - start
                ))
            })?;
        let payload = &bytes[start..end];

        match kind {
            GLB_CHUNK_JSON if json.is_none() && binary_chunks.is_empty() => json = Some(payload),
            GLB_CHUNK_JSON => return Err(malformed("unexpected second JSON chunk")),
            _ if json.is_none() => return Err(malformed("first chunk is not JSON")),
            GLB_CHUNK_BIN => binary_chunks.push(payload),
            _ => {}
        }
        offset = end;
    }

    let json = json.ok_or_else(|| malformed("missing JSON chunk"))?;
    Ok(Container {
        json,
        binary_chunks,
    })
}

/// Resolve every document buffer to bytes.
///
/// A buffer without a URI takes the next binary chunk. Data URIs are decoded
/// into owned bytes; external URIs are rejected since fetching is the
/// caller's job.
pub fn resolve_buffers<'a>(
    buffers: &[document::Buffer],
    container: &Container<'a>,
) -> Result<Vec<Cow<'a, [u8]>>, GltfError> {
    let mut chunks = container.binary_chunks.iter();
    buffers
        .iter()
        .enumerate()
        .map(|(index, buffer)| match buffer.uri.as_deref() {
            None => chunks
                .next()
                .map(|chunk| Cow::Borrowed(*chunk))
                .ok_or_else(|| {
                    GltfError::Buffer(format!("buffer {index} has no URI and no binary chunk"))
                }),
            Some(uri) if uri.starts_with("data:") => decode_data_uri(uri).map(Cow::Owned),
            Some(uri) => Err(GltfError::Buffer(format!(
                "buffer {index} references external URI {uri}"
            ))),
        })
        .collect()
}

/// Decode a base64 `data:` URI.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, GltfError> {
    let (header, payload) = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| GltfError::Buffer("invalid data URI".into()))?;
    if !header.ends_with(";base64") {
        return Err(GltfError::Buffer(format!(
            "data URI '{header}' is not base64 encoded"
        )));
    }
    STANDARD
        .decode(payload)
        .map_err(|e| GltfError::Buffer(format!("data URI: {e}")))
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn malformed(message: impl Into<String>) -> GltfError {
    GltfError::MalformedContainer(message.into())
}
