//! Loader integration tests over assets assembled in memory.

use serde_json::{Value, json};

use super::container::{GLB_CHUNK_BIN, GLB_CHUNK_JSON, GLB_MAGIC};

mod viewer_test;

/// Wrap a JSON document and an optional binary chunk into a GLB.
pub(crate) fn glb(json: &Value, bin: &[u8]) -> Vec<u8> {
    let mut json_bytes = serde_json::to_vec(json).unwrap();
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }
    let mut bin = bin.to_vec();
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let mut total = 12 + 8 + json_bytes.len();
    if !bin.is_empty() {
        total += 8 + bin.len();
    }

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&GLB_CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json_bytes);
    if !bin.is_empty() {
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&GLB_CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(&bin);
    }
    out
}

/// Collects binary data, buffer views and accessors for a test asset.
#[derive(Default)]
pub(crate) struct AssetBuilder {
    bin: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
}

impl AssetBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes as a new buffer view and return its index.
    pub(crate) fn view(&mut self, bytes: &[u8]) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        self.views.push(json!({
            "buffer": 0,
            "byteOffset": self.bin.len(),
            "byteLength": bytes.len(),
        }));
        self.bin.extend_from_slice(bytes);
        self.views.len() - 1
    }

    pub(crate) fn accessor(&mut self, accessor: Value) -> usize {
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    pub(crate) fn vec3(&mut self, values: &[[f32; 3]]) -> usize {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for v in values {
            for c in 0..3 {
                min[c] = min[c].min(v[c]);
                max[c] = max[c].max(v[c]);
            }
        }
        let view = self.view(bytemuck::cast_slice(values));
        self.accessor(json!({
            "bufferView": view,
            "componentType": 5126,
            "count": values.len(),
            "type": "VEC3",
            "min": min,
            "max": max,
        }))
    }

    pub(crate) fn scalars(&mut self, values: &[f32]) -> usize {
        let max = values.iter().copied().fold(f32::MIN, f32::max);
        let view = self.view(bytemuck::cast_slice(values));
        self.accessor(json!({
            "bufferView": view,
            "componentType": 5126,
            "count": values.len(),
            "type": "SCALAR",
            "max": [max],
        }))
    }

    pub(crate) fn indices(&mut self, values: &[u16]) -> usize {
        let view = self.view(bytemuck::cast_slice(values));
        self.accessor(json!({
            "bufferView": view,
            "componentType": 5123,
            "count": values.len(),
            "type": "SCALAR",
        }))
    }

    /// Merge buffers, views and accessors into `document` and pack a GLB.
    pub(crate) fn finish(self, mut document: Value) -> Vec<u8> {
        let root = document.as_object_mut().unwrap();
        root.insert("asset".into(), json!({"version": "2.0"}));
        if !self.bin.is_empty() {
            root.insert("buffers".into(), json!([{"byteLength": self.bin.len()}]));
        }
        root.insert("bufferViews".into(), Value::Array(self.views));
        root.insert("accessors".into(), Value::Array(self.accessors));
        glb(&document, &self.bin)
    }
}

pub(crate) const TRIANGLE: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

/// One indexed triangle, one node, one scene. `patch` edits the document
/// before packing.
pub(crate) fn triangle_glb(patch: impl FnOnce(&mut Value)) -> Vec<u8> {
    let mut builder = AssetBuilder::new();
    let positions = builder.vec3(&TRIANGLE);
    let indices = builder.indices(&[0, 1, 2]);
    let mut document = json!({
        "scene": 0,
        "scenes": [{"name": "Main", "nodes": [0]}],
        "nodes": [{"name": "Body", "mesh": 0}],
        "meshes": [{"name": "Triangle", "primitives": [
            {"attributes": {"POSITION": positions}, "indices": indices, "material": 0}
        ]}],
        "materials": [
            {"name": "Red", "pbrMetallicRoughness": {"baseColorFactor": [1.0, 0.0, 0.0, 1.0]}}
        ],
    });
    patch(&mut document);
    builder.finish(document)
}

/// Read back `count` floats at `offset` of every vertex.
pub(crate) fn read_channel(data: &[u8], stride: usize, offset: usize, count: usize) -> Vec<Vec<f32>> {
    data.chunks_exact(stride)
        .map(|vertex| {
            vertex[offset..offset + count * 4]
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect()
        })
        .collect()
}

pub(crate) fn block_on<F: std::future::Future>(future: F) -> F::Output {
    let _ = env_logger::builder().is_test(true).try_init();
    pollster::block_on(future)
}
