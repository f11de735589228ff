use std::borrow::Cow;
use std::collections::BTreeMap;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

use vitrine_core::configurator::{Configurator, Field, FieldValue};
use vitrine_core::gltf::accessor::{self, AccessorData, ResolvedAccessor};
use vitrine_core::gltf::document::{Accessor, BufferView};
use vitrine_core::gltf::geometry::{GeometryBuilder, GeometryInput, generate_normals};
use vitrine_core::mesh::VertexAttributeSemantic;

/// A `size` x `size` vertex grid in the XY plane, two triangles per cell.
fn grid(size: u32) -> (Vec<[f32; 3]>, Vec<u32>) {
    let mut positions = Vec::with_capacity((size * size) as usize);
    for y in 0..size {
        for x in 0..size {
            positions.push([x as f32, y as f32, 0.0]);
        }
    }
    let mut indices = Vec::new();
    for y in 0..size - 1 {
        for x in 0..size - 1 {
            let i = y * size + x;
            indices.extend_from_slice(&[i, i + 1, i + size, i + 1, i + size + 1, i + size]);
        }
    }
    (positions, indices)
}

// ---------------------------------------------------------------------------
// Accessor resolution
// ---------------------------------------------------------------------------

fn bench_resolve_interleaved(c: &mut Criterion) {
    let count = 65_536usize;
    let stride = 32usize;
    let bytes = vec![0u8; count * stride];
    let buffers = [Cow::Borrowed(bytes.as_slice())];
    let views: Vec<BufferView> = serde_json::from_value(json!([
        {"buffer": 0, "byteLength": bytes.len(), "byteStride": stride}
    ]))
    .unwrap();
    let accessor: Accessor = serde_json::from_value(json!({
        "bufferView": 0, "byteOffset": 12, "componentType": 5126, "count": count, "type": "VEC3"
    }))
    .unwrap();

    c.bench_function("resolve_vec3_interleaved_64k", |b| {
        b.iter(|| accessor::resolve(0, black_box(&accessor), &views, &buffers).unwrap());
    });
}

fn bench_resolve_normalized_colors(c: &mut Criterion) {
    let count = 65_536usize;
    let bytes = vec![200u8; count * 4];
    let buffers = [Cow::Borrowed(bytes.as_slice())];
    let views: Vec<BufferView> =
        serde_json::from_value(json!([{"buffer": 0, "byteLength": bytes.len()}])).unwrap();
    let accessor: Accessor = serde_json::from_value(json!({
        "bufferView": 0, "componentType": 5121, "normalized": true, "count": count, "type": "VEC4"
    }))
    .unwrap();

    c.bench_function("resolve_unorm8x4_64k", |b| {
        b.iter(|| accessor::resolve(0, black_box(&accessor), &views, &buffers).unwrap());
    });
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

fn bench_generate_normals(c: &mut Criterion) {
    let (positions, indices) = grid(256);
    c.bench_function("generate_normals_256x256", |b| {
        b.iter(|| generate_normals(black_box(&positions), black_box(&indices)));
    });
}

fn bench_build_primitive(c: &mut Criterion) {
    let (positions, indices) = grid(128);
    let flat: Vec<f32> = positions.iter().flatten().copied().collect();
    let mut attributes = BTreeMap::new();
    attributes.insert(
        VertexAttributeSemantic::Position,
        ResolvedAccessor::new(AccessorData::F32(flat), 3),
    );
    let input = GeometryInput {
        mode: 4,
        attributes,
        indices: Some(indices),
        ..GeometryInput::default()
    };

    c.bench_function("build_primitive_128x128_with_normals", |b| {
        let mut builder = GeometryBuilder::new(true);
        b.iter(|| builder.build_primitive(black_box(input.clone())).unwrap());
    });
}

// ---------------------------------------------------------------------------
// Configurator
// ---------------------------------------------------------------------------

fn bench_configurator_set_value(c: &mut Criterion) {
    let fields = (0..16)
        .map(|f| {
            let values = (0..8).map(|v| FieldValue::new(v, format!("v{v}"))).collect();
            Field::new(format!("field{f}"), values)
        })
        .collect();
    let mut configurator = Configurator::new(fields).unwrap();
    for field in 0..16 {
        configurator
            .on_value_change(field, |v| {
                black_box(v);
            })
            .unwrap();
    }

    c.bench_function("configurator_set_value_16x8", |b| {
        let mut value = 0;
        b.iter(|| {
            value = (value + 1) % 8;
            for field in 0..16 {
                configurator.set_value(field, black_box(value)).unwrap();
            }
        });
    });
}

criterion_group!(
    accessor_benches,
    bench_resolve_interleaved,
    bench_resolve_normalized_colors,
);

criterion_group!(geometry_benches, bench_generate_normals, bench_build_primitive);

criterion_group!(configurator_benches, bench_configurator_set_value);

criterion_main!(accessor_benches, geometry_benches, configurator_benches);
