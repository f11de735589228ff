//! Embedded image decoding into [`CpuTexture`]s.

use std::borrow::Cow;

use crate::texture::{AddressMode, CpuTexture, FilterMode, TextureSampler};

use super::container::decode_data_uri;
use super::document::{Document, Sampler};
use super::error::GltfError;

/// Decode the image behind glTF texture `index`.
///
/// Images come from a buffer view or a base64 data URI. External URIs are
/// reported as [`GltfError::ImageDecode`].
pub fn decode_texture(
    document: &Document,
    buffers: &[Cow<'_, [u8]>],
    index: usize,
) -> Result<CpuTexture, GltfError> {
    let texture = document
        .textures
        .get(index)
        .ok_or_else(|| GltfError::ImageDecode(format!("texture {index} does not exist")))?;
    let source = texture
        .source
        .ok_or_else(|| GltfError::ImageDecode(format!("texture {index} has no source image")))?;
    let image = document
        .images
        .get(source)
        .ok_or_else(|| GltfError::ImageDecode(format!("image {source} does not exist")))?;

    let bytes: Cow<'_, [u8]> = match (&image.buffer_view, &image.uri) {
        (Some(view_index), _) => {
            let view = document.buffer_views.get(*view_index).ok_or_else(|| {
                GltfError::ImageDecode(format!("buffer view {view_index} does not exist"))
            })?;
            let slice = buffers
                .get(view.buffer)
                .and_then(|buffer| {
                    let end = view.byte_offset.checked_add(view.byte_length)?;
                    buffer.get(view.byte_offset..end)
                })
                .ok_or_else(|| {
                    GltfError::ImageDecode(format!("image {source} lies outside its buffer"))
                })?;
            Cow::Borrowed(slice)
        }
        (None, Some(uri)) if uri.starts_with("data:") => Cow::Owned(
            decode_data_uri(uri).map_err(|e| GltfError::ImageDecode(e.to_string()))?,
        ),
        (None, Some(uri)) => {
            return Err(GltfError::ImageDecode(format!(
                "external URI images not supported: {uri}"
            )));
        }
        (None, None) => {
            return Err(GltfError::ImageDecode(format!("image {source} has no data")));
        }
    };

    let (width, height, data) = decode_rgba8(&bytes)?;
    let sampler = texture
        .sampler
        .and_then(|s| document.samplers.get(s))
        .map(map_sampler)
        .unwrap_or_default();

    Ok(CpuTexture {
        name: texture.name.clone().or_else(|| image.name.clone()),
        width,
        height,
        data,
        sampler,
    })
}

/// Decode image bytes to RGBA8 using the `image` crate.
#[cfg(feature = "textures")]
fn decode_rgba8(bytes: &[u8]) -> Result<(u32, u32, Vec<u8>), GltfError> {
    let img = image::load_from_memory(bytes).map_err(|e| GltfError::ImageDecode(e.to_string()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok((width, height, rgba.into_raw()))
}

#[cfg(not(feature = "textures"))]
fn decode_rgba8(_bytes: &[u8]) -> Result<(u32, u32, Vec<u8>), GltfError> {
    Err(GltfError::ImageDecode(
        "built without the `textures` feature".into(),
    ))
}

fn map_sampler(sampler: &Sampler) -> TextureSampler {
    TextureSampler {
        mag_filter: sampler.mag_filter.map(FilterMode::from_gltf).unwrap_or_default(),
        min_filter: sampler.min_filter.map(FilterMode::from_gltf).unwrap_or_default(),
        wrap_u: AddressMode::from_gltf(sampler.wrap_s),
        wrap_v: AddressMode::from_gltf(sampler.wrap_t),
    }
}
