//! Accessor resolution: typed reads out of buffer views.
//!
//! Everything here is pure. Errors are returned to the loader, which decides
//! whether they are fatal.

use std::borrow::Cow;

use super::document::{Accessor, BufferView, ComponentType, Document};
use super::error::GltfError;

/// Component array read from an accessor, in the accessor's own type.
///
/// Normalized integer accessors are always resolved to [`AccessorData::F32`].
#[derive(Debug, Clone, PartialEq)]
pub enum AccessorData {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    F32(Vec<f32>),
}

impl AccessorData {
    fn zeroed(component_type: ComponentType, len: usize) -> Self {
        match component_type {
            ComponentType::I8 => Self::I8(vec![0; len]),
            ComponentType::U8 => Self::U8(vec![0; len]),
            ComponentType::I16 => Self::I16(vec![0; len]),
            ComponentType::U16 => Self::U16(vec![0; len]),
            ComponentType::U32 => Self::U32(vec![0; len]),
            ComponentType::F32 => Self::F32(vec![0.0; len]),
        }
    }

    /// Number of components (not elements).
    pub fn len(&self) -> usize {
        match self {
            Self::I8(v) => v.len(),
            Self::U8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map integer components into `[0, 1]` (unsigned) or `[-1, 1]` (signed).
    fn normalize(self) -> Self {
        match self {
            Self::I8(v) => Self::F32(v.into_iter().map(|x| (x as f32 / 127.0).max(-1.0)).collect()),
            Self::U8(v) => Self::F32(v.into_iter().map(|x| x as f32 / 255.0).collect()),
            Self::I16(v) => {
                Self::F32(v.into_iter().map(|x| (x as f32 / 32767.0).max(-1.0)).collect())
            }
            Self::U16(v) => Self::F32(v.into_iter().map(|x| x as f32 / 65535.0).collect()),
            Self::U32(v) => Self::F32(v.into_iter().map(|x| x as f32 / u32::MAX as f32).collect()),
            data @ Self::F32(_) => data,
        }
    }
}

/// A fully read accessor.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAccessor {
    /// Flat component array, `count * components` long.
    pub data: AccessorData,
    /// Components per element (1 for SCALAR, 3 for VEC3, ...).
    pub components: usize,
    /// Number of elements.
    pub count: usize,
}

impl ResolvedAccessor {
    pub fn new(data: AccessorData, components: usize) -> Self {
        let count = if components == 0 {
            0
        } else {
            data.len() / components
        };
        Self {
            data,
            components,
            count,
        }
    }

    /// All components as `f32`, converted numerically.
    pub fn to_f32(&self) -> Vec<f32> {
        match &self.data {
            AccessorData::I8(v) => v.iter().map(|&x| x as f32).collect(),
            AccessorData::U8(v) => v.iter().map(|&x| x as f32).collect(),
            AccessorData::I16(v) => v.iter().map(|&x| x as f32).collect(),
            AccessorData::U16(v) => v.iter().map(|&x| x as f32).collect(),
            AccessorData::U32(v) => v.iter().map(|&x| x as f32).collect(),
            AccessorData::F32(v) => v.clone(),
        }
    }

    /// All components as `u32`. Used for indices and joint ids.
    pub fn to_u32(&self) -> Vec<u32> {
        match &self.data {
            AccessorData::I8(v) => v.iter().map(|&x| x.max(0) as u32).collect(),
            AccessorData::U8(v) => v.iter().map(|&x| x as u32).collect(),
            AccessorData::I16(v) => v.iter().map(|&x| x.max(0) as u32).collect(),
            AccessorData::U16(v) => v.iter().map(|&x| x as u32).collect(),
            AccessorData::U32(v) => v.clone(),
            AccessorData::F32(v) => v.iter().map(|&x| x.max(0.0) as u32).collect(),
        }
    }

    /// Elements as fixed-size `f32` arrays.
    ///
    /// Extra source components are dropped; missing ones take `fill`.
    pub fn to_f32_array<const N: usize>(&self, fill: f32) -> Vec<[f32; N]> {
        let flat = self.to_f32();
        let take = self.components.min(N);
        (0..self.count)
            .map(|i| {
                let mut out = [fill; N];
                let base = i * self.components;
                out[..take].copy_from_slice(&flat[base..base + take]);
                out
            })
            .collect()
    }
}

/// Resolve an accessor by index.
pub fn resolve_index(
    document: &Document,
    buffers: &[Cow<'_, [u8]>],
    index: usize,
) -> Result<ResolvedAccessor, GltfError> {
    let accessor = document
        .accessors
        .get(index)
        .ok_or_else(|| out_of_bounds(index, "accessor does not exist"))?;
    resolve(index, accessor, &document.buffer_views, buffers)
}

/// Largest element count a view-less accessor may zero-fill.
const MAX_VIEWLESS_COUNT: usize = 1 << 24;

/// Read an accessor's elements from its buffer view.
///
/// The element stride is the view's `byteStride` or the tightly packed
/// element size. An accessor without a buffer view resolves to zeros, up to
/// [`MAX_VIEWLESS_COUNT`] elements.
pub fn resolve(
    index: usize,
    accessor: &Accessor,
    views: &[BufferView],
    buffers: &[Cow<'_, [u8]>],
) -> Result<ResolvedAccessor, GltfError> {
    let components = accessor.kind.components();
    let element_size = accessor.element_size();

    let Some(view_index) = accessor.buffer_view else {
        let len = accessor
            .count
            .checked_mul(components)
            .filter(|_| accessor.count <= MAX_VIEWLESS_COUNT)
            .ok_or_else(|| {
                out_of_bounds(index, format!("{} elements without a buffer view", accessor.count))
            })?;
        let data = AccessorData::zeroed(accessor.component_type, len);
        return Ok(ResolvedAccessor::new(data, components));
    };

    let view = views
        .get(view_index)
        .ok_or_else(|| out_of_bounds(index, format!("buffer view {view_index} does not exist")))?;
    let buffer = buffers
        .get(view.buffer)
        .ok_or_else(|| out_of_bounds(index, format!("buffer {} does not exist", view.buffer)))?;

    let view_end = view
        .byte_offset
        .checked_add(view.byte_length)
        .filter(|&end| end <= buffer.len())
        .ok_or_else(|| {
            out_of_bounds(
                index,
                format!(
                    "buffer view {view_index} spans {}..{} of a {}-byte buffer",
                    view.byte_offset,
                    view.byte_offset.saturating_add(view.byte_length),
                    buffer.len()
                ),
            )
        })?;
    let view_bytes = &buffer[view.byte_offset..view_end];

    let stride = view.byte_stride.unwrap_or(element_size);
    if stride < element_size {
        return Err(out_of_bounds(
            index,
            format!("stride {stride} is smaller than element size {element_size}"),
        ));
    }

    let span = match accessor.count {
        0 => 0,
        n => (n - 1)
            .checked_mul(stride)
            .and_then(|s| s.checked_add(element_size))
            .ok_or_else(|| out_of_bounds(index, "read range overflows"))?,
    };
    let read_end = accessor
        .byte_offset
        .checked_add(span)
        .filter(|&end| end <= view_bytes.len())
        .ok_or_else(|| {
            out_of_bounds(
                index,
                format!(
                    "reads {span} bytes at offset {} of a {}-byte view",
                    accessor.byte_offset,
                    view_bytes.len()
                ),
            )
        })?;
    let bytes = &view_bytes[accessor.byte_offset..read_end];

    let count = accessor.count;
    let data = match accessor.component_type {
        ComponentType::I8 => AccessorData::I8(gather(bytes, stride, count, components, i8::from_le_bytes)),
        ComponentType::U8 => AccessorData::U8(gather(bytes, stride, count, components, u8::from_le_bytes)),
        ComponentType::I16 => {
            AccessorData::I16(gather(bytes, stride, count, components, i16::from_le_bytes))
        }
        ComponentType::U16 => {
            AccessorData::U16(gather(bytes, stride, count, components, u16::from_le_bytes))
        }
        ComponentType::U32 => {
            AccessorData::U32(gather(bytes, stride, count, components, u32::from_le_bytes))
        }
        ComponentType::F32 => {
            AccessorData::F32(gather(bytes, stride, count, components, f32::from_le_bytes))
        }
    };
    let data = if accessor.normalized {
        data.normalize()
    } else {
        data
    };

    Ok(ResolvedAccessor {
        data,
        components,
        count,
    })
}

/// Copy `count` strided elements of `components` little-endian values each.
fn gather<const N: usize, T>(
    bytes: &[u8],
    stride: usize,
    count: usize,
    components: usize,
    decode: fn([u8; N]) -> T,
) -> Vec<T> {
    let mut out = Vec::with_capacity(count * components);
    for i in 0..count {
        let base = i * stride;
        for c in 0..components {
            let at = base + c * N;
            let mut raw = [0u8; N];
            raw.copy_from_slice(&bytes[at..at + N]);
            out.push(decode(raw));
        }
    }
    out
}

fn out_of_bounds(accessor: usize, reason: impl Into<String>) -> GltfError {
    GltfError::AccessorOutOfBounds {
        accessor,
        reason: reason.into(),
    }
}
