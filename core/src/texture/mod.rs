//! CPU-side texture types.
//!
//! Provides [`CpuTexture`] holding decoded RGBA8 pixels, plus the glTF
//! sampler state ([`TextureSampler`], [`FilterMode`], [`AddressMode`]) the host
//! needs to honor tiling.

use std::sync::Arc;

/// Texture filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest neighbor filtering.
    Nearest,
    /// Linear filtering.
    #[default]
    Linear,
}

impl FilterMode {
    /// Map a glTF filter constant; mipmap variants collapse to their base filter.
    pub fn from_gltf(value: u32) -> Self {
        match value {
            9728 | 9984 | 9986 => Self::Nearest,
            _ => Self::Linear,
        }
    }
}

/// Texture address mode (wrapping behavior).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Clamp to edge.
    ClampToEdge,
    /// Repeat.
    #[default]
    Repeat,
    /// Mirrored repeat.
    MirrorRepeat,
}

impl AddressMode {
    /// Map a glTF wrap constant.
    pub fn from_gltf(value: u32) -> Self {
        match value {
            33071 => Self::ClampToEdge,
            33648 => Self::MirrorRepeat,
            _ => Self::Repeat,
        }
    }
}

/// Sampling state for a texture. glTF defaults to linear filtering and repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureSampler {
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Address mode along U.
    pub wrap_u: AddressMode,
    /// Address mode along V.
    pub wrap_v: AddressMode,
}

/// Decoded texture pixels in RGBA8.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuTexture {
    /// Texture name, if any.
    pub name: Option<String>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8 rows.
    pub data: Vec<u8>,
    /// Sampling state.
    pub sampler: TextureSampler,
}

impl CpuTexture {
    /// Number of bytes expected for the declared dimensions.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Decoded textures indexed like the document's `textures` array.
///
/// An entry is `None` when the texture's image could not be decoded or
/// texture decoding is disabled.
pub type TextureTable = Vec<Option<Arc<CpuTexture>>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gltf_sampler_constants() {
        assert_eq!(FilterMode::from_gltf(9728), FilterMode::Nearest);
        assert_eq!(FilterMode::from_gltf(9987), FilterMode::Linear);
        assert_eq!(AddressMode::from_gltf(33071), AddressMode::ClampToEdge);
        assert_eq!(AddressMode::from_gltf(33648), AddressMode::MirrorRepeat);
        assert_eq!(AddressMode::from_gltf(10497), AddressMode::Repeat);
    }

    #[test]
    fn default_sampler_repeats() {
        let s = TextureSampler::default();
        assert_eq!(s.wrap_u, AddressMode::Repeat);
        assert_eq!(s.mag_filter, FilterMode::Linear);
    }
}
