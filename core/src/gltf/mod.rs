//! glTF 2.0 scene translation.
//!
//! Turns `.glb` / embedded `.gltf` bytes into a [`LoadedAsset`]: a node
//! graph, renderer-ready meshes, flat material parameters, decoded textures
//! and the results of extension parsers.
//!
//! # Stages
//!
//! - [`container`] — GLB framing and buffer resolution
//! - [`accessor`] — Typed reads of accessor data
//! - [`draco`] — Compressed geometry through a [`DecoderBackend`]
//! - [`geometry`] — Interleaved vertex buffers, normals, morph targets
//! - [`material`] — PBR parameters to flat material parameters
//! - [`texture`] — Embedded image decoding
//!
//! # Example
//!
//! ```ignore
//! use vitrine_core::compute::CancellationToken;
//! use vitrine_core::extension::ExtensionRegistry;
//! use vitrine_core::gltf::load_asset;
//! use vitrine_core::settings::LoaderSettings;
//!
//! let data = std::fs::read("car.glb")?;
//! let registry = ExtensionRegistry::with_builtin_parsers();
//! let asset = pollster::block_on(load_asset(
//!     &data,
//!     &registry,
//!     None,
//!     &LoaderSettings::default(),
//!     &CancellationToken::new(),
//! ))?;
//! println!("Variant sets: {:?}", asset.summary().variant_fields);
//! ```

pub mod accessor;
pub mod container;
pub mod document;
pub mod draco;
mod error;
pub mod geometry;
mod loader;
pub mod material;
#[cfg(test)]
pub(crate) mod tests;
pub mod texture;
mod types;
mod vertex;

pub use draco::DecoderBackend;
pub use error::GltfError;
pub use loader::load_asset;
pub use types::LoadedAsset;
