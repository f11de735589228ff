//! # Vitrine Core
//!
//! glTF scene translation and variant configuration for product viewers.
//!
//! - [`gltf`] — Container, accessors, geometry, materials and the load pipeline
//! - [`extension`] — Extension registry and the built-in parsers
//! - [`configurator`] — Field/value configuration engine over variant sets
//! - [`viewer`] — Attaches loaded assets to a [`host::SceneHost`]

pub mod compute;
pub mod configurator;
pub mod extension;
pub mod gltf;
pub mod host;
pub mod material;
pub mod mesh;
pub mod scene;
pub mod settings;
pub mod texture;
pub mod viewer;

pub use gltf::{GltfError, LoadedAsset, load_asset};
pub use viewer::{Viewer, ViewerError};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
