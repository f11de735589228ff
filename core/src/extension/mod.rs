//! glTF extension parsing.
//!
//! - [`ExtensionRegistry`] — Ordered table of node, scene and post-parse callbacks
//! - [`ExtensionOutputs`] — Typed side tables filled by parsers
//! - [`variants`], [`hotspots`], [`backdrop`] — Built-in parsers

mod outputs;
mod registry;

pub mod backdrop;
pub mod hotspots;
pub mod variants;

pub use outputs::ExtensionOutputs;
pub use registry::{
    ExtensionCallback, ExtensionRegistry, NodeContext, NodeExtension, PostParseExtension,
    SceneContext, SceneExtension,
};
