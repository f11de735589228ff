//! Renderer-native material parameters.
//!
//! - [`MaterialParameters`] — Flat parameter set the host turns into a material
//! - [`MaterialSemantic`] / [`MaterialValue`] — Tagged, typed parameters
//! - [`TextureSlot`] — Texture + UV set + channel + UV transform
//! - [`AlphaMode`] / [`CullMode`] — Pipeline state
//! - [`color`] — Gamma conversion helpers

pub mod color;
mod types;

pub use types::{
    AlphaMode, CullMode, MaterialParameter, MaterialParameters, MaterialSemantic, MaterialValue,
    TextureChannel, TextureSlot,
};
