//! Scene graph types for representing loaded scenes.
//!
//! These types are format-agnostic: the glTF loader produces them, variant
//! overrides mutate them and a [`SceneHost`](crate::host::SceneHost) mirrors
//! them.
//!
//! - [`SceneGraph`] / [`SceneNode`] — Arena of nodes addressed by [`NodeId`]
//! - [`Scene`] — Root nodes plus scene-level extension results
//! - [`NodeTransform`] — TRS transform using plain arrays
//! - [`SceneMesh`] / [`MeshPrimitive`] — Built primitives with material slots
//! - [`SceneCamera`] / [`CameraProjection`] — Camera definitions
//! - [`SceneSummary`] — What a UI lists about a scene

mod summary;
mod types;

pub use summary::SceneSummary;
pub use types::{
    AnimationSummary, CameraProjection, MeshPrimitive, NodeId, NodeTransform, Scene, SceneCamera,
    SceneGraph, SceneMesh, SceneNode,
};
