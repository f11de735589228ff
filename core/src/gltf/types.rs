//! Data types for glTF loading results.

use std::sync::Arc;

use crate::configurator::VariantCatalog;
use crate::extension::{ExtensionOutputs, backdrop, variants};
use crate::material::MaterialParameters;
use crate::mesh::VertexLayout;
use crate::scene::{
    AnimationSummary, Scene, SceneCamera, SceneGraph, SceneMesh, SceneSummary,
};
use crate::texture::TextureTable;

/// A fully translated glTF asset.
///
/// All scenes share one node [`SceneGraph`]; node ids below
/// `document.nodes.len()` equal the glTF node index, nodes synthesized by
/// extensions come after. Meshes, materials and textures are indexed like
/// the document's arrays.
#[derive(Debug, Default)]
pub struct LoadedAsset {
    pub graph: SceneGraph,
    pub scenes: Vec<Scene>,
    /// Index of the default scene, if specified.
    pub default_scene: Option<usize>,
    pub meshes: Vec<SceneMesh>,
    pub materials: Vec<MaterialParameters>,
    pub textures: TextureTable,
    pub cameras: Vec<SceneCamera>,
    pub animations: Vec<AnimationSummary>,
    /// Distinct vertex layouts used by the meshes.
    pub layouts: Vec<Arc<VertexLayout>>,
    /// Asset-level extension results (hotspots, backdrops).
    pub outputs: ExtensionOutputs,
}

impl LoadedAsset {
    /// Index of the scene to display: the default scene, else the first.
    pub fn active_scene_index(&self) -> Option<usize> {
        match self.default_scene {
            Some(index) if index < self.scenes.len() => Some(index),
            _ => (!self.scenes.is_empty()).then_some(0),
        }
    }

    pub fn active_scene(&self) -> Option<&Scene> {
        self.scenes.get(self.active_scene_index()?)
    }

    /// Variant catalog of the active scene, if it declares any.
    pub fn variant_catalog(&self) -> Option<&VariantCatalog> {
        self.active_scene()?
            .outputs
            .get::<VariantCatalog>(variants::EXTENSION_NAME)
    }

    pub fn summary(&self) -> SceneSummary {
        let cameras = self
            .cameras
            .iter()
            .enumerate()
            .map(|(i, camera)| camera.name.clone().unwrap_or_else(|| format!("Camera{i}")))
            .collect();
        let animations = self
            .animations
            .iter()
            .enumerate()
            .map(|(i, animation)| {
                let name = animation.name.clone().unwrap_or_else(|| format!("Animation{i}"));
                (name, animation.duration)
            })
            .collect();
        let has_backdrop = self
            .outputs
            .get::<Vec<backdrop::Backdrop>>(backdrop::EXTENSION_NAME)
            .is_some_and(|b| !b.is_empty());
        let variant_fields = self
            .variant_catalog()
            .map(|catalog| catalog.fields().into_iter().map(|f| f.name).collect())
            .unwrap_or_default();

        SceneSummary {
            cameras,
            animations,
            has_backdrop,
            variant_fields,
        }
    }
}
