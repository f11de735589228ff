//! `EPIC_level_variant_sets`: variant catalogs per scene.
//!
//! The document root declares every level variant set; a scene's payload
//! lists the ones it uses by index.

use serde::Deserialize;
use serde_json::Value;

use crate::configurator::{
    LevelVariantSet, MaterialOverride, NodeOverride, Variant, VariantCatalog, VariantSet,
};
use crate::gltf::{GltfError, LoadedAsset};
use crate::scene::Scene;

use super::registry::{
    ExtensionCallback, ExtensionRegistry, PostParseExtension, SceneContext, SceneExtension,
};

pub const EXTENSION_NAME: &str = "EPIC_level_variant_sets";

pub(crate) fn register(registry: &mut ExtensionRegistry) {
    registry.register(EXTENSION_NAME, ExtensionCallback::Scene(Box::new(LevelVariantSets)));
    registry.register(
        EXTENSION_NAME,
        ExtensionCallback::PostParse(Box::new(LevelVariantSets)),
    );
}

/// Parser for `EPIC_level_variant_sets`.
pub struct LevelVariantSets;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RootPayload {
    #[serde(default)]
    level_variant_sets: Vec<RawLevelVariantSet>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScenePayload {
    #[serde(default)]
    level_variant_sets: Vec<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLevelVariantSet {
    #[serde(default)]
    name: String,
    #[serde(default)]
    variant_sets: Vec<RawVariantSet>,
}

#[derive(Deserialize)]
struct RawVariantSet {
    #[serde(default)]
    name: String,
    #[serde(default)]
    variants: Vec<RawVariant>,
}

#[derive(Deserialize)]
struct RawVariant {
    #[serde(default)]
    name: String,
    #[serde(default)]
    active: bool,
    thumbnail: Option<usize>,
    #[serde(default)]
    nodes: Vec<RawNodeOverride>,
}

#[derive(Deserialize)]
struct RawNodeOverride {
    node: usize,
    #[serde(default)]
    properties: RawProperties,
}

#[derive(Deserialize, Default)]
struct RawProperties {
    visible: Option<bool>,
    #[serde(default)]
    materials: Vec<RawMaterialOverride>,
    mesh: Option<usize>,
}

#[derive(Deserialize)]
struct RawMaterialOverride {
    index: usize,
    material: usize,
}

impl From<RawLevelVariantSet> for LevelVariantSet {
    fn from(raw: RawLevelVariantSet) -> Self {
        Self {
            name: raw.name,
            variant_sets: raw
                .variant_sets
                .into_iter()
                .map(|set| VariantSet {
                    name: set.name,
                    variants: set.variants.into_iter().map(Variant::from).collect(),
                })
                .collect(),
        }
    }
}

impl From<RawVariant> for Variant {
    fn from(raw: RawVariant) -> Self {
        Self {
            name: raw.name,
            active: raw.active,
            thumbnail: raw.thumbnail,
            overrides: raw
                .nodes
                .into_iter()
                .map(|n| NodeOverride {
                    node: n.node,
                    visible: n.properties.visible,
                    materials: n
                        .properties
                        .materials
                        .into_iter()
                        .map(|m| MaterialOverride {
                            slot: m.index,
                            material: m.material,
                        })
                        .collect(),
                    mesh: n.properties.mesh,
                })
                .collect(),
        }
    }
}

fn parse<T: for<'de> Deserialize<'de>>(value: &Value) -> Result<T, GltfError> {
    T::deserialize(value).map_err(|e| GltfError::extension(EXTENSION_NAME, e.to_string()))
}

impl SceneExtension for LevelVariantSets {
    fn parse_scene(
        &self,
        scene: &mut Scene,
        payload: &Value,
        cx: &SceneContext<'_>,
    ) -> Result<(), GltfError> {
        let used: ScenePayload = parse(payload)?;
        let root: RootPayload = match cx.document.extension(EXTENSION_NAME) {
            Some(value) => parse(value)?,
            None => {
                return Err(GltfError::extension(
                    EXTENSION_NAME,
                    "scene references variant sets but the document declares none",
                ));
            }
        };

        let mut declared: Vec<Option<RawLevelVariantSet>> =
            root.level_variant_sets.into_iter().map(Some).collect();
        let mut catalog = VariantCatalog::default();
        for index in used.level_variant_sets {
            let Some(slot) = declared.get_mut(index) else {
                return Err(GltfError::extension(
                    EXTENSION_NAME,
                    format!("scene {} references missing level variant set {index}", cx.scene_index),
                ));
            };
            let Some(level) = slot.take() else {
                log::warn!(
                    "Scene {} lists level variant set {index} more than once, ignoring the repeat",
                    cx.scene_index
                );
                continue;
            };
            catalog.level_variant_sets.push(level.into());
        }

        log::debug!(
            "Scene {} has {} variant sets",
            cx.scene_index,
            catalog.variant_sets().count()
        );
        scene.outputs.insert(EXTENSION_NAME, catalog);
        Ok(())
    }
}

impl PostParseExtension for LevelVariantSets {
    /// Drop overrides that point at nodes, meshes, materials or material
    /// slots the asset does not have.
    fn post_parse(&self, asset: &mut LoadedAsset) -> Result<(), GltfError> {
        let graph = &asset.graph;
        let meshes = &asset.meshes;
        let material_count = asset.materials.len();

        for scene in &mut asset.scenes {
            let Some(catalog) = scene.outputs.get_mut::<VariantCatalog>(EXTENSION_NAME) else {
                continue;
            };
            for variant in catalog.variants_mut() {
                variant.overrides.retain_mut(|o| {
                    let Some(node) = graph.get(o.node_id()) else {
                        log::warn!(
                            "Variant '{}' references missing node {}, dropping override",
                            variant.name,
                            o.node
                        );
                        return false;
                    };
                    if o.mesh.is_some_and(|m| m >= meshes.len()) {
                        log::warn!(
                            "Variant '{}' references missing mesh {:?}, ignoring mesh swap",
                            variant.name,
                            o.mesh
                        );
                        o.mesh = None;
                    }
                    let slot_count = o
                        .mesh
                        .or(node.mesh)
                        .and_then(|m| meshes.get(m))
                        .map_or(0, |m| m.slot_count);
                    o.materials.retain(|m| {
                        if m.material >= material_count {
                            log::warn!(
                                "Variant '{}' references missing material {}",
                                variant.name,
                                m.material
                            );
                            return false;
                        }
                        if m.slot >= slot_count {
                            log::warn!(
                                "Variant '{}' targets material slot {} of node {}, which has {slot_count}",
                                variant.name,
                                m.slot,
                                o.node
                            );
                            return false;
                        }
                        true
                    });
                    true
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gltf::document::Document;
    use crate::scene::SceneGraph;
    use serde_json::json;

    fn document() -> Document {
        serde_json::from_value(json!({
            "extensions": {"EPIC_level_variant_sets": {"levelVariantSets": [
                {"name": "Unused", "variantSets": []},
                {"name": "Car", "variantSets": [{"name": "Paint", "variants": [
                    {"name": "Red", "active": true, "nodes": [
                        {"node": 0, "properties": {"materials": [{"index": 0, "material": 1}]}}
                    ]},
                    {"name": "Hidden", "thumbnail": 2, "nodes": [
                        {"node": 0, "properties": {"visible": false, "mesh": 3}}
                    ]}
                ]}]}
            ]}}
        }))
        .unwrap()
    }

    fn parse_scene(document: &Document, payload: Value) -> Result<Scene, GltfError> {
        let graph = SceneGraph::new();
        let cx = SceneContext {
            document,
            scene_index: 0,
            graph: &graph,
        };
        let mut scene = Scene::new();
        LevelVariantSets.parse_scene(&mut scene, &payload, &cx)?;
        Ok(scene)
    }

    #[test]
    fn builds_catalog_from_scene_references() {
        let scene = parse_scene(&document(), json!({"levelVariantSets": [1]})).unwrap();
        let catalog = scene.outputs.get::<VariantCatalog>(EXTENSION_NAME).unwrap();

        assert_eq!(catalog.level_variant_sets.len(), 1);
        assert_eq!(catalog.level_variant_sets[0].name, "Car");
        let red = catalog.variant(0, 0).unwrap();
        assert!(red.active);
        assert_eq!(red.overrides[0].materials, vec![MaterialOverride { slot: 0, material: 1 }]);
        let hidden = catalog.variant(0, 1).unwrap();
        assert_eq!(hidden.thumbnail, Some(2));
        assert_eq!(hidden.overrides[0].visible, Some(false));
        assert_eq!(hidden.overrides[0].mesh, Some(3));
    }

    #[test]
    fn repeated_level_reference_is_listed_once() {
        let scene = parse_scene(&document(), json!({"levelVariantSets": [1, 1]})).unwrap();
        let catalog = scene.outputs.get::<VariantCatalog>(EXTENSION_NAME).unwrap();
        assert_eq!(catalog.level_variant_sets.len(), 1);
        assert_eq!(catalog.level_variant_sets[0].name, "Car");
    }

    #[test]
    fn missing_level_index_aborts() {
        let err = parse_scene(&document(), json!({"levelVariantSets": [7]})).unwrap_err();
        assert!(matches!(err, GltfError::Extension { .. }));
    }

    #[test]
    fn malformed_payload_aborts() {
        let err = parse_scene(&document(), json!({"levelVariantSets": "all"})).unwrap_err();
        assert!(matches!(err, GltfError::Extension { .. }));
    }

    #[test]
    fn missing_root_declaration_aborts() {
        let err = parse_scene(&Document::default(), json!({"levelVariantSets": [0]})).unwrap_err();
        assert!(err.to_string().contains(EXTENSION_NAME));
    }
}
