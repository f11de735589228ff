//! Variant catalog and application of variants to the scene graph.

use crate::scene::{NodeId, SceneGraph, SceneMesh};

use super::engine::{Field, FieldValue};

/// Material bound to one mesh slot by a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialOverride {
    pub slot: usize,
    pub material: usize,
}

/// What one variant changes on one node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeOverride {
    pub node: usize,
    pub visible: Option<bool>,
    pub materials: Vec<MaterialOverride>,
    pub mesh: Option<usize>,
}

impl NodeOverride {
    pub fn node_id(&self) -> NodeId {
        NodeId(self.node)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Variant {
    pub name: String,
    /// Selected when the asset loads.
    pub active: bool,
    /// Texture index of a preview image.
    pub thumbnail: Option<usize>,
    pub overrides: Vec<NodeOverride>,
}

/// Mutually exclusive variants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariantSet {
    pub name: String,
    pub variants: Vec<Variant>,
}

/// Named group of variant sets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LevelVariantSet {
    pub name: String,
    pub variant_sets: Vec<VariantSet>,
}

/// All variant sets available for one scene.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariantCatalog {
    pub level_variant_sets: Vec<LevelVariantSet>,
}

impl VariantCatalog {
    /// Variant sets in field order.
    pub fn variant_sets(&self) -> impl Iterator<Item = &VariantSet> {
        self.level_variant_sets
            .iter()
            .flat_map(|level| level.variant_sets.iter())
    }

    /// One field per variant set. Value ids are variant indices; the default
    /// is the variant flagged `active`.
    pub fn fields(&self) -> Vec<Field> {
        self.variant_sets()
            .map(|set| {
                let values = set
                    .variants
                    .iter()
                    .enumerate()
                    .map(|(i, variant)| FieldValue {
                        id: i as u32,
                        name: variant.name.clone(),
                        is_default: variant.active,
                    })
                    .collect();
                Field::new(set.name.clone(), values)
            })
            .filter(|field| !field.values.is_empty())
            .collect()
    }

    /// Variant selected by `value` of field `field`.
    pub fn variant(&self, field: usize, value: u32) -> Option<&Variant> {
        self.variant_sets()
            .filter(|set| !set.variants.is_empty())
            .nth(field)?
            .variants
            .get(value as usize)
    }

    /// Mutable access to every variant, for validation passes.
    pub(crate) fn variants_mut(&mut self) -> impl Iterator<Item = &mut Variant> {
        self.level_variant_sets
            .iter_mut()
            .flat_map(|level| level.variant_sets.iter_mut())
            .flat_map(|set| set.variants.iter_mut())
    }
}

/// Apply a variant's overrides to the graph.
///
/// Each override swaps the mesh first (resetting slot materials to the new
/// mesh's own), then binds slot materials, then sets visibility. Material
/// overrides past the node's slot count are ignored. Returns the
/// nodes that were touched, in override order.
pub fn apply_variant(graph: &mut SceneGraph, meshes: &[SceneMesh], variant: &Variant) -> Vec<NodeId> {
    let mut changed = Vec::new();

    for o in &variant.overrides {
        let id = o.node_id();
        let Some(node) = graph.get_mut(id) else {
            continue;
        };

        if let Some(mesh) = o.mesh {
            node.mesh = Some(mesh);
            node.materials = meshes
                .get(mesh)
                .map(SceneMesh::default_materials)
                .unwrap_or_default();
        }
        for m in &o.materials {
            if let Some(slot) = node.materials.get_mut(m.slot) {
                *slot = Some(m.material);
            }
        }
        if let Some(visible) = o.visible {
            node.visible = visible;
        }

        if !changed.contains(&id) {
            changed.push(id);
        }
    }

    changed
}
