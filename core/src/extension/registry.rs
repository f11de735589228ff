//! Name-keyed registry of extension parsers.
//!
//! Each entry holds up to three callbacks. The loader runs them in stages:
//! every node callback for every node, then every scene callback, then every
//! post-parse callback. Within a stage, entries run in registration order.

use indexmap::IndexMap;
use serde_json::Value;

use crate::gltf::document::Document;
use crate::gltf::{GltfError, LoadedAsset};
use crate::scene::{NodeId, Scene, SceneGraph, SceneNode};

use super::ExtensionOutputs;

/// State available to a node callback.
pub struct NodeContext<'a> {
    /// The whole document, for root-level definitions.
    pub document: &'a Document,
    /// Id of the node being parsed.
    pub node_id: NodeId,
    /// Asset-level side tables shared by all parsers.
    pub outputs: &'a mut ExtensionOutputs,
    next_id: usize,
    spawned: Vec<SceneNode>,
}

impl<'a> NodeContext<'a> {
    pub(crate) fn new(
        document: &'a Document,
        node_id: NodeId,
        outputs: &'a mut ExtensionOutputs,
        next_id: usize,
    ) -> Self {
        Self {
            document,
            node_id,
            outputs,
            next_id,
            spawned: Vec::new(),
        }
    }

    /// Queue a synthesized child of the current node.
    ///
    /// Returns the id the child will have once the callback returns.
    pub fn spawn_child(&mut self, node: SceneNode) -> NodeId {
        self.spawned.push(node);
        NodeId(self.next_id + self.spawned.len() - 1)
    }

    pub(crate) fn into_spawned(self) -> Vec<SceneNode> {
        self.spawned
    }
}

/// State available to a scene callback.
pub struct SceneContext<'a> {
    pub document: &'a Document,
    /// Index of the scene in the document.
    pub scene_index: usize,
    /// The finished node graph.
    pub graph: &'a SceneGraph,
}

/// Per-node stage.
pub trait NodeExtension {
    /// Receives the node with its raw payload and returns it, possibly
    /// modified.
    fn parse_node(
        &self,
        node: SceneNode,
        payload: &Value,
        cx: &mut NodeContext<'_>,
    ) -> Result<SceneNode, GltfError>;
}

/// Per-scene stage, after all nodes are materialized.
pub trait SceneExtension {
    fn parse_scene(
        &self,
        scene: &mut Scene,
        payload: &Value,
        cx: &SceneContext<'_>,
    ) -> Result<(), GltfError>;
}

/// Runs once per asset after every node and scene callback.
pub trait PostParseExtension {
    fn post_parse(&self, asset: &mut LoadedAsset) -> Result<(), GltfError>;
}

/// A callback for one stage of an extension.
pub enum ExtensionCallback {
    Node(Box<dyn NodeExtension>),
    Scene(Box<dyn SceneExtension>),
    PostParse(Box<dyn PostParseExtension>),
}

#[derive(Default)]
struct ExtensionEntry {
    node: Option<Box<dyn NodeExtension>>,
    scene: Option<Box<dyn SceneExtension>>,
    post_parse: Option<Box<dyn PostParseExtension>>,
}

/// Registration-ordered table of extension parsers.
#[derive(Default)]
pub struct ExtensionRegistry {
    entries: IndexMap<String, ExtensionEntry>,
}

impl ExtensionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the variant-set, hotspot and backdrop parsers.
    pub fn with_builtin_parsers() -> Self {
        let mut registry = Self::new();
        super::variants::register(&mut registry);
        super::hotspots::register(&mut registry);
        super::backdrop::register(&mut registry);
        registry
    }

    /// Register a stage callback, replacing any previous callback for the
    /// same extension and stage.
    pub fn register(&mut self, name: impl Into<String>, callback: ExtensionCallback) {
        let entry = self.entries.entry(name.into()).or_default();
        match callback {
            ExtensionCallback::Node(cb) => entry.node = Some(cb),
            ExtensionCallback::Scene(cb) => entry.scene = Some(cb),
            ExtensionCallback::PostParse(cb) => entry.post_parse = Some(cb),
        }
    }

    /// Remove every callback of an extension. Returns whether it was present.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.entries.shift_remove(name).is_some()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn node_stage(&self) -> impl Iterator<Item = (&str, &dyn NodeExtension)> {
        self.entries
            .iter()
            .filter_map(|(name, e)| e.node.as_deref().map(|cb| (name.as_str(), cb)))
    }

    pub(crate) fn scene_stage(&self) -> impl Iterator<Item = (&str, &dyn SceneExtension)> {
        self.entries
            .iter()
            .filter_map(|(name, e)| e.scene.as_deref().map(|cb| (name.as_str(), cb)))
    }

    pub(crate) fn post_parse_stage(&self) -> impl Iterator<Item = (&str, &dyn PostParseExtension)> {
        self.entries
            .iter()
            .filter_map(|(name, e)| e.post_parse.as_deref().map(|cb| (name.as_str(), cb)))
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl NodeExtension for Noop {
        fn parse_node(
            &self,
            node: SceneNode,
            _: &Value,
            _: &mut NodeContext<'_>,
        ) -> Result<SceneNode, GltfError> {
            Ok(node)
        }
    }

    impl SceneExtension for Noop {
        fn parse_scene(&self, _: &mut Scene, _: &Value, _: &SceneContext<'_>) -> Result<(), GltfError> {
            Ok(())
        }
    }

    #[test]
    fn builtin_parsers_are_registered_in_order() {
        let registry = ExtensionRegistry::with_builtin_parsers();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "EPIC_level_variant_sets",
                "EPIC_interaction_hotspots",
                "EPIC_hdri_backdrop"
            ]
        );
        assert_eq!(registry.node_stage().count(), 2);
        assert_eq!(registry.scene_stage().count(), 1);
        assert_eq!(registry.post_parse_stage().count(), 2);
    }

    #[test]
    fn stages_of_one_extension_share_an_entry() {
        let mut registry = ExtensionRegistry::new();
        registry.register("EXT_a", ExtensionCallback::Node(Box::new(Noop)));
        registry.register("EXT_b", ExtensionCallback::Node(Box::new(Noop)));
        registry.register("EXT_a", ExtensionCallback::Scene(Box::new(Noop)));

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["EXT_a", "EXT_b"]);
        let node_names: Vec<_> = registry.node_stage().map(|(n, _)| n).collect();
        assert_eq!(node_names, vec!["EXT_a", "EXT_b"]);
        assert_eq!(registry.scene_stage().count(), 1);
    }

    #[test]
    fn unregister_removes_every_stage() {
        let mut registry = ExtensionRegistry::new();
        registry.register("EXT_a", ExtensionCallback::Node(Box::new(Noop)));
        registry.register("EXT_a", ExtensionCallback::Scene(Box::new(Noop)));

        assert!(registry.unregister("EXT_a"));
        assert!(!registry.is_registered("EXT_a"));
        assert_eq!(registry.node_stage().count(), 0);
        assert_eq!(registry.scene_stage().count(), 0);
        assert!(!registry.unregister("EXT_a"));
    }

    #[test]
    fn spawned_children_get_sequential_ids() {
        let document = Document::default();
        let mut outputs = ExtensionOutputs::new();
        let mut cx = NodeContext::new(&document, NodeId(0), &mut outputs, 5);
        assert_eq!(cx.spawn_child(SceneNode::new()), NodeId(5));
        assert_eq!(cx.spawn_child(SceneNode::new()), NodeId(6));
        assert_eq!(cx.into_spawned().len(), 2);
    }
}
