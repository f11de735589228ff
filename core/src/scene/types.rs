//! Scene graph data types.
//!
//! Nodes live in one arena ([`SceneGraph`]) and reference each other by
//! [`NodeId`]. Ids of nodes that came from the document equal their glTF node
//! index; nodes synthesized by extensions are appended after them.

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use crate::extension::ExtensionOutputs;
use crate::gltf::document::ExtensionMap;
use crate::mesh::CpuMesh;

/// Node transform decomposed into translation, rotation, and scale.
///
/// Uses plain arrays for portability. Convert to `glam` types as needed:
/// `Vec3::from(t.translation)`, `Quat::from_array(t.rotation)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    /// Translation [x, y, z].
    pub translation: [f32; 3],
    /// Rotation quaternion [x, y, z, w].
    pub rotation: [f32; 4],
    /// Scale [x, y, z].
    pub scale: [f32; 3],
}

impl NodeTransform {
    /// Identity transform: no translation, identity rotation, unit scale.
    pub const IDENTITY: Self = Self {
        translation: [0.0, 0.0, 0.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0, 1.0, 1.0],
    };

    /// Decompose a column-major 4x4 matrix.
    pub fn from_matrix(matrix: &[f32; 16]) -> Self {
        let (scale, rotation, translation) =
            Mat4::from_cols_array(matrix).to_scale_rotation_translation();
        Self {
            translation: translation.to_array(),
            rotation: rotation.to_array(),
            scale: scale.to_array(),
        }
    }

    /// Compose into a column-major 4x4 matrix.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::from(self.scale),
            Quat::from_array(self.rotation),
            Vec3::from(self.translation),
        )
    }

    /// Returns this transform with a different translation.
    #[must_use]
    pub const fn with_translation(mut self, translation: [f32; 3]) -> Self {
        self.translation = translation;
        self
    }

    /// Returns this transform with a different rotation.
    #[must_use]
    pub const fn with_rotation(mut self, rotation: [f32; 4]) -> Self {
        self.rotation = rotation;
        self
    }

    /// Returns this transform with a different scale.
    #[must_use]
    pub const fn with_scale(mut self, scale: [f32; 3]) -> Self {
        self.scale = scale;
        self
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Index of a node in a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(pub usize);

/// A node in the scene graph.
///
/// `materials` holds the material currently bound to each material slot of
/// the node's mesh. It starts from the mesh's own assignments and is changed
/// by variant overrides.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Node name, if any.
    pub name: Option<String>,
    /// Local transform relative to parent.
    pub transform: NodeTransform,
    /// Parent node; `None` for roots.
    pub parent: Option<NodeId>,
    /// Child nodes in document order.
    pub children: Vec<NodeId>,
    /// Index into the asset's meshes.
    pub mesh: Option<usize>,
    /// Material per mesh slot.
    pub materials: Vec<Option<usize>>,
    /// Index into the asset's cameras.
    pub camera: Option<usize>,
    /// Whether the node (and its subtree) is rendered.
    pub visible: bool,
    /// Raw extension payloads from the document.
    pub extensions: ExtensionMap,
}

impl SceneNode {
    /// Creates a new visible node with identity transform and no attachments.
    pub fn new() -> Self {
        Self {
            name: None,
            transform: NodeTransform::IDENTITY,
            parent: None,
            children: Vec::new(),
            mesh: None,
            materials: Vec::new(),
            camera: None,
            visible: true,
            extensions: ExtensionMap::new(),
        }
    }

    /// Set the node name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the local transform.
    #[must_use]
    pub fn with_transform(mut self, transform: NodeTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Attach a mesh with its per-slot materials.
    #[must_use]
    pub fn with_mesh(mut self, mesh: usize, materials: Vec<Option<usize>>) -> Self {
        self.mesh = Some(mesh);
        self.materials = materials;
        self
    }

    /// Set the camera index.
    #[must_use]
    pub fn with_camera(mut self, camera: usize) -> Self {
        self.camera = Some(camera);
        self
    }
}

impl Default for SceneNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Arena of scene nodes.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node without touching parent links.
    pub fn push(&mut self, node: SceneNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Append `node` as the last child of `parent`.
    pub fn push_child(&mut self, parent: NodeId, mut node: SceneNode) -> NodeId {
        node.parent = Some(parent);
        let id = self.push(node);
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes with their ids, in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// First node with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.iter()
            .find(|(_, n)| n.name.as_deref() == Some(name))
            .map(|(id, _)| id)
    }

    /// `root` and all its descendants, parents before children. Each node is
    /// visited once, even if the child links loop back.
    pub fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut visited = vec![false; self.nodes.len()];
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            if std::mem::replace(&mut visited[id.0], true) {
                continue;
            }
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Whether `ancestor` is `node` itself or lies on its parent chain.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        for _ in 0..=self.nodes.len() {
            match current {
                Some(id) if id == ancestor => return true,
                Some(id) => current = self.get(id).and_then(|n| n.parent),
                None => return false,
            }
        }
        false
    }

    /// Swap a node out, leaving a default node in its slot.
    pub(crate) fn take(&mut self, id: NodeId) -> Option<SceneNode> {
        self.nodes.get_mut(id.0).map(std::mem::take)
    }

    /// Put a node back into its slot.
    pub(crate) fn replace(&mut self, id: NodeId, node: SceneNode) {
        if let Some(slot) = self.nodes.get_mut(id.0) {
            *slot = node;
        }
    }
}

/// A scene: a set of root nodes in the shared graph.
#[derive(Debug, Default)]
pub struct Scene {
    /// Scene name, if any.
    pub name: Option<String>,
    /// Root nodes of the scene.
    pub roots: Vec<NodeId>,
    /// Raw scene-level extension payloads.
    pub extensions: ExtensionMap,
    /// Typed results of scene-level extension parsers.
    pub outputs: ExtensionOutputs,
}

impl Scene {
    /// Creates a new empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scene name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the root nodes.
    #[must_use]
    pub fn with_roots(mut self, roots: Vec<NodeId>) -> Self {
        self.roots = roots;
        self
    }
}

// -- Meshes --

/// One built primitive of a mesh.
#[derive(Debug, Clone)]
pub struct MeshPrimitive {
    /// Material slot (primitive index in the document mesh).
    pub slot: usize,
    pub mesh: Arc<CpuMesh>,
    /// Material assigned by the document.
    pub material: Option<usize>,
}

/// A mesh: the primitives that were built successfully.
///
/// Primitives that failed to build are absent, so `primitives[i].slot` is not
/// necessarily `i`.
#[derive(Debug, Clone, Default)]
pub struct SceneMesh {
    pub name: Option<String>,
    pub primitives: Vec<MeshPrimitive>,
    /// Number of primitives declared by the document.
    pub slot_count: usize,
}

impl SceneMesh {
    /// Document material for every slot, including skipped ones.
    pub fn default_materials(&self) -> Vec<Option<usize>> {
        let mut slots = vec![None; self.slot_count];
        for primitive in &self.primitives {
            if let Some(slot) = slots.get_mut(primitive.slot) {
                *slot = primitive.material;
            }
        }
        slots
    }
}

// -- Cameras --

/// A camera definition.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneCamera {
    /// Camera name.
    pub name: Option<String>,
    /// Projection type and parameters.
    pub projection: CameraProjection,
}

/// Camera projection parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraProjection {
    /// Perspective projection.
    Perspective {
        /// Vertical field of view in radians.
        yfov: f32,
        /// Aspect ratio (width/height), if specified.
        aspect: Option<f32>,
        /// Near clipping plane distance.
        znear: f32,
        /// Far clipping plane distance, if specified.
        zfar: Option<f32>,
    },
    /// Orthographic projection.
    Orthographic {
        /// Horizontal magnification.
        xmag: f32,
        /// Vertical magnification.
        ymag: f32,
        /// Near clipping plane distance.
        znear: f32,
        /// Far clipping plane distance.
        zfar: f32,
    },
}

// -- Animations --

/// What the UI needs to know about an animation; keyframes are not kept.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationSummary {
    pub name: Option<String>,
    pub channels: usize,
    /// Seconds; the largest declared input time over all samplers.
    pub duration: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_transform_default_is_identity() {
        let t = NodeTransform::default();
        assert_eq!(t, NodeTransform::IDENTITY);
        assert_eq!(t.to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn matrix_decomposes_to_trs() {
        let m = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::IDENTITY,
            Vec3::new(1.0, 2.0, 3.0),
        );
        let t = NodeTransform::from_matrix(&m.to_cols_array());
        assert_eq!(t.translation, [1.0, 2.0, 3.0]);
        assert_eq!(t.scale, [2.0, 2.0, 2.0]);
        assert_eq!(t.rotation, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn subtree_visits_looping_links_once() {
        let mut graph = SceneGraph::new();
        let a = graph.push(SceneNode::new());
        let b = graph.push_child(a, SceneNode::new());
        graph.get_mut(b).unwrap().children.push(a);

        assert_eq!(graph.subtree(a), vec![a, b]);
        assert_eq!(graph.subtree(b), vec![b, a]);
    }

    #[test]
    fn ancestor_walks_parent_chain() {
        let mut graph = SceneGraph::new();
        let root = graph.push(SceneNode::new());
        let mid = graph.push_child(root, SceneNode::new());
        let leaf = graph.push_child(mid, SceneNode::new());
        let other = graph.push(SceneNode::new());

        assert!(graph.is_ancestor(root, leaf));
        assert!(graph.is_ancestor(leaf, leaf));
        assert!(!graph.is_ancestor(leaf, root));
        assert!(!graph.is_ancestor(other, leaf));
    }

    #[test]
    fn push_child_links_both_ways() {
        let mut graph = SceneGraph::new();
        let root = graph.push(SceneNode::new().with_name("root"));
        let child = graph.push_child(root, SceneNode::new().with_name("child"));

        assert_eq!(graph.get(child).unwrap().parent, Some(root));
        assert_eq!(graph.get(root).unwrap().children, vec![child]);
        assert_eq!(graph.find_by_name("child"), Some(child));
    }

    #[test]
    fn subtree_lists_parents_first() {
        let mut graph = SceneGraph::new();
        let a = graph.push(SceneNode::new());
        let b = graph.push_child(a, SceneNode::new());
        let c = graph.push_child(b, SceneNode::new());
        let d = graph.push_child(a, SceneNode::new());
        let _other = graph.push(SceneNode::new());

        assert_eq!(graph.subtree(a), vec![a, b, c, d]);
        assert_eq!(graph.subtree(b), vec![b, c]);
    }

    #[test]
    fn default_materials_cover_skipped_slots() {
        let mesh = SceneMesh {
            name: None,
            primitives: vec![MeshPrimitive {
                slot: 1,
                mesh: Arc::new(CpuMesh::new(Arc::default())),
                material: Some(4),
            }],
            slot_count: 3,
        };
        assert_eq!(mesh.default_materials(), vec![None, Some(4), None]);
    }
}
