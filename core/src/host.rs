//! The seam between a loaded asset and whatever renders it.
//!
//! A [`SceneHost`] owns live objects (textures, materials, nodes) addressed
//! by opaque handles. The [`Viewer`](crate::viewer::Viewer) creates them after
//! a successful load and destroys them before the next one.
//!
//! [`MemoryHost`] keeps everything in maps and records every call, which is
//! what tests and command-line tools use.

use std::collections::HashMap;
use std::sync::Arc;

use crate::material::MaterialParameters;
use crate::mesh::CpuMesh;
use crate::scene::NodeTransform;
use crate::texture::CpuTexture;

/// Host-side node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostNodeId(pub u64);

/// Host-side material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialHandle(pub u64);

/// Host-side texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

/// One drawable attached to a host node.
#[derive(Debug, Clone)]
pub struct RenderPrimitive {
    pub mesh: Arc<CpuMesh>,
    pub material: Option<MaterialHandle>,
}

/// Renderer-side scene operations.
pub trait SceneHost {
    fn create_texture(&mut self, texture: &Arc<CpuTexture>) -> TextureHandle;

    /// `textures` is indexed like the asset's texture table; material texture
    /// slots refer to it.
    fn create_material(
        &mut self,
        params: &MaterialParameters,
        textures: &[Option<TextureHandle>],
    ) -> MaterialHandle;

    fn create_node(
        &mut self,
        name: Option<&str>,
        transform: &NodeTransform,
        parent: Option<HostNodeId>,
    ) -> HostNodeId;

    /// Replace everything drawn by `node`.
    fn set_render_primitives(&mut self, node: HostNodeId, primitives: Vec<RenderPrimitive>);

    fn set_enabled(&mut self, node: HostNodeId, enabled: bool);

    /// Destroy `node` and its whole subtree.
    fn destroy_node(&mut self, node: HostNodeId);

    fn destroy_material(&mut self, material: MaterialHandle);

    fn destroy_texture(&mut self, texture: TextureHandle);
}

/// A node as stored by [`MemoryHost`].
#[derive(Debug, Clone)]
pub struct HostNode {
    pub name: Option<String>,
    pub transform: NodeTransform,
    pub parent: Option<HostNodeId>,
    pub children: Vec<HostNodeId>,
    pub primitives: Vec<RenderPrimitive>,
    pub enabled: bool,
}

/// Calls recorded by [`MemoryHost`], in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCall {
    CreateTexture(TextureHandle),
    CreateMaterial(MaterialHandle),
    CreateNode(HostNodeId),
    SetRenderPrimitives(HostNodeId),
    SetEnabled(HostNodeId, bool),
    DestroyNode(HostNodeId),
    DestroyMaterial(MaterialHandle),
    DestroyTexture(TextureHandle),
}

/// In-memory [`SceneHost`].
#[derive(Debug, Default)]
pub struct MemoryHost {
    next_id: u64,
    nodes: HashMap<HostNodeId, HostNode>,
    materials: HashMap<MaterialHandle, MaterialParameters>,
    textures: HashMap<TextureHandle, Arc<CpuTexture>>,
    calls: Vec<HostCall>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn node(&self, id: HostNodeId) -> Option<&HostNode> {
        self.nodes.get(&id)
    }

    pub fn material(&self, handle: MaterialHandle) -> Option<&MaterialParameters> {
        self.materials.get(&handle)
    }

    /// First live node with the given name.
    pub fn find_node(&self, name: &str) -> Option<HostNodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.name.as_deref() == Some(name))
            .map(|(&id, _)| id)
            .min()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Whether nothing is alive.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.materials.is_empty() && self.textures.is_empty()
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl SceneHost for MemoryHost {
    fn create_texture(&mut self, texture: &Arc<CpuTexture>) -> TextureHandle {
        let handle = TextureHandle(self.allocate());
        self.textures.insert(handle, Arc::clone(texture));
        self.calls.push(HostCall::CreateTexture(handle));
        handle
    }

    fn create_material(
        &mut self,
        params: &MaterialParameters,
        _textures: &[Option<TextureHandle>],
    ) -> MaterialHandle {
        let handle = MaterialHandle(self.allocate());
        self.materials.insert(handle, params.clone());
        self.calls.push(HostCall::CreateMaterial(handle));
        handle
    }

    fn create_node(
        &mut self,
        name: Option<&str>,
        transform: &NodeTransform,
        parent: Option<HostNodeId>,
    ) -> HostNodeId {
        let id = HostNodeId(self.allocate());
        self.nodes.insert(
            id,
            HostNode {
                name: name.map(str::to_owned),
                transform: *transform,
                parent,
                children: Vec::new(),
                primitives: Vec::new(),
                enabled: true,
            },
        );
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.push(id);
        }
        self.calls.push(HostCall::CreateNode(id));
        id
    }

    fn set_render_primitives(&mut self, node: HostNodeId, primitives: Vec<RenderPrimitive>) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.primitives = primitives;
            self.calls.push(HostCall::SetRenderPrimitives(node));
        }
    }

    fn set_enabled(&mut self, node: HostNodeId, enabled: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.enabled = enabled;
            self.calls.push(HostCall::SetEnabled(node, enabled));
        }
    }

    fn destroy_node(&mut self, node: HostNodeId) {
        let Some(removed) = self.nodes.remove(&node) else {
            return;
        };
        if let Some(parent) = removed.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|&c| c != node);
        }
        let mut stack = removed.children;
        while let Some(id) = stack.pop() {
            if let Some(child) = self.nodes.remove(&id) {
                stack.extend(child.children);
            }
        }
        self.calls.push(HostCall::DestroyNode(node));
    }

    fn destroy_material(&mut self, material: MaterialHandle) {
        if self.materials.remove(&material).is_some() {
            self.calls.push(HostCall::DestroyMaterial(material));
        }
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture).is_some() {
            self.calls.push(HostCall::DestroyTexture(texture));
        }
    }
}
