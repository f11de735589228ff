//! `EPIC_hdri_backdrop`: an HDR cubemap projected onto a ground mesh.

use serde::Deserialize;
use serde_json::Value;

use crate::gltf::GltfError;
use crate::scene::{NodeId, SceneNode};

use super::registry::{ExtensionCallback, ExtensionRegistry, NodeContext, NodeExtension};

pub const EXTENSION_NAME: &str = "EPIC_hdri_backdrop";

pub(crate) fn register(registry: &mut ExtensionRegistry) {
    registry.register(EXTENSION_NAME, ExtensionCallback::Node(Box::new(HdriBackdrop)));
}

/// Backdrop descriptor recorded for a node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backdrop {
    #[serde(skip)]
    pub node: NodeId,
    /// Mesh the cubemap is projected onto.
    pub mesh: usize,
    /// Texture indices in +X, -X, +Y, -Y, +Z, -Z order.
    pub cubemap: [usize; 6],
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    #[serde(default = "default_size")]
    pub size: f32,
    #[serde(default)]
    pub projection_center: [f32; 3],
    #[serde(default = "default_lighting_distance_factor")]
    pub lighting_distance_factor: f32,
    #[serde(default)]
    pub use_camera_projection: bool,
}

fn default_intensity() -> f32 {
    1.0
}

fn default_size() -> f32 {
    150.0
}

fn default_lighting_distance_factor() -> f32 {
    0.5
}

/// Parser for `EPIC_hdri_backdrop`.
pub struct HdriBackdrop;

impl NodeExtension for HdriBackdrop {
    fn parse_node(
        &self,
        node: SceneNode,
        payload: &Value,
        cx: &mut NodeContext<'_>,
    ) -> Result<SceneNode, GltfError> {
        let mut backdrop = Backdrop::deserialize(payload)
            .map_err(|e| GltfError::extension(EXTENSION_NAME, e.to_string()))?;
        if backdrop.mesh >= cx.document.meshes.len() {
            return Err(GltfError::extension(
                EXTENSION_NAME,
                format!("backdrop references missing mesh {}", backdrop.mesh),
            ));
        }
        backdrop.node = cx.node_id;
        log::debug!("Node {} carries an HDRI backdrop", cx.node_id.0);
        cx.outputs.push(EXTENSION_NAME, backdrop);
        Ok(node)
    }
}
