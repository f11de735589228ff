//! `EPIC_interaction_hotspots`: clickable markers that play an animation.
//!
//! The document root declares the hotspots; a node payload `{"hotspot": i}`
//! attaches one of them. Each attached hotspot gets a synthesized marker
//! child so hosts can place a billboard without touching the original node.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::gltf::{GltfError, LoadedAsset};
use crate::scene::{NodeId, SceneNode};
use crate::texture::CpuTexture;

use super::registry::{
    ExtensionCallback, ExtensionRegistry, NodeContext, NodeExtension, PostParseExtension,
};

pub const EXTENSION_NAME: &str = "EPIC_interaction_hotspots";

pub(crate) fn register(registry: &mut ExtensionRegistry) {
    registry.register(EXTENSION_NAME, ExtensionCallback::Node(Box::new(InteractionHotspots)));
    registry.register(
        EXTENSION_NAME,
        ExtensionCallback::PostParse(Box::new(InteractionHotspots)),
    );
}

/// Interaction state selecting which marker image is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HotspotState {
    #[default]
    Idle,
    Hovered,
    Toggled,
    ToggledHovered,
}

impl HotspotState {
    fn slot(self) -> usize {
        match self {
            Self::Idle => 0,
            Self::Hovered => 1,
            Self::Toggled => 2,
            Self::ToggledHovered => 3,
        }
    }
}

/// A hotspot attached to a node.
#[derive(Debug, Clone, Default)]
pub struct Hotspot {
    /// Node carrying the extension payload.
    pub node: NodeId,
    /// Synthesized marker child.
    pub marker: NodeId,
    /// Animation index triggered on click.
    pub animation: Option<usize>,
    /// Resolved at post-parse.
    pub animation_name: Option<String>,
    /// Texture indices for idle, hovered, toggled and toggled-hovered.
    pub images: [Option<usize>; 4],
    /// Decoded textures for `images`, resolved at post-parse.
    pub textures: [Option<Arc<CpuTexture>>; 4],
}

impl Hotspot {
    /// Texture to show in `state`, falling back to the idle image.
    pub fn texture(&self, state: HotspotState) -> Option<&Arc<CpuTexture>> {
        self.textures[state.slot()]
            .as_ref()
            .or(self.textures[HotspotState::Idle.slot()].as_ref())
    }
}

/// Parser for `EPIC_interaction_hotspots`.
pub struct InteractionHotspots;

#[derive(Deserialize)]
struct RootPayload {
    #[serde(default)]
    hotspots: Vec<RawHotspot>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHotspot {
    animation: Option<usize>,
    image: Option<usize>,
    hovered_image: Option<usize>,
    toggled_image: Option<usize>,
    toggled_hovered_image: Option<usize>,
}

#[derive(Deserialize)]
struct NodePayload {
    hotspot: usize,
}

impl NodeExtension for InteractionHotspots {
    fn parse_node(
        &self,
        node: SceneNode,
        payload: &Value,
        cx: &mut NodeContext<'_>,
    ) -> Result<SceneNode, GltfError> {
        let malformed = |e: serde_json::Error| GltfError::extension(EXTENSION_NAME, e.to_string());
        let NodePayload { hotspot } = NodePayload::deserialize(payload).map_err(malformed)?;
        let root = cx
            .document
            .extension(EXTENSION_NAME)
            .ok_or_else(|| GltfError::extension(EXTENSION_NAME, "no hotspots declared"))?;
        let mut root = RootPayload::deserialize(root).map_err(malformed)?;
        if hotspot >= root.hotspots.len() {
            return Err(GltfError::extension(
                EXTENSION_NAME,
                format!("node {} references missing hotspot {hotspot}", cx.node_id.0),
            ));
        }
        let raw = root.hotspots.swap_remove(hotspot);

        let marker_name = match &node.name {
            Some(name) => format!("{name}_Hotspot"),
            None => format!("Hotspot{hotspot}"),
        };
        let marker = cx.spawn_child(SceneNode::new().with_name(marker_name));
        let node_id = cx.node_id;
        cx.outputs.push(
            EXTENSION_NAME,
            Hotspot {
                node: node_id,
                marker,
                animation: raw.animation,
                images: [
                    raw.image,
                    raw.hovered_image,
                    raw.toggled_image,
                    raw.toggled_hovered_image,
                ],
                ..Hotspot::default()
            },
        );
        Ok(node)
    }
}

impl PostParseExtension for InteractionHotspots {
    fn post_parse(&self, asset: &mut LoadedAsset) -> Result<(), GltfError> {
        let Some(hotspots) = asset.outputs.get_mut::<Vec<Hotspot>>(EXTENSION_NAME) else {
            return Ok(());
        };
        for hotspot in hotspots.iter_mut() {
            for (slot, image) in hotspot.images.iter().enumerate() {
                let Some(index) = *image else { continue };
                hotspot.textures[slot] = asset.textures.get(index).cloned().flatten();
                if hotspot.textures[slot].is_none() {
                    log::warn!("Hotspot on node {} has no texture {index}", hotspot.node.0);
                }
            }
            if let Some(index) = hotspot.animation {
                match asset.animations.get(index) {
                    Some(animation) => hotspot.animation_name = animation.name.clone(),
                    None => {
                        log::warn!("Hotspot on node {} references missing animation {index}", hotspot.node.0);
                        hotspot.animation = None;
                    }
                }
            }
        }
        log::debug!("Resolved {} hotspots", hotspots.len());
        Ok(())
    }
}
