//! Owns a [`SceneHost`] and keeps at most one loaded asset attached to it.
//!
//! Loading releases the previous scene first, runs the pipeline, and only
//! then creates host objects, so a failed or cancelled load leaves the host
//! empty. Variant selection goes through the [`Configurator`] and is pushed
//! to the host node by node.

use crate::compute::CancellationToken;
use crate::configurator::{Configurator, ConfiguratorError, VariantCatalog, apply_variant};
use crate::extension::ExtensionRegistry;
use crate::gltf::{DecoderBackend, GltfError, LoadedAsset, load_asset};
use crate::host::{HostNodeId, MaterialHandle, RenderPrimitive, SceneHost, TextureHandle};
use crate::scene::{NodeId, SceneSummary};
use crate::settings::LoaderSettings;

/// Errors from [`Viewer`] operations.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error(transparent)]
    Load(#[from] GltfError),

    #[error(transparent)]
    Configurator(#[from] ConfiguratorError),

    #[error("no asset is loaded")]
    NotLoaded,
}

/// Host objects created for the loaded asset.
#[derive(Debug, Default)]
struct Attachment {
    textures: Vec<Option<TextureHandle>>,
    materials: Vec<MaterialHandle>,
    /// Indexed by [`NodeId`]; `None` for nodes outside the active scene.
    nodes: Vec<Option<HostNodeId>>,
    roots: Vec<HostNodeId>,
}

#[derive(Debug)]
struct Loaded {
    asset: LoadedAsset,
    catalog: VariantCatalog,
    configurator: Option<Configurator>,
    attachment: Attachment,
}

/// Loads assets and mirrors them into a host.
pub struct Viewer<H: SceneHost> {
    host: H,
    registry: ExtensionRegistry,
    decoder: Option<Box<dyn DecoderBackend>>,
    settings: LoaderSettings,
    loaded: Option<Loaded>,
}

impl<H: SceneHost> Viewer<H> {
    /// A viewer with default settings and the built-in extension parsers.
    pub fn new(host: H) -> Self {
        Self::with_settings(host, LoaderSettings::default())
    }

    pub fn with_settings(host: H, settings: LoaderSettings) -> Self {
        Self {
            host,
            registry: ExtensionRegistry::with_builtin_parsers(),
            decoder: None,
            settings,
            loaded: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn registry_mut(&mut self) -> &mut ExtensionRegistry {
        &mut self.registry
    }

    /// Backend for compressed geometry; `None` falls back to plain accessors.
    pub fn set_decoder(&mut self, decoder: Option<Box<dyn DecoderBackend>>) {
        self.decoder = decoder;
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    pub fn asset(&self) -> Option<&LoadedAsset> {
        self.loaded.as_ref().map(|l| &l.asset)
    }

    /// Replace the current scene with the asset in `data`.
    ///
    /// The current scene is released before loading starts. On error the
    /// viewer is left empty.
    pub async fn load(
        &mut self,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> Result<SceneSummary, ViewerError> {
        self.unload();

        let mut asset = load_asset(
            data,
            &self.registry,
            self.decoder.as_deref(),
            &self.settings,
            cancel,
        )
        .await?;

        let catalog = asset.variant_catalog().cloned().unwrap_or_default();
        let configurator = select_defaults(&mut asset, &catalog)?;
        let attachment = attach(&mut self.host, &asset);
        let summary = asset.summary();
        log::info!(
            "Attached {} nodes, {} materials",
            attachment.nodes.iter().flatten().count(),
            attachment.materials.len()
        );

        self.loaded = Some(Loaded {
            asset,
            catalog,
            configurator,
            attachment,
        });
        Ok(summary)
    }

    /// Destroy everything the current scene created on the host.
    pub fn unload(&mut self) {
        if let Some(loaded) = self.loaded.take() {
            detach(&mut self.host, &loaded.attachment);
            log::debug!("Unloaded scene with {} nodes", loaded.asset.graph.len());
        }
    }

    pub fn summary(&self) -> Option<SceneSummary> {
        self.loaded.as_ref().map(|l| l.asset.summary())
    }

    /// Configuration state; `None` when nothing is loaded or the scene has
    /// no variant sets.
    pub fn configurator(&self) -> Option<&Configurator> {
        self.loaded.as_ref()?.configurator.as_ref()
    }

    /// For subscribing to value changes.
    pub fn configurator_mut(&mut self) -> Option<&mut Configurator> {
        self.loaded.as_mut()?.configurator.as_mut()
    }

    /// Select variant `value` of variant-set field `field` and push its
    /// overrides to the host.
    pub fn select_variant(&mut self, field: usize, value: u32) -> Result<(), ViewerError> {
        let loaded = self.loaded.as_mut().ok_or(ViewerError::NotLoaded)?;
        let configurator = loaded
            .configurator
            .as_mut()
            .ok_or(ConfiguratorError::InvalidField(field))?;
        configurator.check(field, value)?;

        let variant = loaded
            .catalog
            .variant(field, value)
            .ok_or(ConfiguratorError::InvalidValue { field, value })?;
        let touched = apply_variant(&mut loaded.asset.graph, &loaded.asset.meshes, variant);
        for id in touched {
            sync_node(&mut self.host, &loaded.asset, &loaded.attachment, id);
        }
        log::debug!("Selected variant '{}' for field {field}", variant.name);

        configurator.set_value(field, value)?;
        Ok(())
    }

    /// Move the loaded scene to another host and return the old one.
    ///
    /// The scene is torn down on the old host before the swap.
    pub fn replace_host(&mut self, host: H) -> H {
        if let Some(loaded) = &self.loaded {
            detach(&mut self.host, &loaded.attachment);
        }
        let old = std::mem::replace(&mut self.host, host);
        if let Some(loaded) = &mut self.loaded {
            loaded.attachment = attach(&mut self.host, &loaded.asset);
        }
        old
    }
}

impl<H: SceneHost> Drop for Viewer<H> {
    fn drop(&mut self) {
        self.unload();
    }
}

/// Build the configurator and apply every field's default variant.
fn select_defaults(
    asset: &mut LoadedAsset,
    catalog: &VariantCatalog,
) -> Result<Option<Configurator>, ConfiguratorError> {
    let fields = catalog.fields();
    if fields.is_empty() {
        return Ok(None);
    }
    let configurator = Configurator::new(fields)?;
    for field in 0..configurator.fields().len() {
        let variant = configurator
            .value(field)
            .and_then(|value| catalog.variant(field, value));
        if let Some(variant) = variant {
            apply_variant(&mut asset.graph, &asset.meshes, variant);
        }
    }
    Ok(Some(configurator))
}

fn attach(host: &mut impl SceneHost, asset: &LoadedAsset) -> Attachment {
    let textures: Vec<_> = asset
        .textures
        .iter()
        .map(|t| t.as_ref().map(|t| host.create_texture(t)))
        .collect();
    let materials = asset
        .materials
        .iter()
        .map(|m| host.create_material(m, &textures))
        .collect();

    let mut attachment = Attachment {
        textures,
        materials,
        nodes: vec![None; asset.graph.len()],
        roots: Vec::new(),
    };

    let roots = asset.active_scene().map(|s| s.roots.as_slice()).unwrap_or_default();
    for &root in roots {
        for id in asset.graph.subtree(root) {
            if attachment.nodes.get(id.0).copied().flatten().is_some() {
                continue;
            }
            let Some(node) = asset.graph.get(id) else {
                continue;
            };
            let parent = node
                .parent
                .and_then(|p| attachment.nodes.get(p.0).copied().flatten());
            let host_id = host.create_node(node.name.as_deref(), &node.transform, parent);
            if parent.is_none() {
                attachment.roots.push(host_id);
            }
            attachment.nodes[id.0] = Some(host_id);
            sync_node(&mut *host, asset, &attachment, id);
        }
    }
    attachment
}

/// Push a node's primitives and visibility to its host node.
fn sync_node(host: &mut impl SceneHost, asset: &LoadedAsset, attachment: &Attachment, id: NodeId) {
    let Some(node) = asset.graph.get(id) else {
        return;
    };
    let Some(host_id) = attachment.nodes.get(id.0).copied().flatten() else {
        return;
    };

    if let Some(mesh) = node.mesh.and_then(|m| asset.meshes.get(m)) {
        let primitives = mesh
            .primitives
            .iter()
            .map(|p| RenderPrimitive {
                mesh: p.mesh.clone(),
                material: node
                    .materials
                    .get(p.slot)
                    .copied()
                    .flatten()
                    .and_then(|m| attachment.materials.get(m).copied()),
            })
            .collect();
        host.set_render_primitives(host_id, primitives);
    }
    host.set_enabled(host_id, node.visible);
}

fn detach(host: &mut impl SceneHost, attachment: &Attachment) {
    for &root in &attachment.roots {
        host.destroy_node(root);
    }
    for &material in &attachment.materials {
        host.destroy_material(material);
    }
    for &texture in attachment.textures.iter().flatten() {
        host.destroy_texture(texture);
    }
}
