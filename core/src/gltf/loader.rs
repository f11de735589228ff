//! glTF load pipeline.
//!
//! [`load_asset`] runs the stages in a fixed order: container, document,
//! buffers, textures, materials, meshes, cameras, animations, nodes, node
//! extensions, scenes, scene extensions, post-parse extensions. A
//! cancellation checkpoint sits between textures, primitives and extension
//! callbacks.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::compute::CancellationToken;
use crate::extension::{ExtensionOutputs, ExtensionRegistry, NodeContext, SceneContext};
use crate::material::MaterialParameters;
use crate::mesh::{CpuMesh, VertexAttributeSemantic, VertexLayout};
use crate::scene::{
    AnimationSummary, CameraProjection, MeshPrimitive, NodeId, NodeTransform, Scene, SceneCamera,
    SceneGraph, SceneMesh, SceneNode,
};
use crate::settings::LoaderSettings;
use crate::texture::TextureTable;

use super::accessor::{self, ResolvedAccessor};
use super::container::{Container, resolve_buffers};
use super::document::{Document, Mesh, Primitive};
use super::draco::{self, DecoderBackend};
use super::error::GltfError;
use super::geometry::{GeometryBuilder, GeometryInput, TargetInput};
use super::material;
use super::texture::decode_texture;
use super::types::LoadedAsset;

/// Extensions the pipeline itself understands, outside the registry.
const BUILTIN_EXTENSIONS: [&str; 4] = [
    "KHR_draco_mesh_compression",
    "KHR_materials_pbrSpecularGlossiness",
    "KHR_materials_unlit",
    "KHR_texture_transform",
];

/// Translate a `.glb` or embedded `.gltf` into a [`LoadedAsset`].
///
/// Nothing outside the returned asset is touched, so a failed or cancelled
/// load leaves no trace.
pub async fn load_asset(
    data: &[u8],
    registry: &ExtensionRegistry,
    decoder: Option<&dyn DecoderBackend>,
    settings: &LoaderSettings,
    cancel: &CancellationToken,
) -> Result<LoadedAsset, GltfError> {
    let container = Container::detect(data)?;
    let document = Document::from_slice(container.json)?;
    let buffers = resolve_buffers(&document.buffers, &container)?;
    log::info!(
        "Loading glTF ({}): {} nodes, {} meshes, {} materials",
        document.asset.generator.as_deref().unwrap_or("unknown generator"),
        document.nodes.len(),
        document.meshes.len(),
        document.materials.len()
    );
    for name in &document.extensions_required {
        if !BUILTIN_EXTENSIONS.contains(&name.as_str()) && !registry.is_registered(name) {
            log::warn!("Required extension {name} is not supported");
        }
    }

    let mut cx = LoadContext::new(&document, &buffers, settings);

    let textures = cx.load_textures(cancel).await?;
    let materials = cx.load_materials();
    let meshes = cx.load_meshes(decoder, cancel).await?;
    let cameras = cx.load_cameras();
    let animations = cx.load_animations();
    let mut graph = cx.load_nodes(&meshes);

    let mut outputs = ExtensionOutputs::new();
    run_node_extensions(&document, registry, settings, &mut graph, &mut outputs, cancel).await?;

    let mut scenes = cx.load_scenes(&graph);
    run_scene_extensions(&document, registry, settings, &graph, &mut scenes, cancel).await?;

    let mut asset = LoadedAsset {
        graph,
        scenes,
        default_scene: document.scene,
        meshes,
        materials,
        textures,
        cameras,
        animations,
        layouts: cx.into_layouts(),
        outputs,
    };

    for (name, callback) in registry.post_parse_stage() {
        if settings.is_disabled(name) {
            continue;
        }
        callback.post_parse(&mut asset)?;
    }

    log::info!(
        "Loaded glTF: {} nodes, {} scenes, {} layouts",
        asset.graph.len(),
        asset.scenes.len(),
        asset.layouts.len()
    );
    Ok(asset)
}

/// State shared by the loading stages.
struct LoadContext<'a> {
    document: &'a Document,
    buffers: &'a [Cow<'a, [u8]>],
    settings: &'a LoaderSettings,
    geometry: GeometryBuilder,
}

impl<'a> LoadContext<'a> {
    fn new(
        document: &'a Document,
        buffers: &'a [Cow<'a, [u8]>],
        settings: &'a LoaderSettings,
    ) -> Self {
        Self {
            document,
            buffers,
            settings,
            geometry: GeometryBuilder::new(settings.generate_missing_normals),
        }
    }

    /// Decode every texture. Failures leave a hole in the table.
    async fn load_textures(&self, cancel: &CancellationToken) -> Result<TextureTable, GltfError> {
        let count = self.document.textures.len();
        if !self.settings.decode_textures {
            log::debug!("Texture decoding disabled, skipping {count} textures");
            return Ok(vec![None; count]);
        }

        let mut table = Vec::with_capacity(count);
        for index in 0..count {
            cancel.checkpoint().await?;
            match decode_texture(self.document, self.buffers, index) {
                Ok(texture) => table.push(Some(Arc::new(texture))),
                Err(e) => {
                    log::warn!("Skipping texture {index}: {e}");
                    table.push(None);
                }
            }
        }
        Ok(table)
    }

    fn load_materials(&self) -> Vec<MaterialParameters> {
        self.document
            .materials
            .iter()
            .map(|m| material::translate(m, self.settings))
            .collect()
    }

    /// Build every primitive. Primitives that fail are logged and left out.
    async fn load_meshes(
        &mut self,
        decoder: Option<&dyn DecoderBackend>,
        cancel: &CancellationToken,
    ) -> Result<Vec<SceneMesh>, GltfError> {
        let document = self.document;
        let mut meshes = Vec::with_capacity(document.meshes.len());

        for (mesh_idx, mesh) in document.meshes.iter().enumerate() {
            let mut primitives = Vec::with_capacity(mesh.primitives.len());
            for (prim_idx, primitive) in mesh.primitives.iter().enumerate() {
                cancel.checkpoint().await?;
                match self.load_primitive(mesh_idx, prim_idx, mesh, primitive, decoder) {
                    Ok(cpu_mesh) => primitives.push(MeshPrimitive {
                        slot: prim_idx,
                        mesh: Arc::new(cpu_mesh),
                        material: primitive.material,
                    }),
                    Err(e) if e.is_primitive_scoped() => {
                        log::warn!("Skipping primitive {prim_idx} of mesh {mesh_idx}: {e}");
                    }
                    Err(e) => return Err(e),
                }
            }
            meshes.push(SceneMesh {
                name: mesh.name.clone(),
                primitives,
                slot_count: mesh.primitives.len(),
            });
        }
        Ok(meshes)
    }

    fn load_primitive(
        &mut self,
        mesh_idx: usize,
        prim_idx: usize,
        mesh: &Mesh,
        primitive: &Primitive,
        decoder: Option<&dyn DecoderBackend>,
    ) -> Result<CpuMesh, GltfError> {
        let mut input = match (&primitive.extensions.draco, decoder) {
            (Some(payload), Some(backend)) => {
                let bytes = draco::payload_bytes(self.document, self.buffers, payload)?;
                let decoded = draco::decode(payload, bytes, backend)?;
                let mut attributes =
                    self.plain_attributes(primitive, |name| !payload.attributes.contains_key(name))?;
                for (name, array) in decoded.attributes {
                    if let Some(semantic) = VertexAttributeSemantic::from_gltf_name(&name) {
                        attributes.insert(semantic, array);
                    }
                }
                GeometryInput {
                    attributes,
                    indices: decoded.indices.map(|i| i.to_u32()),
                    ..GeometryInput::default()
                }
            }
            (Some(_), None) => {
                log::warn!(
                    "Mesh {mesh_idx} primitive {prim_idx} is compressed but no decoder is configured, \
                     using plain accessors"
                );
                let has_plain_positions = primitive
                    .attributes
                    .get("POSITION")
                    .and_then(|&i| self.document.accessors.get(i))
                    .is_some_and(|a| a.buffer_view.is_some());
                if !has_plain_positions {
                    return Err(GltfError::MissingRequiredAttribute {
                        mesh: mesh_idx,
                        primitive: prim_idx,
                        attribute: "POSITION",
                    });
                }
                self.plain_input(primitive)?
            }
            (None, _) => self.plain_input(primitive)?,
        };

        input.mesh = mesh_idx;
        input.primitive = prim_idx;
        input.index_accessor = primitive.indices.unwrap_or_default();
        input.mode = primitive.mode;
        input.position_bounds = self.position_bounds(primitive);
        input.targets = primitive
            .targets
            .iter()
            .map(|target| self.target_input(target))
            .collect::<Result<_, _>>()?;
        input.label = mesh.name.as_ref().map(|name| {
            if mesh.primitives.len() > 1 {
                format!("{name}_prim{prim_idx}")
            } else {
                name.clone()
            }
        });

        self.geometry.build_primitive(input)
    }

    fn resolve(&self, index: usize) -> Result<ResolvedAccessor, GltfError> {
        accessor::resolve_index(self.document, self.buffers, index)
    }

    /// Resolve the primitive's plain accessors whose names pass `keep`.
    fn plain_attributes(
        &self,
        primitive: &Primitive,
        keep: impl Fn(&str) -> bool,
    ) -> Result<BTreeMap<VertexAttributeSemantic, ResolvedAccessor>, GltfError> {
        let mut attributes = BTreeMap::new();
        let wanted = primitive.attributes.iter().filter(|(name, _)| keep(name.as_str()));
        for (name, &index) in wanted {
            let Some(semantic) = VertexAttributeSemantic::from_gltf_name(name) else {
                log::debug!("Ignoring unsupported attribute {name}");
                continue;
            };
            attributes.insert(semantic, self.resolve(index)?);
        }
        Ok(attributes)
    }

    fn plain_input(&self, primitive: &Primitive) -> Result<GeometryInput, GltfError> {
        let attributes = self.plain_attributes(primitive, |_| true)?;
        let indices = primitive
            .indices
            .map(|index| self.resolve(index).map(|a| a.to_u32()))
            .transpose()?;
        Ok(GeometryInput {
            attributes,
            indices,
            ..GeometryInput::default()
        })
    }

    fn target_input(&self, target: &BTreeMap<String, usize>) -> Result<TargetInput, GltfError> {
        let channel = |name: &str| target.get(name).map(|&i| self.resolve(i)).transpose();
        Ok(TargetInput {
            positions: channel("POSITION")?,
            normals: channel("NORMAL")?,
            tangents: channel("TANGENT")?,
        })
    }

    fn position_bounds(&self, primitive: &Primitive) -> Option<([f32; 3], [f32; 3])> {
        let accessor = self.document.accessors.get(*primitive.attributes.get("POSITION")?)?;
        let min = accessor.min.as_deref()?;
        let max = accessor.max.as_deref()?;
        match (min, max) {
            ([a, b, c, ..], [d, e, f, ..]) => Some(([*a, *b, *c], [*d, *e, *f])),
            _ => None,
        }
    }

    fn load_cameras(&self) -> Vec<SceneCamera> {
        self.document
            .cameras
            .iter()
            .enumerate()
            .map(|(index, camera)| {
                let projection = match (&camera.perspective, &camera.orthographic) {
                    (Some(p), _) => CameraProjection::Perspective {
                        yfov: p.yfov,
                        aspect: p.aspect_ratio,
                        znear: p.znear,
                        zfar: p.zfar,
                    },
                    (None, Some(o)) => CameraProjection::Orthographic {
                        xmag: o.xmag,
                        ymag: o.ymag,
                        znear: o.znear,
                        zfar: o.zfar,
                    },
                    (None, None) => {
                        log::warn!("Camera {index} has no projection, using a default perspective");
                        CameraProjection::Perspective {
                            yfov: std::f32::consts::FRAC_PI_4,
                            aspect: None,
                            znear: 0.01,
                            zfar: None,
                        }
                    }
                };
                SceneCamera {
                    name: camera.name.clone(),
                    projection,
                }
            })
            .collect()
    }

    /// Channel counts and durations; keyframes are not kept.
    fn load_animations(&self) -> Vec<AnimationSummary> {
        self.document
            .animations
            .iter()
            .map(|animation| {
                let duration = animation
                    .samplers
                    .iter()
                    .filter_map(|sampler| self.input_end_time(sampler.input))
                    .fold(0.0_f32, f32::max);
                AnimationSummary {
                    name: animation.name.clone(),
                    channels: animation.channels.len(),
                    duration,
                }
            })
            .collect()
    }

    fn input_end_time(&self, index: usize) -> Option<f32> {
        let accessor = self.document.accessors.get(index)?;
        if let Some(&end) = accessor.max.as_ref().and_then(|max| max.first()) {
            return Some(end);
        }
        let times = self.resolve(index).ok()?.to_f32();
        times.into_iter().reduce(f32::max)
    }

    /// Materialize document nodes; node ids equal document indices.
    fn load_nodes(&self, meshes: &[SceneMesh]) -> SceneGraph {
        let mut graph = SceneGraph::new();
        for (index, node) in self.document.nodes.iter().enumerate() {
            let transform = match &node.matrix {
                Some(matrix) => NodeTransform::from_matrix(matrix),
                None => NodeTransform::IDENTITY
                    .with_translation(node.translation.unwrap_or([0.0; 3]))
                    .with_rotation(node.rotation.unwrap_or([0.0, 0.0, 0.0, 1.0]))
                    .with_scale(node.scale.unwrap_or([1.0; 3])),
            };
            let mut scene_node = SceneNode::new().with_transform(transform);
            scene_node.name = node.name.clone();
            scene_node.extensions = node.extensions.clone();
            match node.mesh.and_then(|m| meshes.get(m).map(|mesh| (m, mesh))) {
                Some((m, mesh)) => scene_node = scene_node.with_mesh(m, mesh.default_materials()),
                None if node.mesh.is_some() => {
                    log::warn!("Node {index} references missing mesh {:?}", node.mesh);
                }
                None => {}
            }
            if let Some(camera) = node.camera.filter(|&c| c < self.document.cameras.len()) {
                scene_node = scene_node.with_camera(camera);
            }
            graph.push(scene_node);
        }

        let count = graph.len();
        for (index, node) in self.document.nodes.iter().enumerate() {
            for &child in &node.children {
                let child_id = NodeId(child);
                let valid = child < count
                    && graph.get(child_id).is_some_and(|c| c.parent.is_none())
                    && !graph.is_ancestor(child_id, NodeId(index));
                if !valid {
                    log::warn!("Node {index} has invalid child {child}");
                    continue;
                }
                if let Some(c) = graph.get_mut(child_id) {
                    c.parent = Some(NodeId(index));
                }
                if let Some(p) = graph.get_mut(NodeId(index)) {
                    p.children.push(child_id);
                }
            }
        }
        graph
    }

    /// Scenes with their roots. A document without scenes gets one scene
    /// holding every parentless node.
    fn load_scenes(&self, graph: &SceneGraph) -> Vec<Scene> {
        if self.document.scenes.is_empty() {
            let roots: Vec<NodeId> = graph
                .iter()
                .filter(|(_, n)| n.parent.is_none())
                .map(|(id, _)| id)
                .collect();
            if roots.is_empty() {
                return Vec::new();
            }
            log::debug!("Document has no scenes, using {} parentless nodes", roots.len());
            return vec![Scene::new().with_roots(roots)];
        }

        self.document
            .scenes
            .iter()
            .map(|scene| {
                let roots = scene
                    .nodes
                    .iter()
                    .copied()
                    .filter(|&n| n < self.document.nodes.len())
                    .map(NodeId)
                    .collect();
                let mut out = Scene::new().with_roots(roots);
                out.name = scene.name.clone();
                out.extensions = scene.extensions.clone();
                out
            })
            .collect()
    }

    fn into_layouts(self) -> Vec<Arc<VertexLayout>> {
        self.geometry.layouts().to_vec()
    }
}

/// Run every node callback for every document node, in registration order.
///
/// Children spawned by a callback are appended to the graph right after it
/// returns, so ids handed out by [`NodeContext::spawn_child`] hold.
async fn run_node_extensions(
    document: &Document,
    registry: &ExtensionRegistry,
    settings: &LoaderSettings,
    graph: &mut SceneGraph,
    outputs: &mut ExtensionOutputs,
    cancel: &CancellationToken,
) -> Result<(), GltfError> {
    for (index, raw) in document.nodes.iter().enumerate() {
        let id = NodeId(index);
        for (name, callback) in registry.node_stage() {
            let Some(payload) = raw.extensions.get(name) else {
                continue;
            };
            if settings.is_disabled(name) {
                continue;
            }
            cancel.checkpoint().await?;

            let Some(node) = graph.take(id) else {
                continue;
            };
            let mut cx = NodeContext::new(document, id, outputs, graph.len());
            let node = callback.parse_node(node, payload, &mut cx)?;
            let spawned = cx.into_spawned();
            graph.replace(id, node);
            for child in spawned {
                graph.push_child(id, child);
            }
        }
    }
    Ok(())
}

async fn run_scene_extensions(
    document: &Document,
    registry: &ExtensionRegistry,
    settings: &LoaderSettings,
    graph: &SceneGraph,
    scenes: &mut [Scene],
    cancel: &CancellationToken,
) -> Result<(), GltfError> {
    for (index, scene) in scenes.iter_mut().enumerate() {
        let Some(raw) = document.scenes.get(index) else {
            continue;
        };
        for (name, callback) in registry.scene_stage() {
            let Some(payload) = raw.extensions.get(name) else {
                continue;
            };
            if settings.is_disabled(name) {
                continue;
            }
            cancel.checkpoint().await?;

            let cx = SceneContext {
                document,
                scene_index: index,
                graph,
            };
            callback.parse_scene(scene, payload, &cx)?;
        }
    }
    Ok(())
}
