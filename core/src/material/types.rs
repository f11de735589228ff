//! Renderer-native material parameter types.
//!
//! Materials are a flat list of [`MaterialParameter`] entries, each a
//! [`MaterialSemantic`] tag plus a typed [`MaterialValue`]. Pipeline state
//! (blending, alpha test, culling) lives in separate fields because it
//! configures the renderer rather than shader inputs.

/// Renderer-native material parameters.
///
/// Colors are in display space (already gamma-encoded); opacity is linear.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MaterialSemantic {
    /// Diffuse color `[r, g, b]`.
    Diffuse,
    /// Diffuse map.
    DiffuseMap,
    /// Opacity (0.0–1.0).
    Opacity,
    /// Opacity map.
    OpacityMap,
    /// Specular color `[r, g, b]`.
    Specular,
    /// Specular map.
    SpecularMap,
    /// Shininess on a 0–100 scale.
    Shininess,
    /// Gloss map.
    GlossMap,
    /// Whether the gloss map stores roughness (1 − gloss).
    GlossInvert,
    /// Whether the metalness workflow is used.
    UseMetalness,
    /// Metalness (0.0–1.0).
    Metalness,
    /// Metalness map.
    MetalnessMap,
    /// Normal map.
    NormalMap,
    /// Normal map strength.
    Bumpiness,
    /// Ambient occlusion map.
    AoMap,
    /// Emissive color `[r, g, b]`.
    Emissive,
    /// Emissive map.
    EmissiveMap,
    /// Whether lighting is evaluated (false for unlit materials).
    UseLighting,

    /// Custom parameter for non-standard semantics.
    Custom(String),
}

/// Which channel(s) of a texture a slot samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureChannel {
    /// Red.
    R,
    /// Green.
    G,
    /// Blue.
    B,
    /// Alpha.
    A,
    /// All color channels.
    #[default]
    Rgb,
}

/// A texture bound to one material slot.
///
/// `tiling`, `offset` and `rotation` come from `KHR_texture_transform` and are
/// identity when the extension is absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureSlot {
    /// Index into the asset's texture array.
    pub texture: usize,
    /// Texture coordinate set index (0 or 1).
    pub uv_set: u32,
    /// Channel(s) sampled by this slot.
    pub channel: TextureChannel,
    /// UV scale.
    pub tiling: [f32; 2],
    /// UV offset.
    pub offset: [f32; 2],
    /// UV rotation in radians.
    pub rotation: f32,
}

impl TextureSlot {
    /// Slot sampling all color channels with an identity transform.
    pub fn new(texture: usize, uv_set: u32) -> Self {
        Self {
            texture,
            uv_set,
            channel: TextureChannel::Rgb,
            tiling: [1.0, 1.0],
            offset: [0.0, 0.0],
            rotation: 0.0,
        }
    }

    /// Returns this slot sampling a different channel.
    #[must_use]
    pub fn with_channel(mut self, channel: TextureChannel) -> Self {
        self.channel = channel;
        self
    }
}

/// A typed material parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialValue {
    /// Scalar.
    Float(f32),
    /// Flag.
    Bool(bool),
    /// 3-component vector (colors).
    Vec3([f32; 3]),
    /// Texture slot.
    Texture(TextureSlot),
}

/// A single material parameter: semantic tag + typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialParameter {
    /// What this parameter represents.
    pub semantic: MaterialSemantic,
    /// The parameter value.
    pub value: MaterialValue,
}

/// Alpha rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AlphaMode {
    /// Fully opaque, blending disabled.
    #[default]
    Opaque,
    /// Binary alpha test, blending disabled.
    Mask {
        /// Fragments with alpha below this are discarded.
        cutoff: f32,
    },
    /// Alpha blending.
    Blend,
}

impl AlphaMode {
    /// Whether blending is enabled.
    pub fn blends(&self) -> bool {
        matches!(self, Self::Blend)
    }

    /// Alpha-test threshold, if any.
    pub fn alpha_test(&self) -> Option<f32> {
        match self {
            Self::Mask { cutoff } => Some(*cutoff),
            _ => None,
        }
    }
}

/// Face culling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    /// Back faces are culled.
    #[default]
    Back,
    /// Nothing is culled.
    None,
}

/// Flat renderer-native parameter set for one material.
///
/// # Example
///
/// ```
/// use vitrine_core::material::*;
///
/// let mat = MaterialParameters::new()
///     .with_name("red")
///     .with_parameter(MaterialSemantic::Diffuse, MaterialValue::Vec3([1.0, 0.0, 0.0]))
///     .with_parameter(MaterialSemantic::Opacity, MaterialValue::Float(1.0));
///
/// assert_eq!(mat.get_vec3(&MaterialSemantic::Diffuse), Some([1.0, 0.0, 0.0]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialParameters {
    /// Material name.
    pub name: Option<String>,
    /// Alpha rendering mode.
    pub alpha_mode: AlphaMode,
    /// Face culling.
    pub cull_mode: CullMode,
    /// Whether back faces are lit with flipped normals.
    pub two_sided_lighting: bool,
    /// Parameters in insertion order.
    pub parameters: Vec<MaterialParameter>,
}

impl MaterialParameters {
    /// Creates an empty parameter set (opaque, back-face culled).
    pub fn new() -> Self {
        Self {
            name: None,
            alpha_mode: AlphaMode::Opaque,
            cull_mode: CullMode::Back,
            two_sided_lighting: false,
            parameters: Vec::new(),
        }
    }

    /// Set the material name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the alpha rendering mode.
    #[must_use]
    pub fn with_alpha_mode(mut self, alpha_mode: AlphaMode) -> Self {
        self.alpha_mode = alpha_mode;
        self
    }

    /// Set double-sidedness; culling and two-sided lighting always change
    /// together.
    #[must_use]
    pub fn with_double_sided(mut self, double_sided: bool) -> Self {
        self.cull_mode = if double_sided {
            CullMode::None
        } else {
            CullMode::Back
        };
        self.two_sided_lighting = double_sided;
        self
    }

    /// Add or replace a parameter.
    #[must_use]
    pub fn with_parameter(mut self, semantic: MaterialSemantic, value: MaterialValue) -> Self {
        self.set(semantic, value);
        self
    }

    /// Add or replace a parameter in place.
    pub fn set(&mut self, semantic: MaterialSemantic, value: MaterialValue) {
        match self.parameters.iter_mut().find(|p| p.semantic == semantic) {
            Some(existing) => existing.value = value,
            None => self.parameters.push(MaterialParameter { semantic, value }),
        }
    }

    /// Find a parameter value by semantic.
    pub fn get(&self, semantic: &MaterialSemantic) -> Option<&MaterialValue> {
        self.parameters
            .iter()
            .find(|p| &p.semantic == semantic)
            .map(|p| &p.value)
    }

    /// Get a float parameter.
    pub fn get_float(&self, semantic: &MaterialSemantic) -> Option<f32> {
        match self.get(semantic)? {
            MaterialValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Get a flag parameter.
    pub fn get_bool(&self, semantic: &MaterialSemantic) -> Option<bool> {
        match self.get(semantic)? {
            MaterialValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get a vec3 parameter.
    pub fn get_vec3(&self, semantic: &MaterialSemantic) -> Option<[f32; 3]> {
        match self.get(semantic)? {
            MaterialValue::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    /// Get a texture slot.
    pub fn get_texture(&self, semantic: &MaterialSemantic) -> Option<&TextureSlot> {
        match self.get(semantic)? {
            MaterialValue::Texture(t) => Some(t),
            _ => None,
        }
    }

    /// Iterate over every texture slot.
    pub fn texture_slots(&self) -> impl Iterator<Item = (&MaterialSemantic, &TextureSlot)> {
        self.parameters.iter().filter_map(|p| match &p.value {
            MaterialValue::Texture(t) => Some((&p.semantic, t)),
            _ => None,
        })
    }
}

impl Default for MaterialParameters {
    fn default() -> Self {
        Self::new()
    }
}
