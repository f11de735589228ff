//! Vertex layout description for interleaved vertex buffers.
//!
//! A primitive's layout lists only the semantics it actually carries, in the
//! canonical order given by [`VertexAttributeSemantic::CANONICAL_ORDER`].

/// Semantic meaning of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VertexAttributeSemantic {
    /// Vertex position.
    Position,
    /// Vertex normal.
    Normal,
    /// Tangent with handedness in `w`.
    Tangent,
    /// First texture coordinate set.
    TexCoord0,
    /// Second texture coordinate set.
    TexCoord1,
    /// Vertex color.
    Color,
    /// Skinning joint indices.
    Joints,
    /// Skinning joint weights.
    Weights,
}

impl VertexAttributeSemantic {
    /// Order in which semantics are laid out inside a vertex.
    pub const CANONICAL_ORDER: [Self; 8] = [
        Self::Position,
        Self::Normal,
        Self::Tangent,
        Self::TexCoord0,
        Self::TexCoord1,
        Self::Color,
        Self::Joints,
        Self::Weights,
    ];

    /// Map a glTF attribute name (`POSITION`, `TEXCOORD_0`, ...) to a semantic.
    ///
    /// Additional sets (`TEXCOORD_2`, `COLOR_1`, `JOINTS_1`, ...) are not
    /// supported and return `None`.
    pub fn from_gltf_name(name: &str) -> Option<Self> {
        match name {
            "POSITION" => Some(Self::Position),
            "NORMAL" => Some(Self::Normal),
            "TANGENT" => Some(Self::Tangent),
            "TEXCOORD_0" => Some(Self::TexCoord0),
            "TEXCOORD_1" => Some(Self::TexCoord1),
            "COLOR_0" => Some(Self::Color),
            "JOINTS_0" => Some(Self::Joints),
            "WEIGHTS_0" => Some(Self::Weights),
            _ => None,
        }
    }

    /// The glTF attribute name for this semantic.
    pub fn gltf_name(self) -> &'static str {
        match self {
            Self::Position => "POSITION",
            Self::Normal => "NORMAL",
            Self::Tangent => "TANGENT",
            Self::TexCoord0 => "TEXCOORD_0",
            Self::TexCoord1 => "TEXCOORD_1",
            Self::Color => "COLOR_0",
            Self::Joints => "JOINTS_0",
            Self::Weights => "WEIGHTS_0",
        }
    }

    /// Storage format used for this semantic in an interleaved buffer.
    pub fn format(self) -> VertexAttributeFormat {
        match self {
            Self::Position | Self::Normal => VertexAttributeFormat::Float3,
            Self::Tangent | Self::Weights => VertexAttributeFormat::Float4,
            Self::TexCoord0 | Self::TexCoord1 => VertexAttributeFormat::Float2,
            Self::Color => VertexAttributeFormat::Unorm8x4,
            Self::Joints => VertexAttributeFormat::Uint8x4,
        }
    }
}

/// Storage format of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeFormat {
    /// 2 x f32.
    Float2,
    /// 3 x f32.
    Float3,
    /// 4 x f32.
    Float4,
    /// 4 x u8, normalized to 0..1 by the renderer.
    Unorm8x4,
    /// 4 x u8, integer.
    Uint8x4,
}

impl VertexAttributeFormat {
    /// Number of components.
    pub fn components(&self) -> usize {
        match self {
            Self::Float2 => 2,
            Self::Float3 => 3,
            Self::Float4 | Self::Unorm8x4 | Self::Uint8x4 => 4,
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::Float2 => 8,
            Self::Float3 => 12,
            Self::Float4 => 16,
            Self::Unorm8x4 | Self::Uint8x4 => 4,
        }
    }
}

/// A single attribute inside an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// What the attribute represents.
    pub semantic: VertexAttributeSemantic,
    /// How it is stored.
    pub format: VertexAttributeFormat,
    /// Byte offset within the vertex.
    pub offset: u32,
}

/// Interleaved vertex layout: an ordered attribute list plus a stride.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexLayout {
    /// Attributes in canonical order.
    pub attributes: Vec<VertexAttribute>,
    /// Bytes per vertex.
    pub stride: u32,
}

impl VertexLayout {
    /// Build a layout from the semantics present on a primitive.
    ///
    /// The input order is irrelevant; attributes are placed in canonical
    /// order and packed tightly.
    pub fn from_semantics(present: &[VertexAttributeSemantic]) -> Self {
        let mut attributes = Vec::new();
        let mut offset = 0u32;

        for semantic in VertexAttributeSemantic::CANONICAL_ORDER {
            if !present.contains(&semantic) {
                continue;
            }
            let format = semantic.format();
            attributes.push(VertexAttribute {
                semantic,
                format,
                offset,
            });
            offset += format.size() as u32;
        }

        Self {
            attributes,
            stride: offset,
        }
    }

    /// Find the attribute for a semantic.
    pub fn attribute(&self, semantic: VertexAttributeSemantic) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.semantic == semantic)
    }

    /// Whether the layout carries a semantic.
    pub fn has(&self, semantic: VertexAttributeSemantic) -> bool {
        self.attribute(semantic).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_uses_canonical_order() {
        let layout = VertexLayout::from_semantics(&[
            VertexAttributeSemantic::TexCoord0,
            VertexAttributeSemantic::Position,
            VertexAttributeSemantic::Color,
        ]);

        let order: Vec<_> = layout.attributes.iter().map(|a| a.semantic).collect();
        assert_eq!(
            order,
            vec![
                VertexAttributeSemantic::Position,
                VertexAttributeSemantic::TexCoord0,
                VertexAttributeSemantic::Color,
            ]
        );
        assert_eq!(layout.attributes[1].offset, 12);
        assert_eq!(layout.attributes[2].offset, 20);
        assert_eq!(layout.stride, 24);
    }

    #[test]
    fn full_layout_stride() {
        let layout = VertexLayout::from_semantics(&VertexAttributeSemantic::CANONICAL_ORDER);
        // 12 + 12 + 16 + 8 + 8 + 4 + 4 + 16
        assert_eq!(layout.stride, 80);
        assert!(layout.has(VertexAttributeSemantic::Weights));
    }

    #[test]
    fn gltf_names_round_trip() {
        for semantic in VertexAttributeSemantic::CANONICAL_ORDER {
            assert_eq!(
                VertexAttributeSemantic::from_gltf_name(semantic.gltf_name()),
                Some(semantic)
            );
        }
        assert_eq!(VertexAttributeSemantic::from_gltf_name("TEXCOORD_2"), None);
    }
}
