//! Material translator: glTF PBR blocks to flat renderer parameters.

use crate::material::color::rgb_to_display;
use crate::material::{
    AlphaMode, MaterialParameters, MaterialSemantic as M, MaterialValue as V, TextureChannel,
    TextureSlot,
};
use crate::settings::LoaderSettings;

use super::document::{Material, TextureInfoExtensions, TextureTransform};

/// Translate one glTF material. Never fails; missing data takes defaults.
pub fn translate(material: &Material, settings: &LoaderSettings) -> MaterialParameters {
    let gamma = settings.gamma;
    let alpha_mode = match material.alpha_mode.as_deref() {
        Some("MASK") => AlphaMode::Mask {
            cutoff: material.alpha_cutoff.unwrap_or(settings.default_alpha_cutoff),
        },
        Some("BLEND") => AlphaMode::Blend,
        _ => AlphaMode::Opaque,
    };
    let uses_alpha = alpha_mode != AlphaMode::Opaque;

    let mut params = MaterialParameters::new()
        .with_alpha_mode(alpha_mode)
        .with_double_sided(material.double_sided);
    if let Some(name) = &material.name {
        params = params.with_name(name.clone());
    }

    if let Some(sg) = &material.extensions.pbr_specular_glossiness {
        let [r, g, b, a] = sg.diffuse_factor.unwrap_or([1.0; 4]);
        params.set(M::Diffuse, V::Vec3(rgb_to_display([r, g, b], gamma)));
        params.set(M::Opacity, V::Float(a));
        if let Some(info) = &sg.diffuse_texture {
            set_diffuse_maps(&mut params, slot(info.index, info.tex_coord, &info.extensions), uses_alpha);
        }

        let specular = sg.specular_factor.unwrap_or([1.0; 3]);
        params.set(M::Specular, V::Vec3(rgb_to_display(specular, gamma)));
        params.set(M::Shininess, V::Float(100.0 * sg.glossiness_factor.unwrap_or(1.0)));
        params.set(M::UseMetalness, V::Bool(false));
        if let Some(info) = &sg.specular_glossiness_texture {
            let base = slot(info.index, info.tex_coord, &info.extensions);
            params.set(M::SpecularMap, V::Texture(base));
            params.set(M::GlossMap, V::Texture(base.with_channel(TextureChannel::A)));
        }
    } else if let Some(mr) = &material.pbr_metallic_roughness {
        let [r, g, b, a] = mr.base_color_factor.unwrap_or([1.0; 4]);
        params.set(M::Diffuse, V::Vec3(rgb_to_display([r, g, b], gamma)));
        params.set(M::Opacity, V::Float(a));
        if let Some(info) = &mr.base_color_texture {
            set_diffuse_maps(&mut params, slot(info.index, info.tex_coord, &info.extensions), uses_alpha);
        }

        params.set(M::UseMetalness, V::Bool(true));
        params.set(M::Metalness, V::Float(mr.metallic_factor.unwrap_or(1.0)));
        params.set(M::Shininess, V::Float(100.0 * mr.roughness_factor.unwrap_or(1.0)));
        if let Some(info) = &mr.metallic_roughness_texture {
            let base = slot(info.index, info.tex_coord, &info.extensions);
            params.set(M::MetalnessMap, V::Texture(base.with_channel(TextureChannel::B)));
            params.set(M::GlossMap, V::Texture(base.with_channel(TextureChannel::G)));
            params.set(M::GlossInvert, V::Bool(true));
        }
    } else {
        params.set(M::Diffuse, V::Vec3([1.0; 3]));
        params.set(M::Opacity, V::Float(1.0));
        params.set(M::UseMetalness, V::Bool(true));
        params.set(M::Metalness, V::Float(1.0));
        params.set(M::Shininess, V::Float(100.0));
    }

    if let Some(info) = &material.normal_texture {
        params.set(M::NormalMap, V::Texture(slot(info.index, info.tex_coord, &info.extensions)));
        params.set(M::Bumpiness, V::Float(info.scale.unwrap_or(1.0)));
    }
    if let Some(info) = &material.occlusion_texture {
        let ao = slot(info.index, info.tex_coord, &info.extensions).with_channel(TextureChannel::R);
        params.set(M::AoMap, V::Texture(ao));
    }

    let emissive = material.emissive_factor.unwrap_or([0.0; 3]);
    params.set(M::Emissive, V::Vec3(rgb_to_display(emissive, gamma)));
    if let Some(info) = &material.emissive_texture {
        params.set(M::EmissiveMap, V::Texture(slot(info.index, info.tex_coord, &info.extensions)));
    }

    params.set(M::UseLighting, V::Bool(material.extensions.unlit.is_none()));
    params
}

/// Diffuse slot plus, for masked/blended materials, an opacity slot reading
/// alpha from the same texture with the same transform.
fn set_diffuse_maps(params: &mut MaterialParameters, diffuse: TextureSlot, uses_alpha: bool) {
    params.set(M::DiffuseMap, V::Texture(diffuse));
    if uses_alpha {
        params.set(M::OpacityMap, V::Texture(diffuse.with_channel(TextureChannel::A)));
    }
}

fn slot(texture: usize, tex_coord: u32, extensions: &TextureInfoExtensions) -> TextureSlot {
    let slot = TextureSlot::new(texture, tex_coord);
    match extensions.texture_transform {
        Some(transform) => apply_transform(slot, &transform),
        None => slot,
    }
}

fn apply_transform(mut slot: TextureSlot, transform: &TextureTransform) -> TextureSlot {
    slot.tiling = transform.scale;
    slot.offset = transform.offset;
    slot.rotation = transform.rotation;
    if let Some(tex_coord) = transform.tex_coord {
        slot.uv_set = tex_coord;
    }
    slot
}
