//! Material system for PBR rendering
//!
//! Materials live in the [`SceneGraph`](crate::gfx::scene::SceneGraph) arena and
//! meshes reference them by [`MaterialId`]. Several meshes can share one material,
//! so editing a material changes every mesh that uses it.

use std::{collections::BTreeMap, fmt, rc::Rc};

use crate::{assets::TextureData, gfx::color::Color};

/// Index of a material inside its scene graph
pub type MaterialId = usize;

/// GPU uniform data for materials
///
/// Layout matches the `MaterialUniform` struct in the configurator shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub normal_scale: f32,
    pub occlusion_strength: f32,
    pub emissive: [f32; 3],
    _padding: f32,
}

/// Texture slots a material can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureSlot {
    Map,
    NormalMap,
    RoughnessMap,
    MetalnessMap,
    AoMap,
    EmissiveMap,
    BumpMap,
    DisplacementMap,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 8] = [
        TextureSlot::Map,
        TextureSlot::NormalMap,
        TextureSlot::RoughnessMap,
        TextureSlot::MetalnessMap,
        TextureSlot::AoMap,
        TextureSlot::EmissiveMap,
        TextureSlot::BumpMap,
        TextureSlot::DisplacementMap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextureSlot::Map => "map",
            TextureSlot::NormalMap => "normalMap",
            TextureSlot::RoughnessMap => "roughnessMap",
            TextureSlot::MetalnessMap => "metalnessMap",
            TextureSlot::AoMap => "aoMap",
            TextureSlot::EmissiveMap => "emissiveMap",
            TextureSlot::BumpMap => "bumpMap",
            TextureSlot::DisplacementMap => "displacementMap",
        }
    }
}

impl fmt::Display for TextureSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Material definition with PBR properties
///
/// `revision` increases on every edit so GPU-side copies know when to re-upload.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub normal_scale: f32,
    pub occlusion_strength: f32,
    pub emissive: [f32; 3],
    textures: BTreeMap<TextureSlot, Rc<TextureData>>,
    revision: u64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            base_color: [0.8, 0.8, 0.8, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            normal_scale: 1.0,
            occlusion_strength: 1.0,
            emissive: [0.0, 0.0, 0.0],
            textures: BTreeMap::new(),
            revision: 0,
        }
    }
}

impl Material {
    /// Creates a new material with basic PBR properties
    ///
    /// # Arguments
    /// * `name` - Display name, not required to be unique
    /// * `base_color` - RGBA base color
    /// * `metallic` - Metallic factor (0.0 = dielectric, 1.0 = metallic)
    /// * `roughness` - Surface roughness (0.0 = mirror, 1.0 = rough)
    pub fn new(name: &str, base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            metallic: metallic.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// Builder pattern: Set base color from RGB values
    pub fn with_color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.base_color = [r, g, b, self.base_color[3]];
        self
    }

    /// Builder pattern: Set emissive color
    pub fn with_emission(mut self, r: f32, g: f32, b: f32) -> Self {
        self.emissive = [r, g, b];
        self
    }

    /// Builder pattern: Attach a texture
    pub fn with_texture(mut self, slot: TextureSlot, texture: Rc<TextureData>) -> Self {
        self.textures.insert(slot, texture);
        self
    }

    pub fn color(&self) -> Color {
        Color::new(self.base_color[0], self.base_color[1], self.base_color[2])
    }

    /// Replaces the RGB part of the base color, alpha is kept
    pub fn set_color(&mut self, color: Color) {
        self.base_color = [color.r, color.g, color.b, self.base_color[3]];
        self.touch();
    }

    pub fn set_metallic(&mut self, metallic: f32) {
        self.metallic = metallic.clamp(0.0, 1.0);
        self.touch();
    }

    pub fn set_roughness(&mut self, roughness: f32) {
        self.roughness = roughness.clamp(0.0, 1.0);
        self.touch();
    }

    /// Assigns a texture to a slot and returns the one it replaced
    pub fn set_texture(
        &mut self,
        slot: TextureSlot,
        texture: Rc<TextureData>,
    ) -> Option<Rc<TextureData>> {
        let previous = self.textures.insert(slot, texture);
        self.touch();
        previous
    }

    pub fn texture(&self, slot: TextureSlot) -> Option<&Rc<TextureData>> {
        self.textures.get(&slot)
    }

    pub fn textures(&self) -> impl Iterator<Item = (TextureSlot, &Rc<TextureData>)> {
        self.textures.iter().map(|(slot, texture)| (*slot, texture))
    }

    /// Monotonic edit counter
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Packs the material factors for upload
    pub fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            base_color: self.base_color,
            metallic: self.metallic,
            roughness: self.roughness,
            normal_scale: self.normal_scale,
            occlusion_strength: self.occlusion_strength,
            emissive: self.emissive,
            _padding: 0.0,
        }
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
