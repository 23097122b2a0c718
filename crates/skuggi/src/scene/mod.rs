//! # Scene — CPU-Side Geometry and Materials
//!
//! The scene is the immutable result of loading a model file: an ordered
//! list of [`Surface`]s, each owning its triangles and referencing exactly
//! one [`Material`] by dense index. All triangles of a surface share that
//! surface's material — the many-to-one relationship the renderer exploits
//! when it tags vertices with material indices.
//!
//! Everything here is read-only after load. The session never mutates the
//! scene; moving things is the camera's and the light's job.
//!
//! ## Texture Slots
//!
//! A material carries a fixed seven-slot texture table indexed by
//! [`TextureSlot`]. Only a subset is ever populated; the material table
//! builder reads the Diffuse, Normal, and Rma slots and substitutes
//! fallbacks for the rest. Slots hold decoded RGBA8 pixels
//! ([`TextureData`]), never file paths — decoding happens at load time.

pub(crate) mod gltf;

pub use self::gltf::load_scene;

use glam::{Vec2, Vec3};

/// Number of texture slots a material carries.
pub const TEXTURE_SLOT_COUNT: usize = 7;

/// The texture slots a material can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Diffuse = 0,
    Specular = 1,
    Normal = 2,
    Opacity = 3,
    Roughness = 4,
    Metallic = 5,
    /// Combined roughness/metallic/ambient-occlusion map.
    Rma = 6,
}

/// Which shading variant a material asks for.
///
/// Stored as a tag on the material rather than a shader object — the
/// pipeline maps tags to fragment entry points when it is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShaderKind {
    /// Shaded-normal debug view.
    Normal,
    Lambert,
    Phong,
    Glass,
    #[default]
    Pbr,
    Mirror,
    CookTorrance,
}

/// Decoded RGBA8 texture pixels plus dimensions.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Construct from raw RGBA8 pixels. The pixel count must match the
    /// dimensions — anything else is a programming error upstream.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(
            pixels.len(),
            (width * height * 4) as usize,
            "texture pixel buffer does not match {width}x{height} RGBA8"
        );
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// A single CPU-side material.
///
/// The scene owns all materials for its lifetime; surfaces reference them by
/// `material_index`, which doubles as the record index in the GPU material
/// table.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub emission: Vec3,
    pub shininess: f32,
    pub roughness: f32,
    pub metallic: f32,
    pub reflectivity: f32,
    /// Index of refraction. Defaults to glass-like 1.5.
    pub ior: f32,
    pub shader: ShaderKind,
    /// Dense index into the scene's material list, assigned at load time.
    pub material_index: u32,
    textures: [Option<TextureData>; TEXTURE_SLOT_COUNT],
}

impl Material {
    /// A matte grey default with the given name and dense index.
    pub fn new(name: impl Into<String>, material_index: u32) -> Self {
        Self {
            name: name.into(),
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::splat(0.5),
            specular: Vec3::ZERO,
            emission: Vec3::ZERO,
            shininess: 1.0,
            roughness: 0.5,
            metallic: 0.0,
            reflectivity: 0.0,
            ior: 1.5,
            shader: ShaderKind::default(),
            material_index,
            textures: Default::default(),
        }
    }

    /// Store a texture in the given slot, replacing any previous one.
    pub fn set_texture(&mut self, slot: TextureSlot, texture: TextureData) {
        self.textures[slot as usize] = Some(texture);
    }

    /// The texture in a slot, if populated.
    pub fn texture(&self, slot: TextureSlot) -> Option<&TextureData> {
        self.textures[slot as usize].as_ref()
    }

    /// Whether a slot is populated.
    pub fn has_texture(&self, slot: TextureSlot) -> bool {
        self.textures[slot as usize].is_some()
    }
}

/// One corner of a triangle.
///
/// The per-vertex material index the GPU sees is not stored here — it is
/// stamped on during flattening from the owning surface.
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: Vec3,
    pub uv: Vec2,
    pub tangent: Vec3,
}

impl Vertex {
    /// A vertex at a position with neutral attributes: +Y normal, white
    /// color, zero UV, +X tangent.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            normal: Vec3::Y,
            color: Vec3::ONE,
            uv: Vec2::ZERO,
            tangent: Vec3::X,
        }
    }
}

/// Three vertices, wound counter-clockwise.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

/// An ordered run of triangles sharing one material.
#[derive(Debug, Clone)]
pub struct Surface {
    pub name: String,
    triangles: Vec<Triangle>,
    /// Dense index of this surface's material in [`SceneData::materials`].
    pub material: usize,
}

impl Surface {
    pub fn new(name: impl Into<String>, triangles: Vec<Triangle>, material: usize) -> Self {
        Self {
            name: name.into(),
            triangles,
            material,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }
}

/// Everything a loaded scene contains. Immutable for the session.
#[derive(Debug, Clone, Default)]
pub struct SceneData {
    pub surfaces: Vec<Surface>,
    pub materials: Vec<Material>,
}

impl SceneData {
    /// Total triangle count across all surfaces.
    pub fn triangle_count(&self) -> usize {
        self.surfaces.iter().map(Surface::triangle_count).sum()
    }

    /// Sanity-check the cross-references the renderer relies on: every
    /// surface points at an existing material and every material's dense
    /// index matches its position.
    pub(crate) fn validate(&self) {
        for (i, material) in self.materials.iter().enumerate() {
            assert_eq!(
                material.material_index as usize, i,
                "material '{}' has index {} but sits at position {i}",
                material.name, material.material_index
            );
        }
        for surface in &self.surfaces {
            assert!(
                surface.material < self.materials.len(),
                "surface '{}' references material {} of {}",
                surface.name,
                surface.material,
                self.materials.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Triangle {
        Triangle {
            vertices: [
                Vertex::at(Vec3::ZERO),
                Vertex::at(Vec3::X),
                Vertex::at(Vec3::Y),
            ],
        }
    }

    #[test]
    fn new_material_has_empty_slots() {
        let material = Material::new("grey", 0);
        for slot in [
            TextureSlot::Diffuse,
            TextureSlot::Specular,
            TextureSlot::Normal,
            TextureSlot::Opacity,
            TextureSlot::Roughness,
            TextureSlot::Metallic,
            TextureSlot::Rma,
        ] {
            assert!(!material.has_texture(slot), "{slot:?} should start empty");
        }
    }

    #[test]
    fn set_texture_populates_only_its_slot() {
        let mut material = Material::new("brick", 0);
        material.set_texture(
            TextureSlot::Diffuse,
            TextureData::new(1, 1, vec![255, 0, 0, 255]),
        );
        assert!(material.has_texture(TextureSlot::Diffuse));
        assert!(!material.has_texture(TextureSlot::Normal));
        assert_eq!(material.texture(TextureSlot::Diffuse).unwrap().width, 1);
    }

    #[test]
    fn triangle_count_sums_surfaces() {
        let scene = SceneData {
            surfaces: vec![
                Surface::new("a", vec![triangle(), triangle()], 0),
                Surface::new("b", vec![triangle()], 0),
            ],
            materials: vec![Material::new("grey", 0)],
        };
        assert_eq!(scene.triangle_count(), 3);
    }

    #[test]
    fn validate_accepts_dense_indices() {
        let scene = SceneData {
            surfaces: vec![Surface::new("a", vec![triangle()], 1)],
            materials: vec![Material::new("m0", 0), Material::new("m1", 1)],
        };
        scene.validate();
    }

    #[test]
    #[should_panic(expected = "references material")]
    fn validate_rejects_out_of_range_surface_material() {
        let scene = SceneData {
            surfaces: vec![Surface::new("a", vec![triangle()], 3)],
            materials: vec![Material::new("m0", 0)],
        };
        scene.validate();
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn texture_data_rejects_short_buffer() {
        TextureData::new(2, 2, vec![0; 4]);
    }
}
