//! # glTF — Scene Loading
//!
//! [glTF 2.0](https://www.khronos.org/gltf/) is the industry-standard format
//! for real-time 3D assets. Both `.gltf` (JSON + sidecar files) and `.glb`
//! (single binary) variants import through the same call.
//!
//! ## Mapping Onto the Scene Model
//!
//! - Every mesh **primitive** becomes one [`Surface`] — a triangle run with
//!   a single material, which is exactly what a primitive is.
//! - Primitives sharing a glTF material share one scene [`Material`]. Dense
//!   `material_index` values are assigned in encounter order, which fixes
//!   the GPU table order before any geometry is flattened.
//! - `pbrMetallicRoughness` factors map to the diffuse color and the
//!   roughness/metallic scalars; the base-color, normal, and
//!   metallic-roughness textures land in the Diffuse, Normal, and Rma slots.
//!
//! A scene that cannot be read at all is a fatal setup error — there is
//! nothing to render without geometry. A texture in an unsupported pixel
//! format is not: the slot stays empty, the material table substitutes a
//! fallback, and we log and move on.

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use super::{Material, SceneData, Surface, TextureData, TextureSlot, Triangle, Vertex};

/// Load a glTF/GLB scene file.
///
/// Panics when the file is missing or malformed (fatal setup — the renderer
/// cannot proceed), and when a primitive lacks positions or indices.
pub fn load_scene(path: &str) -> SceneData {
    let (document, buffers, images) =
        gltf::import(path).unwrap_or_else(|e| panic!("failed to load scene '{path}': {e}"));

    let mut materials: Vec<Material> = Vec::new();
    // glTF material index (None = the implicit default) → dense scene index.
    let mut material_ids: HashMap<Option<usize>, usize> = HashMap::new();
    let mut surfaces: Vec<Surface> = Vec::new();

    for mesh in document.meshes() {
        for (prim_index, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "skipping non-triangle primitive {prim_index} of mesh '{}'",
                    mesh.name().unwrap_or("?")
                );
                continue;
            }
            let gltf_material = primitive.material();
            let material = *material_ids.entry(gltf_material.index()).or_insert_with(|| {
                let dense = materials.len();
                materials.push(convert_material(&gltf_material, &images, dense as u32));
                dense
            });

            let name = match mesh.name() {
                Some(n) => format!("{n}/{prim_index}"),
                None => format!("surface{}", surfaces.len()),
            };
            let triangles = read_triangles(&primitive, &buffers, &name);
            surfaces.push(Surface::new(name, triangles, material));
        }
    }

    let scene = SceneData {
        surfaces,
        materials,
    };
    assert!(
        !scene.surfaces.is_empty(),
        "scene '{path}' contains no renderable geometry"
    );
    scene.validate();
    log::info!(
        "loaded scene '{}': {} surfaces, {} triangles, {} materials",
        path,
        scene.surfaces.len(),
        scene.triangle_count(),
        scene.materials.len()
    );
    scene
}

/// Read one primitive's triangle list.
fn read_triangles(
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
    name: &str,
) -> Vec<Triangle> {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    // Positions (required)
    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .unwrap_or_else(|| panic!("surface '{name}' is missing the POSITION attribute"))
        .collect();

    // Normals (optional, default +Y)
    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|iter| iter.collect())
        .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; positions.len()]);

    // UVs (optional, default [0, 0])
    let uvs: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|iter| iter.into_f32().collect())
        .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);

    // Vertex colors (optional, default white)
    let colors: Vec<[f32; 4]> = reader
        .read_colors(0)
        .map(|iter| iter.into_rgba_f32().collect())
        .unwrap_or_else(|| vec![[1.0, 1.0, 1.0, 1.0]; positions.len()]);

    // Tangents (optional, default +X; glTF tangents carry a handedness w we
    // do not need for a single-sided TBN)
    let tangents: Vec<[f32; 4]> = reader
        .read_tangents()
        .map(|iter| iter.collect())
        .unwrap_or_else(|| vec![[1.0, 0.0, 0.0, 1.0]; positions.len()]);

    // Indices (required — the flattener unrolls them into vertex triples)
    let indices: Vec<u32> = reader
        .read_indices()
        .unwrap_or_else(|| panic!("surface '{name}' is missing indices"))
        .into_u32()
        .collect();

    let vertex = |i: u32| {
        let i = i as usize;
        Vertex {
            position: Vec3::from_array(positions[i]),
            normal: Vec3::from_array(normals[i]),
            color: Vec3::new(colors[i][0], colors[i][1], colors[i][2]),
            uv: Vec2::from_array(uvs[i]),
            tangent: Vec3::new(tangents[i][0], tangents[i][1], tangents[i][2]),
        }
    };

    indices
        .chunks_exact(3)
        .map(|tri| Triangle {
            vertices: [vertex(tri[0]), vertex(tri[1]), vertex(tri[2])],
        })
        .collect()
}

/// Convert a glTF material into a scene material with the given dense index.
fn convert_material(
    material: &gltf::Material<'_>,
    images: &[gltf::image::Data],
    dense_index: u32,
) -> Material {
    let name = material.name().unwrap_or("material").to_string();
    let pbr = material.pbr_metallic_roughness();

    let mut out = Material::new(name, dense_index);
    let base = pbr.base_color_factor();
    out.diffuse = Vec3::new(base[0], base[1], base[2]);
    out.metallic = pbr.metallic_factor();
    out.roughness = pbr.roughness_factor();
    let emissive = material.emissive_factor();
    out.emission = Vec3::from_array(emissive);

    if let Some(info) = pbr.base_color_texture() {
        if let Some(data) = decode_image(&images[info.texture().source().index()], &out.name) {
            out.set_texture(TextureSlot::Diffuse, data);
        }
    }
    if let Some(info) = material.normal_texture() {
        if let Some(data) = decode_image(&images[info.texture().source().index()], &out.name) {
            out.set_texture(TextureSlot::Normal, data);
        }
    }
    if let Some(info) = pbr.metallic_roughness_texture() {
        if let Some(data) = decode_image(&images[info.texture().source().index()], &out.name) {
            out.set_texture(TextureSlot::Rma, data);
        }
    }

    out
}

/// Decode a glTF image into RGBA8, or `None` (logged) for pixel formats we
/// do not handle — the material table degrades those slots to fallbacks.
fn decode_image(image: &gltf::image::Data, material: &str) -> Option<TextureData> {
    match image.format {
        gltf::image::Format::R8G8B8A8 => Some(TextureData::new(
            image.width,
            image.height,
            image.pixels.clone(),
        )),
        gltf::image::Format::R8G8B8 => {
            let mut rgba = Vec::with_capacity(image.pixels.len() / 3 * 4);
            for rgb in image.pixels.chunks_exact(3) {
                rgba.extend_from_slice(rgb);
                rgba.push(255);
            }
            Some(TextureData::new(image.width, image.height, rgba))
        }
        other => {
            log::warn!(
                "material '{material}': unsupported texture format {other:?}, using fallback"
            );
            None
        }
    }
}
