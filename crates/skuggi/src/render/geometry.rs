//! # Geometry — Flattening Surfaces Into One Vertex Stream
//!
//! The scene's surface → triangle → vertex hierarchy collapses into a single
//! contiguous vertex buffer: surfaces in order, each surface's triangles in
//! order, each triangle's corners in order (0, 1, 2). Every emitted vertex
//! is stamped with its owning surface's material index, which is how one
//! unindexed draw call renders the whole scene across all materials.
//!
//! No index buffer and no deduplication — every triangle contributes three
//! independent entries. For a static, render-once scene the memory cost buys
//! a pipeline with exactly one vertex buffer binding and zero per-surface
//! state changes, and the flattened order is deterministic for a given
//! scene, which the material table relies on.

use wgpu::util::DeviceExt;

use crate::render::gpu::GpuContext;
use crate::render::vertex::SceneVertex;
use crate::scene::SceneData;

/// Flatten all surfaces into the upload-ready vertex stream.
///
/// Output length is exactly `3 × total_triangle_count`.
pub(crate) fn flatten_surfaces(scene: &SceneData) -> Vec<SceneVertex> {
    let mut vertices = Vec::with_capacity(scene.triangle_count() * 3);

    for surface in &scene.surfaces {
        let material_index = surface.material as u32;
        for triangle in surface.triangles() {
            for vertex in &triangle.vertices {
                vertices.push(SceneVertex {
                    position: vertex.position.to_array(),
                    normal: vertex.normal.to_array(),
                    color: vertex.color.to_array(),
                    uv: vertex.uv.to_array(),
                    tangent: vertex.tangent.to_array(),
                    material_index,
                });
            }
        }
    }

    vertices
}

/// The uploaded scene geometry: one vertex buffer, one count, drawn with
/// `draw(0..vertex_count, 0..1)`. Static for the session.
pub(crate) struct GeometryBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub vertex_count: u32,
}

impl GeometryBuffer {
    /// Flatten and upload the scene in one transfer.
    pub fn upload(gpu: &GpuContext, scene: &SceneData) -> Self {
        let vertices = flatten_surfaces(scene);
        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("scene vertex buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        log::info!(
            "geometry: {} surfaces flattened to {} vertices",
            scene.surfaces.len(),
            vertices.len()
        );

        Self {
            vertex_buffer,
            vertex_count: vertices.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, Surface, Triangle, Vertex};
    use glam::Vec3;

    fn triangle(x: f32) -> Triangle {
        Triangle {
            vertices: [
                Vertex::at(Vec3::new(x, 0.0, 0.0)),
                Vertex::at(Vec3::new(x + 1.0, 0.0, 0.0)),
                Vertex::at(Vec3::new(x, 1.0, 0.0)),
            ],
        }
    }

    #[test]
    fn vertex_count_is_three_per_triangle() {
        let scene = SceneData {
            surfaces: vec![
                Surface::new("a", vec![triangle(0.0), triangle(1.0), triangle(2.0)], 0),
                Surface::new("b", vec![triangle(3.0)], 0),
            ],
            materials: vec![Material::new("m", 0)],
        };
        assert_eq!(flatten_surfaces(&scene).len(), 12);
    }

    #[test]
    fn vertices_carry_their_surface_material() {
        // Two surfaces: 2 triangles on material 0, then 1 triangle on
        // material 1 → 9 vertices, first six tagged 0, last three tagged 1.
        let scene = SceneData {
            surfaces: vec![
                Surface::new("plain", vec![triangle(0.0), triangle(1.0)], 0),
                Surface::new("detailed", vec![triangle(2.0)], 1),
            ],
            materials: vec![Material::new("m0", 0), Material::new("m1", 1)],
        };

        let vertices = flatten_surfaces(&scene);
        assert_eq!(vertices.len(), 9);
        let tags: Vec<u32> = vertices.iter().map(|v| v.material_index).collect();
        assert_eq!(tags, vec![0, 0, 0, 0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn vertex_order_follows_surface_then_triangle_then_corner() {
        let scene = SceneData {
            surfaces: vec![
                Surface::new("a", vec![triangle(0.0)], 0),
                Surface::new("b", vec![triangle(10.0)], 0),
            ],
            materials: vec![Material::new("m", 0)],
        };

        let vertices = flatten_surfaces(&scene);
        // Surface a's first corner, then its second...
        assert_eq!(vertices[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[2].position, [0.0, 1.0, 0.0]);
        // ...then surface b starts at index 3.
        assert_eq!(vertices[3].position, [10.0, 0.0, 0.0]);
    }

    #[test]
    fn flattening_is_deterministic() {
        let scene = SceneData {
            surfaces: vec![Surface::new("a", vec![triangle(0.0), triangle(5.0)], 0)],
            materials: vec![Material::new("m", 0)],
        };
        assert_eq!(flatten_surfaces(&scene), flatten_surfaces(&scene));
    }

    #[test]
    fn empty_scene_flattens_to_nothing() {
        let scene = SceneData::default();
        assert!(flatten_surfaces(&scene).is_empty());
    }
}
