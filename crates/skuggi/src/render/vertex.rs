//! # Vertex and Uniform Layouts
//!
//! The GPU-facing byte layouts: the flattened scene vertex and the per-frame
//! uniform block. Both are `#[repr(C)]` + `Pod` so upload is a cast, never a
//! serialization step.
//!
//! ## SceneVertex (60 bytes)
//!
//! ```text
//! ┌────────────┬────────────┬────────────┬──────────┬────────────┬──────────────┐
//! │ position   │ normal     │ color      │ uv       │ tangent    │ material_idx │
//! │ [f32; 3]   │ [f32; 3]   │ [f32; 3]   │ [f32; 2] │ [f32; 3]   │ u32          │
//! │ offset 0   │ offset 12  │ offset 24  │ offset 36│ offset 44  │ offset 56    │
//! │ location 0 │ location 1 │ location 2 │ location3│ location 4 │ location 5   │
//! └────────────┴────────────┴────────────┴──────────┴────────────┴──────────────┘
//! ```
//!
//! The material index rides along as a `Uint32` attribute and reaches the
//! fragment stage flat-interpolated — that is the whole trick that lets one
//! draw call cover every material in the scene.
//!
//! ## FrameUniform (288 bytes)
//!
//! One uniform buffer, written exactly once per frame, read by both the
//! depth pass (mlp) and the color pass (everything). Writing it once is what
//! makes the light-space matrix bit-identical between the two passes.

use bytemuck::{Pod, Zeroable};

use crate::camera::FrameMatrices;

/// One flattened scene vertex, as uploaded.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct SceneVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 3],
    /// Dense index into the material record table.
    pub material_index: u32,
}

/// Vertex stride. Checked against the struct so the attribute table and the
/// Rust layout cannot drift apart.
pub(crate) const VERTEX_STRIDE: usize = 60;
const _: () = assert!(std::mem::size_of::<SceneVertex>() == VERTEX_STRIDE);

impl SceneVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: VERTEX_STRIDE as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position: vec3<f32>
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal: vec3<f32>
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // color: vec3<f32>
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv: vec2<f32>
            wgpu::VertexAttribute {
                offset: 36,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32x2,
            },
            // tangent: vec3<f32>
            wgpu::VertexAttribute {
                offset: 44,
                shader_location: 4,
                format: wgpu::VertexFormat::Float32x3,
            },
            // material_index: u32
            wgpu::VertexAttribute {
                offset: 56,
                shader_location: 5,
                format: wgpu::VertexFormat::Uint32,
            },
        ],
    };
}

/// Per-frame uniform block shared by both passes.
///
/// `shadows` rides in the padding slot after the view position, the same
/// packing trick the light data uses for intensity elsewhere in this layout.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct FrameUniform {
    /// Full model-view-projection, depth-adapted. 64 bytes.
    pub mvp: [[f32; 4]; 4],
    /// Light-space transform (identity when shadows are off). 64 bytes.
    pub mlp: [[f32; 4]; 4],
    /// Model matrix. 64 bytes.
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of the model matrix. 64 bytes.
    pub normal: [[f32; 4]; 4],
    /// Eye position. 12 bytes.
    pub view_pos: [f32; 3],
    /// 1 when the shadow map is valid this frame, else 0. 4 bytes → 16.
    pub shadows: u32,
    /// Light position. 12 bytes.
    pub light_pos: [f32; 3],
    pub _pad: f32, // 4 bytes → 16, total 288
}

const _: () = assert!(std::mem::size_of::<FrameUniform>() == 288);
const _: () = assert!(std::mem::size_of::<FrameUniform>() % 16 == 0);

impl FrameUniform {
    /// Pack a frame's matrices for upload. The mlp slot falls back to
    /// identity when shadows are off — the shader never reads it then.
    pub fn pack(frame: &FrameMatrices) -> Self {
        Self {
            mvp: frame.mvp.to_cols_array_2d(),
            mlp: frame
                .mlp
                .unwrap_or(glam::Mat4::IDENTITY)
                .to_cols_array_2d(),
            model: frame.model.to_cols_array_2d(),
            normal: frame.normal.to_cols_array_2d(),
            view_pos: frame.view_pos.to_array(),
            shadows: frame.mlp.is_some() as u32,
            light_pos: frame.light_pos.to_array(),
            _pad: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use glam::Vec3;

    #[test]
    fn layout_offsets_match_struct_fields() {
        // The attribute table is hand-written; pin it to the struct.
        assert_eq!(std::mem::offset_of!(SceneVertex, position), 0);
        assert_eq!(std::mem::offset_of!(SceneVertex, normal), 12);
        assert_eq!(std::mem::offset_of!(SceneVertex, color), 24);
        assert_eq!(std::mem::offset_of!(SceneVertex, uv), 36);
        assert_eq!(std::mem::offset_of!(SceneVertex, tangent), 44);
        assert_eq!(std::mem::offset_of!(SceneVertex, material_index), 56);
    }

    #[test]
    fn pack_flags_shadows_and_copies_the_single_mlp() {
        let camera = Camera::new(640, 480, 0.8, Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO);
        let light = Vec3::new(3.0, 8.0, 1.0);

        let with = FrameMatrices::compute(&camera, light, 0.1, true);
        let packed = FrameUniform::pack(&with);
        assert_eq!(packed.shadows, 1);
        assert_eq!(packed.mlp, with.mlp.unwrap().to_cols_array_2d());

        let without = FrameMatrices::compute(&camera, light, 0.1, false);
        let packed = FrameUniform::pack(&without);
        assert_eq!(packed.shadows, 0);
        assert_eq!(packed.mlp, glam::Mat4::IDENTITY.to_cols_array_2d());
    }
}
