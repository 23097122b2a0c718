//! # Pipeline — Render Pipelines and Shared GPU Resources
//!
//! Two pipelines cover the whole renderer:
//!
//! - **Scene pipeline**: the shading pass. One vertex entry, and a fragment
//!   entry chosen at build time from the material [`ShaderKind`] tag —
//!   `fs_pbr` for every lit variant, `fs_normal` for the shaded-normal
//!   debug view.
//! - **Depth pipeline**: the shadow pass. Vertex stage only, no fragment,
//!   no color targets — the rasterizer writes depth and nothing else.
//!
//! ## Bind Group Layouts, by Change Frequency
//!
//! | Group | Content                                  | Rebinding      |
//! |-------|------------------------------------------|----------------|
//! | 0     | Frame uniform (matrices, positions)      | Never — buffer |
//! |       |                                          | rewritten/frame|
//! | 1     | Material table + texture array + sampler | Never          |
//! | 2     | Shadow map + comparison sampler          | Never          |
//! | 3     | Environment maps + sampler + mip count   | Never          |
//!
//! Nothing is rebound between draws — that is the point of the bindless
//! material table. The only per-frame GPU traffic besides the passes
//! themselves is one `write_buffer` into the frame uniform.

use bytemuck::Zeroable;
use wgpu::util::DeviceExt;

use crate::render::environment::EnvironmentMaps;
use crate::render::gpu::GpuContext;
use crate::render::material::MaterialTable;
use crate::render::shadow::{DEPTH_FORMAT, ShadowResources};
use crate::render::vertex::{FrameUniform, SceneVertex};
use crate::scene::ShaderKind;

/// All pipeline-level GPU state: the two pipelines, the bind group layouts,
/// the frame uniform buffer, the shared material sampler, and the
/// window-sized depth buffer.
pub(crate) struct SceneRenderer {
    pub scene_pipeline: wgpu::RenderPipeline,
    pub depth_pipeline: wgpu::RenderPipeline,

    pub scene_layout: wgpu::BindGroupLayout,
    pub shadow_layout: wgpu::BindGroupLayout,
    pub environment_layout: wgpu::BindGroupLayout,

    pub frame_buffer: wgpu::Buffer,
    pub frame_bind_group: wgpu::BindGroup,

    pub material_sampler: wgpu::Sampler,

    // Window depth buffer (recreated on resize)
    pub depth_texture: wgpu::TextureView,
    depth_size: (u32, u32),
}

impl SceneRenderer {
    /// Build every pipeline and layout. `shader` picks the fragment variant
    /// for the scene pipeline.
    pub fn new(gpu: &GpuContext, shader: ShaderKind) -> Self {
        let device = &gpu.device;

        // ── Shaders ─────────────────────────────────────────────────────
        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
        });
        let depth_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadow depth shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shadow.wgsl").into()),
        });

        // ── Bind group layout 0: frame uniform ──────────────────────────
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        // ── Layouts 1–3: materials, shadow map, environment ─────────────
        let scene_layout = MaterialTable::bind_group_layout(device);
        let shadow_layout = ShadowResources::bind_group_layout(device);
        let environment_layout = EnvironmentMaps::bind_group_layout(device);

        // ── Scene pipeline ──────────────────────────────────────────────
        let scene_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("scene pipeline layout"),
                bind_group_layouts: &[
                    &frame_layout,
                    &scene_layout,
                    &shadow_layout,
                    &environment_layout,
                ],
                push_constant_ranges: &[],
            });

        let scene_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene pipeline"),
            layout: Some(&scene_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &scene_shader,
                entry_point: Some("vs_main"),
                buffers: &[SceneVertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &scene_shader,
                entry_point: Some(fragment_entry(shader)),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.surface_format(),
                    blend: None, // opaque only
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // ── Depth pipeline (shadow pass) ────────────────────────────────
        let depth_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("shadow pipeline layout"),
                bind_group_layouts: &[&frame_layout],
                push_constant_ranges: &[],
            });

        let depth_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow pipeline"),
            layout: Some(&depth_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &depth_shader,
                entry_point: Some("vs_depth"),
                buffers: &[SceneVertex::LAYOUT],
                compilation_options: Default::default(),
            },
            // Depth-only: no fragment stage, no color targets.
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // ── Frame uniform buffer + bind group ───────────────────────────
        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame uniform buffer"),
            contents: bytemuck::cast_slice(&[FrameUniform::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame bind group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        // ── Shared material sampler ─────────────────────────────────────
        let material_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // ── Window depth buffer ─────────────────────────────────────────
        let (w, h) = gpu.surface_size();
        let depth_texture = create_depth_texture(device, w, h);

        Self {
            scene_pipeline,
            depth_pipeline,
            scene_layout,
            shadow_layout,
            environment_layout,
            frame_buffer,
            frame_bind_group,
            material_sampler,
            depth_texture,
            depth_size: (w, h),
        }
    }

    /// Recreate the window depth buffer if the surface size changed.
    pub fn resize_depth_if_needed(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if (width, height) != self.depth_size && width > 0 && height > 0 {
            self.depth_texture = create_depth_texture(device, width, height);
            self.depth_size = (width, height);
        }
    }
}

/// Map the material's shader tag to a fragment entry point. Every lit
/// variant shares the PBR evaluation; Normal is the debug view.
fn fragment_entry(shader: ShaderKind) -> &'static str {
    match shader {
        ShaderKind::Normal => "fs_normal",
        ShaderKind::Lambert
        | ShaderKind::Phong
        | ShaderKind::Glass
        | ShaderKind::Pbr
        | ShaderKind::Mirror
        | ShaderKind::CookTorrance => "fs_pbr",
    }
}

/// Create a depth texture at the given dimensions.
fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("window depth texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_tag_selects_the_debug_entry() {
        assert_eq!(fragment_entry(ShaderKind::Normal), "fs_normal");
    }

    #[test]
    fn lit_tags_share_the_pbr_entry() {
        for kind in [
            ShaderKind::Lambert,
            ShaderKind::Phong,
            ShaderKind::Glass,
            ShaderKind::Pbr,
            ShaderKind::Mirror,
            ShaderKind::CookTorrance,
        ] {
            assert_eq!(fragment_entry(kind), "fs_pbr");
        }
    }
}
