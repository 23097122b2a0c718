//! # Environment — Image-Based Lighting Maps
//!
//! Three optional lookup textures feed the ambient terms of the PBR shader:
//!
//! - **Irradiance map**: diffuse ambient light by surface direction
//!   (equirectangular).
//! - **Prefiltered environment map**: specular reflections, one image per
//!   roughness level loaded into successive mip levels, so the shader can
//!   pick the blur that matches the material's roughness with a single
//!   `textureSampleLevel`.
//! - **BRDF integration map**: the split-sum GGX lookup table indexed by
//!   (n·v, roughness).
//!
//! All three are precomputed offline and loaded as HDR images. Any map that
//! fails to load degrades to a 1x1 black pixel — the ambient terms vanish
//! and the renderer carries on with direct lighting only (logged, not
//! fatal). When no environment is configured at all, the same fallbacks keep
//! the bind group layout satisfied.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::render::gpu::GpuContext;

/// File paths for the three environment maps. The prefiltered list is
/// ordered base level first, each following image intended at half the
/// previous resolution.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentPaths {
    pub irradiance: String,
    pub prefiltered: Vec<String>,
    pub brdf_lut: String,
}

/// Mip count for the prefiltered map, padded to 16 bytes for the uniform.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct EnvUniform {
    mip_count: u32,
    _pad: [u32; 3],
}

/// The resident environment map set. Built once at startup.
pub(crate) struct EnvironmentMaps {
    pub bind_group: wgpu::BindGroup,
}

impl EnvironmentMaps {
    /// Load the configured maps, or fall back to neutral 1x1 textures.
    pub fn load(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        paths: Option<&EnvironmentPaths>,
    ) -> Self {
        let (irradiance, env, mip_count, brdf) = match paths {
            Some(paths) => {
                let irradiance = load_level_images(gpu, "irradiance map", &[paths.irradiance.clone()]);
                let env = load_level_images(gpu, "environment map", &paths.prefiltered);
                let mips = if paths.prefiltered.is_empty() {
                    1
                } else {
                    paths.prefiltered.len() as u32
                };
                let brdf = load_level_images(gpu, "brdf lut", &[paths.brdf_lut.clone()]);
                (irradiance, env, mips, brdf)
            }
            None => (
                black_pixel(gpu, "irradiance fallback"),
                black_pixel(gpu, "environment fallback"),
                1,
                black_pixel(gpu, "brdf fallback"),
            ),
        };

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("environment sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("environment uniform"),
                contents: bytemuck::cast_slice(&[EnvUniform {
                    mip_count,
                    _pad: [0; 3],
                }]),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("environment bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&irradiance),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&env),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&brdf),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: uniform.as_entire_binding(),
                },
            ],
        });

        Self { bind_group }
    }

    /// Layout for the three maps + sampler + mip-count uniform.
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        let float_texture = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        };

        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("environment layout"),
            entries: &[
                float_texture(0),
                float_texture(1),
                float_texture(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        })
    }
}

/// Load a stack of images into the mip chain of one `Rgba32Float` texture.
/// Level 0 sets the base size; later images are resized onto the expected
/// half-size chain when they disagree. Any read failure falls back to black.
fn load_level_images(gpu: &GpuContext, label: &str, paths: &[String]) -> wgpu::TextureView {
    if paths.is_empty() {
        return black_pixel(gpu, label);
    }

    let mut levels: Vec<image::Rgba32FImage> = Vec::with_capacity(paths.len());
    for (level, path) in paths.iter().enumerate() {
        let img = match image::open(path) {
            Ok(img) => img.to_rgba32f(),
            Err(e) => {
                log::warn!("{label}: cannot load '{path}': {e}, using fallback");
                return black_pixel(gpu, label);
            }
        };
        let img = if level == 0 {
            img
        } else {
            let expected_w = (levels[0].width() >> level).max(1);
            let expected_h = (levels[0].height() >> level).max(1);
            if (img.width(), img.height()) != (expected_w, expected_h) {
                log::warn!(
                    "{label}: level {level} is {}x{}, resizing to {expected_w}x{expected_h}",
                    img.width(),
                    img.height()
                );
                image::imageops::resize(
                    &img,
                    expected_w,
                    expected_h,
                    image::imageops::FilterType::Triangle,
                )
            } else {
                img
            }
        };
        levels.push(img);
    }

    // Concatenate the levels mip-major for a single upload.
    let mut data: Vec<u8> = Vec::new();
    for level in &levels {
        data.extend_from_slice(bytemuck::cast_slice(level.as_raw()));
    }

    let texture = gpu.device.create_texture_with_data(
        &gpu.queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: levels[0].width(),
                height: levels[0].height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::MipMajor,
        &data,
    );

    log::info!(
        "{label}: {}x{}, {} level(s)",
        levels[0].width(),
        levels[0].height(),
        levels.len()
    );

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// A 1x1 black `Rgba32Float` pixel — the neutral "no environment" value.
fn black_pixel(gpu: &GpuContext, label: &str) -> wgpu::TextureView {
    let texture = gpu.device.create_texture_with_data(
        &gpu.queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        bytemuck::cast_slice(&[0.0f32, 0.0, 0.0, 1.0]),
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
