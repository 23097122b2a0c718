//! # Material Table — Packing Materials for Bindless Access
//!
//! The renderer never binds a texture per draw call. Instead, every texture
//! the scene uses is made resident once, in one global binding array, and
//! each material becomes a fixed-stride [`MaterialRecord`] holding *indices*
//! into that array. The whole record table is one read-only storage buffer
//! the fragment shader indexes with the per-vertex material index.
//!
//! ## Record Layout (48 bytes, 16-byte aligned)
//!
//! ```text
//! ┌──────────────┬──────────────┬──────────────┬──────────────┐
//! │ diffuse      │ tex_diffuse  │ rma          │ tex_rma      │
//! │ [f32; 3]     │ u32          │ [f32; 3]     │ u32          │
//! │ offset 0     │ offset 12    │ offset 16    │ offset 28    │
//! ├──────────────┼──────────────┴──────────────┴──────────────┤
//! │ tex_normal   │ reserved × 3                               │
//! │ u32, off 32  │ [u32; 3], offset 36                        │
//! └──────────────┴────────────────────────────────────────────┘
//! ```
//!
//! `rma` packs the roughness/metallic/ior scalar triple. The scalar channels
//! are always present next to the texture indices, so the shader has a
//! constant to fall back on (or to modulate the texture with) either way.
//!
//! ## Fallbacks
//!
//! Index 0 is a 1x1 opaque white pixel, index 1 a 1x1 neutral normal
//! (pointing straight out of the surface). An unpopulated slot stores the
//! matching fallback index — records never hold an invalid index, so the
//! shader needs no validity branches.
//!
//! ## Two Stages
//!
//! Packing is split so the index-assignment logic stays testable without a
//! GPU: [`plan_material_table`] is pure (materials in → records + upload
//! list out), and [`MaterialTable::build`] executes a plan against the
//! device. Record `i` always describes material `i` — the table is built
//! before geometry upload so per-vertex material indices stay valid. The
//! table is uploaded as a single bulk transfer; there is no partial update
//! path, a material change means a full rebuild.

use std::num::NonZeroU32;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::render::gpu::GpuContext;
use crate::scene::{Material, TextureData, TextureSlot};

/// Binding-array capacity. Slots beyond the scene's textures are padded with
/// the white fallback so the bind group always matches the layout count.
pub(crate) const MAX_SCENE_TEXTURES: usize = 64;

/// Index of the 1x1 opaque-white fallback texture.
pub(crate) const WHITE_TEXTURE: u32 = 0;

/// Index of the 1x1 neutral-normal fallback texture.
pub(crate) const FLAT_NORMAL_TEXTURE: u32 = 1;

/// First index handed out to scene textures.
pub(crate) const FIRST_SCENE_TEXTURE: u32 = 2;

/// One fixed-stride GPU material record.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct MaterialRecord {
    /// Diffuse color, multiplied with the diffuse texture sample.
    pub diffuse: [f32; 3],
    /// Binding-array index of the diffuse texture.
    pub tex_diffuse: u32,
    /// Roughness, metallic, index of refraction.
    pub rma: [f32; 3],
    /// Binding-array index of the combined roughness/metallic map.
    pub tex_rma: u32,
    /// Binding-array index of the normal map.
    pub tex_normal: u32,
    /// Keeps the stride at a 16-byte multiple; must stay zero.
    pub reserved: [u32; 3],
}

const _: () = assert!(std::mem::size_of::<MaterialRecord>() == 48);
const _: () = assert!(std::mem::size_of::<MaterialRecord>() % 16 == 0);

/// A texture slot the plan wants uploaded, identified by owner + slot so the
/// pixel data is borrowed from the scene at upload time, not copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PlannedTexture {
    pub material: usize,
    pub slot: TextureSlot,
}

/// Output of the pure packing stage.
pub(crate) struct TablePlan {
    /// One record per material, in material order.
    pub records: Vec<MaterialRecord>,
    /// Textures to upload, in binding-array index order starting at
    /// [`FIRST_SCENE_TEXTURE`].
    pub textures: Vec<PlannedTexture>,
}

/// Walk the material list and assign every populated Diffuse/Rma/Normal slot
/// a binding-array index; unpopulated slots get the matching fallback.
///
/// The material list must carry dense indices (material `i` has
/// `material_index == i`) — that invariant is what makes record order equal
/// table order, and it is asserted here rather than silently repaired.
pub(crate) fn plan_material_table(materials: &[Material]) -> TablePlan {
    let mut records = Vec::with_capacity(materials.len());
    let mut textures = Vec::new();

    let mut next_index = FIRST_SCENE_TEXTURE;
    let mut assign = |textures: &mut Vec<PlannedTexture>,
                      material: usize,
                      slot: TextureSlot,
                      populated: bool,
                      fallback: u32| {
        if populated {
            let index = next_index;
            next_index += 1;
            textures.push(PlannedTexture { material, slot });
            index
        } else {
            fallback
        }
    };

    for (i, material) in materials.iter().enumerate() {
        assert_eq!(
            material.material_index as usize, i,
            "material '{}' is not densely indexed",
            material.name
        );

        let tex_diffuse = assign(
            &mut textures,
            i,
            TextureSlot::Diffuse,
            material.has_texture(TextureSlot::Diffuse),
            WHITE_TEXTURE,
        );
        let tex_rma = assign(
            &mut textures,
            i,
            TextureSlot::Rma,
            material.has_texture(TextureSlot::Rma),
            WHITE_TEXTURE,
        );
        let tex_normal = assign(
            &mut textures,
            i,
            TextureSlot::Normal,
            material.has_texture(TextureSlot::Normal),
            FLAT_NORMAL_TEXTURE,
        );

        records.push(MaterialRecord {
            diffuse: material.diffuse.to_array(),
            tex_diffuse,
            rma: [material.roughness, material.metallic, material.ior],
            tex_rma,
            tex_normal,
            reserved: [0; 3],
        });
    }

    assert!(
        (next_index as usize) <= MAX_SCENE_TEXTURES,
        "scene uses {} textures, binding array holds {}",
        next_index,
        MAX_SCENE_TEXTURES
    );

    TablePlan { records, textures }
}

// ── GPU side ────────────────────────────────────────────────────────────

/// All resident scene textures, in binding-array order.
pub(crate) struct TextureStore {
    views: Vec<wgpu::TextureView>,
}

impl TextureStore {
    /// Create the store with the two fallbacks resident at indices 0 and 1.
    pub fn new(gpu: &GpuContext) -> Self {
        let mut store = Self { views: Vec::new() };
        store.upload_rgba8(gpu, "white 1x1", 1, 1, &[255, 255, 255, 255], true);
        store.upload_rgba8(gpu, "flat normal 1x1", 1, 1, &[128, 128, 255, 255], false);
        store
    }

    /// Upload RGBA8 pixels and return the assigned binding-array index.
    /// Color data is sRGB; normal/roughness data stays linear.
    pub fn upload_rgba8(
        &mut self,
        gpu: &GpuContext,
        label: &str,
        width: u32,
        height: u32,
        data: &[u8],
        srgb: bool,
    ) -> u32 {
        let format = if srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let index = self.views.len() as u32;
        self.views
            .push(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        index
    }

    /// Number of resident textures (fallbacks included).
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// View references padded to the binding-array capacity with the white
    /// fallback, ready for the bind group.
    pub fn binding_views(&self) -> Vec<&wgpu::TextureView> {
        let mut views: Vec<&wgpu::TextureView> = self.views.iter().collect();
        while views.len() < MAX_SCENE_TEXTURES {
            views.push(&self.views[WHITE_TEXTURE as usize]);
        }
        views
    }
}

/// The GPU-resident material table: record buffer, resident textures, and
/// the bind group that exposes both (plus the shared sampler) to the color
/// pass. Built once at scene load.
pub(crate) struct MaterialTable {
    pub bind_group: wgpu::BindGroup,
    // Views must outlive the bind group that references them.
    _textures: TextureStore,
    _buffer: wgpu::Buffer,
}

impl MaterialTable {
    /// Plan and execute the full table build: make every planned texture
    /// resident, upload the record table in one transfer, and assemble the
    /// scene bind group.
    pub fn build(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        materials: &[Material],
    ) -> Self {
        let plan = plan_material_table(materials);
        assert_eq!(plan.records.len(), materials.len());

        let mut store = TextureStore::new(gpu);
        for planned in &plan.textures {
            let material = &materials[planned.material];
            let data: &TextureData = material
                .texture(planned.slot)
                .expect("planned texture slot is populated");
            let label = format!("{}:{:?}", material.name, planned.slot);
            // Only the diffuse slot holds color data.
            let srgb = planned.slot == TextureSlot::Diffuse;
            store.upload_rgba8(gpu, &label, data.width, data.height, &data.pixels, srgb);
        }
        // The plan assigned indices assuming upload order; verify they met.
        assert_eq!(
            store.len(),
            FIRST_SCENE_TEXTURE as usize + plan.textures.len(),
            "texture uploads diverged from the plan"
        );

        let buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("material record table"),
                contents: bytemuck::cast_slice(&plan.records),
                usage: wgpu::BufferUsages::STORAGE,
            });

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene material bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureViewArray(&store.binding_views()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        log::info!(
            "material table: {} records, {} resident textures",
            plan.records.len(),
            store.len()
        );

        Self {
            bind_group,
            _textures: store,
            _buffer: buffer,
        }
    }

    /// Bind group layout for the record table + texture array + sampler.
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene material layout"),
            entries: &[
                // material record table
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // global texture binding array
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: Some(NonZeroU32::new(MAX_SCENE_TEXTURES as u32).unwrap()),
                },
                // shared material sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Material;

    fn pixel(rgba: [u8; 4]) -> TextureData {
        TextureData::new(1, 1, rgba.to_vec())
    }

    #[test]
    fn one_record_per_material_in_order() {
        let materials: Vec<Material> = (0..5)
            .map(|i| Material::new(format!("m{i}"), i as u32))
            .collect();
        let plan = plan_material_table(&materials);
        assert_eq!(plan.records.len(), 5);
        assert!(plan.textures.is_empty(), "bare materials upload nothing");
    }

    #[test]
    fn untextured_slots_fall_back() {
        let mut material = Material::new("matte", 0);
        material.diffuse = glam::Vec3::new(0.8, 0.2, 0.1);
        material.roughness = 0.7;
        material.metallic = 0.3;

        let plan = plan_material_table(&[material]);
        let record = &plan.records[0];
        assert_eq!(record.tex_diffuse, WHITE_TEXTURE);
        assert_eq!(record.tex_rma, WHITE_TEXTURE);
        assert_eq!(record.tex_normal, FLAT_NORMAL_TEXTURE);
        assert_eq!(record.diffuse, [0.8, 0.2, 0.1]);
        assert_eq!(record.rma, [0.7, 0.3, 1.5]);
    }

    #[test]
    fn scalar_channels_are_stored_even_with_textures() {
        let mut material = Material::new("painted", 0);
        material.diffuse = glam::Vec3::new(0.5, 0.5, 1.0);
        material.set_texture(TextureSlot::Diffuse, pixel([10, 20, 30, 255]));

        let plan = plan_material_table(&[material]);
        assert_eq!(plan.records[0].diffuse, [0.5, 0.5, 1.0]);
        assert_eq!(plan.records[0].tex_diffuse, FIRST_SCENE_TEXTURE);
    }

    #[test]
    fn diffuse_only_and_fully_textured_pair() {
        // The two-surface scenario: material 0 is diffuse-only, material 1
        // carries all three relevant maps.
        let mut diffuse_only = Material::new("plain", 0);
        diffuse_only.set_texture(TextureSlot::Diffuse, pixel([200, 200, 200, 255]));

        let mut full = Material::new("detailed", 1);
        full.set_texture(TextureSlot::Diffuse, pixel([1, 2, 3, 255]));
        full.set_texture(TextureSlot::Rma, pixel([128, 64, 0, 255]));
        full.set_texture(TextureSlot::Normal, pixel([128, 128, 255, 255]));

        let plan = plan_material_table(&[diffuse_only, full]);
        assert_eq!(plan.records.len(), 2);
        assert_eq!(plan.textures.len(), 4);

        let plain = &plan.records[0];
        assert_eq!(plain.tex_diffuse, FIRST_SCENE_TEXTURE);
        assert_eq!(plain.tex_rma, WHITE_TEXTURE);
        assert_eq!(plain.tex_normal, FLAT_NORMAL_TEXTURE);

        let detailed = &plan.records[1];
        assert!(detailed.tex_diffuse >= FIRST_SCENE_TEXTURE);
        assert!(detailed.tex_rma >= FIRST_SCENE_TEXTURE);
        assert!(detailed.tex_normal >= FIRST_SCENE_TEXTURE);
        assert_ne!(detailed.tex_diffuse, detailed.tex_rma);
        assert_ne!(detailed.tex_rma, detailed.tex_normal);
        assert_ne!(detailed.tex_diffuse, detailed.tex_normal);
    }

    #[test]
    fn every_assigned_index_is_in_range() {
        let mut materials = Vec::new();
        for i in 0..8 {
            let mut m = Material::new(format!("m{i}"), i as u32);
            if i % 2 == 0 {
                m.set_texture(TextureSlot::Diffuse, pixel([i as u8; 4]));
            }
            if i % 3 == 0 {
                m.set_texture(TextureSlot::Normal, pixel([128, 128, 255, 255]));
            }
            materials.push(m);
        }
        let plan = plan_material_table(&materials);
        for record in &plan.records {
            for index in [record.tex_diffuse, record.tex_rma, record.tex_normal] {
                assert!((index as usize) < MAX_SCENE_TEXTURES);
                let dynamic = index >= FIRST_SCENE_TEXTURE;
                let fallback = index == WHITE_TEXTURE || index == FLAT_NORMAL_TEXTURE;
                assert!(dynamic || fallback, "index {index} is neither");
            }
        }
    }

    #[test]
    #[should_panic(expected = "not densely indexed")]
    fn sparse_material_indices_are_rejected() {
        let materials = vec![Material::new("a", 0), Material::new("b", 5)];
        plan_material_table(&materials);
    }
}
