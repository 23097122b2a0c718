//! # Shadow — Depth Map Resources and the Pass Sequencer
//!
//! Shadow mapping is two passes with different framebuffer state: first the
//! scene is rendered from the light into a depth-only texture, then the
//! normal color pass samples that texture to decide what the light reaches.
//! The classic failure mode is state leakage between the passes — above all
//! forgetting to restore the viewport after the depth pass, because the
//! shadow map has its own fixed resolution that has nothing to do with the
//! window. Every draw after that silently renders into the wrong corner of
//! the screen.
//!
//! So the ordering and the state restoration are not left to control flow.
//! [`PassSequence`] is a tiny state machine that yields fully-specified
//! [`PassPlan`]s in enforced order: the depth plan carries the shadow-map
//! viewport, the color plan carries the full window viewport, and the
//! executor applies whatever plan it is handed. Skipping the restore is not
//! expressible.
//!
//! The depth pass re-renders every frame — the light and the geometry spin
//! freely, so nothing about the previous frame's map can be reused.

use crate::render::gpu::GpuContext;

/// Shadow map resolution, deliberately independent of (and usually lower
/// than) the window resolution.
pub(crate) const SHADOW_MAP_SIZE: u32 = 1024;

/// Depth format shared by the shadow map and the window depth buffer.
pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// The depth-only target the light renders into, plus everything the color
/// pass needs to sample it. Created once when shadows are enabled, reused
/// unmodified every frame, released on drop.
pub(crate) struct ShadowResources {
    /// Attached as the depth target of the depth pass.
    pub render_view: wgpu::TextureView,
    /// Bound into the color pass for comparison sampling.
    pub bind_group: wgpu::BindGroup,
}

impl ShadowResources {
    pub fn new(gpu: &GpuContext, layout: &wgpu::BindGroupLayout) -> Self {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow map"),
            size: wgpu::Extent3d {
                width: SHADOW_MAP_SIZE,
                height: SHADOW_MAP_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let render_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampled_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let bind_group = Self::bind(gpu, layout, &sampled_view, &sampler);

        Self {
            render_view,
            bind_group,
        }
    }

    /// A 1x1 stand-in bound when shadows are disabled: the pipeline layout
    /// still expects the slot, but the shader never samples it (the frame
    /// uniform's shadow flag is 0).
    pub fn placeholder(gpu: &GpuContext, layout: &wgpu::BindGroupLayout) -> wgpu::BindGroup {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow map placeholder"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow sampler placeholder"),
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        Self::bind(gpu, layout, &view, &sampler)
    }

    fn bind(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    /// Layout for the depth texture + comparison sampler pair.
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Depth,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        })
    }
}

/// Shadow state for the whole session: either the real resource set, or the
/// placeholder bind group that keeps the pipeline layout satisfied while the
/// controller is skipped entirely.
pub(crate) enum ShadowState {
    Enabled(ShadowResources),
    Disabled { bind_group: wgpu::BindGroup },
}

impl ShadowState {
    pub fn new(gpu: &GpuContext, layout: &wgpu::BindGroupLayout, enabled: bool) -> Self {
        if enabled {
            Self::Enabled(ShadowResources::new(gpu, layout))
        } else {
            Self::Disabled {
                bind_group: ShadowResources::placeholder(gpu, layout),
            }
        }
    }

    pub fn enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    /// The real resources, present only when shadows are on.
    pub fn resources(&self) -> Option<&ShadowResources> {
        match self {
            Self::Enabled(resources) => Some(resources),
            Self::Disabled { .. } => None,
        }
    }

    /// The bind group the color pass mounts at the shadow slot.
    pub fn sample_bind_group(&self) -> &wgpu::BindGroup {
        match self {
            Self::Enabled(resources) => &resources.bind_group,
            Self::Disabled { bind_group } => bind_group,
        }
    }
}

// ── Pass sequencing ─────────────────────────────────────────────────────

/// Which render pass a plan describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PassKind {
    /// Depth-only render into the shadow map, from the light's view.
    Depth,
    /// The shading pass into the window surface.
    Color,
}

/// One fully-specified pass: what it is and the viewport it must set.
///
/// The viewport travels with the plan so restoring it after the depth pass
/// is a property of the sequence, not a cleanup step someone can forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PassPlan {
    pub kind: PassKind,
    /// Viewport extent in pixels.
    pub viewport: (u32, u32),
}

/// The per-frame pass state machine.
///
/// With shadows enabled it yields exactly `[Depth, Color]`; without, exactly
/// `[Color]`. The transition out of Depth is unconditional — there is no
/// state in which the color pass runs at the shadow-map viewport.
pub(crate) struct PassSequence {
    plans: [Option<PassPlan>; 2],
    next: usize,
}

impl PassSequence {
    pub fn new(shadows: bool, surface_size: (u32, u32)) -> Self {
        let depth = shadows.then_some(PassPlan {
            kind: PassKind::Depth,
            viewport: (SHADOW_MAP_SIZE, SHADOW_MAP_SIZE),
        });
        let color = Some(PassPlan {
            kind: PassKind::Color,
            viewport: surface_size,
        });
        let plans = match depth {
            Some(d) => [Some(d), color],
            None => [color, None],
        };
        Self { plans, next: 0 }
    }
}

impl Iterator for PassSequence {
    type Item = PassPlan;

    fn next(&mut self) -> Option<PassPlan> {
        let plan = self.plans.get(self.next).copied().flatten();
        self.next += 1;
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadows_off_yields_exactly_one_color_pass() {
        let plans: Vec<PassPlan> = PassSequence::new(false, (1280, 720)).collect();
        assert_eq!(plans.len(), 1, "no depth pass may run with shadows off");
        assert_eq!(plans[0].kind, PassKind::Color);
        assert_eq!(plans[0].viewport, (1280, 720));
    }

    #[test]
    fn shadows_on_yields_depth_then_color() {
        let plans: Vec<PassPlan> = PassSequence::new(true, (1920, 1080)).collect();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].kind, PassKind::Depth);
        assert_eq!(plans[1].kind, PassKind::Color);
    }

    #[test]
    fn depth_pass_uses_the_shadow_viewport() {
        let plans: Vec<PassPlan> = PassSequence::new(true, (1920, 1080)).collect();
        assert_eq!(plans[0].viewport, (SHADOW_MAP_SIZE, SHADOW_MAP_SIZE));
    }

    #[test]
    fn color_pass_viewport_is_restored_to_the_surface() {
        // The invariant the whole module exists for: after the depth pass,
        // the color pass runs at the full surface resolution, even when the
        // shadow map is larger than the window.
        for surface in [(640, 480), (1920, 1080), (800, 600)] {
            let plans: Vec<PassPlan> = PassSequence::new(true, surface).collect();
            let color = plans.iter().find(|p| p.kind == PassKind::Color).unwrap();
            assert_eq!(color.viewport, surface);
        }
    }

    #[test]
    fn sequence_is_exhausted_after_the_color_pass() {
        let mut seq = PassSequence::new(true, (100, 100));
        seq.next();
        seq.next();
        assert_eq!(seq.next(), None);
        assert_eq!(seq.next(), None);
    }
}
