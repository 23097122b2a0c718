//! # Draw — Per-Frame Pass Execution
//!
//! The per-frame entry point of the renderer. [`render_frame`] writes the
//! frame uniform once, walks the [`PassSequence`], encodes one render pass
//! per plan, and submits the lot.
//!
//! ## Per-Frame Flow
//!
//! ```text
//! render_frame(...)
//!   │
//!   ├─ 1. Pack + upload FrameUniform ─── one write, both passes read it
//!   │
//!   ├─ 2. Acquire surface texture
//!   │
//!   ├─ 3. For each plan in PassSequence:
//!   │       Depth → shadow map target, shadow viewport, depth pipeline
//!   │       Color → surface target, full viewport, scene pipeline,
//!   │               groups 0-3 bound once, one draw
//!   │
//!   └─ 4. Submit + present
//! ```
//!
//! Each plan's viewport is applied unconditionally at the top of its pass —
//! the sequencer owns the restoration invariant, this module just obeys it.
//! There is exactly one draw call per pass; the bindless material table is
//! what makes that possible.

use crate::camera::FrameMatrices;
use crate::render::environment::EnvironmentMaps;
use crate::render::geometry::GeometryBuffer;
use crate::render::gpu::GpuContext;
use crate::render::material::MaterialTable;
use crate::render::pipeline::SceneRenderer;
use crate::render::shadow::{PassKind, PassSequence, ShadowState};
use crate::render::vertex::FrameUniform;

/// Render one frame. Returns surface errors to the caller, which decides
/// between reconfigure (Lost/Outdated) and shutdown (OutOfMemory).
pub(crate) fn render_frame(
    gpu: &GpuContext,
    renderer: &SceneRenderer,
    geometry: &GeometryBuffer,
    materials: &MaterialTable,
    shadow: &ShadowState,
    environment: &EnvironmentMaps,
    frame: &FrameMatrices,
    clear_color: [f64; 4],
) -> Result<(), wgpu::SurfaceError> {
    // ── 1. Frame uniform ────────────────────────────────────────────────
    // Written exactly once: the depth pass and the color pass read the same
    // light-space matrix from the same buffer, so they cannot drift apart.
    let uniform = FrameUniform::pack(frame);
    gpu.queue
        .write_buffer(&renderer.frame_buffer, 0, bytemuck::cast_slice(&[uniform]));

    // ── 2. Surface ──────────────────────────────────────────────────────
    let output = gpu.surface.get_current_texture()?;
    let surface_view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("skuggi frame encoder"),
        });

    // ── 3. Passes, in sequencer order ───────────────────────────────────
    for plan in PassSequence::new(shadow.enabled(), gpu.surface_size()) {
        let (vw, vh) = plan.viewport;
        match plan.kind {
            PassKind::Depth => {
                let resources = shadow
                    .resources()
                    .expect("depth pass planned without shadow resources");
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("shadow depth pass"),
                    color_attachments: &[],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &resources.render_view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                pass.set_viewport(0.0, 0.0, vw as f32, vh as f32, 0.0, 1.0);
                pass.set_pipeline(&renderer.depth_pipeline);
                pass.set_bind_group(0, &renderer.frame_bind_group, &[]);
                pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
                pass.draw(0..geometry.vertex_count, 0..1);
            }

            PassKind::Color => {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("scene color pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &surface_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: clear_color[0],
                                g: clear_color[1],
                                b: clear_color[2],
                                a: clear_color[3],
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &renderer.depth_texture,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                pass.set_viewport(0.0, 0.0, vw as f32, vh as f32, 0.0, 1.0);
                pass.set_pipeline(&renderer.scene_pipeline);
                pass.set_bind_group(0, &renderer.frame_bind_group, &[]);
                pass.set_bind_group(1, &materials.bind_group, &[]);
                pass.set_bind_group(2, shadow.sample_bind_group(), &[]);
                pass.set_bind_group(3, &environment.bind_group, &[]);
                pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
                pass.draw(0..geometry.vertex_count, 0..1);
            }
        }
    }

    // ── 4. Submit + present ─────────────────────────────────────────────
    gpu.queue.submit(std::iter::once(encoder.finish()));
    output.present();

    Ok(())
}
