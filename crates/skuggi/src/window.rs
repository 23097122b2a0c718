//! Window management and the frame loop.
//!
//! Implements [`winit::application::ApplicationHandler`] to drive the event
//! loop. Window creation triggers the one-time scene setup (GPU context,
//! material table, geometry upload, shadow resources); every redraw then
//! runs the per-frame sequence:
//!
//! 1. update timing,
//! 2. apply held-key camera/light steps,
//! 3. advance the spin angle when animation is on,
//! 4. compute the frame's matrices once,
//! 5. execute the pass sequence and present.
//!
//! Resource-table setup runs before geometry upload — per-vertex material
//! indices are only valid against a table that already exists in its final
//! order.

use std::sync::Arc;

use glam::Vec3;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::app::AppConfig;
use crate::camera::{Camera, FrameMatrices};
use crate::input::{Input, KeyCode};
use crate::render::draw::render_frame;
use crate::render::environment::EnvironmentMaps;
use crate::render::geometry::GeometryBuffer;
use crate::render::gpu::GpuContext;
use crate::render::material::MaterialTable;
use crate::render::pipeline::SceneRenderer;
use crate::render::shadow::ShadowState;
use crate::scene::load_scene;
use crate::time::Time;

/// The application state winit drives.
pub(crate) struct WinitApp {
    config: AppConfig,
    window: Option<Arc<Window>>,
    state: Option<RenderState>,
    input: Input<KeyCode>,
    time: Time,
}

impl WinitApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            window: None,
            state: None,
            input: Input::new(),
            time: Time::new(),
        }
    }
}

/// Everything built at scene-load time and consumed every frame. Dropping
/// this releases every GPU-resident object exactly once.
struct RenderState {
    gpu: GpuContext,
    renderer: SceneRenderer,
    materials: MaterialTable,
    geometry: GeometryBuffer,
    shadow: ShadowState,
    environment: EnvironmentMaps,
    camera: Camera,
    light_pos: Vec3,
    spin: f32,
}

impl RenderState {
    fn new(window: Arc<Window>, config: &AppConfig) -> Self {
        let gpu = GpuContext::new(window);
        let scene = load_scene(&config.scene_path);

        let renderer = SceneRenderer::new(&gpu, config.shader);
        // Table first, geometry second: flattening stamps vertices with
        // indices into the table that now exists.
        let materials = MaterialTable::build(
            &gpu,
            &renderer.scene_layout,
            &renderer.material_sampler,
            &scene.materials,
        );
        let geometry = GeometryBuffer::upload(&gpu, &scene);
        let shadow = ShadowState::new(&gpu, &renderer.shadow_layout, config.shadows);
        let environment =
            EnvironmentMaps::load(&gpu, &renderer.environment_layout, config.environment.as_ref());

        let (width, height) = gpu.surface_size();
        let camera = Camera::new(width, height, config.fov_y, config.view_from, config.view_at);

        Self {
            gpu,
            renderer,
            materials,
            geometry,
            shadow,
            environment,
            camera,
            light_pos: config.light_pos,
            spin: 0.0,
        }
    }
}

impl ApplicationHandler for WinitApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let (width, height) = self.config.window_size;
            let attrs = Window::default_attributes()
                .with_title(&self.config.title)
                .with_inner_size(winit::dpi::LogicalSize::new(width as f64, height as f64));
            let window = Arc::new(
                event_loop
                    .create_window(attrs)
                    .expect("Failed to create window"),
            );

            self.state = Some(RenderState::new(window.clone(), &self.config));
            window.request_redraw();
            self.window = Some(window);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Window close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(state) = &mut self.state {
                    state.gpu.resize(size.width, size.height);
                    // Aspect ratio follows the surface; the projection is
                    // re-derived from it next frame.
                    state.camera.set_viewport(size.width, size.height);
                    state
                        .renderer
                        .resize_depth_if_needed(&state.gpu.device, size.width, size.height);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.input.press(key_code),
                        ElementState::Released => self.input.release(key_code),
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                self.time.update();

                if let Some(state) = &mut self.state {
                    // ── Input → parameter deltas ────────────────────────
                    let step = self.config.step_policy.step(self.time.delta_secs());
                    apply_movement(&self.input, step, &mut state.camera, &mut state.light_pos);

                    // ── Animation ───────────────────────────────────────
                    if self.config.animate {
                        state.spin += self.config.spin_step;
                    }

                    // ── Transforms, once per frame ──────────────────────
                    let frame = FrameMatrices::compute(
                        &state.camera,
                        state.light_pos,
                        state.spin,
                        state.shadow.enabled(),
                    );

                    log::trace!(
                        "frame {}: camera {:?} light {:?}",
                        self.time.frame_count(),
                        state.camera.view_from,
                        state.light_pos
                    );

                    // ── Render ──────────────────────────────────────────
                    match render_frame(
                        &state.gpu,
                        &state.renderer,
                        &state.geometry,
                        &state.materials,
                        &state.shadow,
                        &state.environment,
                        &frame,
                        self.config.clear_color,
                    ) {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            let (w, h) = state.gpu.surface_size();
                            state.gpu.resize(w, h);
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("Out of GPU memory!");
                            event_loop.exit();
                        }
                        Err(e) => {
                            log::warn!("Surface error: {:?}", e);
                        }
                    }
                }

                self.input.clear_just();

                // Request the next frame.
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }
}

/// Apply the held movement keys: one step along the matching axis per key.
///
/// Light rides on D/A (±x), W/S (±z), Q/E (±y); the camera eye on the
/// numpad — 6/4 (±x), 8/5 (±z), 7/9 (±y).
fn apply_movement(input: &Input<KeyCode>, step: f32, camera: &mut Camera, light_pos: &mut Vec3) {
    if input.pressed(KeyCode::KeyD) {
        light_pos.x += step;
    }
    if input.pressed(KeyCode::KeyA) {
        light_pos.x -= step;
    }
    if input.pressed(KeyCode::KeyW) {
        light_pos.z += step;
    }
    if input.pressed(KeyCode::KeyS) {
        light_pos.z -= step;
    }
    if input.pressed(KeyCode::KeyQ) {
        light_pos.y += step;
    }
    if input.pressed(KeyCode::KeyE) {
        light_pos.y -= step;
    }

    if input.pressed(KeyCode::Numpad6) {
        camera.view_from.x += step;
    }
    if input.pressed(KeyCode::Numpad4) {
        camera.view_from.x -= step;
    }
    if input.pressed(KeyCode::Numpad8) {
        camera.view_from.z += step;
    }
    if input.pressed(KeyCode::Numpad5) {
        camera.view_from.z -= step;
    }
    if input.pressed(KeyCode::Numpad7) {
        camera.view_from.y += step;
    }
    if input.pressed(KeyCode::Numpad9) {
        camera.view_from.y -= step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(800, 600, 1.0, Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO)
    }

    #[test]
    fn held_light_keys_move_the_light_by_one_step() {
        let mut input: Input<KeyCode> = Input::new();
        input.press(KeyCode::KeyD);
        input.press(KeyCode::KeyQ);

        let mut cam = camera();
        let mut light = Vec3::ZERO;
        apply_movement(&input, 0.2, &mut cam, &mut light);

        assert_eq!(light, Vec3::new(0.2, 0.2, 0.0));
        assert_eq!(cam.view_from, Vec3::new(1.0, 2.0, 3.0), "camera untouched");
    }

    #[test]
    fn held_numpad_keys_move_the_camera_eye() {
        let mut input: Input<KeyCode> = Input::new();
        input.press(KeyCode::Numpad4);
        input.press(KeyCode::Numpad8);

        let mut cam = camera();
        let mut light = Vec3::ZERO;
        apply_movement(&input, 0.5, &mut cam, &mut light);

        assert_eq!(cam.view_from, Vec3::new(0.5, 2.0, 3.5));
        assert_eq!(light, Vec3::ZERO, "light untouched");
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut input: Input<KeyCode> = Input::new();
        input.press(KeyCode::KeyW);
        input.press(KeyCode::KeyS);

        let mut cam = camera();
        let mut light = Vec3::new(5.0, 5.0, 5.0);
        apply_movement(&input, 0.2, &mut cam, &mut light);

        assert_eq!(light, Vec3::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn no_keys_no_motion() {
        let input: Input<KeyCode> = Input::new();
        let mut cam = camera();
        let before = cam.view_from;
        let mut light = Vec3::ONE;
        apply_movement(&input, 0.2, &mut cam, &mut light);
        assert_eq!(cam.view_from, before);
        assert_eq!(light, Vec3::ONE);
    }
}
