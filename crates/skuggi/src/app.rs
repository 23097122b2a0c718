//! App builder — the whole configuration surface.
//!
//! [`App`] collects the small enumerated set of options a session needs
//! (scene file, shader variant, shadows, animation, starting camera/light,
//! stepping policy, environment maps), then hands a frozen snapshot to the
//! window handler and runs the event loop.
//!
//! # Example
//!
//! ```ignore
//! use skuggi::prelude::*;
//!
//! fn main() {
//!     env_logger::init();
//!
//!     App::new("my scene")
//!         .scene("assets/room.glb")
//!         .shader(ShaderKind::Pbr)
//!         .shadows(true)
//!         .camera(Vec3::new(6.0, 4.0, 10.0), Vec3::ZERO)
//!         .light(Vec3::new(3.0, 10.0, 5.0))
//!         .run();
//! }
//! ```

use glam::Vec3;

use crate::render::EnvironmentPaths;
use crate::scene::ShaderKind;

/// How held movement keys translate into camera/light position deltas.
///
/// The classic behavior is a fixed step per frame per held key, which makes
/// apparent speed depend on frame rate. That is kept as the default on
/// purpose — it is a policy choice, not a bug to silently repair — and the
/// time-scaled alternative is a configuration away.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepPolicy {
    /// Fixed world units per frame per held key. Frame-rate dependent.
    PerFrame { step: f32 },
    /// World units per second per held key, scaled by the frame delta.
    PerSecond { rate: f32 },
}

impl StepPolicy {
    /// The world-space step for a frame that took `delta_secs`.
    pub(crate) fn step(&self, delta_secs: f32) -> f32 {
        match *self {
            StepPolicy::PerFrame { step } => step,
            StepPolicy::PerSecond { rate } => rate * delta_secs,
        }
    }
}

impl Default for StepPolicy {
    fn default() -> Self {
        StepPolicy::PerFrame { step: 0.2 }
    }
}

/// Frozen configuration handed to the window handler.
#[derive(Debug, Clone)]
pub(crate) struct AppConfig {
    pub title: String,
    pub scene_path: String,
    pub shader: ShaderKind,
    pub shadows: bool,
    pub animate: bool,
    pub view_from: Vec3,
    pub view_at: Vec3,
    pub light_pos: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub window_size: (u32, u32),
    pub step_policy: StepPolicy,
    /// Spin advance per frame in radians, applied when `animate` is set.
    pub spin_step: f32,
    pub clear_color: [f64; 4],
    pub environment: Option<EnvironmentPaths>,
}

/// The app builder. Configure, then call [`run`](App::run).
pub struct App {
    config: AppConfig,
}

impl App {
    /// Create an app with the given window title and defaults: PBR shading,
    /// shadows and animation off, a 45° field of view, and the camera a few
    /// units out looking at the origin.
    pub fn new(title: &str) -> Self {
        Self {
            config: AppConfig {
                title: title.to_string(),
                scene_path: String::new(),
                shader: ShaderKind::default(),
                shadows: false,
                animate: false,
                view_from: Vec3::new(6.0, 4.0, 10.0),
                view_at: Vec3::ZERO,
                light_pos: Vec3::new(3.0, 10.0, 5.0),
                fov_y: 45f32.to_radians(),
                window_size: (1280, 720),
                step_policy: StepPolicy::default(),
                spin_step: 0.0009,
                clear_color: [0.0, 0.0, 0.0, 1.0],
                environment: None,
            },
        }
    }

    /// Set the scene file to load (glTF/GLB). Required.
    pub fn scene(mut self, path: impl Into<String>) -> Self {
        self.config.scene_path = path.into();
        self
    }

    /// Select the shading variant.
    pub fn shader(mut self, shader: ShaderKind) -> Self {
        self.config.shader = shader;
        self
    }

    /// Enable or disable the shadow-mapping stage.
    pub fn shadows(mut self, enabled: bool) -> Self {
        self.config.shadows = enabled;
        self
    }

    /// Enable or disable the model spin animation.
    pub fn animate(mut self, enabled: bool) -> Self {
        self.config.animate = enabled;
        self
    }

    /// Initial camera eye and target positions.
    pub fn camera(mut self, view_from: Vec3, view_at: Vec3) -> Self {
        self.config.view_from = view_from;
        self.config.view_at = view_at;
        self
    }

    /// Initial light position.
    pub fn light(mut self, position: Vec3) -> Self {
        self.config.light_pos = position;
        self
    }

    /// Vertical field of view in radians. Must be strictly positive.
    pub fn fov_y(mut self, fov_y: f32) -> Self {
        assert!(fov_y > 0.0, "field of view must be strictly positive");
        self.config.fov_y = fov_y;
        self
    }

    /// Initial window size in logical pixels.
    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.config.window_size = (width, height);
        self
    }

    /// Movement stepping policy for the camera/light keys.
    pub fn step_policy(mut self, policy: StepPolicy) -> Self {
        self.config.step_policy = policy;
        self
    }

    /// Background color.
    pub fn clear_color(mut self, color: [f64; 4]) -> Self {
        self.config.clear_color = color;
        self
    }

    /// Configure the image-based-lighting maps.
    pub fn environment(mut self, paths: EnvironmentPaths) -> Self {
        self.config.environment = Some(paths);
        self
    }

    /// Start the event loop. Does not return until the window closes.
    pub fn run(self) {
        assert!(
            !self.config.scene_path.is_empty(),
            "no scene file configured — call .scene(path)"
        );

        let event_loop = winit::event_loop::EventLoop::new()
            .expect("Failed to create event loop");

        let mut app = crate::window::WinitApp::new(self.config);
        event_loop.run_app(&mut app).expect("Event loop error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_frame_step_ignores_delta() {
        let policy = StepPolicy::PerFrame { step: 0.2 };
        assert_eq!(policy.step(0.001), 0.2);
        assert_eq!(policy.step(0.5), 0.2);
    }

    #[test]
    fn per_second_step_scales_with_delta() {
        let policy = StepPolicy::PerSecond { rate: 4.0 };
        assert!((policy.step(0.25) - 1.0).abs() < 1e-6);
        assert!((policy.step(0.5) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn builder_overrides_land_in_the_config() {
        let app = App::new("t")
            .scene("scene.glb")
            .shadows(true)
            .animate(true)
            .fov_y(1.0)
            .window_size(640, 480);
        assert_eq!(app.config.scene_path, "scene.glb");
        assert!(app.config.shadows);
        assert!(app.config.animate);
        assert_eq!(app.config.fov_y, 1.0);
        assert_eq!(app.config.window_size, (640, 480));
    }

    #[test]
    #[should_panic(expected = "field of view must be strictly positive")]
    fn zero_fov_is_rejected_by_the_builder() {
        App::new("t").fov_y(0.0);
    }
}
