//! Shadows — the two-pass shadow-mapping setup.
//!
//! Same controls as the viewer. Move the light (WASD/QE) to watch the
//! shadow sweep across the scene; the depth map re-renders every frame.

use skuggi::prelude::*;

fn main() {
    env_logger::init();

    let scene = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("assets/piece.glb"));

    App::new("skuggi — shadows")
        .scene(scene)
        .shader(ShaderKind::Pbr)
        .shadows(true)
        .camera(Vec3::new(10.0, 6.0, 14.0), Vec3::ZERO)
        .light(Vec3::new(6.0, 15.0, 4.0))
        .step_policy(StepPolicy::PerFrame { step: 0.2 })
        .clear_color([0.02, 0.02, 0.03, 1.0])
        .run();
}
