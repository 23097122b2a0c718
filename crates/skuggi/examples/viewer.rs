//! Viewer — load a scene and orbit around it.
//!
//! Pass a glTF/GLB path as the first argument, or rely on the default.
//! Light moves on WASD/QE, the camera eye on the numpad (4/6, 8/5, 7/9).

use skuggi::prelude::*;

fn main() {
    env_logger::init();

    let scene = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("assets/avenger.glb"));

    App::new("skuggi — viewer")
        .scene(scene)
        .shader(ShaderKind::Pbr)
        .animate(true)
        .camera(Vec3::new(8.0, 5.0, 12.0), Vec3::ZERO)
        .light(Vec3::new(4.0, 12.0, 6.0))
        .run();
}
