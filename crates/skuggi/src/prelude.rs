//! Convenience re-exports — `use skuggi::prelude::*` for the common items.

pub use crate::app::{App, StepPolicy};
pub use crate::camera::{Camera, FrameMatrices, FAR_PLANE, NEAR_PLANE};
pub use crate::input::{Input, KeyCode};
pub use crate::render::{EnvironmentPaths, GpuContext};
pub use crate::scene::{
    Material, SceneData, ShaderKind, Surface, TextureData, TextureSlot, Triangle, Vertex,
    load_scene,
};
pub use crate::time::Time;

pub use glam::{Mat4, Vec2, Vec3};
