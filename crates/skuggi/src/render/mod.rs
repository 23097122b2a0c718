//! Rendering subsystem: GPU context, resource upload, and the per-frame
//! pass execution.
//!
//! Scene-load time builds the static resources ([`material::MaterialTable`],
//! [`geometry::GeometryBuffer`], [`shadow::ShadowState`],
//! [`environment::EnvironmentMaps`]); every frame then runs through
//! [`draw::render_frame`], which executes the pass sequence against them.

pub(crate) mod draw;
pub mod environment;
pub(crate) mod geometry;
pub mod gpu;
pub(crate) mod material;
pub(crate) mod pipeline;
pub(crate) mod shadow;
pub(crate) mod vertex;

pub use environment::EnvironmentPaths;
pub use gpu::GpuContext;
