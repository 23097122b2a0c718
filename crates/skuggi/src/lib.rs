//! # Skuggi — Forward PBR Rasterizer with Shadow Mapping
//!
//! A real-time forward renderer: load a triangle-mesh scene once, upload its
//! geometry and materials to the GPU, then draw it every frame under a
//! physically-based shading model with an optional two-pass shadow stage.
//!
//! The design leans on three ideas:
//!
//! - **A bindless material table.** Every material becomes a fixed-stride
//!   record in one storage buffer; every texture lives in one global binding
//!   array. Vertices carry a material index, so the whole scene draws with a
//!   single call and zero per-draw texture binding.
//! - **Closed-form camera math.** View and light-space matrices come from an
//!   orthonormal basis plus the Euclidean inverse — never a general matrix
//!   inverse.
//! - **An explicit pass sequencer.** The depth-then-color ordering and the
//!   viewport restoration between them are a tiny state machine, not a
//!   convention someone can break by reordering statements.
//!
//! Start with `use skuggi::prelude::*` and build an [`App`](app::App).

pub mod app;
pub mod camera;
pub mod input;
pub mod prelude;
pub mod render;
pub mod scene;
pub mod time;
pub(crate) mod window;
