//! ascii-ngin
//!
//! A lightweight scene lifecycle engine for rendering 3D models as ASCII
//! art in grid cells. The crate owns orchestration: building a scene from a
//! [`config::SceneConfig`], loading its model in the background, mounting
//! into a host container, pausing off-screen cells and running a frame loop
//! capped at 30 fps. Rasterization and model decoding stay behind the seams
//! in [`backend`] and [`resources`], so the same core drives a browser
//! canvas, a native window or the headless doubles used in tests.
//!
//! High-level modules
//! - `backend`: trait seams to the renderer stack and the host container
//! - `cell`: maps viewport visibility/resize signals onto a scene
//! - `config`: per-cell settings, charset ramps, the model repository
//! - `headless`: no-GPU implementations of every seam, with probes
//! - `resources`: fire-and-forget model loading
//! - `sched`: frame callback scheduling
//! - `scene`: the scene instance, its lifecycle and frame loop
//!

pub mod backend;
pub mod cell;
pub mod config;
pub mod headless;
pub mod resources;
pub mod sched;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use instant::Duration;
