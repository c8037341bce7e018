//! Seams to the rendering backend and the hosting page.
//!
//! The engine never rasterizes anything itself. A host hands it a
//! [`RenderBackend`] that builds the whole rig for one cell as a
//! [`RenderStack`], plus a [`MountPoint`] standing in for the cell's
//! container. Everything the engine does afterwards goes through the
//! object-safe traits below, which is what keeps the core drivable without
//! a GPU (see [`crate::headless`]).
//!
//! Backends are expected to build the stack the way the production site
//! does: a perspective camera (50 degree fov, aspect 1, near 0.1, far 1000)
//! sitting at `z = 3`, pixel ratio 1, and the glyph post-effect sampling
//! inverted luminance at `config.resolution`, drawing `config.charset`
//! glyphs tinted `config.color` on black, under a bright and a dim point
//! light plus a weak ambient term.

use anyhow::Result;
use cgmath::{EuclideanSpace, Point3, Vector3};

use crate::config::SceneConfig;

/// Opaque token naming a backend's output surface.
///
/// The engine only ever passes it back into [`MountPoint`] methods, so it
/// can track which container holds which surface without knowing the host's
/// surface type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Axis-aligned bounding box of a model in its local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Point3<f32> {
        self.min.midpoint(self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Largest extent over the three axes.
    pub fn max_dim(&self) -> f32 {
        let size = self.size();
        size.x.max(size.y).max(size.z)
    }

    /// True when the box cannot drive normalization: zero extent in every
    /// axis, or non-finite bounds.
    pub fn is_degenerate(&self) -> bool {
        let dim = self.max_dim();
        !dim.is_finite() || dim <= 0.0
    }
}

/// A decoded model sitting in (or headed for) a scene.
pub trait SceneModel {
    /// Swap every material for the backend's uniform high-contrast one so
    /// luminance maps cleanly onto the charset.
    fn override_materials(&mut self);

    fn bounding_box(&self) -> Aabb;

    fn set_uniform_scale(&mut self, scale: f32);

    fn set_position(&mut self, position: Vector3<f32>);

    /// Add `radians` to the model's yaw.
    fn rotate_y(&mut self, radians: f32);

    /// Start playing the clip at `index` and return the mixer driving it,
    /// or `None` when the model has no such clip.
    fn start_clip(&mut self, index: usize) -> Option<Box<dyn AnimationMixer>>;
}

/// Drives a playing animation clip.
pub trait AnimationMixer {
    /// Advance playback by `seconds`.
    fn advance(&mut self, seconds: f32);
}

/// The backend's scene graph. Holds at most one model.
pub trait SceneGraph {
    /// Put `model` into the scene, replacing any previous one.
    fn attach_model(&mut self, model: Box<dyn SceneModel>);

    fn model(&self) -> Option<&dyn SceneModel>;

    // Not elided: the default object lifetime would be the `&mut self`
    // borrow, which an owning implementation cannot shrink its box to.
    fn model_mut(&mut self) -> Option<&mut (dyn SceneModel + 'static)>;
}

/// Perspective camera owned by one scene.
pub trait Camera {
    /// Update the aspect ratio and refresh the projection.
    fn set_aspect(&mut self, aspect: f32);

    fn aspect(&self) -> f32;
}

/// Raster device behind the glyph effect.
pub trait Renderer {
    /// Release raster resources. Safe to call more than once.
    fn dispose(&mut self);
}

/// Character post-effect drawing the scene as glyphs onto its surface.
pub trait GlyphEffect {
    fn surface(&self) -> SurfaceId;

    /// Match the effect's output to the cell size in pixels.
    fn set_size(&mut self, width: u32, height: u32);

    fn render(&mut self, scene: &dyn SceneGraph, camera: &dyn Camera);
}

/// Everything one cell renders through.
pub struct RenderStack {
    pub scene: Box<dyn SceneGraph>,
    pub camera: Box<dyn Camera>,
    pub renderer: Box<dyn Renderer>,
    pub effect: Box<dyn GlyphEffect>,
}

/// Factory building a [`RenderStack`] per scene.
pub trait RenderBackend {
    fn create_stack(&self, config: &SceneConfig) -> Result<RenderStack>;
}

/// Host-side handle to the container a cell renders into.
///
/// The engine owns the handle exclusively between mount and unmount; the
/// host must not mutate the container behind its back.
pub trait MountPoint {
    /// Insert the surface into the container.
    fn attach(&mut self, surface: SurfaceId);

    /// Remove the surface from the container.
    fn detach(&mut self, surface: SurfaceId);

    /// Whether the container currently holds `surface`.
    fn contains(&self, surface: SurfaceId) -> bool;

    /// Container content size in whole pixels.
    fn measure(&self) -> (u32, u32);

    /// Tell the host the cell is worth showing (fade it in).
    fn reveal(&mut self);
}
