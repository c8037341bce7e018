//! Headless implementations of every seam.
//!
//! Nothing here touches a GPU or a DOM. Each double pairs with a probe
//! sharing its state through `Rc<RefCell<_>>`: a test keeps the probe,
//! hands the double to the engine and asserts on what the engine did with
//! it. The demo under `demos/` drives full scenes the same way, and the
//! doubles are the recommended bring-up rig when porting the engine to a
//! new host.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use cgmath::Vector3;

use crate::backend::{
    Aabb, AnimationMixer, Camera, GlyphEffect, MountPoint, RenderBackend, RenderStack, Renderer,
    SceneGraph, SceneModel, SurfaceId,
};
use crate::config::SceneConfig;
use crate::resources::{LoadReceiver, LoadSender, ModelAsset, ModelLoader};

static NEXT_SURFACE: AtomicU64 = AtomicU64::new(1);

/// Everything the stack doubles record.
#[derive(Debug)]
pub struct StackState {
    pub config: Option<SceneConfig>,
    pub renders: u32,
    pub aspect: f32,
    pub size: (u32, u32),
    pub disposed: bool,
    pub model_attached: bool,
}

impl Default for StackState {
    fn default() -> Self {
        Self {
            config: None,
            renders: 0,
            aspect: 1.0,
            size: (0, 0),
            disposed: false,
            model_attached: false,
        }
    }
}

/// Backend double. Build one per scene and keep the probe.
pub struct HeadlessBackend {
    state: Rc<RefCell<StackState>>,
    fail_create: bool,
}

impl HeadlessBackend {
    pub fn new() -> (Self, StackProbe) {
        let state = Rc::new(RefCell::new(StackState::default()));
        (
            Self {
                state: Rc::clone(&state),
                fail_create: false,
            },
            StackProbe { state },
        )
    }

    /// A backend whose `create_stack` always fails.
    pub fn failing() -> Self {
        Self {
            state: Rc::new(RefCell::new(StackState::default())),
            fail_create: true,
        }
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_stack(&self, config: &SceneConfig) -> Result<RenderStack> {
        if self.fail_create {
            anyhow::bail!("no raster device available");
        }
        self.state.borrow_mut().config = Some(config.clone());
        let surface = SurfaceId(NEXT_SURFACE.fetch_add(1, Ordering::Relaxed));
        Ok(RenderStack {
            scene: Box::new(HeadlessScene {
                model: None,
                state: Rc::clone(&self.state),
            }),
            camera: Box::new(HeadlessCamera {
                state: Rc::clone(&self.state),
            }),
            renderer: Box::new(HeadlessRenderer {
                state: Rc::clone(&self.state),
            }),
            effect: Box::new(HeadlessEffect {
                surface,
                state: Rc::clone(&self.state),
            }),
        })
    }
}

/// Observer half of [`HeadlessBackend`].
pub struct StackProbe {
    state: Rc<RefCell<StackState>>,
}

impl StackProbe {
    pub fn renders(&self) -> u32 {
        self.state.borrow().renders
    }

    pub fn aspect(&self) -> f32 {
        self.state.borrow().aspect
    }

    pub fn size(&self) -> (u32, u32) {
        self.state.borrow().size
    }

    pub fn disposed(&self) -> bool {
        self.state.borrow().disposed
    }

    pub fn model_attached(&self) -> bool {
        self.state.borrow().model_attached
    }

    /// The config the stack was built from.
    pub fn config(&self) -> Option<SceneConfig> {
        self.state.borrow().config.clone()
    }
}

struct HeadlessScene {
    model: Option<Box<dyn SceneModel>>,
    state: Rc<RefCell<StackState>>,
}

impl SceneGraph for HeadlessScene {
    fn attach_model(&mut self, model: Box<dyn SceneModel>) {
        self.state.borrow_mut().model_attached = true;
        self.model = Some(model);
    }

    fn model(&self) -> Option<&dyn SceneModel> {
        self.model.as_deref()
    }

    fn model_mut(&mut self) -> Option<&mut (dyn SceneModel + 'static)> {
        self.model.as_deref_mut()
    }
}

struct HeadlessCamera {
    state: Rc<RefCell<StackState>>,
}

impl Camera for HeadlessCamera {
    fn set_aspect(&mut self, aspect: f32) {
        self.state.borrow_mut().aspect = aspect;
    }

    fn aspect(&self) -> f32 {
        self.state.borrow().aspect
    }
}

struct HeadlessRenderer {
    state: Rc<RefCell<StackState>>,
}

impl Renderer for HeadlessRenderer {
    fn dispose(&mut self) {
        self.state.borrow_mut().disposed = true;
    }
}

struct HeadlessEffect {
    surface: SurfaceId,
    state: Rc<RefCell<StackState>>,
}

impl GlyphEffect for HeadlessEffect {
    fn surface(&self) -> SurfaceId {
        self.surface
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.state.borrow_mut().size = (width, height);
    }

    fn render(&mut self, _scene: &dyn SceneGraph, _camera: &dyn Camera) {
        self.state.borrow_mut().renders += 1;
    }
}

/// What a [`HeadlessModel`] records.
#[derive(Debug)]
pub struct ModelState {
    pub materials_overridden: bool,
    pub scale: f32,
    pub position: Vector3<f32>,
    pub rotation_y: f32,
    pub started_clip: Option<usize>,
    pub mixer_seconds: f32,
}

impl Default for ModelState {
    fn default() -> Self {
        Self {
            materials_overridden: false,
            scale: 1.0,
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation_y: 0.0,
            started_clip: None,
            mixer_seconds: 0.0,
        }
    }
}

/// Model double with a configurable bounding box and clip count.
pub struct HeadlessModel {
    bounds: Aabb,
    clips: usize,
    state: Rc<RefCell<ModelState>>,
}

impl HeadlessModel {
    pub fn new(bounds: Aabb, clips: usize) -> (Self, ModelProbe) {
        let state = Rc::new(RefCell::new(ModelState::default()));
        (
            Self {
                bounds,
                clips,
                state: Rc::clone(&state),
            },
            ModelProbe { state },
        )
    }

    /// The model wrapped as a ready-to-deliver asset.
    pub fn asset(bounds: Aabb, clips: usize) -> (ModelAsset, ModelProbe) {
        let (model, probe) = Self::new(bounds, clips);
        (
            ModelAsset {
                root: Box::new(model),
                clip_count: clips,
            },
            probe,
        )
    }
}

impl SceneModel for HeadlessModel {
    fn override_materials(&mut self) {
        self.state.borrow_mut().materials_overridden = true;
    }

    fn bounding_box(&self) -> Aabb {
        self.bounds
    }

    fn set_uniform_scale(&mut self, scale: f32) {
        self.state.borrow_mut().scale = scale;
    }

    fn set_position(&mut self, position: Vector3<f32>) {
        self.state.borrow_mut().position = position;
    }

    fn rotate_y(&mut self, radians: f32) {
        self.state.borrow_mut().rotation_y += radians;
    }

    fn start_clip(&mut self, index: usize) -> Option<Box<dyn AnimationMixer>> {
        if index >= self.clips {
            return None;
        }
        self.state.borrow_mut().started_clip = Some(index);
        Some(Box::new(HeadlessMixer {
            state: Rc::clone(&self.state),
        }))
    }
}

struct HeadlessMixer {
    state: Rc<RefCell<ModelState>>,
}

impl AnimationMixer for HeadlessMixer {
    fn advance(&mut self, seconds: f32) {
        self.state.borrow_mut().mixer_seconds += seconds;
    }
}

/// Observer half of [`HeadlessModel`].
pub struct ModelProbe {
    state: Rc<RefCell<ModelState>>,
}

impl ModelProbe {
    pub fn materials_overridden(&self) -> bool {
        self.state.borrow().materials_overridden
    }

    pub fn scale(&self) -> f32 {
        self.state.borrow().scale
    }

    pub fn position(&self) -> Vector3<f32> {
        self.state.borrow().position
    }

    pub fn rotation_y(&self) -> f32 {
        self.state.borrow().rotation_y
    }

    pub fn started_clip(&self) -> Option<usize> {
        self.state.borrow().started_clip
    }

    pub fn mixer_seconds(&self) -> f32 {
        self.state.borrow().mixer_seconds
    }
}

#[derive(Default)]
struct LoaderState {
    requests: Vec<(String, LoadSender)>,
}

/// Loader double. Loads resolve only when the probe delivers them.
pub struct HeadlessLoader {
    state: Rc<RefCell<LoaderState>>,
}

impl HeadlessLoader {
    pub fn new() -> (Self, LoaderProbe) {
        let state = Rc::new(RefCell::new(LoaderState::default()));
        (
            Self {
                state: Rc::clone(&state),
            },
            LoaderProbe { state },
        )
    }
}

impl ModelLoader for HeadlessLoader {
    fn begin_load(&mut self, url: &str) -> LoadReceiver {
        let (sender, receiver) = futures::channel::oneshot::channel();
        self.state
            .borrow_mut()
            .requests
            .push((url.to_string(), sender));
        receiver
    }
}

/// Observer half of [`HeadlessLoader`].
pub struct LoaderProbe {
    state: Rc<RefCell<LoaderState>>,
}

impl LoaderProbe {
    /// Loads begun and not yet delivered.
    pub fn pending(&self) -> usize {
        self.state.borrow().requests.len()
    }

    /// URL of the oldest pending load.
    pub fn next_url(&self) -> Option<String> {
        self.state
            .borrow()
            .requests
            .first()
            .map(|(url, _)| url.clone())
    }

    /// Resolve the oldest pending load. Returns false when nothing is
    /// pending or the scene dropped the receiving end.
    pub fn deliver(&self, result: Result<ModelAsset>) -> bool {
        let (_, sender) = {
            let mut state = self.state.borrow_mut();
            if state.requests.is_empty() {
                return false;
            }
            state.requests.remove(0)
        };
        sender.send(result).is_ok()
    }

    /// Drop the oldest pending load without resolving it.
    pub fn abandon(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.requests.is_empty() {
            return false;
        }
        drop(state.requests.remove(0));
        true
    }
}

/// What a [`HeadlessMount`] records.
#[derive(Debug, Default)]
pub struct MountState {
    pub attached: Option<SurfaceId>,
    pub detaches: u32,
    pub reveals: u32,
    pub size: (u32, u32),
}

/// Mount point double reporting a fixed measured size.
pub struct HeadlessMount {
    state: Rc<RefCell<MountState>>,
}

impl HeadlessMount {
    pub fn new(width: u32, height: u32) -> (Self, MountProbe) {
        let state = Rc::new(RefCell::new(MountState {
            size: (width, height),
            ..MountState::default()
        }));
        (
            Self {
                state: Rc::clone(&state),
            },
            MountProbe { state },
        )
    }
}

impl MountPoint for HeadlessMount {
    fn attach(&mut self, surface: SurfaceId) {
        self.state.borrow_mut().attached = Some(surface);
    }

    fn detach(&mut self, surface: SurfaceId) {
        let mut state = self.state.borrow_mut();
        if state.attached == Some(surface) {
            state.attached = None;
            state.detaches += 1;
        }
    }

    fn contains(&self, surface: SurfaceId) -> bool {
        self.state.borrow().attached == Some(surface)
    }

    fn measure(&self) -> (u32, u32) {
        self.state.borrow().size
    }

    fn reveal(&mut self) {
        self.state.borrow_mut().reveals += 1;
    }
}

/// Observer half of [`HeadlessMount`].
pub struct MountProbe {
    state: Rc<RefCell<MountState>>,
}

impl MountProbe {
    pub fn attached(&self) -> Option<SurfaceId> {
        self.state.borrow().attached
    }

    pub fn detaches(&self) -> u32 {
        self.state.borrow().detaches
    }

    pub fn reveals(&self) -> u32 {
        self.state.borrow().reveals
    }
}
