//! Scene lifecycle and the frame loop.
//!
//! [`SceneInstance`] is one grid cell's engine: it owns the backend stack,
//! runs the throttled render loop and walks the cell through its life. The
//! host drives it with plain method calls; nothing here spawns threads or
//! timers.
//!
//! # Lifecycle
//!
//! 1. [`SceneInstance::create`] validates the config, builds the backend
//!    stack and starts the model load
//! 2. [`SceneInstance::mount`] hands over the cell's container and starts
//!    the loop
//! 3. [`SceneInstance::pause`] / [`SceneInstance::resume`] follow viewport
//!    visibility
//! 4. [`SceneInstance::resize`] follows container layout
//! 5. [`SceneInstance::unmount`] tears everything down; the instance is
//!    spent afterwards
//!
//! Every fired frame callback lands in [`SceneInstance::on_frame`], which
//! reschedules first and only then decides whether this tick actually
//! renders. Dropping a render never drops the loop.

use anyhow::Result;
use cgmath::EuclideanSpace;
use instant::Duration;

use crate::backend::{
    AnimationMixer, Camera, GlyphEffect, MountPoint, RenderBackend, Renderer, SceneGraph,
};
use crate::config::SceneConfig;
use crate::resources::{LoadReceiver, ModelAsset, ModelLoader};
use crate::sched::{FrameRequest, FrameScheduler};

/// Shortest spacing between two rendered frames (30 fps cap).
pub const FRAME_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 30);

/// Yaw added per rendered frame while auto-rotate is on.
pub const AUTO_ROTATE_STEP: f32 = 0.005;

/// Largest model dimension after normalization.
pub const REFERENCE_SIZE: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Created,
    Mounted,
    Unmounted,
}

/// Elapsed time between rendered frames in the scheduler's timebase.
///
/// Free-running: not reset on pause, so animations skip ahead over hidden
/// stretches the way wall-clock playback would.
struct FrameClock {
    last: Option<Duration>,
}

impl FrameClock {
    fn new() -> Self {
        Self { last: None }
    }

    /// Time since the previous call; zero on the first.
    fn delta(&mut self, now: Duration) -> Duration {
        let delta = match self.last {
            Some(last) => now.saturating_sub(last),
            None => Duration::ZERO,
        };
        self.last = Some(now);
        delta
    }
}

struct PendingModel {
    receiver: LoadReceiver,
    generation: u64,
}

/// One grid cell's scene: backend stack, model state and frame loop.
///
/// Single-threaded by design. Create it, mount it and drive it from the
/// thread the host UI runs on.
pub struct SceneInstance {
    auto_rotate: bool,
    animation_speed: f32,
    scene: Box<dyn SceneGraph>,
    camera: Box<dyn Camera>,
    renderer: Box<dyn Renderer>,
    effect: Box<dyn GlyphEffect>,
    clock: FrameClock,
    mixer: Option<Box<dyn AnimationMixer>>,
    scheduler: Box<dyn FrameScheduler>,
    pending: Option<PendingModel>,
    generation: u64,
    container: Option<Box<dyn MountPoint>>,
    phase: Phase,
    paused: bool,
    // Some exactly while a frame request is outstanding.
    loop_handle: Option<FrameRequest>,
    last_render: Option<Duration>,
}

impl SceneInstance {
    /// Build the scene and start loading its model.
    ///
    /// Returns before the model is available; the load resolves through the
    /// loader's channel and is applied at the next poll point. A broken
    /// config or a backend that cannot build its stack is an error. A model
    /// that later fails to load is not: the cell just never fades in.
    pub fn create(
        config: SceneConfig,
        backend: &dyn RenderBackend,
        loader: &mut dyn ModelLoader,
        scheduler: Box<dyn FrameScheduler>,
    ) -> Result<Self> {
        config.validate()?;
        let stack = backend.create_stack(&config)?;
        let receiver = loader.begin_load(&config.model_url());
        log::debug!("scene created for {}", config.model_source);
        Ok(Self {
            auto_rotate: config.auto_rotate,
            animation_speed: config.animation_speed,
            scene: stack.scene,
            camera: stack.camera,
            renderer: stack.renderer,
            effect: stack.effect,
            clock: FrameClock::new(),
            mixer: None,
            scheduler,
            pending: Some(PendingModel {
                receiver,
                generation: 0,
            }),
            generation: 0,
            container: None,
            phase: Phase::Created,
            paused: false,
            loop_handle: None,
            last_render: None,
        })
    }

    /// Attach the scene to its cell and start the frame loop.
    ///
    /// A scene mounts once. Calling this on a mounted or spent instance is
    /// host misuse and is ignored with a warning.
    pub fn mount(&mut self, mut container: Box<dyn MountPoint>) {
        if self.phase != Phase::Created {
            log::warn!("mount ignored, scene is already {:?}", self.phase);
            return;
        }
        container.attach(self.effect.surface());
        let (width, height) = container.measure();
        let loaded = self.scene.model().is_some();
        self.container = Some(container);
        self.phase = Phase::Mounted;
        if width > 0 && height > 0 {
            self.camera.set_aspect(width as f32 / height as f32);
            self.effect.set_size(width, height);
        }
        if loaded {
            // The model beat the mount; fade the cell in now.
            if let Some(container) = &mut self.container {
                container.reveal();
            }
        }
        self.poll_load();
        self.start_animation();
    }

    /// Tear the scene down.
    ///
    /// Terminal: a spent instance never mounts or renders again. Calling it
    /// twice is fine. An in-flight model load is not cancelled; bumping the
    /// generation makes its late completion land harmlessly.
    pub fn unmount(&mut self) {
        if self.phase == Phase::Unmounted {
            return;
        }
        self.phase = Phase::Unmounted;
        self.generation += 1;
        self.stop_animation();
        if let Some(mut container) = self.container.take() {
            let surface = self.effect.surface();
            if container.contains(surface) {
                container.detach(surface);
            }
        }
        self.renderer.dispose();
        log::debug!("scene unmounted");
    }

    /// Stop scheduling frames. Model and loop state stay warm for
    /// [`SceneInstance::resume`].
    pub fn pause(&mut self) {
        self.paused = true;
        self.stop_animation();
    }

    /// Restart the loop after [`SceneInstance::pause`].
    ///
    /// Only acts on a paused, mounted scene. Clears the render throttle so
    /// the first tick after resuming renders immediately.
    pub fn resume(&mut self) {
        if !self.paused || self.phase != Phase::Mounted {
            return;
        }
        self.paused = false;
        self.last_render = None;
        self.start_animation();
    }

    /// Follow the container to a new size in whole pixels.
    ///
    /// Collapsed layouts (a zero dimension) are ignored, as is anything
    /// after unmount.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || self.phase == Phase::Unmounted {
            return;
        }
        self.camera.set_aspect(width as f32 / height as f32);
        self.effect.set_size(width, height);
    }

    /// Deliver one fired frame callback.
    ///
    /// `now` is the tick's timestamp in the scheduler's timebase. The next
    /// frame is requested before the 30 fps throttle is checked, so a
    /// skipped render never stalls the loop.
    pub fn on_frame(&mut self, now: Duration) {
        self.loop_handle = None;
        self.poll_load();
        if self.paused || self.phase != Phase::Mounted {
            return;
        }
        self.loop_handle = Some(self.scheduler.request());

        let due = match self.last_render {
            Some(last) => now.saturating_sub(last) >= FRAME_INTERVAL,
            None => true,
        };
        if !due {
            return;
        }
        self.last_render = Some(now);

        let delta = self.clock.delta(now);
        if let Some(mixer) = &mut self.mixer {
            mixer.advance(delta.as_secs_f32() * self.animation_speed);
        }
        if self.auto_rotate {
            if let Some(model) = self.scene.model_mut() {
                model.rotate_y(AUTO_ROTATE_STEP);
            }
        }
        self.effect.render(self.scene.as_ref(), self.camera.as_ref());
    }

    /// Apply the model load if it has resolved.
    ///
    /// Runs from `mount` and from every frame callback. Hosts whose cells
    /// sit hidden for a while can also call it directly so the fade-in does
    /// not wait for the first visible frame.
    pub fn poll_load(&mut self) {
        let Some(pending) = &mut self.pending else {
            return;
        };
        let generation = pending.generation;
        let result = match pending.receiver.try_recv() {
            Ok(Some(result)) => result,
            Ok(None) => return,
            Err(_) => {
                self.pending = None;
                log::error!("model load dropped without a result");
                return;
            }
        };
        self.pending = None;
        if generation != self.generation {
            // Unmounted while the load was in flight.
            log::debug!("stale model load discarded");
            return;
        }
        match result {
            Ok(asset) => self.install_model(asset),
            Err(error) => log::error!("model load failed: {error:#}"),
        }
    }

    /// True while the scene is mounted and not yet torn down.
    pub fn is_mounted(&self) -> bool {
        self.phase == Phase::Mounted
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// True while a frame request is outstanding.
    pub fn has_pending_frame(&self) -> bool {
        self.loop_handle.is_some()
    }

    /// True once the model survived normalization and sits in the scene.
    pub fn model_ready(&self) -> bool {
        self.scene.model().is_some()
    }

    fn install_model(&mut self, asset: ModelAsset) {
        let ModelAsset {
            mut root,
            clip_count,
        } = asset;
        root.override_materials();

        let bounds = root.bounding_box();
        if bounds.is_degenerate() {
            log::error!("model rejected, bounding box {bounds:?} cannot be normalized");
            return;
        }
        // Fit the largest dimension to REFERENCE_SIZE, centered on the origin.
        let scale = REFERENCE_SIZE / bounds.max_dim();
        root.set_uniform_scale(scale);
        root.set_position(-bounds.center().to_vec() * scale);

        if clip_count > 0 {
            self.mixer = root.start_clip(0);
        }
        self.scene.attach_model(root);

        if let Some(container) = &mut self.container {
            container.reveal();
        }
        log::debug!("model installed, scale {scale}");
    }

    fn start_animation(&mut self) {
        if self.loop_handle.is_some() {
            return;
        }
        self.paused = false;
        self.loop_handle = Some(self.scheduler.request());
    }

    fn stop_animation(&mut self) {
        if let Some(handle) = self.loop_handle.take() {
            self.scheduler.cancel(handle);
        }
    }
}
