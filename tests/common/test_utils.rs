use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use ascii_ngin::backend::Aabb;
use ascii_ngin::cell::{CellSignal, SignalSource};
use ascii_ngin::config::SceneConfig;
use ascii_ngin::headless::{
    HeadlessBackend, HeadlessLoader, HeadlessMount, LoaderProbe, MountProbe, StackProbe,
};
use ascii_ngin::sched::{ManualScheduler, SchedulerProbe};
use ascii_ngin::scene::SceneInstance;
use ascii_ngin::{Duration, Point3};

/// One scene plus every probe watching it.
pub(crate) struct Rig {
    pub scene: SceneInstance,
    pub stack: StackProbe,
    pub loader: LoaderProbe,
    pub frames: SchedulerProbe,
}

impl Rig {
    pub fn new(config: SceneConfig) -> Self {
        let (backend, stack) = HeadlessBackend::new();
        let (mut loader, loader_probe) = HeadlessLoader::new();
        let (scheduler, frames) = ManualScheduler::new();
        let scene = SceneInstance::create(config, &backend, &mut loader, Box::new(scheduler))
            .expect("scene construction");
        Self {
            scene,
            stack,
            loader: loader_probe,
            frames,
        }
    }

    /// Mount into a fresh container of the given size.
    pub fn mount(&mut self, width: u32, height: u32) -> MountProbe {
        let (mount, probe) = HeadlessMount::new(width, height);
        self.scene.mount(Box::new(mount));
        probe
    }

    /// Fire the next outstanding frame request at `now_ms`. Returns false
    /// when nothing was scheduled.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        match self.frames.take_next() {
            Some(_) => {
                self.scene.on_frame(Duration::from_millis(now_ms));
                true
            }
            None => false,
        }
    }
}

pub(crate) fn test_config() -> SceneConfig {
    SceneConfig::new("Horse.glb")
}

/// Cube of side 1 centered on the origin.
pub(crate) fn unit_box() -> Aabb {
    Aabb::new(Point3::new(-0.5, -0.5, -0.5), Point3::new(0.5, 0.5, 0.5))
}

/// Origin-centered box whose largest extent (along x) is `dim`.
pub(crate) fn box_with_max_dim(dim: f32) -> Aabb {
    let half = dim / 2.0;
    Aabb::new(
        Point3::new(-half, -half / 2.0, -half / 2.0),
        Point3::new(half, half / 2.0, half / 2.0),
    )
}

/// Relative float comparison.
pub(crate) fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps * a.abs().max(b.abs()).max(1.0)
}

/// Signal source scripted by the test, standing in for a host's observers.
#[derive(Clone, Default)]
pub(crate) struct SignalFeed {
    queue: Rc<RefCell<VecDeque<CellSignal>>>,
}

impl SignalFeed {
    pub fn push(&self, signal: CellSignal) {
        self.queue.borrow_mut().push_back(signal);
    }
}

impl SignalSource for SignalFeed {
    fn drain(&mut self) -> Vec<CellSignal> {
        self.queue.borrow_mut().drain(..).collect()
    }
}
