//! The five marketing grid cells running against the headless backend.
//!
//! A scripted timeline stands in for a browsing session: models arrive off
//! the network, one cell scrolls out and back in, the layout resizes to
//! fractional pixels. Run with `RUST_LOG=debug cargo run --example grid` to
//! watch the lifecycle logging.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use anyhow::Result;
use ascii_ngin::backend::Aabb;
use ascii_ngin::cell::{CellSignal, GridCell, SignalSource};
use ascii_ngin::config::{BLOCK_RAMP, SceneConfig};
use ascii_ngin::headless::{
    HeadlessBackend, HeadlessLoader, HeadlessModel, HeadlessMount, LoaderProbe, ModelProbe,
    MountProbe, StackProbe,
};
use ascii_ngin::scene::SceneInstance;
use ascii_ngin::sched::{ManualScheduler, SchedulerProbe};
use ascii_ngin::{Duration, Point3};

/// Observer queue for one cell. The timeline pushes what a real page's
/// intersection and resize observers would have reported.
#[derive(Clone, Default)]
struct Feed {
    queue: Rc<RefCell<VecDeque<CellSignal>>>,
}

impl Feed {
    fn push(&self, signal: CellSignal) {
        self.queue.borrow_mut().push_back(signal);
    }
}

impl SignalSource for Feed {
    fn drain(&mut self) -> Vec<CellSignal> {
        self.queue.borrow_mut().drain(..).collect()
    }
}

struct DemoCell {
    title: &'static str,
    cell: GridCell,
    feed: Feed,
    frames: SchedulerProbe,
    stack: StackProbe,
    loader: LoaderProbe,
    mount: MountProbe,
    model: Option<ModelProbe>,
}

impl DemoCell {
    fn build(title: &'static str, config: SceneConfig, width: u32, height: u32) -> Result<Self> {
        let (backend, stack) = HeadlessBackend::new();
        let (mut loader, loader_probe) = HeadlessLoader::new();
        let (scheduler, frames) = ManualScheduler::new();
        let scene = SceneInstance::create(config, &backend, &mut loader, Box::new(scheduler))?;
        let (mount, mount_probe) = HeadlessMount::new(width, height);
        let feed = Feed::default();
        let cell = GridCell::mount(scene, Box::new(feed.clone()), Box::new(mount));
        Ok(Self {
            title,
            cell,
            feed,
            frames,
            stack,
            loader: loader_probe,
            mount: mount_probe,
            model: None,
        })
    }

    /// Apply queued observer signals, then fire the scene's outstanding
    /// frame request, if any.
    fn pump_and_tick(&mut self, now: Duration) {
        self.cell.pump();
        if self.frames.take_next().is_some() {
            self.cell.scene_mut().on_frame(now);
        }
    }

    fn deliver_model(&mut self, bounds: Aabb, clips: usize) {
        let (asset, probe) = HeadlessModel::asset(bounds, clips);
        if self.loader.deliver(Ok(asset)) {
            self.model = Some(probe);
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let presets = [
        (
            "Perception",
            SceneConfig::new("LeePerrySmith/LeePerrySmith.glb"),
            620,
            360,
        ),
        (
            "Field Intelligence",
            SceneConfig {
                resolution: 0.14,
                color: [0xff, 0xff, 0xff],
                auto_rotate: false,
                ..SceneConfig::new("Soldier.glb")
            },
            620,
            360,
        ),
        (
            "Embodied Systems",
            SceneConfig {
                charset: BLOCK_RAMP.to_string(),
                color: [0x88, 0xcc, 0xff],
                auto_rotate: false,
                animation_speed: 0.5,
                ..SceneConfig::new("RobotExpressive/RobotExpressive.glb")
            },
            620,
            360,
        ),
        (
            "Motion Analysis",
            SceneConfig {
                resolution: 0.13,
                color: [0x88, 0xff, 0xcc],
                auto_rotate: false,
                ..SceneConfig::new("Horse.glb")
            },
            620,
            360,
        ),
        (
            "We see what you see.",
            SceneConfig {
                resolution: 0.12,
                animation_speed: 0.8,
                ..SceneConfig::new("Flamingo.glb")
            },
            1240,
            420,
        ),
    ];

    let mut cells = Vec::new();
    for (title, config, width, height) in presets {
        cells.push(DemoCell::build(title, config, width, height)?);
    }

    // Raw asset dimensions before normalization, clip counts as shipped.
    let arrivals: [(Aabb, usize); 4] = [
        (
            Aabb::new(Point3::new(-0.9, -1.2, -0.8), Point3::new(0.9, 1.0, 0.8)),
            0,
        ),
        (
            Aabb::new(Point3::new(-0.6, 0.0, -0.4), Point3::new(0.6, 1.8, 0.4)),
            4,
        ),
        (
            Aabb::new(Point3::new(-1.2, 0.0, -0.9), Point3::new(1.2, 2.6, 0.9)),
            14,
        ),
        (
            Aabb::new(
                Point3::new(-75.0, -5.0, -160.0),
                Point3::new(75.0, 150.0, 160.0),
            ),
            1,
        ),
    ];

    for now_ms in (0..=2400u64).step_by(16) {
        match now_ms {
            // first four models come off the network together
            192 => {
                for (cell, (bounds, clips)) in cells.iter_mut().zip(arrivals) {
                    cell.deliver_model(bounds, clips);
                }
            }
            // the soldier cell scrolls out of view
            400 => cells[1].feed.push(CellSignal::VisibilityChanged { visible: false }),
            // window resize lands on the head cell, and the soldier returns
            1200 => {
                cells[0].feed.push(CellSignal::ContainerResized {
                    width: 613.7,
                    height: 344.2,
                });
                cells[1].feed.push(CellSignal::VisibilityChanged { visible: true });
            }
            // the flamingo is on a slow connection
            1600 => cells[4].deliver_model(
                Aabb::new(
                    Point3::new(-60.0, -25.0, -12.0),
                    Point3::new(60.0, 40.0, 12.0),
                ),
                1,
            ),
            _ => {}
        }

        let now = Duration::from_millis(now_ms);
        for cell in cells.iter_mut() {
            cell.pump_and_tick(now);
        }
    }

    println!("cell                    renders  rotation  mixer  reveals");
    for cell in &cells {
        let rotation = cell.model.as_ref().map(|m| m.rotation_y()).unwrap_or(0.0);
        let mixer = cell.model.as_ref().map(|m| m.mixer_seconds()).unwrap_or(0.0);
        println!(
            "{:<22} {:>8}  {:>8.3}  {:>5.2}  {:>7}",
            cell.title,
            cell.stack.renders(),
            rotation,
            mixer,
            cell.mount.reveals(),
        );
    }

    for cell in cells {
        let DemoCell { title, cell, stack, .. } = cell;
        cell.dismiss();
        println!("{title}: renderer disposed = {}", stack.disposed());
    }
    Ok(())
}
