//! Glue between host viewport signals and a scene.
//!
//! The production page watches each cell with an intersection observer (to
//! pause off-screen work) and a resize observer (to keep the effect matched
//! to the layout). A host translates whatever its environment reports into
//! [`CellSignal`]s behind a [`SignalSource`]; [`GridCell`] drains the source
//! and maps the raw facts onto the scene's lifecycle methods.

use crate::backend::MountPoint;
use crate::scene::SceneInstance;

/// Fraction of a cell that must be visible before it counts as on-screen.
pub const VISIBILITY_THRESHOLD: f32 = 0.1;

/// One observation about a cell's container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CellSignal {
    /// The container crossed [`VISIBILITY_THRESHOLD`] in either direction.
    VisibilityChanged { visible: bool },
    /// The content box changed, dimensions as the layout engine reports
    /// them (fractional pixels included).
    ContainerResized { width: f32, height: f32 },
}

/// Queue of signals for one cell, filled by the host's observers.
pub trait SignalSource {
    /// Take every signal observed since the last drain, oldest first.
    fn drain(&mut self) -> Vec<CellSignal>;
}

/// A scene wired to its cell's observers.
pub struct GridCell {
    scene: SceneInstance,
    signals: Box<dyn SignalSource>,
}

impl GridCell {
    /// Mount `scene` into `container` and wire it to `signals`.
    pub fn mount(
        mut scene: SceneInstance,
        signals: Box<dyn SignalSource>,
        container: Box<dyn MountPoint>,
    ) -> Self {
        scene.mount(container);
        Self { scene, signals }
    }

    /// Drain pending signals and apply them to the scene.
    ///
    /// Call this from the host's update cycle. Also polls the model load so
    /// an off-screen cell still fades in once its model arrives.
    pub fn pump(&mut self) {
        for signal in self.signals.drain() {
            match signal {
                CellSignal::VisibilityChanged { visible } => {
                    if visible {
                        self.scene.resume();
                    } else {
                        self.scene.pause();
                    }
                }
                CellSignal::ContainerResized { width, height } => {
                    if width > 0.0 && height > 0.0 {
                        self.scene.resize(width.floor() as u32, height.floor() as u32);
                    }
                }
            }
        }
        self.scene.poll_load();
    }

    pub fn scene(&self) -> &SceneInstance {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneInstance {
        &mut self.scene
    }

    /// Unwire the observers and tear the scene down.
    pub fn dismiss(mut self) {
        self.scene.unmount();
    }
}
