//! Frame scheduling.
//!
//! The engine never owns a timer. It asks a [`FrameScheduler`] for a single
//! callback and the host delivers the fired tick by calling
//! [`SceneInstance::on_frame`](crate::scene::SceneInstance::on_frame) with
//! the tick's timestamp. Browser hosts wrap `requestAnimationFrame`, native
//! hosts hook their event loop's redraw request, and tests drive a
//! [`ManualScheduler`] by hand.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Handle for one requested frame callback. Only used for cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

pub trait FrameScheduler {
    /// Ask for one callback. Each request fires at most once.
    fn request(&mut self) -> FrameRequest;

    /// Revoke a request that has not fired yet. Unknown or already fired
    /// handles are ignored.
    fn cancel(&mut self, request: FrameRequest);
}

#[derive(Default)]
struct SchedulerState {
    pending: VecDeque<FrameRequest>,
    requested: u64,
    cancelled: u64,
}

/// Hand-driven scheduler for tests and demos.
///
/// Nothing fires on its own: pull requests out of the paired
/// [`SchedulerProbe`] and call `on_frame` yourself with whatever timestamps
/// the scenario needs.
pub struct ManualScheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl ManualScheduler {
    pub fn new() -> (Self, SchedulerProbe) {
        let state = Rc::new(RefCell::new(SchedulerState::default()));
        (
            Self {
                state: Rc::clone(&state),
            },
            SchedulerProbe { state },
        )
    }
}

impl FrameScheduler for ManualScheduler {
    fn request(&mut self) -> FrameRequest {
        let mut state = self.state.borrow_mut();
        let request = FrameRequest(state.requested);
        state.requested += 1;
        state.pending.push_back(request);
        request
    }

    fn cancel(&mut self, request: FrameRequest) {
        let mut state = self.state.borrow_mut();
        let before = state.pending.len();
        state.pending.retain(|pending| *pending != request);
        if state.pending.len() < before {
            state.cancelled += 1;
        }
    }
}

/// Observer half of [`ManualScheduler`].
pub struct SchedulerProbe {
    state: Rc<RefCell<SchedulerState>>,
}

impl SchedulerProbe {
    /// Requests made and neither fired nor cancelled.
    pub fn outstanding(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Pop the oldest pending request, "firing" it. The caller is expected
    /// to follow up with an `on_frame` call.
    pub fn take_next(&self) -> Option<FrameRequest> {
        self.state.borrow_mut().pending.pop_front()
    }

    /// Total requests ever made.
    pub fn requested(&self) -> u64 {
        self.state.borrow().requested
    }

    /// Requests revoked before firing.
    pub fn cancelled(&self) -> u64 {
        self.state.borrow().cancelled
    }
}
