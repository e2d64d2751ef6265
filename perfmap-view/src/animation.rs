//! Frame task driving a [`BubbleField`]
//!
//! The loop runs only while the view is shown and no detail panel is open.
//! At most one task exists at a time and none survives the `AnimationLoop`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::debug;

use crate::layout::{Bubble, BubbleField, FRAME_MS};

/// Nominal frame interval
pub const FRAME_INTERVAL: Duration = Duration::from_millis(FRAME_MS as u64);

#[derive(Debug)]
struct Shared {
    field: BubbleField,
    pointer: Option<(f64, f64)>,
    frames: u64,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    // A panic mid-frame leaves the field usable
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lifecycle owner of the bubble animation
///
/// Starting the task needs a tokio runtime; every method that may start it
/// (`show`, `close_detail`) must be called from within one.
#[derive(Debug)]
pub struct AnimationLoop {
    shared: Arc<Mutex<Shared>>,
    visible: bool,
    detail_open: bool,
    task: Option<JoinHandle<()>>,
    frame_interval: Duration,
    starts: u64,
}

impl AnimationLoop {
    /// Wrap a field; the loop starts hidden
    pub fn new(field: BubbleField) -> Self {
        Self::with_frame_interval(field, FRAME_INTERVAL)
    }

    pub fn with_frame_interval(field: BubbleField, frame_interval: Duration) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                field,
                pointer: None,
                frames: 0,
            })),
            visible: false,
            detail_open: false,
            task: None,
            frame_interval,
            starts: 0,
        }
    }

    pub fn show(&mut self) {
        self.visible = true;
        self.sync();
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.sync();
    }

    /// Opening an artist's detail panel freezes the field
    pub fn open_detail(&mut self) {
        self.detail_open = true;
        self.sync();
    }

    pub fn close_detail(&mut self) {
        self.detail_open = false;
        self.sync();
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Frames stepped since creation, across restarts
    pub fn frame_count(&self) -> u64 {
        lock(&self.shared).frames
    }

    /// Number of times a frame task has been started
    pub fn starts(&self) -> u64 {
        self.starts
    }

    pub fn set_pointer(&self, pointer: Option<(f64, f64)>) {
        lock(&self.shared).pointer = pointer;
    }

    pub fn pointer(&self) -> Option<(f64, f64)> {
        lock(&self.shared).pointer
    }

    /// Copy of the current node states
    pub fn snapshot(&self) -> Vec<Bubble> {
        lock(&self.shared).field.bubbles().to_vec()
    }

    fn sync(&mut self) {
        let should_run = self.visible && !self.detail_open;
        match (should_run, self.task.is_some()) {
            (true, false) => self.start(),
            (false, true) => self.stop(),
            _ => {}
        }
    }

    fn start(&mut self) {
        let shared = Arc::clone(&self.shared);
        let period = self.frame_interval;
        lock(&shared).field.reset_clock();

        self.starts += 1;
        debug!("Starting bubble animation (start #{})", self.starts);

        self.task = Some(tokio::spawn(async move {
            let clock = Instant::now();
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let now_ms = clock.elapsed().as_secs_f64() * 1000.0;
                let mut state = lock(&shared);
                let pointer = state.pointer;
                state.field.step(now_ms, pointer);
                state.frames += 1;
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Stopped bubble animation");
        }
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
