//! Scheduler thread: ticks the sequencer on absolute deadlines.
//!
//! Each deadline is the previous deadline plus the interval at the tempo
//! current when that step fired, so sleep overshoot never accumulates. A
//! clock that falls more than one step behind re-anchors to now instead of
//! firing the missed steps in a burst.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use gs_engine::{CommandSender, StepSequencer};
use tracing::{debug, warn};

const NO_HIGHLIGHT: usize = usize::MAX;

/// State the clock thread shares with the controller.
pub(crate) struct Shared {
    sequencer: Mutex<StepSequencer>,
    highlight: AtomicUsize,
}

impl Shared {
    pub(crate) fn new(sequencer: StepSequencer) -> Self {
        Self { sequencer: Mutex::new(sequencer), highlight: AtomicUsize::new(NO_HIGHLIGHT) }
    }

    pub(crate) fn sequencer(&self) -> MutexGuard<'_, StepSequencer> {
        self.sequencer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, column: Option<usize>) {
        self.highlight.store(column.unwrap_or(NO_HIGHLIGHT), Ordering::Release);
    }

    pub(crate) fn highlighted(&self) -> Option<usize> {
        match self.highlight.load(Ordering::Acquire) {
            NO_HIGHLIGHT => None,
            column => Some(column),
        }
    }
}

/// Next deadline after one that just fired, and whether it was re-anchored.
pub(crate) fn advance_deadline(fired: Instant, interval: Duration, now: Instant) -> (Instant, bool) {
    let next = fired + interval;
    if now.saturating_duration_since(next) > interval {
        (now, true)
    } else {
        (next, false)
    }
}

/// Handle to a running scheduler thread.
pub(crate) struct Clock {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Clock {
    /// Spawn the thread. The first step fires immediately.
    pub(crate) fn start(shared: Arc<Shared>, sink: CommandSender) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let thread = thread::Builder::new()
            .name("gs-clock".into())
            .spawn(move || run(&shared, sink, &flag))?;
        Ok(Self { stop, thread: Some(thread) })
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Signal the thread and wait for it. Must not be called with the
    /// sequencer lock held.
    pub(crate) fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.thread.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                warn!("clock thread panicked");
            }
        }
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(shared: &Shared, mut sink: CommandSender, stop: &AtomicBool) {
    let mut deadline = Instant::now();
    debug!("clock started");
    while !stop.load(Ordering::Acquire) {
        let now = Instant::now();
        if now < deadline {
            thread::park_timeout(deadline - now);
            continue;
        }

        let interval = {
            let mut sequencer = shared.sequencer();
            match sequencer.tick(&mut sink) {
                Some(column) => shared.publish(Some(column)),
                None => break,
            }
            sequencer.step_interval()
        };

        let (next, reanchored) = advance_deadline(deadline, interval, Instant::now());
        if reanchored {
            warn!(behind_ms = (Instant::now() - deadline).as_millis() as u64, "clock fell behind, re-anchoring");
        }
        deadline = next;
    }
    debug!("clock stopped");
}
