//! Page activity tracking.
//!
//! A page is active while browsers viewing it keep sending heartbeats.
//! Each heartbeat (re)starts a single-shot idle timer; when it fires without
//! a newer heartbeat the page becomes inactive. The flag only decides the
//! priority of rebuilds after a source change.

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::{sync::watch, task::JoinHandle};

/// Time without heartbeats after which a page is idle.
pub const IDLE_WINDOW: Duration = Duration::from_secs(15);

/// Activity flag plus the idle timer that clears it.
#[derive(Debug)]
pub struct Activity {
    timer: Arc<Mutex<IdleTimer>>,
    active: Arc<watch::Sender<bool>>,
    window: Duration,
}

/// Guarded by one lock so heartbeat and expiry never interleave.
#[derive(Debug, Default)]
struct IdleTimer {
    /// Bumped on every heartbeat; an expiry only applies to its own generation
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl Activity {
    pub fn new() -> Self {
        Self::with_window(IDLE_WINDOW)
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            timer: Arc::new(Mutex::new(IdleTimer::default())),
            active: Arc::new(watch::Sender::new(false)),
            window,
        }
    }

    /// Mark active and restart the idle timer. Must run inside a tokio runtime.
    pub fn heartbeat(&self) {
        let mut timer = self.timer.lock();
        timer.generation = timer.generation.wrapping_add(1);
        if let Some(handle) = timer.handle.take() {
            handle.abort();
        }
        self.active.send_replace(true);

        let generation = timer.generation;
        let slot = Arc::clone(&self.timer);
        let active = Arc::clone(&self.active);
        let window = self.window;
        timer.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let mut timer = slot.lock();
            if timer.generation == generation {
                timer.handle = None;
                active.send_replace(false);
            }
        }));
    }

    pub fn is_active(&self) -> bool {
        *self.active.borrow()
    }

    /// Whether an idle timer is pending.
    pub fn has_timer(&self) -> bool {
        self.timer.lock().handle.is_some()
    }

    /// Observe activity changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.active.subscribe()
    }

    /// Cancel the timer and mark inactive.
    pub fn close(&self) {
        let mut timer = self.timer.lock();
        timer.generation = timer.generation.wrapping_add(1);
        if let Some(handle) = timer.handle.take() {
            handle.abort();
        }
        self.active.send_replace(false);
    }
}

impl Default for Activity {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Activity {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.lock().handle.take() {
            handle.abort();
        }
    }
}
