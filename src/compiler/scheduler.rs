//! Build scheduler with priority queue.
//!
//! Single entry point for all page builds:
//! - Render-triggered build → `request(page, Active)`, waits for the outcome
//! - Rebuild after a source change → `submit(page, priority)`, fire-and-forget
//! - Bulk prebuild → `request(page, Idle)` per page, then `wait_idle()`
//!
//! At most one build per page is in flight. A request for a page that is
//! already pending joins it (upgrading its priority); a waiting request for a
//! page that is building joins the in-flight build's waiters, while a
//! submitted one is deferred until that build finishes.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use tokio::sync::{Notify, oneshot, watch};

use crate::core::{Priority, RoutePath};
use crate::logger::{status_error, status_success};
use crate::page::PageError;
use crate::{debug, log};

// =============================================================================
// Public API
// =============================================================================

/// Something the scheduler can build: in practice a `Page`.
#[async_trait]
pub trait BuildTarget: Send + Sync {
    fn route(&self) -> &RoutePath;

    /// Run the build step and load its artifact.
    async fn build(&self) -> Result<(), PageError>;
}

/// Queue accepting build requests.
#[async_trait]
pub trait BuildQueue: Send + Sync {
    /// Request a build and wait for its outcome.
    async fn request(&self, target: Arc<dyn BuildTarget>, priority: Priority)
    -> Result<(), PageError>;

    /// Request a build without waiting. Failures are reported by the queue.
    fn submit(&self, target: Arc<dyn BuildTarget>, priority: Priority);
}

type Outcome = Result<(), PageError>;
type Waiter = oneshot::Sender<Outcome>;

// =============================================================================
// Scheduler
// =============================================================================

/// Central build scheduler with priority queue and deduplication.
pub struct BuildScheduler {
    /// Priority queue of pending tasks
    queue: Mutex<BinaryHeap<Task>>,
    /// Pending routes → target + waiters (for dedup and result broadcasting)
    pending: DashMap<RoutePath, PendingState>,
    /// In-progress routes → waiters
    active: DashMap<RoutePath, Vec<Waiter>>,
    /// Number of pending + active jobs, for `wait_idle`
    outstanding: watch::Sender<usize>,
    /// FIFO tiebreak among equal priorities
    seq: AtomicU64,
    /// Worker notification
    notify: Notify,
    /// Shutdown flag
    shutdown: AtomicBool,
}

struct Task {
    route: RoutePath,
    priority: Priority,
    seq: u64,
}

struct PendingState {
    priority: Priority,
    target: Arc<dyn BuildTarget>,
    waiters: Vec<Waiter>,
    /// At least one fire-and-forget request joined this job
    detached: bool,
}

// Task ordering: higher priority first (BinaryHeap is max-heap), then older first
impl Ord for Task {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}
impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Task {}

// =============================================================================
// Public methods
// =============================================================================

impl BuildScheduler {
    /// Create a scheduler and spawn its workers on the current runtime.
    ///
    /// `workers == 0` means available parallelism.
    pub fn start(workers: usize) -> Arc<Self> {
        let scheduler = Arc::new(Self {
            queue: Mutex::new(BinaryHeap::new()),
            pending: DashMap::new(),
            active: DashMap::new(),
            outstanding: watch::Sender::new(0),
            seq: AtomicU64::new(0),
            notify: Notify::new(),
            shutdown: AtomicBool::new(false),
        });

        let n = if workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            workers
        };
        for _ in 0..n {
            tokio::spawn(Arc::clone(&scheduler).run_worker());
        }
        debug!("build"; "scheduler started with {} workers", n);
        scheduler
    }

    /// Number of builds pending or in flight.
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Wait until nothing is pending or building.
    pub async fn wait_idle(&self) {
        let mut rx = self.outstanding.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    /// Stop workers after their current build. Pending waiters are cancelled.
    pub fn shutdown(&self) {
        self.shutdown.store(true, AtomicOrdering::SeqCst);
        self.notify.notify_waiters();

        let routes: Vec<RoutePath> = self.pending.iter().map(|e| e.key().clone()).collect();
        for route in routes {
            if let Some((route, state)) = self.pending.remove(&route) {
                Self::broadcast(state.waiters, &Err(PageError::Cancelled(route)));
                self.finish_job();
            }
        }
        self.queue.lock().clear();
    }
}

#[async_trait]
impl BuildQueue for BuildScheduler {
    async fn request(
        &self,
        target: Arc<dyn BuildTarget>,
        priority: Priority,
    ) -> Result<(), PageError> {
        let route = target.route().clone();
        let (tx, rx) = oneshot::channel();
        self.join_or_enqueue(target, priority, Some(tx));
        rx.await.unwrap_or(Err(PageError::Cancelled(route)))
    }

    fn submit(&self, target: Arc<dyn BuildTarget>, priority: Priority) {
        self.join_or_enqueue(target, priority, None);
    }
}

// =============================================================================
// Request handling
// =============================================================================

impl BuildScheduler {
    fn join_or_enqueue(&self, target: Arc<dyn BuildTarget>, priority: Priority, tx: Option<Waiter>) {
        let route = target.route().clone();

        if self.is_shutdown() {
            if let Some(tx) = tx {
                let _ = tx.send(Err(PageError::Cancelled(route)));
            }
            return;
        }

        // Waiters join an in-flight build. A detached request means the
        // sources changed, so it queues a fresh build behind the running one.
        let tx = match tx {
            Some(tx) => match self.try_join_active(&route, tx) {
                Ok(()) => return,
                Err(tx) => Some(tx),
            },
            None => None,
        };

        // Atomically join or create pending
        if self.join_or_create_pending(&route, target, priority, tx) {
            self.enqueue(route, priority);
        }
    }

    /// `Err` hands the waiter back when nothing is building.
    fn try_join_active(&self, route: &RoutePath, tx: Waiter) -> Result<(), Waiter> {
        match self.active.get_mut(route) {
            Some(mut waiters) => {
                waiters.push(tx);
                Ok(())
            }
            None => Err(tx),
        }
    }

    /// Returns true if a task needs to be enqueued.
    fn join_or_create_pending(
        &self,
        route: &RoutePath,
        target: Arc<dyn BuildTarget>,
        priority: Priority,
        tx: Option<Waiter>,
    ) -> bool {
        match self.pending.entry(route.clone()) {
            Entry::Occupied(mut e) => {
                let state = e.get_mut();
                state.detached |= tx.is_none();
                state.waiters.extend(tx);
                if priority > state.priority {
                    state.priority = priority;
                    true // upgrade: enqueue higher priority task
                } else {
                    false
                }
            }
            Entry::Vacant(e) => {
                e.insert(PendingState {
                    priority,
                    target,
                    detached: tx.is_none(),
                    waiters: tx.into_iter().collect(),
                });
                self.outstanding.send_modify(|n| *n += 1);
                true // new task
            }
        }
    }

    fn enqueue(&self, route: RoutePath, priority: Priority) {
        let seq = self.seq.fetch_add(1, AtomicOrdering::Relaxed);
        self.queue.lock().push(Task {
            route,
            priority,
            seq,
        });
        self.notify.notify_one();
    }

    fn finish_job(&self) {
        self.outstanding.send_modify(|n| *n = n.saturating_sub(1));
    }
}

// =============================================================================
// Worker
// =============================================================================

impl BuildScheduler {
    async fn run_worker(self: Arc<Self>) {
        while let Some(task) = self.dequeue().await {
            if let Some((target, detached)) = self.claim(task) {
                self.execute(target, detached).await;
            }
        }
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown.load(AtomicOrdering::SeqCst)
    }

    async fn dequeue(&self) -> Option<Task> {
        loop {
            let notified = self.notify.notified();
            if self.is_shutdown() {
                return None;
            }
            if let Some(task) = self.queue.lock().pop() {
                return Some(task);
            }
            notified.await;
        }
    }

    /// Move a pending job to active. `None` for stale or deferred tasks.
    ///
    /// The pending entry stays locked until the route is registered as
    /// active, so no other request or worker observes the route in neither map.
    fn claim(&self, task: Task) -> Option<(Arc<dyn BuildTarget>, bool)> {
        let Entry::Occupied(mut pending) = self.pending.entry(task.route.clone()) else {
            return None; // already claimed
        };
        if pending.get().priority > task.priority {
            return None; // stale: higher priority task in queue
        }

        match self.active.entry(task.route) {
            // Still building: the job stays pending and is requeued on completion
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(std::mem::take(&mut pending.get_mut().waiters));
                let state = pending.remove();
                Some((state.target, state.detached))
            }
        }
    }

    async fn execute(&self, target: Arc<dyn BuildTarget>, detached: bool) {
        let route = target.route().clone();
        debug!("build"; "building {}", route);

        // Run in its own task so a panicking build still answers its waiters
        let job = Arc::clone(&target);
        let result = tokio::spawn(async move { job.build().await })
            .await
            .unwrap_or_else(|e| Err(PageError::build(&route, format_args!("build task panicked: {e}"))));

        let waiters = self
            .active
            .remove(&route)
            .map(|(_, w)| w)
            .unwrap_or_default();

        if detached || waiters.is_empty() {
            Self::report(&route, &result);
        }
        Self::broadcast(waiters, &result);

        // A job deferred while this build ran
        let deferred = self.pending.get(&route).map(|state| state.priority);
        if let Some(priority) = deferred {
            self.enqueue(route, priority);
        }
        self.finish_job();
    }

    fn broadcast(waiters: Vec<Waiter>, result: &Outcome) {
        for tx in waiters {
            let _ = tx.send(result.clone());
        }
    }

    /// Fire-and-forget outcomes go to the watch status line.
    fn report(route: &RoutePath, result: &Outcome) {
        match result {
            Ok(()) => status_success(&format!("rebuilt {route}")),
            Err(e) => {
                status_error(&format!("rebuild failed: {route}"), &e.to_string());
                log!("error"; "{}", e);
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
