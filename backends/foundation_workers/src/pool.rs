//! Named worker threads sharing one stop signal.

use core::fmt;
use core::time::Duration;
use std::thread::{self, JoinHandle};

use foundation_sync::CancellationToken;

use crate::errors::{PoolError, PoolResult};
use crate::jitter::Jitter;

/// What a worker does in a scenario; used for thread names and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Producer,
    Consumer,
    Reader,
    Writer,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Producer => "producer",
            Role::Consumer => "consumer",
            Role::Reader => "reader",
            Role::Writer => "writer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a worker body gets handed when its thread starts.
pub struct WorkerContext {
    role: Role,
    id: usize,
    stop: CancellationToken,
    rng: fastrand::Rng,
}

impl WorkerContext {
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn stop(&self) -> &CancellationToken {
        &self.stop
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Per-worker generator, seeded from the pool seed and spawn order.
    pub fn rng(&mut self) -> &mut fastrand::Rng {
        &mut self.rng
    }

    /// Sleeps for a duration drawn from `jitter`.
    ///
    /// Returns `false` when the pool was stopped before the pause ended.
    pub fn pause(&mut self, jitter: Jitter) -> bool {
        let duration = jitter.sample(&mut self.rng);
        if duration.is_zero() {
            return !self.is_stopped();
        }
        self.stop.sleep(duration)
    }
}

impl fmt::Debug for WorkerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerContext")
            .field("role", &self.role)
            .field("id", &self.id)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

struct Deadline {
    finished: CancellationToken,
    timer: JoinHandle<()>,
}

/// Spawns workers as named OS threads and joins them all at the end.
///
/// Every worker shares the pool's stop token, a child of the token the pool
/// was created with. Cancelling the caller's token, reaching the deadline or
/// dropping the pool asks workers to wind down; the last two never cancel the
/// caller's token. The pool never kills a thread.
pub struct WorkerPool {
    stop: CancellationToken,
    seed: u64,
    spawned: u64,
    workers: Vec<(String, JoinHandle<()>)>,
    deadline: Option<Deadline>,
}

impl WorkerPool {
    #[must_use]
    pub fn new(stop: &CancellationToken) -> Self {
        Self {
            stop: stop.child_token(),
            seed: fastrand::u64(..),
            spawned: 0,
            workers: Vec::new(),
            deadline: None,
        }
    }

    /// Fixes the base seed so pauses are reproducible; `None` keeps the
    /// random one.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        if let Some(seed) = seed {
            self.seed = seed;
        }
        self
    }

    /// Cancels the workers' stop token once `deadline` has passed, unless the
    /// pool was joined first.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Spawn`] if the timer thread cannot be started.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> PoolResult<Self> {
        let Some(deadline) = deadline else {
            return Ok(self);
        };

        let finished = CancellationToken::new();
        let timer = {
            let finished = finished.clone();
            let stop = self.stop.clone();
            thread::Builder::new()
                .name(String::from("pool-deadline"))
                .spawn(move || {
                    if finished.sleep(deadline) {
                        ewe_logs::warn!("Deadline of {:?} reached, stopping workers", deadline);
                        stop.cancel();
                    }
                })
                .map_err(PoolError::Spawn)?
        };

        self.deadline = Some(Deadline { finished, timer });
        Ok(self)
    }

    /// Starts `work` on a thread named `{role}-{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Spawn`] if the OS refuses the thread.
    pub fn spawn<F>(&mut self, role: Role, id: usize, work: F) -> PoolResult<()>
    where
        F: FnOnce(WorkerContext) + Send + 'static,
    {
        let span = tracing::trace_span!("WorkerPool::spawn");
        let _enter = span.enter();

        let thread_name = format!("{role}-{id}");
        let context = WorkerContext {
            role,
            id,
            stop: self.stop.clone(),
            rng: fastrand::Rng::with_seed(self.seed.wrapping_add(self.spawned)),
        };

        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                ewe_logs::debug!("Starting {} {}", context.role, context.id);
                work(context);
            })
            .map_err(PoolError::Spawn)?;

        self.spawned += 1;
        self.workers.push((thread_name, handle));
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Token the workers observe; cancelled by the caller's token, the
    /// deadline or dropping the pool.
    #[must_use]
    pub fn stop_token(&self) -> &CancellationToken {
        &self.stop
    }

    /// Waits for every worker to finish.
    ///
    /// A panicking worker does not stop the others from being joined.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::WorkerPanicked`] naming each worker that panicked.
    pub fn join(mut self) -> PoolResult<()> {
        let span = tracing::trace_span!("WorkerPool::join");
        let _enter = span.enter();

        let panicked = self.join_workers();
        self.stop_deadline();

        if panicked.is_empty() {
            Ok(())
        } else {
            Err(PoolError::WorkerPanicked { workers: panicked })
        }
    }

    fn join_workers(&mut self) -> Vec<String> {
        let mut panicked = Vec::new();
        for (name, handle) in self.workers.drain(..) {
            if let Err(reason) = handle.join() {
                ewe_logs::error!("Worker {} panicked: {:?}", name, panic_message(&*reason));
                panicked.push(name);
            }
        }
        panicked
    }

    fn stop_deadline(&mut self) {
        if let Some(deadline) = self.deadline.take() {
            deadline.finished.cancel();
            if deadline.timer.join().is_err() {
                ewe_logs::error!("Deadline timer panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.workers.is_empty() && self.deadline.is_none() {
            return;
        }
        self.stop.cancel();
        let _ = self.join_workers();
        self.stop_deadline();
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .field("seed", &self.seed)
            .field("stopped", &self.stop.is_cancelled())
            .finish_non_exhaustive()
    }
}

fn panic_message(reason: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = reason.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = reason.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}
