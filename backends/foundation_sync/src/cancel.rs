//! Cooperative stop signal usable across worker threads.

use std::sync::{Arc, Condvar, Mutex, Weak};
use std::time::{Duration, Instant};

use crate::poison::recover;

/// `CancellationToken` tells workers to wind down at their next wait boundary.
///
/// Cloning yields another handle to the same token. Cancelling is sticky and
/// wakes every thread currently parked in [`CancellationToken::sleep`], so a
/// worker between iterations reacts immediately instead of finishing its pause.
///
/// Workers must only check the token outside their critical sections; the
/// token never interrupts a thread that holds a lock.
///
/// [`CancellationToken::child_token`] derives a token that is cancelled along
/// with its parent but can also be cancelled on its own without touching the
/// parent.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<TokenState>,
}

#[derive(Default)]
struct TokenState {
    cancelled: Mutex<bool>,
    event: Condvar,
    children: Mutex<Vec<Weak<TokenState>>>,
}

impl TokenState {
    fn cancel(&self) {
        let mut cancelled = recover(self.cancelled.lock());
        *cancelled = true;
        drop(cancelled);

        self.event.notify_all();

        // the flag is set before the list is taken, so a child registered
        // concurrently either sees the flag or lands in this list
        let children = std::mem::take(&mut *recover(self.children.lock()));
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }
}

impl core::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels this token and every child derived from it.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Creates a token that is cancelled when `self` is, while cancelling the
    /// child leaves `self` untouched.
    #[must_use]
    pub fn child_token(&self) -> Self {
        let child = Self::new();

        let mut children = recover(self.inner.children.lock());
        if *recover(self.inner.cancelled.lock()) {
            drop(children);
            child.cancel();
            return child;
        }
        children.retain(|weak| weak.strong_count() > 0);
        children.push(Arc::downgrade(&child.inner));
        child
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *recover(self.inner.cancelled.lock())
    }

    /// Sleeps for `duration` unless the token is cancelled first.
    ///
    /// Returns `true` when the full duration elapsed and `false` when the
    /// sleep was cut short (or never started) because of cancellation.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut cancelled = recover(self.inner.cancelled.lock());

        loop {
            if *cancelled {
                return false;
            }

            let now = Instant::now();
            if now >= deadline {
                return true;
            }

            let (guard, _) = recover(self.inner.event.wait_timeout(cancelled, deadline - now));
            cancelled = guard;
        }
    }
}
