//! Counting semaphore built from a mutex and a condition variable.
//!
//! Threads take a permit with [`Semaphore::acquire`], which hands back a
//! [`SemaphorePermit`] that gives the permit back when dropped, so early
//! returns and panics never leak it.
//!
//! Some protocols acquire a permit on one thread and release it on another
//! (the readers-writer gate's first reader acquires, its last reader
//! releases). For those, [`Semaphore::wait`] and [`Semaphore::signal`] work
//! on raw permits and the caller is responsible for pairing them.

use std::sync::{Condvar, Mutex};

use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::poison::recover;

/// Counting semaphore.
///
/// # Examples
///
/// ```
/// use foundation_sync::Semaphore;
///
/// let gate = Semaphore::binary();
/// let permit = gate.acquire();
/// assert!(gate.try_acquire().is_none());
///
/// drop(permit);
/// assert!(gate.try_acquire().is_some());
/// ```
pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl core::fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Semaphore")
            .field("available_permits", &self.available_permits())
            .finish()
    }
}

impl Semaphore {
    /// Creates a semaphore holding `permits` permits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ZeroPermits`] when `permits` is zero; a
    /// semaphore that can never be acquired is a configuration mistake.
    pub fn new(permits: usize) -> ConfigurationResult<Self> {
        if permits == 0 {
            return Err(ConfigurationError::ZeroPermits);
        }
        Ok(Self::with_permits(permits))
    }

    /// Creates a semaphore with a single permit, usable as a gate.
    #[must_use]
    pub fn binary() -> Self {
        Self::with_permits(1)
    }

    fn with_permits(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    /// Blocks until a permit is available and takes it.
    pub fn acquire(&self) -> SemaphorePermit<'_> {
        self.wait();
        SemaphorePermit { semaphore: self }
    }

    /// Takes a permit if one is available right now.
    pub fn try_acquire(&self) -> Option<SemaphorePermit<'_>> {
        let mut permits = recover(self.permits.lock());
        if *permits == 0 {
            return None;
        }
        *permits -= 1;
        Some(SemaphorePermit { semaphore: self })
    }

    /// Blocks until a permit is available and takes it without a guard.
    ///
    /// Every call must be matched by exactly one [`Semaphore::signal`],
    /// possibly from another thread.
    pub fn wait(&self) {
        let mut permits = recover(self.permits.lock());
        while *permits == 0 {
            permits = recover(self.available.wait(permits));
        }
        *permits -= 1;
    }

    /// Returns one permit and wakes a single waiter.
    pub fn signal(&self) {
        let mut permits = recover(self.permits.lock());
        *permits += 1;
        drop(permits);

        self.available.notify_one();
    }

    #[must_use]
    pub fn available_permits(&self) -> usize {
        *recover(self.permits.lock())
    }
}

/// RAII permit; releases back to its [`Semaphore`] on drop.
#[must_use = "dropping the permit releases it immediately"]
pub struct SemaphorePermit<'a> {
    semaphore: &'a Semaphore,
}

impl SemaphorePermit<'_> {
    /// Consumes the guard without releasing the permit.
    ///
    /// The permit then has to be given back with [`Semaphore::signal`].
    pub fn forget(self) {
        core::mem::forget(self);
    }
}

impl Drop for SemaphorePermit<'_> {
    fn drop(&mut self) {
        self.semaphore.signal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn zero_permits_is_rejected() {
        assert_eq!(
            Semaphore::new(0).unwrap_err(),
            ConfigurationError::ZeroPermits
        );
    }

    #[test]
    fn permits_are_returned_on_drop() {
        let semaphore = Semaphore::new(2).unwrap();
        let first = semaphore.acquire();
        let second = semaphore.acquire();
        assert_eq!(semaphore.available_permits(), 0);
        assert!(semaphore.try_acquire().is_none());

        drop(first);
        assert_eq!(semaphore.available_permits(), 1);
        drop(second);
        assert_eq!(semaphore.available_permits(), 2);
    }

    #[test]
    fn forgotten_permit_stays_taken_until_signalled() {
        let semaphore = Semaphore::binary();
        semaphore.acquire().forget();
        assert_eq!(semaphore.available_permits(), 0);

        semaphore.signal();
        assert_eq!(semaphore.available_permits(), 1);
    }

    #[test]
    fn waiter_is_released_by_signal_from_another_thread() {
        let semaphore = Arc::new(Semaphore::binary());
        semaphore.wait();

        let acquired = Arc::new(AtomicBool::new(false));
        let waiter = {
            let semaphore = Arc::clone(&semaphore);
            let acquired = Arc::clone(&acquired);
            thread::spawn(move || {
                let _permit = semaphore.acquire();
                acquired.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!acquired.load(Ordering::SeqCst));

        semaphore.signal();
        waiter.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
        assert_eq!(semaphore.available_permits(), 1);
    }

    #[test]
    fn never_more_holders_than_permits() {
        let semaphore = Arc::new(Semaphore::new(3).unwrap());
        let holders = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let semaphore = Arc::clone(&semaphore);
                let holders = Arc::clone(&holders);
                let peak = Arc::clone(&peak);
                thread::spawn(move || {
                    for _ in 0..50 {
                        let _permit = semaphore.acquire();
                        let now = holders.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        thread::yield_now();
                        holders.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(semaphore.available_permits(), 3);
    }
}
