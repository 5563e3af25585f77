//! Readers-writer gate built on the first-reader / last-reader protocol.
//!
//! Two locks coordinate access to the protected resource:
//!
//! - `resource_lock`, a binary [`Semaphore`]. A writer holds it for the
//!   length of its write. Readers hold it as a group: the reader that moves
//!   the active count from 0 to 1 acquires it, the reader that moves the
//!   count from 1 to 0 releases it. Those two readers are usually different
//!   threads, which is why this is a semaphore and not a mutex.
//! - `reader_count_lock`, a mutex guarding only the active reader count.
//!   The first reader keeps holding it while it waits for `resource_lock`,
//!   so later readers queue behind it instead of slipping past a writer.
//!
//! Readers never serialize against each other, only against writers and the
//! count transitions. There is no fairness: while readers keep overlapping,
//! the count never drops to zero and a waiting writer stays blocked.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use std::sync::Mutex;

use crate::errors::ResourceResult;
use crate::poison::recover;
use crate::resource::SharedResource;
use crate::semaphore::{Semaphore, SemaphorePermit};

/// Lets many readers or a single writer at a protected resource.
///
/// # Examples
///
/// ```
/// use foundation_sync::{MemoryCell, ReadersWriterGate};
///
/// let gate = ReadersWriterGate::new(MemoryCell::new(String::from("init")));
///
/// let first = gate.begin_read();
/// let second = gate.begin_read();
/// assert_eq!(gate.active_readers(), 2);
/// drop((first, second));
///
/// gate.write(String::from("Message #1 from Writer 0")).unwrap();
/// assert_eq!(gate.read().unwrap(), "Message #1 from Writer 0");
/// ```
pub struct ReadersWriterGate<R> {
    resource_lock: Semaphore,
    reader_count_lock: Mutex<ReaderCount>,
    resource: UnsafeCell<R>,
}

#[derive(Debug, Default)]
struct ReaderCount {
    active: usize,
    peak: usize,
}

// SAFETY: the resource is only reachable through a `ReadSection` (shared
// access, needs `R: Sync`) or a `WriteSection` (exclusive access, needs
// `R: Send`). Write sections hold `resource_lock`; read sections exist only
// while the reader group holds it. So a `&mut R` never coexists with any
// other reference to the resource.
unsafe impl<R: Send + Sync> Sync for ReadersWriterGate<R> {}

impl<R> ReadersWriterGate<R> {
    pub fn new(resource: R) -> Self {
        Self {
            resource_lock: Semaphore::binary(),
            reader_count_lock: Mutex::new(ReaderCount::default()),
            resource: UnsafeCell::new(resource),
        }
    }

    /// Enters a read section, blocking while a writer holds the gate.
    ///
    /// The section ends when the returned guard is dropped, on every exit
    /// path including unwinding.
    pub fn begin_read(&self) -> ReadSection<'_, R> {
        let mut readers = recover(self.reader_count_lock.lock());

        readers.active += 1;
        if readers.active == 1 {
            ewe_logs::trace!("First reader acquiring resource lock");
            self.resource_lock.wait();
        }
        readers.peak = readers.peak.max(readers.active);
        drop(readers);

        ReadSection { gate: self }
    }

    fn end_read(&self) {
        let mut readers = recover(self.reader_count_lock.lock());

        debug_assert!(readers.active > 0);
        readers.active -= 1;
        if readers.active == 0 {
            ewe_logs::trace!("Last reader releasing resource lock");
            self.resource_lock.signal();
        }
    }

    /// Enters the exclusive write section, blocking until no reader and no
    /// other writer holds the gate.
    pub fn begin_write(&self) -> WriteSection<'_, R> {
        let permit = self.resource_lock.acquire();
        WriteSection {
            gate: self,
            _permit: permit,
        }
    }

    /// Number of readers currently inside a read section.
    #[must_use]
    pub fn active_readers(&self) -> usize {
        recover(self.reader_count_lock.lock()).active
    }

    /// Highest number of simultaneous readers seen so far.
    #[must_use]
    pub fn peak_readers(&self) -> usize {
        recover(self.reader_count_lock.lock()).peak
    }

    /// Returns `true` while a writer or the reader group holds the gate.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.resource_lock.available_permits() == 0
    }

    pub fn get_mut(&mut self) -> &mut R {
        self.resource.get_mut()
    }

    pub fn into_inner(self) -> R {
        self.resource.into_inner()
    }
}

impl<R: SharedResource> ReadersWriterGate<R> {
    /// Reads the resource inside a read section.
    ///
    /// # Errors
    ///
    /// Propagates the resource's read failure; the section is closed either way.
    pub fn read(&self) -> ResourceResult<R::Content> {
        let section = self.begin_read();
        section.read()
    }

    /// Writes the resource inside the exclusive write section.
    ///
    /// # Errors
    ///
    /// Propagates the resource's write failure; the gate is released either way.
    pub fn write(&self, content: R::Content) -> ResourceResult<()> {
        let mut section = self.begin_write();
        section.write(content)
    }
}

impl<R: Default> Default for ReadersWriterGate<R> {
    fn default() -> Self {
        Self::new(R::default())
    }
}

impl<R> core::fmt::Debug for ReadersWriterGate<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let readers = recover(self.reader_count_lock.lock());
        f.debug_struct("ReadersWriterGate")
            .field("active_readers", &readers.active)
            .field("peak_readers", &readers.peak)
            .finish_non_exhaustive()
    }
}

/// Shared access to the gate's resource; ends the read section on drop.
#[must_use = "dropping the section ends the read immediately"]
pub struct ReadSection<'a, R> {
    gate: &'a ReadersWriterGate<R>,
}

impl<R> Deref for ReadSection<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        // SAFETY: while a read section exists the reader group holds
        // `resource_lock`, so no write section can hand out `&mut R`.
        unsafe { &*self.gate.resource.get() }
    }
}

impl<R> Drop for ReadSection<'_, R> {
    fn drop(&mut self) {
        self.gate.end_read();
    }
}

/// Exclusive access to the gate's resource; releases the gate on drop.
#[must_use = "dropping the section releases the gate immediately"]
pub struct WriteSection<'a, R> {
    gate: &'a ReadersWriterGate<R>,
    _permit: SemaphorePermit<'a>,
}

impl<R> Deref for WriteSection<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        // SAFETY: this section owns the only `resource_lock` permit.
        unsafe { &*self.gate.resource.get() }
    }
}

impl<R> DerefMut for WriteSection<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        // SAFETY: this section owns the only `resource_lock` permit, so no
        // reader or other writer can reach the resource.
        unsafe { &mut *self.gate.resource.get() }
    }
}
