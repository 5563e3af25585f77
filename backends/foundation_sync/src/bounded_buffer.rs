//! Bounded producer-consumer buffer using a mutex and two condition variables.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::poison::recover;

/// A fixed-capacity FIFO ring shared between producers and consumers.
///
/// Producers block in [`BoundedBuffer::insert`] while the ring is full and
/// consumers block in [`BoundedBuffer::remove`] while it is empty. Waiting
/// never holds the internal lock; the condition variable releases it and
/// takes it back on wake, after which the predicate is checked again.
///
/// Blocking has no timeout. Callers that need one, or need to observe a stop
/// signal, use the `*_timeout` variants in a loop.
///
/// # Examples
///
/// ```
/// use foundation_sync::BoundedBuffer;
/// use std::sync::Arc;
/// use std::thread;
///
/// let buffer = Arc::new(BoundedBuffer::new(5).unwrap());
///
/// // Producer thread
/// let producer_buffer = Arc::clone(&buffer);
/// let producer = thread::spawn(move || {
///     for i in 0..10 {
///         producer_buffer.insert(i);
///     }
/// });
///
/// // Consumer thread
/// let consumer_buffer = Arc::clone(&buffer);
/// let consumer = thread::spawn(move || {
///     (0..10).map(|_| consumer_buffer.remove()).collect::<Vec<_>>()
/// });
///
/// producer.join().unwrap();
/// assert_eq!(consumer.join().unwrap(), (0..10).collect::<Vec<_>>());
/// ```
pub struct BoundedBuffer<T> {
    ring: Mutex<Ring<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

/// Point-in-time view of a buffer's ring state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSnapshot<T> {
    pub count: usize,
    /// Next slot to remove from.
    pub head: usize,
    /// Next slot to insert into.
    pub tail: usize,
    /// Resident items, oldest first.
    pub items: Vec<T>,
}

struct Ring<T> {
    slots: Vec<Option<T>>,
    head: usize,
    tail: usize,
    count: usize,
}

impl<T> Ring<T> {
    fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    fn push(&mut self, item: T) {
        debug_assert!(!self.is_full());
        debug_assert!(self.slots[self.tail].is_none());

        self.slots[self.tail] = Some(item);
        self.tail = (self.tail + 1) % self.capacity();
        self.count += 1;
    }

    fn pop(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }

        let item = self.slots[self.head].take();
        debug_assert!(item.is_some());

        self.head = (self.head + 1) % self.capacity();
        self.count -= 1;
        item
    }
}

impl<T> BoundedBuffer<T> {
    /// Creates an empty buffer that holds at most `capacity` items.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ZeroCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> ConfigurationResult<Self> {
        if capacity == 0 {
            return Err(ConfigurationError::ZeroCapacity);
        }

        Ok(Self {
            ring: Mutex::new(Ring::with_capacity(capacity)),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        })
    }

    /// Inserts an item at the tail, blocking while the buffer is full.
    pub fn insert(&self, item: T) {
        let mut ring = recover(self.ring.lock());

        while ring.is_full() {
            ewe_logs::debug!("Buffer full, producer waiting");
            ring = recover(self.not_full.wait(ring));
        }

        ring.push(item);
        ewe_logs::trace!(count = ring.count, "Inserted item");

        // Notify consumers that buffer is not empty
        drop(ring);
        self.not_empty.notify_one();
    }

    /// Removes the item at the head, blocking while the buffer is empty.
    pub fn remove(&self) -> T {
        let mut ring = recover(self.ring.lock());

        let item = loop {
            if let Some(item) = ring.pop() {
                break item;
            }
            ewe_logs::debug!("Buffer empty, consumer waiting");
            ring = recover(self.not_empty.wait(ring));
        };
        ewe_logs::trace!(count = ring.count, "Removed item");

        // Notify producers that buffer is not full
        drop(ring);
        self.not_full.notify_one();

        item
    }

    /// Inserts without blocking, handing the item back when the buffer is full.
    ///
    /// # Errors
    ///
    /// Returns `Err(item)` if there was no free slot.
    pub fn try_insert(&self, item: T) -> Result<(), T> {
        let mut ring = recover(self.ring.lock());
        if ring.is_full() {
            return Err(item);
        }

        ring.push(item);
        drop(ring);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes without blocking.
    pub fn try_remove(&self) -> Option<T> {
        let mut ring = recover(self.ring.lock());
        let item = ring.pop()?;

        drop(ring);
        self.not_full.notify_one();
        Some(item)
    }

    /// Like [`BoundedBuffer::insert`] but gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `Err(item)` if the buffer stayed full for the whole timeout.
    pub fn insert_timeout(&self, item: T, timeout: Duration) -> Result<(), T> {
        let ring = recover(self.ring.lock());
        let (mut ring, _) = recover(
            self.not_full
                .wait_timeout_while(ring, timeout, |ring| ring.is_full()),
        );

        if ring.is_full() {
            return Err(item);
        }

        ring.push(item);
        drop(ring);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Like [`BoundedBuffer::remove`] but gives up after `timeout`.
    pub fn remove_timeout(&self, timeout: Duration) -> Option<T> {
        let ring = recover(self.ring.lock());
        let (mut ring, _) = recover(
            self.not_empty
                .wait_timeout_while(ring, timeout, |ring| ring.count == 0),
        );

        let item = ring.pop()?;
        drop(ring);
        self.not_full.notify_one();
        Some(item)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        recover(self.ring.lock()).count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        recover(self.ring.lock()).is_full()
    }
}

impl<T: Clone> BoundedBuffer<T> {
    /// Captures count, cursors and resident items under the lock.
    #[must_use]
    pub fn snapshot(&self) -> BufferSnapshot<T> {
        let ring = recover(self.ring.lock());

        let items = (0..ring.count)
            .filter_map(|offset| ring.slots[(ring.head + offset) % ring.capacity()].clone())
            .collect();

        BufferSnapshot {
            count: ring.count,
            head: ring.head,
            tail: ring.tail,
            items,
        }
    }
}

impl<T> core::fmt::Debug for BoundedBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ring = recover(self.ring.lock());
        f.debug_struct("BoundedBuffer")
            .field("capacity", &self.capacity)
            .field("count", &ring.count)
            .field("head", &ring.head)
            .field("tail", &ring.tail)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn zero_capacity_is_a_configuration_error() {
        assert_eq!(
            BoundedBuffer::<u32>::new(0).unwrap_err(),
            ConfigurationError::ZeroCapacity
        );
    }

    #[test]
    fn cursors_wrap_around_the_ring() {
        let buffer = BoundedBuffer::new(3).unwrap();
        for round in 0..4 {
            buffer.insert(round * 10);
            buffer.insert(round * 10 + 1);
            assert_eq!(buffer.remove(), round * 10);
            assert_eq!(buffer.remove(), round * 10 + 1);
        }

        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.count, 0);
        assert_eq!(snapshot.head, 8 % 3);
        assert_eq!(snapshot.tail, 8 % 3);
        assert!(snapshot.items.is_empty());
    }

    #[test]
    fn snapshot_lists_items_oldest_first() {
        let buffer = BoundedBuffer::new(4).unwrap();
        for item in 1..=4 {
            buffer.insert(item);
        }
        assert_eq!(buffer.remove(), 1);
        buffer.insert(5);

        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.count, 4);
        assert_eq!(snapshot.head, 1);
        assert_eq!(snapshot.tail, 1);
        assert_eq!(snapshot.items, vec![2, 3, 4, 5]);
    }

    #[test]
    fn try_variants_do_not_block() {
        let buffer = BoundedBuffer::new(1).unwrap();
        assert_eq!(buffer.try_remove(), None);
        assert_eq!(buffer.try_insert('a'), Ok(()));
        assert!(buffer.is_full());
        assert_eq!(buffer.try_insert('b'), Err('b'));
        assert_eq!(buffer.try_remove(), Some('a'));
        assert!(buffer.is_empty());
    }

    #[test]
    fn timeouts_hand_back_control() {
        let buffer = BoundedBuffer::new(1).unwrap();
        assert_eq!(buffer.remove_timeout(Duration::from_millis(20)), None);

        buffer.insert(7);
        assert_eq!(buffer.insert_timeout(8, Duration::from_millis(20)), Err(8));
        assert_eq!(buffer.remove_timeout(Duration::from_millis(20)), Some(7));
        assert_eq!(buffer.insert_timeout(9, Duration::from_millis(20)), Ok(()));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn producer_blocks_while_full() {
        let buffer = Arc::new(BoundedBuffer::new(1).unwrap());
        buffer.insert(1);

        let inserted = Arc::new(AtomicBool::new(false));
        let producer = {
            let buffer = Arc::clone(&buffer);
            let inserted = Arc::clone(&inserted);
            thread::spawn(move || {
                buffer.insert(2);
                inserted.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!inserted.load(Ordering::SeqCst));
        assert_eq!(buffer.len(), 1);

        assert_eq!(buffer.remove(), 1);
        producer.join().unwrap();
        assert!(inserted.load(Ordering::SeqCst));
        assert_eq!(buffer.remove(), 2);
    }

    #[test]
    fn consumer_blocks_while_empty() {
        let buffer = Arc::new(BoundedBuffer::<&str>::new(2).unwrap());

        let consumer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.remove())
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!consumer.is_finished());

        buffer.insert("late");
        assert_eq!(consumer.join().unwrap(), "late");
    }
}
