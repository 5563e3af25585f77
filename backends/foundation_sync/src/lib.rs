//! Blocking synchronization building blocks shared between worker threads.
//!
//! This crate provides:
//! - **[`BoundedBuffer`]**: fixed-capacity ring guarded by a mutex and two
//!   condition variables (producers block when full, consumers when empty)
//! - **[`ReadersWriterGate`]**: many concurrent readers or one writer over a
//!   [`SharedResource`], using the first-reader / last-reader protocol
//! - **[`StatsCounter`]**: atomic operation counter for reporting
//! - **[`Semaphore`]** and **[`CancellationToken`]**: the gate's binary lock and
//!   the cooperative stop signal used by workers
//!
//! # Examples
//!
//! ```rust
//! use foundation_sync::{BoundedBuffer, StatsCounter};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let buffer = Arc::new(BoundedBuffer::new(2).unwrap());
//! let consumed = Arc::new(StatsCounter::new());
//!
//! let producer = {
//!     let buffer = Arc::clone(&buffer);
//!     thread::spawn(move || {
//!         for item in 0..4 {
//!             buffer.insert(item);
//!         }
//!     })
//! };
//!
//! for expected in 0..4 {
//!     assert_eq!(buffer.remove(), expected);
//!     consumed.increment();
//! }
//!
//! producer.join().unwrap();
//! assert_eq!(consumed.get(), 4);
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bounded_buffer;
pub mod cancel;
pub mod counter;
pub mod errors;
pub mod resource;
pub mod rw_gate;
pub mod semaphore;

mod poison;

pub use bounded_buffer::{BoundedBuffer, BufferSnapshot};
pub use cancel::CancellationToken;
pub use counter::StatsCounter;
pub use errors::{ConfigurationError, ConfigurationResult, ResourceError, ResourceResult};
pub use resource::{MemoryCell, SharedResource};
pub use rw_gate::{ReadSection, ReadersWriterGate, WriteSection};
pub use semaphore::{Semaphore, SemaphorePermit};
