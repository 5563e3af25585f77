//! Worker pool driver for the `foundation_sync` primitives.
//!
//! This crate provides:
//! - **Worker pool**: named worker threads sharing a cancellation token, with
//!   panic detection on join and an optional deadline
//! - **Scenarios**: producers/consumers over a `BoundedBuffer`,
//!   readers/writers over a `ReadersWriterGate`
//! - **Configuration**: builder-style scenario configs, loadable from TOML
//! - **Reports**: observed vs expected totals and the final resource state
//!
//! # Examples
//!
//! ```rust
//! use foundation_sync::CancellationToken;
//! use foundation_workers::{run_buffer_scenario, BufferScenarioConfig, Jitter};
//!
//! let config = BufferScenarioConfig::new()
//!     .producers(3)
//!     .items_per_producer(4)
//!     .consumers(2)
//!     .producer_jitter(Jitter::none())
//!     .consumer_jitter(Jitter::none());
//!
//! let report = run_buffer_scenario(&config, &CancellationToken::new()).unwrap();
//!
//! assert_eq!(report.produced, 12);
//! assert_eq!(report.consumed, 12);
//! assert!(report.is_complete());
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod errors;
pub mod jitter;
pub mod pool;
pub mod report;
pub mod scenarios;

pub use config::{BufferScenarioConfig, GateScenarioConfig, SynclabConfig};
pub use errors::{PoolError, PoolResult};
pub use jitter::Jitter;
pub use pool::{Role, WorkerContext, WorkerPool};
pub use report::{BufferReport, GateReport};
pub use scenarios::{run_buffer_scenario, run_gate_scenario, run_gate_scenario_with, Item};
