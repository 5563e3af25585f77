//! Scenario runners wiring the `foundation_sync` primitives to a
//! [`WorkerPool`](crate::WorkerPool).
//!
//! Each runner validates its configuration, spawns the workers, joins them
//! and returns a report. Cancelling the caller's token stops a run early; so
//! does the configured deadline. Workers observe a child of the caller's
//! token, so neither a deadline nor an early error return cancels the
//! caller's token. A report is marked `cancelled` only when the run was
//! stopped before finishing its work.

mod bounded_buffer;
mod readers_writers;

pub use bounded_buffer::{consumer_quota, run_buffer_scenario, Item};
pub use readers_writers::{run_gate_scenario, run_gate_scenario_with, writer_payload};
