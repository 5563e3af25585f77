use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use foundation_sync::{
    CancellationToken, MemoryCell, ReadersWriterGate, SharedResource, StatsCounter,
};

use crate::config::GateScenarioConfig;
use crate::errors::PoolResult;
use crate::pool::{Role, WorkerContext, WorkerPool};
use crate::report::GateReport;

/// Content writer `writer` stores on its `n`th write, counting from 1.
#[must_use]
pub fn writer_payload(writer: usize, n: usize) -> String {
    format!("Message #{n} from Writer {writer}")
}

struct Shared<R> {
    gate: ReadersWriterGate<R>,
    reads: StatsCounter,
    writes: StatsCounter,
    failed_reads: StatsCounter,
    failed_writes: StatsCounter,
    payloads: Mutex<Vec<String>>,
}

/// Runs the readers/writers scenario over an in-memory cell holding the
/// configured initial content.
///
/// # Errors
///
/// See [`run_gate_scenario_with`].
pub fn run_gate_scenario(
    config: &GateScenarioConfig,
    stop: &CancellationToken,
) -> PoolResult<GateReport> {
    run_gate_scenario_with(
        config,
        MemoryCell::new(config.get_initial().to_owned()),
        stop,
    )
}

/// Runs readers and writers against `resource` behind a
/// [`ReadersWriterGate`].
///
/// A failed read or write is logged and counted; the worker moves on to its
/// next iteration.
///
/// # Errors
///
/// Returns [`PoolError::Configuration`](crate::PoolError::Configuration) for an
/// invalid config, [`PoolError::Spawn`](crate::PoolError::Spawn) when a thread
/// cannot be started and
/// [`PoolError::WorkerPanicked`](crate::PoolError::WorkerPanicked) when a
/// worker panicked.
pub fn run_gate_scenario_with<R>(
    config: &GateScenarioConfig,
    resource: R,
    stop: &CancellationToken,
) -> PoolResult<GateReport>
where
    R: SharedResource<Content = String> + Send + Sync + 'static,
{
    config.validate()?;

    let shared = Arc::new(Shared {
        gate: ReadersWriterGate::new(resource),
        reads: StatsCounter::new(),
        writes: StatsCounter::new(),
        failed_reads: StatsCounter::new(),
        failed_writes: StatsCounter::new(),
        payloads: Mutex::new(Vec::with_capacity(config.expected_writes())),
    });

    ewe_logs::info!(
        "Starting {} readers and {} writers, {} iterations each",
        config.get_readers(),
        config.get_writers(),
        config.get_iterations()
    );

    let started = Instant::now();
    let mut pool = WorkerPool::new(stop)
        .with_seed(config.get_seed())
        .with_deadline(config.get_deadline())?;
    let workers_stop = pool.stop_token().clone();

    for id in 0..config.get_readers() {
        let shared = Arc::clone(&shared);
        let config = config.clone();
        pool.spawn(Role::Reader, id, move |ctx| read_loop(ctx, &shared, &config))?;
    }

    for id in 0..config.get_writers() {
        let shared = Arc::clone(&shared);
        let config = config.clone();
        pool.spawn(Role::Writer, id, move |ctx| write_loop(ctx, &shared, &config))?;
    }

    pool.join()?;
    let duration = started.elapsed();

    // sampled before the final read below, which would count as a reader
    let peak_readers = shared.gate.peak_readers();
    let final_content = match shared.gate.read() {
        Ok(content) => Some(content),
        Err(err) => {
            ewe_logs::error!("Could not read final state: {}", err);
            None
        }
    };
    let payloads = std::mem::take(
        &mut *shared
            .payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner),
    );

    let mut report = GateReport {
        reads: shared.reads.get(),
        writes: shared.writes.get(),
        failed_reads: shared.failed_reads.get(),
        failed_writes: shared.failed_writes.get(),
        expected_reads: config.expected_reads(),
        expected_writes: config.expected_writes(),
        peak_readers,
        final_content,
        payloads,
        cancelled: false,
        duration,
    };
    report.cancelled = workers_stop.is_cancelled() && !report.is_complete();
    Ok(report)
}

fn read_loop<R>(mut ctx: WorkerContext, shared: &Shared<R>, config: &GateScenarioConfig)
where
    R: SharedResource<Content = String>,
{
    for _ in 0..config.get_iterations() {
        if !ctx.pause(config.get_read_jitter()) {
            break;
        }

        let outcome = {
            let section = shared.gate.begin_read();
            let outcome = section.read();
            // a cancelled hold only cuts the padding short
            let _ = ctx.pause(config.get_read_hold());
            outcome
        };

        match outcome {
            Ok(content) => {
                shared.reads.increment();
                ewe_logs::info!("Reader {} read: {}", ctx.id(), content);
            }
            Err(err) => {
                shared.failed_reads.increment();
                ewe_logs::error!("Reader {} failed to read: {}", ctx.id(), err);
            }
        }

        if !ctx.pause(config.get_read_pause()) {
            break;
        }
    }
    ewe_logs::debug!("Reader {} done", ctx.id());
}

fn write_loop<R>(mut ctx: WorkerContext, shared: &Shared<R>, config: &GateScenarioConfig)
where
    R: SharedResource<Content = String>,
{
    let delay = config.get_writer_start_delay();
    if !delay.is_zero() && !ctx.stop().sleep(delay) {
        return;
    }

    for iteration in 0..config.get_iterations() {
        if !ctx.pause(config.get_write_jitter()) {
            break;
        }

        let payload = writer_payload(ctx.id(), iteration + 1);
        let outcome = {
            let mut section = shared.gate.begin_write();
            let outcome = section.write(payload.clone());
            let _ = ctx.pause(config.get_write_hold());
            outcome
        };

        match outcome {
            Ok(()) => {
                shared.writes.increment();
                ewe_logs::info!("Writer {} wrote: {}", ctx.id(), payload);
                shared
                    .payloads
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(payload);
            }
            Err(err) => {
                shared.failed_writes.increment();
                ewe_logs::error!("Writer {} failed to write: {}", ctx.id(), err);
            }
        }

        if !ctx.pause(config.get_write_pause()) {
            break;
        }
    }
    ewe_logs::debug!("Writer {} done", ctx.id());
}
