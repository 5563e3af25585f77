use core::time::Duration;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use foundation_sync::{BoundedBuffer, CancellationToken, StatsCounter};

use crate::config::BufferScenarioConfig;
use crate::errors::PoolResult;
use crate::pool::{Role, WorkerContext, WorkerPool};
use crate::report::BufferReport;

/// A value moving through the buffer, tagged with where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Item {
    pub producer: usize,
    /// Position in the producer's own output, starting at 0.
    pub sequence: usize,
    pub value: u32,
}

/// Number of items consumer `index` takes out of `total`.
///
/// Items are split evenly and the remainder goes to the lowest-numbered
/// consumers, so the quotas always add up to `total`.
#[must_use]
pub fn consumer_quota(total: usize, consumers: usize, index: usize) -> usize {
    if consumers == 0 {
        return 0;
    }
    let base = total / consumers;
    if index < total % consumers {
        base + 1
    } else {
        base
    }
}

struct Shared {
    buffer: BoundedBuffer<Item>,
    produced: StatsCounter,
    consumed: StatsCounter,
    consumed_items: Mutex<Vec<Item>>,
}

/// Runs producers and consumers over one [`BoundedBuffer`] until every
/// expected item went through it or `stop` is cancelled.
///
/// # Errors
///
/// Returns [`PoolError::Configuration`](crate::PoolError::Configuration) for an
/// invalid config, [`PoolError::Spawn`](crate::PoolError::Spawn) when a thread
/// cannot be started and
/// [`PoolError::WorkerPanicked`](crate::PoolError::WorkerPanicked) when a
/// worker panicked.
pub fn run_buffer_scenario(
    config: &BufferScenarioConfig,
    stop: &CancellationToken,
) -> PoolResult<BufferReport> {
    config.validate()?;

    let expected = config.expected_items();
    let shared = Arc::new(Shared {
        buffer: BoundedBuffer::new(config.get_capacity())?,
        produced: StatsCounter::new(),
        consumed: StatsCounter::new(),
        consumed_items: Mutex::new(Vec::with_capacity(expected)),
    });

    ewe_logs::info!(
        "Starting {} producers and {} consumers over a buffer of {}",
        config.get_producers(),
        config.get_consumers(),
        config.get_capacity()
    );

    let started = Instant::now();
    let mut pool = WorkerPool::new(stop)
        .with_seed(config.get_seed())
        .with_deadline(config.get_deadline())?;
    let workers_stop = pool.stop_token().clone();

    for id in 0..config.get_producers() {
        let shared = Arc::clone(&shared);
        let config = *config;
        pool.spawn(Role::Producer, id, move |ctx| produce(ctx, &shared, &config))?;
    }

    for id in 0..config.get_consumers() {
        let shared = Arc::clone(&shared);
        let config = *config;
        let quota = consumer_quota(expected, config.get_consumers(), id);
        pool.spawn(Role::Consumer, id, move |ctx| {
            consume(ctx, &shared, &config, quota);
        })?;
    }

    pool.join()?;
    let duration = started.elapsed();

    let consumed_items = std::mem::take(
        &mut *shared
            .consumed_items
            .lock()
            .unwrap_or_else(PoisonError::into_inner),
    );

    let produced = shared.produced.get();
    let consumed = shared.consumed.get();
    let finished = produced == expected && consumed == expected;

    Ok(BufferReport {
        capacity: shared.buffer.capacity(),
        produced,
        consumed,
        expected,
        cancelled: workers_stop.is_cancelled() && !finished,
        snapshot: shared.buffer.snapshot(),
        consumed_items,
        duration,
    })
}

fn produce(mut ctx: WorkerContext, shared: &Shared, config: &BufferScenarioConfig) {
    let poll = config.get_poll_interval();
    for sequence in 0..config.get_items_per_producer() {
        if ctx.is_stopped() {
            break;
        }

        let item = Item {
            producer: ctx.id(),
            sequence,
            value: ctx.rng().u32(1..=config.get_max_item_value()),
        };

        if !insert_until_stopped(&shared.buffer, item, ctx.stop(), poll) {
            break;
        }
        shared.produced.increment();
        ewe_logs::info!(
            "Producer {} produced: {} (Buffer count: {})",
            ctx.id(),
            item.value,
            shared.buffer.len()
        );

        if !ctx.pause(config.get_producer_jitter()) {
            break;
        }
    }
    ewe_logs::debug!("Producer {} done", ctx.id());
}

fn consume(mut ctx: WorkerContext, shared: &Shared, config: &BufferScenarioConfig, quota: usize) {
    let poll = config.get_poll_interval();
    for _ in 0..quota {
        if ctx.is_stopped() {
            break;
        }

        let Some(item) = remove_until_stopped(&shared.buffer, ctx.stop(), poll) else {
            break;
        };
        shared.consumed.increment();
        shared
            .consumed_items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(item);
        ewe_logs::info!(
            "Consumer {} consumed: {} (from Producer {}, Buffer count: {})",
            ctx.id(),
            item.value,
            item.producer,
            shared.buffer.len()
        );

        if !ctx.pause(config.get_consumer_jitter()) {
            break;
        }
    }
    ewe_logs::debug!("Consumer {} done", ctx.id());
}

/// Blocks in `poll`-sized slices so a cancelled token is noticed.
fn insert_until_stopped(
    buffer: &BoundedBuffer<Item>,
    mut item: Item,
    stop: &CancellationToken,
    poll: Duration,
) -> bool {
    loop {
        match buffer.insert_timeout(item, poll) {
            Ok(()) => return true,
            Err(returned) => {
                if stop.is_cancelled() {
                    return false;
                }
                item = returned;
            }
        }
    }
}

fn remove_until_stopped(
    buffer: &BoundedBuffer<Item>,
    stop: &CancellationToken,
    poll: Duration,
) -> Option<Item> {
    loop {
        if let Some(item) = buffer.remove_timeout(poll) {
            return Some(item);
        }
        if stop.is_cancelled() {
            return None;
        }
    }
}
