//! Scenario configuration.
//!
//! Defaults reproduce the classic lab setup: a 5-slot buffer fed by 3
//! producers and drained by 2 consumers, and 4 readers racing 2 writers over
//! a single cell. Every field can be overridden with the builder methods or
//! from a TOML file:
//!
//! ```toml
//! [buffer]
//! capacity = 8
//! producers = 4
//! producer_jitter = { min_ms = 0, max_ms = 50 }
//!
//! [gate]
//! readers = 6
//! initial = "hello"
//! ```

use core::time::Duration;
use std::path::Path;

use foundation_sync::{ConfigurationError, ConfigurationResult};
use serde::Deserialize;

use crate::errors::{PoolError, PoolResult};
use crate::jitter::Jitter;

const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Configuration for the producer/consumer scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BufferScenarioConfig {
    /// Buffer slots
    capacity: usize,
    /// Number of producer threads
    producers: usize,
    /// Number of consumer threads
    consumers: usize,
    /// Items each producer inserts
    items_per_producer: usize,
    /// Item values are drawn from `1..=max_item_value`
    max_item_value: u32,
    producer_jitter: Jitter,
    consumer_jitter: Jitter,
    /// How often a blocked worker re-checks the stop signal
    poll_interval_ms: u64,
    /// Optional wall-clock limit after which workers are asked to stop
    deadline_ms: Option<u64>,
    seed: Option<u64>,
}

impl BufferScenarioConfig {
    /// Creates a configuration with the default values.
    ///
    /// Defaults:
    /// - `capacity`: 5
    /// - `producers`: 3, `consumers`: 2, `items_per_producer`: 4
    /// - `max_item_value`: 100
    /// - `producer_jitter`: 0–500 ms, `consumer_jitter`: 0–800 ms
    /// - no deadline, random seed
    #[must_use]
    pub const fn new() -> Self {
        Self {
            capacity: 5,
            producers: 3,
            consumers: 2,
            items_per_producer: 4,
            max_item_value: 100,
            producer_jitter: Jitter::new(0, 500),
            consumer_jitter: Jitter::new(0, 800),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            deadline_ms: None,
            seed: None,
        }
    }

    #[must_use]
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use]
    pub const fn producers(mut self, count: usize) -> Self {
        self.producers = count;
        self
    }

    #[must_use]
    pub const fn consumers(mut self, count: usize) -> Self {
        self.consumers = count;
        self
    }

    #[must_use]
    pub const fn items_per_producer(mut self, count: usize) -> Self {
        self.items_per_producer = count;
        self
    }

    #[must_use]
    pub const fn max_item_value(mut self, value: u32) -> Self {
        self.max_item_value = value;
        self
    }

    #[must_use]
    pub const fn producer_jitter(mut self, jitter: Jitter) -> Self {
        self.producer_jitter = jitter;
        self
    }

    #[must_use]
    pub const fn consumer_jitter(mut self, jitter: Jitter) -> Self {
        self.consumer_jitter = jitter;
        self
    }

    #[must_use]
    pub const fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Sets the wall-clock limit; when it passes, workers stop early.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline_ms = Some(deadline.as_millis() as u64);
        self
    }

    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub const fn get_capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn get_producers(&self) -> usize {
        self.producers
    }

    #[must_use]
    pub const fn get_consumers(&self) -> usize {
        self.consumers
    }

    #[must_use]
    pub const fn get_items_per_producer(&self) -> usize {
        self.items_per_producer
    }

    #[must_use]
    pub const fn get_max_item_value(&self) -> u32 {
        self.max_item_value
    }

    #[must_use]
    pub const fn get_producer_jitter(&self) -> Jitter {
        self.producer_jitter
    }

    #[must_use]
    pub const fn get_consumer_jitter(&self) -> Jitter {
        self.consumer_jitter
    }

    /// Never zero, so a blocked worker always wakes up eventually.
    #[must_use]
    pub const fn get_poll_interval(&self) -> Duration {
        if self.poll_interval_ms == 0 {
            Duration::from_millis(1)
        } else {
            Duration::from_millis(self.poll_interval_ms)
        }
    }

    #[must_use]
    pub const fn get_deadline(&self) -> Option<Duration> {
        match self.deadline_ms {
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        }
    }

    #[must_use]
    pub const fn get_seed(&self) -> Option<u64> {
        self.seed
    }

    /// Total number of items the producers will insert.
    #[must_use]
    pub const fn expected_items(&self) -> usize {
        self.producers * self.items_per_producer
    }

    /// # Errors
    ///
    /// Returns the first invalid parameter found.
    pub fn validate(&self) -> ConfigurationResult<()> {
        if self.capacity == 0 {
            return Err(ConfigurationError::ZeroCapacity);
        }
        if self.producers == 0 {
            return Err(ConfigurationError::ZeroWorkers { role: "producer" });
        }
        if self.consumers == 0 {
            return Err(ConfigurationError::ZeroWorkers { role: "consumer" });
        }
        if self.max_item_value == 0 {
            return Err(ConfigurationError::InvalidItemRange {
                max_value: self.max_item_value,
            });
        }
        self.producer_jitter.validate()?;
        self.consumer_jitter.validate()
    }
}

impl Default for BufferScenarioConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the readers/writers scenario.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GateScenarioConfig {
    readers: usize,
    writers: usize,
    /// Operations per reader and per writer
    iterations: usize,
    /// Starting content of the shared cell
    initial: String,
    /// Pause before each read / write
    read_jitter: Jitter,
    write_jitter: Jitter,
    /// Extra time spent inside the read / write section
    read_hold: Jitter,
    write_hold: Jitter,
    /// Pause after each read / write
    read_pause: Jitter,
    write_pause: Jitter,
    /// Lets readers get going before the first writer starts
    writer_start_delay_ms: u64,
    deadline_ms: Option<u64>,
    seed: Option<u64>,
}

impl GateScenarioConfig {
    /// Creates a configuration with the default values.
    ///
    /// Defaults:
    /// - `readers`: 4, `writers`: 2, `iterations`: 3, `initial`: `"init"`
    /// - 100–500 ms before each operation
    /// - writers hold the gate 100–500 ms, readers do not pad their section
    /// - 0–200 ms after a read, 200–500 ms after a write
    /// - writers start 100 ms after readers
    #[must_use]
    pub fn new() -> Self {
        Self {
            readers: 4,
            writers: 2,
            iterations: 3,
            initial: String::from("init"),
            read_jitter: Jitter::new(100, 500),
            write_jitter: Jitter::new(100, 500),
            read_hold: Jitter::none(),
            write_hold: Jitter::new(100, 500),
            read_pause: Jitter::new(0, 200),
            write_pause: Jitter::new(200, 500),
            writer_start_delay_ms: 100,
            deadline_ms: None,
            seed: None,
        }
    }

    /// Same worker counts as [`GateScenarioConfig::new`] with every pause
    /// set to zero.
    #[must_use]
    pub fn without_pauses() -> Self {
        Self::new()
            .read_jitter(Jitter::none())
            .write_jitter(Jitter::none())
            .read_hold(Jitter::none())
            .write_hold(Jitter::none())
            .read_pause(Jitter::none())
            .write_pause(Jitter::none())
            .writer_start_delay(Duration::ZERO)
    }

    #[must_use]
    pub fn readers(mut self, count: usize) -> Self {
        self.readers = count;
        self
    }

    #[must_use]
    pub fn writers(mut self, count: usize) -> Self {
        self.writers = count;
        self
    }

    #[must_use]
    pub fn iterations(mut self, count: usize) -> Self {
        self.iterations = count;
        self
    }

    #[must_use]
    pub fn initial(mut self, content: impl Into<String>) -> Self {
        self.initial = content.into();
        self
    }

    #[must_use]
    pub fn read_jitter(mut self, jitter: Jitter) -> Self {
        self.read_jitter = jitter;
        self
    }

    #[must_use]
    pub fn write_jitter(mut self, jitter: Jitter) -> Self {
        self.write_jitter = jitter;
        self
    }

    #[must_use]
    pub fn read_hold(mut self, jitter: Jitter) -> Self {
        self.read_hold = jitter;
        self
    }

    #[must_use]
    pub fn write_hold(mut self, jitter: Jitter) -> Self {
        self.write_hold = jitter;
        self
    }

    #[must_use]
    pub fn read_pause(mut self, jitter: Jitter) -> Self {
        self.read_pause = jitter;
        self
    }

    #[must_use]
    pub fn write_pause(mut self, jitter: Jitter) -> Self {
        self.write_pause = jitter;
        self
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn writer_start_delay(mut self, delay: Duration) -> Self {
        self.writer_start_delay_ms = delay.as_millis() as u64;
        self
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline_ms = Some(deadline.as_millis() as u64);
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub const fn get_readers(&self) -> usize {
        self.readers
    }

    #[must_use]
    pub const fn get_writers(&self) -> usize {
        self.writers
    }

    #[must_use]
    pub const fn get_iterations(&self) -> usize {
        self.iterations
    }

    #[must_use]
    pub fn get_initial(&self) -> &str {
        &self.initial
    }

    #[must_use]
    pub const fn get_read_jitter(&self) -> Jitter {
        self.read_jitter
    }

    #[must_use]
    pub const fn get_write_jitter(&self) -> Jitter {
        self.write_jitter
    }

    #[must_use]
    pub const fn get_read_hold(&self) -> Jitter {
        self.read_hold
    }

    #[must_use]
    pub const fn get_write_hold(&self) -> Jitter {
        self.write_hold
    }

    #[must_use]
    pub const fn get_read_pause(&self) -> Jitter {
        self.read_pause
    }

    #[must_use]
    pub const fn get_write_pause(&self) -> Jitter {
        self.write_pause
    }

    #[must_use]
    pub const fn get_writer_start_delay(&self) -> Duration {
        Duration::from_millis(self.writer_start_delay_ms)
    }

    #[must_use]
    pub const fn get_deadline(&self) -> Option<Duration> {
        match self.deadline_ms {
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        }
    }

    #[must_use]
    pub const fn get_seed(&self) -> Option<u64> {
        self.seed
    }

    #[must_use]
    pub const fn expected_reads(&self) -> usize {
        self.readers * self.iterations
    }

    #[must_use]
    pub const fn expected_writes(&self) -> usize {
        self.writers * self.iterations
    }

    /// # Errors
    ///
    /// Returns the first invalid parameter found.
    pub fn validate(&self) -> ConfigurationResult<()> {
        if self.readers == 0 && self.writers == 0 {
            return Err(ConfigurationError::ZeroWorkers {
                role: "reader or writer",
            });
        }
        for jitter in [
            self.read_jitter,
            self.write_jitter,
            self.read_hold,
            self.write_hold,
            self.read_pause,
            self.write_pause,
        ] {
            jitter.validate()?;
        }
        Ok(())
    }
}

impl Default for GateScenarioConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Both scenario configurations, as read from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SynclabConfig {
    pub buffer: BufferScenarioConfig,
    pub gate: GateScenarioConfig,
}

impl SynclabConfig {
    /// # Errors
    ///
    /// Returns [`PoolError::ConfigParse`] when the document is not valid TOML
    /// or does not match the expected tables.
    pub fn from_toml_str(content: &str) -> PoolResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// # Errors
    ///
    /// Returns [`PoolError::ConfigRead`] when the file cannot be read and
    /// [`PoolError::ConfigParse`] when its content is invalid.
    pub fn load(path: impl AsRef<Path>) -> PoolResult<Self> {
        let content = std::fs::read_to_string(path).map_err(PoolError::ConfigRead)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_defaults_match_lab_setup() {
        let config = BufferScenarioConfig::default();
        assert_eq!(config.get_capacity(), 5);
        assert_eq!(config.get_producers(), 3);
        assert_eq!(config.get_consumers(), 2);
        assert_eq!(config.get_items_per_producer(), 4);
        assert_eq!(config.expected_items(), 12);
        assert_eq!(config.get_producer_jitter(), Jitter::new(0, 500));
        assert_eq!(config.get_consumer_jitter(), Jitter::new(0, 800));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn gate_defaults_match_lab_setup() {
        let config = GateScenarioConfig::default();
        assert_eq!(config.get_readers(), 4);
        assert_eq!(config.get_writers(), 2);
        assert_eq!(config.get_iterations(), 3);
        assert_eq!(config.get_initial(), "init");
        assert_eq!(config.expected_reads(), 12);
        assert_eq!(config.expected_writes(), 6);
        assert_eq!(config.get_writer_start_delay(), Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_buffer_configs_are_rejected() {
        assert_eq!(
            BufferScenarioConfig::new().capacity(0).validate(),
            Err(ConfigurationError::ZeroCapacity)
        );
        assert_eq!(
            BufferScenarioConfig::new().consumers(0).validate(),
            Err(ConfigurationError::ZeroWorkers { role: "consumer" })
        );
        assert_eq!(
            BufferScenarioConfig::new()
                .producer_jitter(Jitter::new(9, 1))
                .validate(),
            Err(ConfigurationError::InvalidJitter { min_ms: 9, max_ms: 1 })
        );
    }

    #[test]
    fn gate_needs_at_least_one_worker() {
        assert!(GateScenarioConfig::new().readers(0).validate().is_ok());
        assert!(GateScenarioConfig::new()
            .readers(0)
            .writers(0)
            .validate()
            .is_err());
    }

    #[test]
    fn zero_poll_interval_is_clamped() {
        let config = BufferScenarioConfig::new().poll_interval_ms(0);
        assert_eq!(config.get_poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn toml_overrides_only_given_fields() {
        let config = SynclabConfig::from_toml_str(
            r#"
            [buffer]
            capacity = 8
            producer_jitter = { min_ms = 1, max_ms = 2 }
            seed = 99

            [gate]
            readers = 6
            initial = "hello"
            "#,
        )
        .unwrap();

        assert_eq!(config.buffer.get_capacity(), 8);
        assert_eq!(config.buffer.get_producers(), 3);
        assert_eq!(config.buffer.get_producer_jitter(), Jitter::new(1, 2));
        assert_eq!(config.buffer.get_seed(), Some(99));
        assert_eq!(config.gate.get_readers(), 6);
        assert_eq!(config.gate.get_writers(), 2);
        assert_eq!(config.gate.get_initial(), "hello");
    }

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(
            SynclabConfig::from_toml_str("").unwrap(),
            SynclabConfig::default()
        );
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = SynclabConfig::from_toml_str("[buffer\ncapacity = ").unwrap_err();
        assert!(matches!(err, PoolError::ConfigParse(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = SynclabConfig::load("/definitely/not/here/synclab.toml").unwrap_err();
        assert!(matches!(err, PoolError::ConfigRead(_)));
    }
}
