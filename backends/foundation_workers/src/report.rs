//! Scenario run reports.

use core::time::Duration;
use std::fmt;

use foundation_sync::BufferSnapshot;

use crate::scenarios::Item;

/// Outcome of a producer/consumer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferReport {
    pub capacity: usize,
    pub produced: usize,
    pub consumed: usize,
    pub expected: usize,
    /// True when the run was stopped before the workers ran out of work.
    pub cancelled: bool,
    /// Ring state after every worker was joined.
    pub snapshot: BufferSnapshot<Item>,
    /// Every item taken out of the buffer, in completion order.
    pub consumed_items: Vec<Item>,
    pub duration: Duration,
}

impl BufferReport {
    /// Every expected item was produced and consumed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.produced == self.expected && self.consumed == self.expected
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn operations_per_second(&self) -> f64 {
        let seconds = self.duration.as_secs_f64();
        if seconds == 0.0 {
            return 0.0;
        }
        (self.produced + self.consumed) as f64 / seconds
    }

    #[must_use]
    pub fn to_string_pretty(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Bounded buffer ===\n");
        if self.cancelled {
            report.push_str("Run was cancelled before completion\n");
        }
        report.push_str(&format!("Total items produced: {}\n", self.produced));
        report.push_str(&format!("Total items consumed: {}\n", self.consumed));
        report.push_str(&format!("Expected items: {}\n", self.expected));
        report.push_str(&format!("Duration: {:?}\n", self.duration));
        report.push_str(&format!(
            "Throughput: {:.2} ops/sec\n",
            self.operations_per_second()
        ));

        report.push_str("\nBuffer status:\n");
        report.push_str(&format!(
            "  Items in buffer: {}/{}\n",
            self.snapshot.count, self.capacity
        ));
        report.push_str(&format!("  Next insert position: {}\n", self.snapshot.tail));
        report.push_str(&format!("  Next remove position: {}\n", self.snapshot.head));
        if self.snapshot.items.is_empty() {
            report.push_str("  Current buffer contents: (empty)\n");
        } else {
            let values: Vec<String> = self
                .snapshot
                .items
                .iter()
                .map(|item| item.value.to_string())
                .collect();
            report.push_str(&format!("  Current buffer contents: {}\n", values.join(" ")));
        }

        report
    }
}

impl fmt::Display for BufferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_pretty())
    }
}

/// Outcome of a readers/writers run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateReport {
    pub reads: usize,
    pub writes: usize,
    pub failed_reads: usize,
    pub failed_writes: usize,
    pub expected_reads: usize,
    pub expected_writes: usize,
    /// Most readers seen inside the gate at the same time.
    pub peak_readers: usize,
    /// Content read back after the run, `None` if that read failed.
    pub final_content: Option<String>,
    /// Every payload a writer stored successfully, in completion order.
    pub payloads: Vec<String>,
    pub cancelled: bool,
    pub duration: Duration,
}

impl GateReport {
    /// Every expected operation was attempted, failed ones included.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.reads + self.failed_reads == self.expected_reads
            && self.writes + self.failed_writes == self.expected_writes
    }

    #[must_use]
    pub fn failures(&self) -> usize {
        self.failed_reads + self.failed_writes
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn operations_per_second(&self) -> f64 {
        let seconds = self.duration.as_secs_f64();
        if seconds == 0.0 {
            return 0.0;
        }
        (self.reads + self.writes) as f64 / seconds
    }

    #[must_use]
    pub fn to_string_pretty(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Readers-writer gate ===\n");
        if self.cancelled {
            report.push_str("Run was cancelled before completion\n");
        }
        report.push_str(&format!("Total reads: {}\n", self.reads));
        report.push_str(&format!("Total writes: {}\n", self.writes));
        report.push_str(&format!("Expected reads: {}\n", self.expected_reads));
        report.push_str(&format!("Expected writes: {}\n", self.expected_writes));
        if self.failures() > 0 {
            report.push_str(&format!(
                "Failed operations: {} reads, {} writes\n",
                self.failed_reads, self.failed_writes
            ));
        }
        report.push_str(&format!("Peak concurrent readers: {}\n", self.peak_readers));
        report.push_str(&format!("Duration: {:?}\n", self.duration));
        report.push_str(&format!(
            "Throughput: {:.2} ops/sec\n",
            self.operations_per_second()
        ));

        report.push_str("\nFinal contents:\n");
        match &self.final_content {
            Some(content) => report.push_str(&format!("  {content}\n")),
            None => report.push_str("  Could not read final state\n"),
        }

        report
    }
}

impl fmt::Display for GateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_pretty())
    }
}
