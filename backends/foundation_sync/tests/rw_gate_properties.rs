//! Multi-threaded properties of `ReadersWriterGate`.

use foundation_sync::{
    MemoryCell, ReadersWriterGate, ResourceError, ResourceResult, SharedResource, StatsCounter,
};
use serial_test::serial;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

/// Resource that records how many readers and writers are inside it at once.
#[derive(Default)]
struct Tracked {
    readers_inside: AtomicUsize,
    writers_inside: AtomicUsize,
    violations: AtomicUsize,
    peak_readers: AtomicUsize,
    value: u64,
}

impl Tracked {
    fn enter_read(&self) {
        let readers = self.readers_inside.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_readers.fetch_max(readers, Ordering::SeqCst);
        if self.writers_inside.load(Ordering::SeqCst) != 0 {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn exit_read(&self) {
        self.readers_inside.fetch_sub(1, Ordering::SeqCst);
    }

    fn enter_write(&self) {
        let writers = self.writers_inside.fetch_add(1, Ordering::SeqCst) + 1;
        if writers != 1 || self.readers_inside.load(Ordering::SeqCst) != 0 {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn exit_write(&self) {
        self.writers_inside.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SharedResource for Tracked {
    type Content = u64;

    fn read(&self) -> ResourceResult<u64> {
        self.enter_read();
        thread::sleep(Duration::from_micros(200));
        let value = self.value;
        self.exit_read();
        Ok(value)
    }

    fn write(&mut self, content: u64) -> ResourceResult<()> {
        self.enter_write();
        thread::sleep(Duration::from_micros(200));
        self.value = content;
        self.exit_write();
        Ok(())
    }
}

#[test]
#[ntest::timeout(30000)]
fn readers_and_writers_never_overlap() {
    let gate = Arc::new(ReadersWriterGate::new(Tracked::default()));
    let reads = Arc::new(StatsCounter::new());
    let writes = Arc::new(StatsCounter::new());

    let mut handles = Vec::new();
    for _ in 0..6 {
        let gate = Arc::clone(&gate);
        let reads = Arc::clone(&reads);
        handles.push(thread::spawn(move || {
            for _ in 0..100 {
                gate.read().unwrap();
                reads.increment();
            }
        }));
    }
    for writer in 0..3u64 {
        let gate = Arc::clone(&gate);
        let writes = Arc::clone(&writes);
        handles.push(thread::spawn(move || {
            for iteration in 0..50u64 {
                gate.write(writer * 1000 + iteration).unwrap();
                writes.increment();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(reads.get(), 600);
    assert_eq!(writes.get(), 150);
    assert_eq!(gate.active_readers(), 0);
    assert!(!gate.is_held());

    let tracked = Arc::try_unwrap(gate).ok().unwrap().into_inner();
    assert_eq!(tracked.violations.load(Ordering::SeqCst), 0);
}

#[test]
#[serial]
#[ntest::timeout(10000)]
fn readers_share_the_gate() {
    let readers = 4;
    let gate = Arc::new(ReadersWriterGate::new(Tracked::default()));
    let all_inside = Arc::new(Barrier::new(readers));

    let handles: Vec<_> = (0..readers)
        .map(|_| {
            let gate = Arc::clone(&gate);
            let all_inside = Arc::clone(&all_inside);
            thread::spawn(move || {
                let section = gate.begin_read();
                // nobody leaves until every reader has entered
                all_inside.wait();
                section.read().unwrap()
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(gate.peak_readers(), readers);
    assert_eq!(gate.active_readers(), 0);
}

#[test]
#[serial]
#[ntest::timeout(10000)]
fn overlapping_readers_starve_a_waiting_writer() {
    let gate = Arc::new(ReadersWriterGate::new(MemoryCell::new(0u32)));
    let first = gate.begin_read();

    let written = Arc::new(AtomicBool::new(false));
    let writer = {
        let gate = Arc::clone(&gate);
        let written = Arc::clone(&written);
        thread::spawn(move || {
            gate.write(1).unwrap();
            written.store(true, Ordering::SeqCst);
        })
    };

    // Hand the read over from one reader to the next without the count ever
    // reaching zero; the writer keeps waiting the whole time.
    let mut current = first;
    for _ in 0..5 {
        thread::sleep(Duration::from_millis(20));
        let next = gate.begin_read();
        drop(current);
        current = next;
        assert!(!written.load(Ordering::SeqCst));
        assert_eq!(*current.get(), 0);
    }

    drop(current);
    writer.join().unwrap();
    assert!(written.load(Ordering::SeqCst));
    assert_eq!(gate.read().unwrap(), 1);
}

struct Flaky {
    calls: usize,
    value: String,
}

impl SharedResource for Flaky {
    type Content = String;

    fn read(&self) -> ResourceResult<String> {
        if self.value.is_empty() {
            return Err(ResourceError::custom("nothing written yet"));
        }
        Ok(self.value.clone())
    }

    fn write(&mut self, content: String) -> ResourceResult<()> {
        self.calls += 1;
        if self.calls % 2 == 0 {
            return Err(std::io::Error::other("disk full").into());
        }
        self.value = content;
        Ok(())
    }
}

#[test]
#[ntest::timeout(10000)]
fn resource_failures_do_not_leak_the_gate() {
    let gate = Arc::new(ReadersWriterGate::new(Flaky {
        calls: 0,
        value: String::new(),
    }));
    assert!(gate.read().is_err());

    let failures = Arc::new(StatsCounter::new());
    let handles: Vec<_> = (0..4)
        .map(|writer| {
            let gate = Arc::clone(&gate);
            let failures = Arc::clone(&failures);
            thread::spawn(move || {
                for iteration in 0..10 {
                    if gate.write(format!("{writer}:{iteration}")).is_err() {
                        failures.increment();
                    }
                    let _ = gate.read();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(failures.get(), 20);
    assert_eq!(gate.active_readers(), 0);
    assert!(!gate.is_held());
    assert!(gate.read().is_ok());
}

#[test]
#[ntest::timeout(20000)]
fn example_scenario_four_readers_two_writers() {
    let gate = Arc::new(ReadersWriterGate::new(MemoryCell::new(String::from("init"))));
    let total_reads = Arc::new(StatsCounter::new());
    let total_writes = Arc::new(StatsCounter::new());

    let mut handles = Vec::new();
    for _ in 0..4 {
        let gate = Arc::clone(&gate);
        let reads = Arc::clone(&total_reads);
        handles.push(thread::spawn(move || {
            for _ in 0..3 {
                let content = gate.read().unwrap();
                assert!(content == "init" || content.starts_with("Message #"));
                reads.increment();
                thread::sleep(Duration::from_millis(2));
            }
        }));
    }
    for writer in 0..2 {
        let gate = Arc::clone(&gate);
        let writes = Arc::clone(&total_writes);
        handles.push(thread::spawn(move || {
            for iteration in 0..3 {
                gate.write(format!("Message #{} from Writer {writer}", iteration + 1))
                    .unwrap();
                writes.increment();
                thread::sleep(Duration::from_millis(3));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(total_reads.get(), 12);
    assert_eq!(total_writes.get(), 6);

    let payloads: Vec<String> = (0..2)
        .flat_map(|writer| (1..=3).map(move |n| format!("Message #{n} from Writer {writer}")))
        .collect();
    let final_content = gate.read().unwrap();
    assert!(payloads.contains(&final_content));
}
