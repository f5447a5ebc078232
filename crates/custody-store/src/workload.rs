//! Randomized reader/writer load against any [`KeyValueStore`].
//!
//! Spawns `readers + writers` scoped threads. Each one loops on random keys
//! until the run's duration has elapsed, pausing between operations, and
//! counts what it completed in a shared [`OperationCounters`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use custody_counters::{Counter, CounterSnapshot, OperationCounters};
use rand::Rng;
use tracing::debug;

use crate::KeyValueStore;
use crate::error::StoreResult;

/// Shape of a load run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    /// Number of reader threads.
    pub readers: usize,
    /// Number of writer threads.
    pub writers: usize,
    /// Keys are drawn from `0..key_space`.
    pub key_space: i64,
    /// Values are drawn from `0..max_value`.
    pub max_value: i64,
    /// How long the run lasts.
    pub duration: Duration,
    /// Sleep between two operations of the same thread.
    pub pause: Duration,
}

impl Default for Workload {
    fn default() -> Self {
        Self {
            readers: 100,
            writers: 10,
            key_space: 5,
            max_value: 100,
            duration: Duration::from_secs(1),
            pause: Duration::from_millis(1),
        }
    }
}

/// Totals from a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadReport {
    /// Operations completed by the workload threads.
    pub completed: CounterSnapshot,
    /// Wall-clock time from start until every thread had stopped.
    pub elapsed: Duration,
}

impl Workload {
    /// Runs the workload against `store` and waits for every thread.
    ///
    /// Returns the first error any thread hit; a thread stops at its first
    /// error, the others run to the deadline.
    ///
    /// # Panics
    ///
    /// Panics if `key_space` or `max_value` is not positive, or if a worker
    /// thread panics.
    pub fn run<S>(&self, store: &S) -> StoreResult<WorkloadReport>
    where
        S: KeyValueStore + ?Sized,
    {
        assert!(self.key_space > 0, "key_space must be positive");
        assert!(self.max_value > 0, "max_value must be positive");

        let counters = OperationCounters::new();
        let stop = AtomicBool::new(false);
        let started = Instant::now();

        debug!(
            readers = self.readers,
            writers = self.writers,
            duration_ms = self.duration.as_millis() as u64,
            "workload started"
        );

        let results: Vec<StoreResult<()>> = thread::scope(|s| {
            let mut workers = Vec::with_capacity(self.readers + self.writers);

            for _ in 0..self.readers {
                workers.push(s.spawn(|| {
                    self.drive(&stop, |rng| {
                        store.get(rng.gen_range(0..self.key_space))?;
                        counters.increment(Counter::Reads);
                        Ok(())
                    })
                }));
            }

            for _ in 0..self.writers {
                workers.push(s.spawn(|| {
                    self.drive(&stop, |rng| {
                        let key = rng.gen_range(0..self.key_space);
                        let value = rng.gen_range(0..self.max_value);
                        store.put(key, value)?;
                        counters.increment(Counter::Writes);
                        Ok(())
                    })
                }));
            }

            thread::sleep(self.duration);
            stop.store(true, Ordering::Relaxed);

            workers
                .into_iter()
                .map(|worker| {
                    worker
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        });

        let report = WorkloadReport {
            completed: counters.snapshot(),
            elapsed: started.elapsed(),
        };
        debug!(completed = %report.completed, "workload finished");

        results.into_iter().collect::<StoreResult<()>>()?;
        Ok(report)
    }

    fn drive(
        &self,
        stop: &AtomicBool,
        mut op: impl FnMut(&mut rand::rngs::ThreadRng) -> StoreResult<()>,
    ) -> StoreResult<()> {
        let mut rng = rand::thread_rng();
        while !stop.load(Ordering::Relaxed) {
            op(&mut rng)?;
            if !self.pause.is_zero() {
                thread::sleep(self.pause);
            }
        }
        Ok(())
    }
}
