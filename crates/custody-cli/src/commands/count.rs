//! Atomic counter command.

use std::thread;
use std::time::Instant;

use anyhow::{Context, Result, ensure};
use custody::{Counter, OperationCounters};
use custody_config::CustodyConfig;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct CountReport {
    threads: usize,
    increments: u64,
    total: u64,
    elapsed_ms: u64,
}

/// Total the counter must reach, rejected up front if it cannot fit in a
/// `u64`.
fn expected_total(threads: usize, increments: u64) -> Result<u64> {
    u64::try_from(threads)
        .ok()
        .and_then(|threads| threads.checked_mul(increments))
        .with_context(|| format!("{threads} threads x {increments} increments overflows u64"))
}

pub fn run(config: &CustodyConfig, json: bool) -> Result<()> {
    let threads = config.counting.threads;
    let increments = config.counting.increments;
    let expected = expected_total(threads, increments)?;
    let counters = OperationCounters::new();

    let start = Instant::now();
    thread::scope(|s| {
        for _ in 0..threads {
            s.spawn(|| {
                for _ in 0..increments {
                    counters.increment(Counter::Ops);
                }
            });
        }
    });

    let total = counters.load(Counter::Ops);
    ensure!(total == expected, "lost increments: counted {total}, expected {expected}");

    let report = CountReport {
        threads,
        increments,
        total,
        elapsed_ms: start.elapsed().as_millis() as u64,
    };

    if json {
        return super::print_json(&report);
    }

    println!("Counter");
    println!("-------");
    println!("Threads:    {threads}");
    println!("Increments: {increments} per thread");
    println!("Total:      {total}");
    println!("Elapsed:    {} ms", report.elapsed_ms);

    Ok(())
}
