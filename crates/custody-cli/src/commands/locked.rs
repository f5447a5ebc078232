//! Mutex-guarded store workload.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use custody::{CounterSnapshot, LockedStateStore};
use custody_config::CustodyConfig;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct LockedReport {
    completed: CounterSnapshot,
    elapsed_ms: u64,
    /// Map contents after every thread stopped.
    state: BTreeMap<i64, i64>,
}

pub fn run(config: &CustodyConfig, json: bool) -> Result<()> {
    let store = LockedStateStore::new();

    let workload = config.workload();
    let run = workload
        .run(&store)
        .context("Workload against locked store failed")?;

    let report = LockedReport {
        completed: run.completed,
        elapsed_ms: run.elapsed.as_millis() as u64,
        state: store.snapshot(),
    };

    if json {
        return super::print_json(&report);
    }

    println!("Locked Store");
    println!("------------");
    println!(
        "Threads:   {} readers, {} writers",
        workload.readers, workload.writers
    );
    println!("Elapsed:   {} ms", report.elapsed_ms);
    println!("Completed: {}", report.completed);
    println!("Final state:");
    for (key, value) in &report.state {
        println!("  {key:>4} = {value}");
    }

    Ok(())
}
