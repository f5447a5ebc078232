//! Owner-thread store workload.

use anyhow::{Context, Result};
use custody::{CounterSnapshot, OwnedStateStore, replay};
use custody_config::CustodyConfig;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct OwnedReport {
    /// Operations the workload threads completed.
    completed: CounterSnapshot,
    /// Requests the owner thread served.
    served: CounterSnapshot,
    elapsed_ms: u64,
    journal: Option<JournalSummary>,
}

#[derive(Debug, Serialize)]
struct JournalSummary {
    retained: usize,
    evicted: u64,
    /// Keys written by the retained entries.
    keys: usize,
}

pub fn run(config: &CustodyConfig, json: bool) -> Result<()> {
    let mut store =
        OwnedStateStore::start(config.store_config()).context("Failed to start store owner")?;

    let workload = config.workload();
    let run = workload
        .run(&store.handle())
        .context("Workload against owned store failed")?;

    let journal = store.journal().map(|journal| {
        let entries = journal.drain();
        JournalSummary {
            retained: entries.len(),
            evicted: journal.evicted(),
            keys: replay(&entries).len(),
        }
    });
    let served = store.counters().snapshot();
    store.shutdown();

    let report = OwnedReport {
        completed: run.completed,
        served,
        elapsed_ms: run.elapsed.as_millis() as u64,
        journal,
    };

    if json {
        return super::print_json(&report);
    }

    println!("Owned Store");
    println!("-----------");
    println!(
        "Threads:   {} readers, {} writers",
        workload.readers, workload.writers
    );
    println!("Elapsed:   {} ms", report.elapsed_ms);
    println!("Completed: {}", report.completed);
    println!("Served:    {}", report.served);
    if let Some(journal) = &report.journal {
        println!(
            "Journal:   {} retained, {} evicted, {} keys written",
            journal.retained, journal.evicted, journal.keys
        );
    }

    Ok(())
}
