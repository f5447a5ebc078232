//! Quorum vote command.

use anyhow::{Context, Result, ensure};
use custody::hold_vote;
use custody_config::CustodyConfig;
use rand::Rng;

pub fn run(config: &CustodyConfig, probability: f64, json: bool) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&probability),
        "probability must be within 0.0..=1.0, got {probability}"
    );

    let voters = config.quorum.voters;
    let threshold = config.quorum.threshold;

    let decision = hold_vote(voters, threshold, |_| {
        rand::thread_rng().gen_bool(probability)
    })
    .context("Vote failed")?;

    if json {
        return super::print_json(&decision);
    }

    println!("Vote");
    println!("----");
    println!("Voters:    {voters}");
    println!("Threshold: {threshold}");
    println!(
        "Tally:     {} positive, {} negative, {} reported",
        decision.tally.positive,
        decision.tally.negative(),
        decision.tally.total
    );
    println!("Result:    {}", decision.verdict);

    Ok(())
}
