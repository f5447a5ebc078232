//! Configuration display command.

use anyhow::{Result, bail};
use custody_config::CustodyConfig;

/// Show the effective configuration.
pub fn show(config: &CustodyConfig, format: &str) -> Result<()> {
    match format {
        "json" => super::print_json(config),
        "toml" => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        other => bail!("Unknown format '{other}' (expected toml or json)"),
    }
}
