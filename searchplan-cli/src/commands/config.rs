//! Config command implementation - print or write the example configuration

use anyhow::{anyhow, Result};
use std::path::PathBuf;

use crate::config::Config;

pub fn execute(example: bool, output: Option<PathBuf>) -> Result<()> {
    match (example, output) {
        (_, Some(path)) => {
            Config::default().save_to_file(&path)?;
            log::info!("Wrote example configuration to {}", path.display());
        }
        (true, None) => print!("{}", Config::example_toml()?),
        (false, None) => {
            return Err(anyhow!("Nothing to do; pass --example or --output <file>"));
        }
    }
    Ok(())
}
