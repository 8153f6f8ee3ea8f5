// src/commands/smoke.rs

//! Test command - run a formula's smoke test

use super::load_validated;
use anyhow::{Context, Result};
use kettle::{Kitchen, KitchenConfig};
use std::path::PathBuf;

/// Run the formula's test command against an installed prefix
pub fn cmd_test(formula: &str, config: KitchenConfig, prefix: Option<PathBuf>) -> Result<()> {
    let formula = load_validated(formula)?;
    let prefix = prefix.unwrap_or_else(|| config.prefix.clone());

    let kitchen = Kitchen::new(config)?;
    let output = kitchen
        .test(&formula, &prefix)
        .with_context(|| format!("Smoke test failed for {}", formula.full_name()))?;

    let combined = output.combined();
    if !combined.trim().is_empty() {
        println!("{}", combined.trim_end());
    }
    println!("[OK] {} passed its smoke test", formula.full_name());
    Ok(())
}
