// src/commands/caveats.rs

//! Caveats command - post-install instructions

use super::load_validated;
use anyhow::Result;
use kettle::{render_advisory, KitchenConfig};
use std::path::PathBuf;

pub fn cmd_caveats(formula: &str, config: &KitchenConfig, prefix: Option<PathBuf>) -> Result<()> {
    let formula = load_validated(formula)?;
    let prefix = prefix.unwrap_or_else(|| config.prefix.clone());
    println!("{}", render_advisory(&formula, &prefix));
    Ok(())
}
