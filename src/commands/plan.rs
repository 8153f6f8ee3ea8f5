// src/commands/plan.rs

//! Plan command - dry run

use super::{build_request, load_validated};
use crate::cli::TargetArgs;
use anyhow::{Context, Result};
use kettle::{Kitchen, KitchenConfig};

/// Print the assembled plan as text or JSON
pub fn cmd_plan(formula: &str, mut config: KitchenConfig, target: &TargetArgs, json: bool) -> Result<()> {
    let formula = load_validated(formula)?;
    let request = build_request(&mut config, target)?;

    let kitchen = Kitchen::new(config)?;
    let plan = kitchen
        .plan(&formula, &request)
        .with_context(|| format!("Failed to plan {}", formula.full_name()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", plan.render());
    }
    Ok(())
}
