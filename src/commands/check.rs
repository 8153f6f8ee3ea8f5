// src/commands/check.rs

//! Check command - evaluate requirements without building

use super::{load_validated, resolve_platform};
use anyhow::{Context, Result};
use kettle::{Kitchen, KitchenConfig, Platform};
use std::path::PathBuf;

/// Evaluate the requirements that apply on the target platform
pub fn cmd_check(
    formula: &str,
    mut config: KitchenConfig,
    platform: Option<Platform>,
    host_prefix: Option<PathBuf>,
) -> Result<()> {
    let formula = load_validated(formula)?;
    let platform = resolve_platform(platform)?;
    if let Some(host_prefix) = host_prefix {
        config.host_prefix = host_prefix;
    }

    let kitchen = Kitchen::new(config)?;
    let report = kitchen
        .check(&formula, platform)
        .with_context(|| format!("Requirements not met for {} on {}", formula.full_name(), platform))?;

    if report.outcomes.is_empty() {
        println!("[OK] No requirements apply on {}", platform);
        return Ok(());
    }

    for outcome in &report.outcomes {
        if outcome.satisfied {
            println!("[OK] {}", outcome.name);
        } else {
            println!(
                "[WARN] {}: {}",
                outcome.name,
                outcome.message.as_deref().unwrap_or("not satisfied")
            );
        }
    }

    if !report.env.is_empty() {
        println!("\nEnvironment contributed:");
        for (key, value) in report.env.iter() {
            println!("  {}={}", key, value);
        }
    }

    Ok(())
}
