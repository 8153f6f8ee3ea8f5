// src/commands/mod.rs
//! Command handlers for the kettle CLI

mod brew;
mod caveats;
mod check;
mod info;
mod plan;
mod smoke;

pub use brew::{cmd_brew, BrewOptions};
pub use caveats::cmd_caveats;
pub use check::cmd_check;
pub use info::cmd_info;
pub use plan::cmd_plan;
pub use smoke::cmd_test;

use crate::cli::TargetArgs;
use anyhow::{anyhow, Context, Result};
use kettle::formula::validate_formula;
use kettle::{load_formula, BrewRequest, Formula, KitchenConfig, Platform};
use std::path::Path;
use tracing::debug;

/// Load the kitchen configuration, falling back to defaults
pub fn load_config(path: Option<&Path>) -> Result<KitchenConfig> {
    match path {
        Some(path) => {
            debug!("Loading config from {}", path.display());
            KitchenConfig::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))
        }
        None => Ok(KitchenConfig::default()),
    }
}

/// Load and validate a formula, printing validation warnings
pub fn load_validated(name_or_path: &str) -> Result<Formula> {
    let formula = load_formula(name_or_path)
        .with_context(|| format!("Failed to load formula: {}", name_or_path))?;
    let warnings = validate_formula(&formula).with_context(|| "Formula validation failed")?;
    for warning in &warnings {
        println!("Warning: {}", warning);
    }
    Ok(formula)
}

/// The requested platform, or the running host's
pub fn resolve_platform(platform: Option<Platform>) -> Result<Platform> {
    platform
        .or_else(Platform::current)
        .ok_or_else(|| anyhow!("Unsupported host OS '{}'; pass --platform", std::env::consts::OS))
}

/// Apply target flags on top of the config and build the request
pub fn build_request(config: &mut KitchenConfig, target: &TargetArgs) -> Result<BrewRequest> {
    if let Some(prefix) = &target.prefix {
        config.prefix = prefix.clone();
    }
    if let Some(opt_root) = &target.opt_root {
        config.opt_root = Some(opt_root.clone());
    }
    if let Some(host_prefix) = &target.host_prefix {
        config.host_prefix = host_prefix.clone();
    }
    let platform = resolve_platform(target.platform)?;
    Ok(config.request(platform))
}
