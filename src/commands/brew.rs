// src/commands/brew.rs

//! Brew command - fetch, patch, build, install

use super::build_request;
use crate::cli::TargetArgs;
use anyhow::{Context, Result};
use kettle::{load_formula, Kitchen, KitchenConfig};
use std::path::PathBuf;
use tracing::info;

/// Options for the brew command beyond the target
#[derive(Debug, Default)]
pub struct BrewOptions {
    pub source_cache: Option<PathBuf>,
    pub jobs: Option<u32>,
    pub keep_builddir: bool,
    pub fetch_only: bool,
}

/// Brew a formula into the requested prefix
pub fn cmd_brew(
    formula: &str,
    mut config: KitchenConfig,
    target: &TargetArgs,
    options: BrewOptions,
) -> Result<()> {
    // Validation warnings come back with the brew result
    let formula =
        load_formula(formula).with_context(|| format!("Failed to load formula: {}", formula))?;

    if let Some(source_cache) = options.source_cache {
        config.source_cache = source_cache;
    }
    if let Some(jobs) = options.jobs {
        config.jobs = jobs;
    }
    config.keep_builddir |= options.keep_builddir;

    let request = build_request(&mut config, target)?;
    let kitchen = Kitchen::new(config)?;

    if options.fetch_only {
        let fetched = kitchen
            .fetch(&formula)
            .with_context(|| format!("Failed to fetch {}", formula.full_name()))?;
        for path in &fetched {
            println!("  {}", path.display());
        }
        println!("[COMPLETE] Fetched {} file(s)", fetched.len());
        return Ok(());
    }

    println!(
        "Brewing {} for {} into {}",
        formula.full_name(),
        request.platform,
        request.prefix.display()
    );

    let result = kitchen
        .brew(&formula, &request)
        .with_context(|| format!("Failed to brew {}", formula.full_name()))?;
    info!("Build log is {} bytes", result.log.len());

    println!("[COMPLETE] {} installed to {}", formula.full_name(), request.prefix.display());
    for dir in &result.staged {
        println!("  Staged: {}", dir.display());
    }
    for link in &result.linked {
        println!("  Linked: {}", link.display());
    }
    if let Some(build_dir) = &result.build_dir {
        println!("  Build directory kept at {}", build_dir.display());
    }
    for warning in &result.warnings {
        println!("Warning: {}", warning);
    }

    println!();
    println!("{}", result.advisory);
    Ok(())
}
