// src/commands/info.rs

//! Info command - show formula metadata

use super::load_validated;
use anyhow::Result;
use kettle::formula::resolve_dependencies;
use kettle::Platform;

/// Print metadata, dependencies per platform, and disabled features
pub fn cmd_info(formula: &str) -> Result<()> {
    let formula = load_validated(formula)?;
    let package = &formula.package;

    println!("{} {}", package.name, package.version);
    if let Some(description) = &package.description {
        println!("  {}", description);
    }
    if let Some(homepage) = &package.homepage {
        println!("  Homepage: {}", homepage);
    }
    if let Some(license) = &package.license {
        println!("  License: {}", license);
    }
    println!("  Source: {}", formula.archive_url());

    for platform in Platform::all() {
        let deps = resolve_dependencies(&formula.dependencies, platform);
        println!("\nDependencies ({}): {}", platform, deps.len());
        for dep in deps {
            println!("  {}", dep);
        }
    }

    if !formula.patches.is_empty() {
        println!("\nPatches:");
        for patch in &formula.patches {
            let verified = if patch.checksum.is_some() { "verified" } else { "unverified" };
            println!("  {} ({})", patch.url, verified);
        }
    }

    if !formula.resources.is_empty() {
        println!("\nResources:");
        for resource in &formula.resources {
            println!("  {} -> {}", resource.name, resource.stage_dir.display());
        }
    }

    let disabled: Vec<&str> = formula.build.disable.iter().map(|f| f.as_ref()).collect();
    if !disabled.is_empty() {
        println!("\nDisabled features: {}", disabled.join(", "));
    }

    Ok(())
}
