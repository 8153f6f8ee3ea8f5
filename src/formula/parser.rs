// src/formula/parser.rs

//! Formula loading and validation

use crate::error::{Error, Result};
use crate::formula::dependency::DependencyKind;
use crate::formula::feature::Feature;
use crate::formula::format::Formula;
use std::collections::HashSet;
use std::path::{Component, Path};

/// Formulas shipped with kettle, by name
const BUILTIN_FORMULAS: &[(&str, &str)] = &[(
    "libguestfs@1.32",
    include_str!("../../formulas/libguestfs@1.32.toml"),
)];

/// Names of the built-in formulas
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTIN_FORMULAS.iter().map(|(name, _)| *name)
}

/// Parse a formula from a TOML string
pub fn parse_formula(content: &str) -> Result<Formula> {
    toml::from_str(content).map_err(|e| Error::ParseError(format!("Invalid formula: {}", e)))
}

/// Parse a formula from a file
pub fn parse_formula_file(path: &Path) -> Result<Formula> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::IoError(format!("Failed to read formula file: {}", e)))?;

    parse_formula(&content)
}

/// Load a built-in formula by name, or a formula file by path
pub fn load_formula(name_or_path: &str) -> Result<Formula> {
    if let Some((_, content)) = BUILTIN_FORMULAS.iter().find(|(n, _)| *n == name_or_path) {
        return parse_formula(content);
    }

    let path = Path::new(name_or_path);
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "No formula file or built-in formula named '{}' (built-in: {})",
            name_or_path,
            builtin_names().collect::<Vec<_>>().join(", ")
        )));
    }
    parse_formula_file(path)
}

/// Validate a formula for completeness and correctness
///
/// Returns warnings for lower-trust or incomplete declarations; structural
/// problems are errors.
pub fn validate_formula(formula: &Formula) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if formula.package.name.is_empty() {
        return Err(Error::InvalidFormula("package name cannot be empty".to_string()));
    }
    if formula.package.version.is_empty() {
        return Err(Error::InvalidFormula("package version cannot be empty".to_string()));
    }

    let defined: HashSet<&str> = formula.requirements.iter().map(|r| r.name()).collect();
    for dep in &formula.dependencies {
        if dep.name.is_empty() {
            return Err(Error::InvalidFormula("dependency name cannot be empty".to_string()));
        }
        if dep.kind == DependencyKind::Requirement && !defined.contains(dep.name.as_str()) {
            return Err(Error::InvalidFormula(format!(
                "dependency '{}' refers to an undefined requirement",
                dep.name
            )));
        }
    }

    for resource in &formula.resources {
        if !is_contained_relative(&resource.stage_dir) {
            return Err(Error::InvalidFormula(format!(
                "resource '{}' stage_dir must be a relative path inside the prefix: {}",
                resource.name,
                resource.stage_dir.display()
            )));
        }
    }

    if let Some(dir) = &formula.install.link_binaries_from {
        if !is_contained_relative(dir) {
            return Err(Error::InvalidFormula(format!(
                "link_binaries_from must be relative to the source tree: {}",
                dir.display()
            )));
        }
    }

    if formula.build.disable.contains(&Feature::Appliance) && formula.resources.is_empty() {
        return Err(Error::InvalidFormula(
            "appliance build is disabled but no resource provides a prebuilt appliance"
                .to_string(),
        ));
    }

    if let Some(test) = &formula.test {
        if test.command.is_empty() {
            return Err(Error::InvalidFormula("test command cannot be empty".to_string()));
        }
    }

    if formula.source.checksum.is_none() {
        warnings.push(format!(
            "Source archive {} has no checksum; using it unverified",
            formula.archive_url()
        ));
    }
    for patch in &formula.patches {
        if patch.checksum.is_none() {
            warnings.push(format!("Patch {} has no checksum; applying unverified", patch.url));
        }
    }
    if formula.package.description.is_none() {
        warnings.push("Missing package description".to_string());
    }
    if formula.package.homepage.is_none() {
        warnings.push("Missing package homepage".to_string());
    }

    Ok(warnings)
}

/// A non-empty relative path that cannot climb out of its base directory
pub(crate) fn is_contained_relative(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
