// src/formula/advisory.rs

//! Post-install advisory text

use crate::formula::format::{Formula, TemplateVars};
use std::path::Path;

/// Render the instructions shown after a successful brew
///
/// Placeholders that cannot be resolved are left as written rather than
/// failing, since the advisory is informational.
pub fn render_advisory(formula: &Formula, prefix: &Path) -> String {
    match &formula.caveats {
        Some(caveats) => TemplateVars::new(formula, prefix)
            .expand_lossy(caveats.trim()),
        None => format!(
            "{} was installed to {}",
            formula.full_name(),
            prefix.display()
        ),
    }
}
