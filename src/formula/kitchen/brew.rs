// src/formula/kitchen/brew.rs

//! Brew: the actual build execution for a single formula

use super::archive::place_artifact;
use super::fetch::verify_download;
use super::patch::{apply_patches, fetch_patches, FetchedPatch, PATCH_STAGE};
use super::resource::{link_binaries, stage_resource, InstallReceipt};
use super::Kitchen;
use crate::error::{Error, Result};
use crate::formula::format::Formula;
use crate::formula::plan::BuildPlan;
use std::collections::HashSet;
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// A single brew operation
pub struct Brew<'a> {
    pub(super) kitchen: &'a Kitchen,
    pub(super) formula: &'a Formula,
    pub(super) plan: &'a BuildPlan,
    /// Temporary build directory
    pub(super) build_dir: TempDir,
    /// Unpacked source tree
    pub(super) source_dir: PathBuf,
    pub(super) patches: Vec<FetchedPatch>,
    /// Build log accumulator
    pub(super) log: String,
    pub(super) warnings: Vec<String>,
}

impl<'a> Brew<'a> {
    pub(super) fn new(kitchen: &'a Kitchen, formula: &'a Formula, plan: &'a BuildPlan) -> Result<Self> {
        let build_dir = tempfile::Builder::new()
            .prefix(&format!("kettle-{}-", formula.full_name()))
            .tempdir()
            .map_err(|e| Error::IoError(format!("Failed to create build directory: {}", e)))?;

        let source_dir = build_dir.path().join("source");

        Ok(Self {
            kitchen,
            formula,
            plan,
            build_dir,
            source_dir,
            patches: Vec::new(),
            log: String::new(),
            warnings: Vec::new(),
        })
    }

    /// Phase 1: Prep - fetch the source archive and patches
    pub(super) fn prep(&mut self) -> Result<()> {
        let url = self.formula.archive_url();
        let checksum = self.formula.source.checksum.as_ref();
        let archive = self.kitchen.fetcher.fetch(&url, checksum)?;

        match checksum {
            Some(c) => verify_download(&archive, &url, c)?,
            None => {
                let message = format!("Source archive {} has no checksum; using it unverified", url);
                warn!("{}", message);
                self.warnings.push(message);
            }
        }
        self.log_line(&format!("Fetched source: {}", url));

        place_artifact(&archive, &self.formula.archive_filename(), &self.source_dir)?;
        self.log_line(&format!("Extracted source to {}", self.source_dir.display()));

        self.patches = fetch_patches(
            &self.formula.patches,
            self.kitchen.fetcher.as_ref(),
            &mut self.warnings,
        )?;
        for patch in &self.patches {
            debug!("Fetched patch {} -> {}", patch.url, patch.path.display());
        }

        Ok(())
    }

    /// Phase 2: Apply patches in declaration order
    pub(super) fn patch(&mut self) -> Result<()> {
        let result = apply_patches(&self.patches, self.kitchen.runner.as_ref(), &self.source_dir);
        let outputs = match result {
            Ok(outputs) => outputs,
            Err(e) => {
                if let Error::BuildStageFailure { output, .. } = &e {
                    self.log_build_output(PATCH_STAGE, output, "");
                }
                return Err(e);
            }
        };

        let urls: Vec<String> = self.patches.iter().map(|p| p.url.clone()).collect();
        for (url, output) in urls.iter().zip(&outputs) {
            self.log_build_output(PATCH_STAGE, &output.stdout, &output.stderr);
            self.log_line(&format!("Applied patch: {}", url));
        }
        Ok(())
    }

    /// Phase 3: Simmer - run the build stages
    ///
    /// Stages run strictly in plan order; the first non-zero exit stops the
    /// brew with its captured output.
    pub(super) fn simmer(&mut self) -> Result<InstallReceipt> {
        let plan = self.plan;
        for step in &plan.steps {
            let stage = step.stage.as_str();
            info!("Running {} stage", stage);
            debug!("Command: {}", step.command_line());

            let output =
                self.kitchen
                    .runner
                    .run(stage, &step.command, &step.env, &self.source_dir)?;
            self.log_build_output(stage, &output.stdout, &output.stderr);
            output.check(stage)?;
        }

        Ok(InstallReceipt::new(&plan.prefix))
    }

    /// Phase 4: Stage resources into the prefix
    pub(super) fn stage(&mut self, receipt: &InstallReceipt) -> Result<Vec<PathBuf>> {
        let formula = self.formula;
        let mut staged = Vec::with_capacity(formula.resources.len());
        for resource in &formula.resources {
            let target = stage_resource(resource, self.kitchen.fetcher.as_ref(), receipt)?;
            self.log_line(&format!("Staged {} into {}", resource.name, target.display()));
            staged.push(target);
        }
        Ok(staged)
    }

    /// Phase 5: Link binaries from the source tree into `<prefix>/bin`
    pub(super) fn link(&mut self, receipt: &InstallReceipt) -> Result<Vec<PathBuf>> {
        let Some(dir) = &self.plan.link_binaries_from else {
            return Ok(Vec::new());
        };
        let linked = link_binaries(&self.source_dir.join(dir), receipt)?;
        for link in &linked {
            self.log_line(&format!("Linked {}", link.display()));
        }
        Ok(linked)
    }

    /// Keep or drop the build directory according to the kitchen config
    ///
    /// Validation and fetching can report the same missing checksum; each
    /// warning is returned once, in first-seen order.
    pub(super) fn finish(self) -> (String, Vec<String>, Option<PathBuf>) {
        let kept = if self.kitchen.config.keep_builddir {
            let path = self.build_dir.keep();
            info!("Build directory kept at {}", path.display());
            Some(path)
        } else {
            None
        };
        let mut seen = HashSet::new();
        let warnings = self
            .warnings
            .into_iter()
            .filter(|w| seen.insert(w.clone()))
            .collect();
        (self.log, warnings, kept)
    }

    fn log_line(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }

    /// Log stage output with a stage header
    fn log_build_output(&mut self, stage: &str, stdout: &str, stderr: &str) {
        self.log_line(&format!("=== {} ===", stage));
        if !stdout.is_empty() {
            self.log.push_str(stdout);
            self.log.push('\n');
        }
        if !stderr.is_empty() {
            self.log.push_str(stderr);
            self.log.push('\n');
        }
    }
}
