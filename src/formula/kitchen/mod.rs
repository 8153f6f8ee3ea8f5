// src/formula/kitchen/mod.rs

//! Kitchen: drives a formula from requirement check to post-install advisory
//!
//! The Kitchen owns two collaborators, both behind traits so the pipeline
//! can run without network or toolchain:
//! - a [`Fetcher`] for source archives, patches, and resources
//! - a [`StageRunner`] for `patch` and the build stages

mod archive;
mod brew;
mod config;
mod fetch;
mod patch;
mod resource;
mod runner;

pub use archive::{place_artifact, unpack_stripped, ArchiveFormat};
pub use config::{BrewRequest, BrewResult, KitchenConfig};
pub use fetch::{verify_download, Fetcher, SourceCache};
pub use patch::{apply_patches, fetch_patches, FetchedPatch, PATCH_STAGE};
pub use resource::{link_binaries, stage_resource, InstallReceipt};
pub use runner::{ShellRunner, StageOutput, StageRunner};

use brew::Brew;
use crate::error::{Error, Result};
use crate::formula::advisory::render_advisory;
use crate::formula::dependency::resolve_dependencies;
use crate::formula::format::{Formula, TemplateVars};
use crate::formula::parser::validate_formula;
use crate::formula::plan::{BuildPlan, BuildPlanAssembler};
use crate::formula::requirement::{check_requirements, RequirementContext, RequirementReport};
use crate::env::EnvOverrides;
use crate::platform::Platform;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Stage name smoke-test failures are reported under
pub const TEST_STAGE: &str = "test";

/// The Kitchen: where formulas are brewed
pub struct Kitchen {
    pub(crate) config: KitchenConfig,
    fetcher: Arc<dyn Fetcher>,
    runner: Arc<dyn StageRunner>,
}

impl Kitchen {
    /// Create a Kitchen that downloads into the configured source cache and
    /// runs commands directly
    pub fn new(config: KitchenConfig) -> Result<Self> {
        let fetcher = SourceCache::new(&config.source_cache, config.timeout())?;
        Ok(Self::with_collaborators(
            config,
            Arc::new(fetcher),
            Arc::new(ShellRunner),
        ))
    }

    /// Create a Kitchen with explicit collaborators
    pub fn with_collaborators(
        config: KitchenConfig,
        fetcher: Arc<dyn Fetcher>,
        runner: Arc<dyn StageRunner>,
    ) -> Self {
        Self {
            config,
            fetcher,
            runner,
        }
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    fn requirement_context(&self) -> RequirementContext {
        RequirementContext {
            host_prefix: self.config.host_prefix.clone(),
        }
    }

    /// Evaluate the requirements that apply on `platform`
    pub fn check(&self, formula: &Formula, platform: Platform) -> Result<RequirementReport> {
        let deps = resolve_dependencies(&formula.dependencies, platform);
        check_requirements(&deps, &formula.requirements, &self.requirement_context())
    }

    /// Check requirements, resolve dependencies, and assemble the plan
    ///
    /// Nothing is fetched and no command runs.
    pub fn plan(&self, formula: &Formula, request: &BrewRequest) -> Result<BuildPlan> {
        self.plan_validated(formula, request).map(|(plan, _)| plan)
    }

    /// Validate the formula, then plan; returns the validation warnings too
    fn plan_validated(
        &self,
        formula: &Formula,
        request: &BrewRequest,
    ) -> Result<(BuildPlan, Vec<String>)> {
        let warnings = validate_formula(formula)?;
        let deps = resolve_dependencies(&formula.dependencies, request.platform);
        let report =
            check_requirements(&deps, &formula.requirements, &self.requirement_context())?;

        let plan = BuildPlanAssembler::new(formula, &request.dependency_paths, request.platform)
            .with_jobs(self.config.jobs)
            .assemble(&deps, &report, &formula.feature_flags(), &request.prefix)?;
        Ok((plan, warnings))
    }

    /// Brew a formula into `request.prefix`
    ///
    /// ## Full Brewing Process
    /// 1. **Requirements**: fatal requirements abort before anything else
    /// 2. **Plan**: dependencies resolved and the build plan assembled
    /// 3. **Prep**: source archive and patches fetched and verified
    /// 4. **Patch**: patches applied in order
    /// 5. **Simmer**: bootstrap, configure, compile, install
    /// 6. **Stage**: resources unpacked into the prefix
    /// 7. **Link**: source-tree binaries linked into `<prefix>/bin`
    pub fn brew(&self, formula: &Formula, request: &BrewRequest) -> Result<BrewResult> {
        info!(
            "Brewing {} version {} for {}",
            formula.package.name, formula.package.version, request.platform
        );

        let (plan, validation) = self.plan_validated(formula, request)?;
        let mut brew = Brew::new(self, formula, &plan)?;
        brew.warnings.extend(validation);
        brew.warnings.extend(
            plan.requirements
                .iter()
                .filter(|r| !r.satisfied)
                .filter_map(|r| r.message.clone()),
        );

        info!("Prep: fetching source and patches...");
        brew.prep()?;

        info!("Applying {} patch(es)...", brew.patches.len());
        brew.patch()?;

        info!("Simmering: running build stages...");
        let receipt = brew.simmer()?;

        info!("Staging resources...");
        let staged = brew.stage(&receipt)?;
        let linked = brew.link(&receipt)?;

        let advisory = render_advisory(formula, receipt.prefix());
        let (log, warnings, build_dir) = brew.finish();

        info!("Brewed {} into {}", formula.full_name(), request.prefix.display());

        Ok(BrewResult {
            plan,
            log,
            warnings,
            staged,
            linked,
            advisory,
            build_dir,
        })
    }

    /// Fetch sources, patches, and resources without building
    pub fn fetch(&self, formula: &Formula) -> Result<Vec<PathBuf>> {
        validate_formula(formula)?;
        let mut fetched = Vec::new();

        let url = formula.archive_url();
        fetched.push(self.fetcher.fetch(&url, formula.source.checksum.as_ref())?);

        let mut warnings = Vec::new();
        fetched.extend(
            fetch_patches(&formula.patches, self.fetcher.as_ref(), &mut warnings)?
                .into_iter()
                .map(|p| p.path),
        );

        for resource in &formula.resources {
            let path = self.fetcher.fetch(&resource.url, Some(&resource.checksum))?;
            verify_download(&path, &resource.url, &resource.checksum)?;
            fetched.push(path);
        }

        info!(
            "Fetched {} file(s) for {}",
            fetched.len(),
            formula.package.name
        );
        Ok(fetched)
    }

    /// Run the formula's smoke test against an installed prefix
    pub fn test(&self, formula: &Formula, prefix: &Path) -> Result<StageOutput> {
        let test = formula.test.as_ref().ok_or_else(|| {
            Error::NotFound(format!("{} does not define a test", formula.full_name()))
        })?;

        let vars = TemplateVars::new(formula, prefix);
        let command = test
            .command
            .iter()
            .map(|arg| vars.expand(arg))
            .collect::<Result<Vec<_>>>()?;

        let mut env = EnvOverrides::new();
        for (key, value) in &test.env {
            env.set(key.as_str(), vars.expand(value)?);
        }

        info!("Testing {}: {}", formula.full_name(), command.join(" "));
        self.runner
            .run(TEST_STAGE, &command, &env, prefix)?
            .check(TEST_STAGE)
    }
}
