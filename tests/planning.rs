// tests/planning.rs

//! Planning, configuration, and requirement checks: nothing here fetches or
//! runs a command.

mod common;

use common::{with_fuse_header, RecordingRunner, Workbench};
use kettle::formula::{parse_formula, validate_formula, DependencyPaths, Stage, INCLUDE_PATHS_VAR, LIBRARY_PATHS_VAR};
use kettle::{load_formula, render_advisory, BrewRequest, Error, Kitchen, KitchenConfig, Platform};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const ADVISORY_FORMULA: &str = r#"
[package]
name = "hello"
version = "2.12"
description = "Friendly greeter"
homepage = "https://www.gnu.org/software/hello/"

[source]
archive = "https://ftp.gnu.org/gnu/%(name)s/%(name)s-%(version)s.tar.gz"

[[dependencies]]
name = "gettext"

[[dependencies]]
name = "libiconv-headers"
kind = "requirement"

[[requirements]]
name = "libiconv-headers"
kind = "native-header"
severity = "advisory"
header = "/nonexistent/include/iconv.h"
default_prefix = "/usr/local"
library_path = "/usr/local/lib"
include_path = "/usr/local/include"
message = "iconv headers not found; building without them"
"#;

fn workbench_kitchen(bench: &Workbench, config: KitchenConfig) -> Kitchen {
    Kitchen::with_collaborators(config, bench.fetcher.clone(), bench.runner.clone())
}

#[test]
fn test_platform_substitution_in_plans() {
    let bench = Workbench::new(RecordingRunner::default());
    let paths = DependencyPaths::opt_tree("/hb");

    let linux = bench
        .kitchen
        .plan(&bench.formula, &BrewRequest::new(Platform::Linux, "/opt/lg", paths.clone()))
        .unwrap();
    let names: Vec<&str> = linux.dependencies.iter().map(|d| d.name.as_str()).collect();
    assert!(names.contains(&"libfuse"));
    assert!(!names.contains(&"macfuse"));
    assert!(linux.requirements.is_empty());

    let header_dir = bench.dir.path().join("fuse");
    std::fs::create_dir_all(&header_dir).unwrap();
    std::fs::write(header_dir.join("fuse.h"), "").unwrap();
    let formula = with_fuse_header(bench.formula.clone(), &header_dir.join("fuse.h"));

    let macos = bench
        .kitchen
        .plan(&formula, &BrewRequest::new(Platform::MacOs, "/opt/lg", paths))
        .unwrap();
    let names: Vec<&str> = macos.dependencies.iter().map(|d| d.name.as_str()).collect();
    assert!(names.contains(&"macfuse"));
    assert!(!names.contains(&"libfuse"));
    assert_eq!(macos.requirements.len(), 1);
    assert!(macos.requirements[0].satisfied);

    // Dependency order is declaration order on both platforms
    assert_eq!(linux.dependencies[0].name, "amar1729/libguestfs/automake-1.15");
    assert_eq!(macos.dependencies[0].name, "amar1729/libguestfs/automake-1.15");
    assert!(bench.runner.stages().is_empty());
}

#[test]
fn test_fuse_header_under_foreign_host_prefix_extends_search_paths() {
    let bench = Workbench::new(RecordingRunner::default());
    let header_dir = bench.dir.path().join("fuse");
    std::fs::create_dir_all(&header_dir).unwrap();
    std::fs::write(header_dir.join("fuse.h"), "").unwrap();
    let formula = with_fuse_header(bench.formula.clone(), &header_dir.join("fuse.h"));

    let config = KitchenConfig {
        host_prefix: PathBuf::from("/opt/homebrew"),
        ..bench.kitchen.config().clone()
    };
    let kitchen = workbench_kitchen(&bench, config);

    let report = kitchen.check(&formula, Platform::MacOs).unwrap();
    assert_eq!(report.env.get(LIBRARY_PATHS_VAR), Some("/usr/local/lib"));
    assert_eq!(report.env.get(INCLUDE_PATHS_VAR), Some("/usr/local/include/fuse"));

    let default_kitchen = workbench_kitchen(&bench, bench.kitchen.config().clone());
    let report = default_kitchen.check(&formula, Platform::MacOs).unwrap();
    assert!(report.env.is_empty());
}

#[test]
fn test_fuse_search_paths_reach_linker_flags_under_foreign_host_prefix() {
    let bench = Workbench::new(RecordingRunner::default());
    let header_dir = bench.dir.path().join("fuse");
    std::fs::create_dir_all(&header_dir).unwrap();
    std::fs::write(header_dir.join("fuse.h"), "").unwrap();
    let formula = with_fuse_header(bench.formula.clone(), &header_dir.join("fuse.h"));

    let config = KitchenConfig {
        host_prefix: PathBuf::from("/opt/homebrew"),
        ..bench.kitchen.config().clone()
    };
    let kitchen = workbench_kitchen(&bench, config);
    let request = BrewRequest::new(Platform::MacOs, "/opt/lg", DependencyPaths::opt_tree("/opt/homebrew"));
    let plan = kitchen.plan(&formula, &request).unwrap();

    let configure = plan.step(Stage::Configure).unwrap();
    let ldflags = configure.env.get("LDFLAGS").unwrap();
    let cppflags = configure.env.get("CPPFLAGS").unwrap();
    assert!(ldflags.split(' ').any(|f| f == "-L/usr/local/lib"));
    assert!(cppflags.split(' ').any(|f| f == "-I/usr/local/include/fuse"));
    assert_eq!(configure.env.get("FUSE_LIBS"), Some("-lfuse -pthread -liconv"));
}

#[test]
fn test_symlinked_fuse_include_dir_is_unsatisfied() {
    let bench = Workbench::new(RecordingRunner::default());
    let real = bench.dir.path().join("osxfuse");
    std::fs::create_dir_all(&real).unwrap();
    std::fs::write(real.join("fuse.h"), "").unwrap();
    let link = bench.dir.path().join("fuse");
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let formula = with_fuse_header(bench.formula.clone(), &link.join("fuse.h"));
    let err = bench.kitchen.check(&formula, Platform::MacOs).unwrap_err();
    assert!(matches!(err, Error::UnsatisfiedRequirement { .. }));
}

#[test]
fn test_advisory_requirement_does_not_block() {
    let formula = parse_formula(ADVISORY_FORMULA).unwrap();
    assert!(validate_formula(&formula).unwrap().iter().any(|w| w.contains("no checksum")));

    let bench = Workbench::new(RecordingRunner::default());
    let request = BrewRequest::new(Platform::Linux, "/usr/local", DependencyPaths::opt_tree("/hb"));
    let plan = bench.kitchen.plan(&formula, &request).unwrap();

    assert_eq!(plan.requirements.len(), 1);
    assert!(!plan.requirements[0].satisfied);
    assert_eq!(plan.steps.len(), 4);
    assert_eq!(
        plan.step(Stage::Configure).unwrap().env.get("PKG_CONFIG_PATH"),
        Some("/hb/opt/gettext/lib/pkgconfig")
    );
}

#[test]
fn test_config_file_drives_dependency_paths() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("kitchen.toml");
    std::fs::write(
        &config_path,
        r#"
prefix = "/opt/libguestfs"
opt_root = "/linuxbrew"
jobs = 3

[dependency_paths]
ncurses = "/opt/ncurses-6.4"
"#,
    )
    .unwrap();

    let config = KitchenConfig::load(&config_path).unwrap();
    assert_eq!(config.jobs, 3);
    assert_eq!(config.download_timeout, 300);
    let request = config.request(Platform::Linux);
    assert_eq!(request.prefix, Path::new("/opt/libguestfs"));

    let bench = Workbench::new(RecordingRunner::default());
    let kitchen = workbench_kitchen(&bench, config);
    let plan = kitchen.plan(&bench.formula, &request).unwrap();

    assert_eq!(plan.env.get("LIBTINFO_CFLAGS"), Some("-I/opt/ncurses-6.4/include"));
    assert_eq!(plan.env.get("AUGEAS_CFLAGS"), Some("-I/linuxbrew/opt/augeas/include"));
    assert_eq!(plan.env.get("MAKEFLAGS"), Some("-j3"));
    assert!(plan.render().contains("--prefix=/opt/libguestfs"));
}

#[test]
fn test_invalid_config_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("kitchen.toml");
    std::fs::write(&config_path, "jobs = \"many\"").unwrap();

    assert!(matches!(KitchenConfig::load(&config_path), Err(Error::ParseError(_))));
    assert!(matches!(
        KitchenConfig::load(&dir.path().join("missing.toml")),
        Err(Error::IoError(_))
    ));
}

#[test]
fn test_plan_serializes_to_json() {
    let bench = Workbench::new(RecordingRunner::default());
    let request = BrewRequest::new(Platform::Linux, "/opt/lg", DependencyPaths::opt_tree("/hb"));
    let plan = bench.kitchen.plan(&bench.formula, &request).unwrap();

    let json: serde_json::Value = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["formula"], "libguestfs-1.32.6");
    assert_eq!(json["steps"].as_array().unwrap().len(), 4);
    assert_eq!(json["env"]["GTKDOCIZE"], "echo");
}

#[test]
fn test_caveats_expand_for_any_prefix() {
    let formula = load_formula("libguestfs@1.32").unwrap();
    let advisory = render_advisory(&formula, Path::new("/opt/lg"));
    assert!(advisory.starts_with("A fixed appliance is required"));
    assert!(advisory.contains("export LIBGUESTFS_PATH=/opt/lg/var/libguestfs-appliance"));
    assert!(advisory.contains("PKG_CONFIG_PATH=\"/opt/lg/lib/pkgconfig\""));
}

#[test]
fn test_missing_formula_is_not_found() {
    let err = load_formula("/nonexistent/formula.toml").unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(err.to_string().contains("libguestfs@1.32"));
}

#[test]
fn test_kitchen_is_shareable() {
    fn assert_send_sync<T: Send + Sync>(_: &T) {}
    let bench = Workbench::new(RecordingRunner::default());
    assert_send_sync(&bench.kitchen);
    let _shared = Arc::new(bench.kitchen);
}
