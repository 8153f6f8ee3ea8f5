// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: formula name or path
fn formula_arg() -> Arg {
    Arg::new("formula")
        .required(true)
        .help("Built-in formula name or path to a formula file")
}

/// Common argument: installation prefix
fn prefix_arg() -> Arg {
    Arg::new("prefix")
        .short('p')
        .long("prefix")
        .value_name("PATH")
        .help("Installation prefix (default: from config, else /usr/local)")
}

fn platform_arg() -> Arg {
    Arg::new("platform")
        .long("platform")
        .value_parser(["macos", "linux"])
        .help("Target platform (default: the running host)")
}

/// Prefix, platform, and dependency lookup flags shared by plan and brew
fn target_args() -> [Arg; 4] {
    [
        prefix_arg(),
        platform_arg(),
        Arg::new("opt_root")
            .long("opt-root")
            .value_name("PATH")
            .help("Root of the opt tree dependencies are installed under"),
        Arg::new("host_prefix")
            .long("host-prefix")
            .value_name("PATH")
            .help("Prefix of the active package-manager installation"),
    ]
}

fn build_cli() -> Command {
    Command::new("kettle")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Kettle Contributors")
        .about("Build packages from source with declarative formulas")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Kitchen configuration file (TOML)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("info")
                .about("Show formula metadata and dependencies per platform")
                .arg(formula_arg()),
        )
        .subcommand(
            Command::new("check")
                .about("Evaluate the formula's requirements on this host")
                .arg(formula_arg())
                .arg(platform_arg())
                .arg(
                    Arg::new("host_prefix")
                        .long("host-prefix")
                        .value_name("PATH")
                        .help("Prefix of the active package-manager installation"),
                ),
        )
        .subcommand(
            Command::new("plan")
                .about("Print the build plan without running it")
                .arg(formula_arg())
                .args(target_args())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output the plan as JSON"),
                ),
        )
        .subcommand(
            Command::new("brew")
                .about("Fetch, patch, build, and install a formula")
                .arg(formula_arg())
                .args(target_args())
                .arg(
                    Arg::new("source_cache")
                        .long("source-cache")
                        .value_name("PATH")
                        .help("Directory for caching downloaded sources"),
                )
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .help("Number of parallel make jobs"),
                )
                .arg(
                    Arg::new("keep_builddir")
                        .long("keep-builddir")
                        .action(ArgAction::SetTrue)
                        .help("Keep build directory after completion (for debugging)"),
                )
                .arg(
                    Arg::new("fetch_only")
                        .long("fetch-only")
                        .action(ArgAction::SetTrue)
                        .help("Only fetch sources, patches, and resources; don't build"),
                ),
        )
        .subcommand(
            Command::new("caveats")
                .about("Print post-install instructions")
                .arg(formula_arg())
                .arg(prefix_arg()),
        )
        .subcommand(
            Command::new("test")
                .about("Run the formula's smoke test against an installed prefix")
                .arg(formula_arg())
                .arg(prefix_arg()),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR").map(PathBuf::from) else {
        println!("cargo:warning=CARGO_MANIFEST_DIR not set; skipping man page");
        return;
    };
    let man_dir = manifest_dir.join("man");
    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create {}: {}", man_dir.display(), e);
        return;
    }

    let mut buffer = Vec::new();
    if let Err(e) = Man::new(build_cli()).render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("kettle.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write {}: {}", man_path.display(), e);
    }
}
