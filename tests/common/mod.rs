// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.
#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use kettle::formula::kitchen::{Fetcher, StageOutput, StageRunner};
use kettle::formula::RequirementSpec;
use kettle::hash::hash_bytes;
use kettle::{
    load_formula, Checksum, EnvOverrides, Error, Formula, HashAlgorithm, Kitchen, KitchenConfig,
    Result,
};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Serves canned bytes per URL and records what was asked for
pub struct CannedFetcher {
    dir: PathBuf,
    files: HashMap<String, Vec<u8>>,
    pub requests: Mutex<Vec<String>>,
}

impl CannedFetcher {
    pub fn new(dir: &Path) -> Self {
        std::fs::create_dir_all(dir).unwrap();
        Self {
            dir: dir.to_path_buf(),
            files: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn serve(&mut self, url: &str, bytes: Vec<u8>) {
        self.files.insert(url.to_string(), bytes);
    }

    pub fn requested(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Fetcher for CannedFetcher {
    fn fetch(&self, url: &str, _checksum: Option<&Checksum>) -> Result<PathBuf> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(url.to_string());
        let bytes = self
            .files
            .get(url)
            .ok_or_else(|| Error::DownloadError(format!("HTTP 404 Not Found from {}", url)))?;
        let path = self.dir.join(format!("download-{}", requests.len()));
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// One recorded invocation of an external command
#[derive(Debug, Clone)]
pub struct Invocation {
    pub stage: String,
    pub command: Vec<String>,
    pub env: EnvOverrides,
}

/// Records every command instead of running it; can fail one stage
#[derive(Default)]
pub struct RecordingRunner {
    pub fail_stage: Option<String>,
    pub invocations: Mutex<Vec<Invocation>>,
}

impl RecordingRunner {
    pub fn failing_at(stage: &str) -> Self {
        Self {
            fail_stage: Some(stage.to_string()),
            ..Default::default()
        }
    }

    pub fn stages(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(|i| i.stage.clone())
            .collect()
    }

    pub fn invocation(&self, stage: &str) -> Option<Invocation> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.stage == stage)
            .cloned()
    }
}

impl StageRunner for RecordingRunner {
    fn run(
        &self,
        stage: &str,
        command: &[String],
        env: &EnvOverrides,
        _workdir: &Path,
    ) -> Result<StageOutput> {
        self.invocations.lock().unwrap().push(Invocation {
            stage: stage.to_string(),
            command: command.to_vec(),
            env: env.clone(),
        });
        let failed = self.fail_stage.as_deref() == Some(stage);
        Ok(StageOutput {
            exit_code: Some(if failed { 1 } else { 0 }),
            stdout: String::new(),
            stderr: if failed {
                format!("{} exploded", stage)
            } else {
                String::new()
            },
        })
    }
}

fn tar_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, path, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

pub fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar_bytes(entries)).unwrap();
    encoder.finish().unwrap()
}

pub fn tar_xz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
    encoder.write_all(&tar_bytes(entries)).unwrap();
    encoder.finish().unwrap()
}

pub fn sha256(data: &[u8]) -> Checksum {
    Checksum::new(HashAlgorithm::Sha256, hash_bytes(HashAlgorithm::Sha256, data)).unwrap()
}

/// Point the macFUSE requirement at a header path the test controls
pub fn with_fuse_header(mut formula: Formula, header: &Path) -> Formula {
    for spec in &mut formula.requirements {
        let RequirementSpec::NativeHeader(req) = spec;
        if req.name == "macfuse" {
            req.header = header.to_path_buf();
        }
    }
    formula
}

/// The shipped libguestfs formula with every download served locally
pub struct Workbench {
    pub dir: TempDir,
    pub formula: Formula,
    pub fetcher: Arc<CannedFetcher>,
    pub runner: Arc<RecordingRunner>,
    pub kitchen: Kitchen,
}

impl Workbench {
    pub fn new(runner: RecordingRunner) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut formula = load_formula("libguestfs@1.32").unwrap();
        let mut fetcher = CannedFetcher::new(&dir.path().join("downloads"));

        let source = tar_gz(&[
            ("libguestfs-1.32.6/configure.ac", &b"AC_INIT([libguestfs])"[..]),
            ("libguestfs-1.32.6/bin/guestfish-wrapper", &b"#!/bin/sh\n"[..]),
            ("libguestfs-1.32.6/bin/virt-wrapper", &b"#!/bin/sh\n"[..]),
        ]);
        formula.source.checksum = Some(sha256(&source));
        fetcher.serve(&formula.archive_url(), source);

        let patch = b"--- a/m4/program.m4\n+++ b/m4/program.m4\n".to_vec();
        for patch_info in &mut formula.patches {
            patch_info.checksum = Some(sha256(&patch));
            fetcher.serve(&patch_info.url, patch.clone());
        }

        let appliance = tar_xz(&[
            ("appliance/kernel", &b"vmlinuz"[..]),
            ("appliance/root", &b"rootfs"[..]),
        ]);
        formula.resources[0].checksum = sha256(&appliance);
        fetcher.serve(&formula.resources[0].url, appliance);

        let fetcher = Arc::new(fetcher);
        let runner = Arc::new(runner);
        let config = KitchenConfig {
            source_cache: dir.path().join("cache"),
            jobs: 4,
            ..Default::default()
        };
        let kitchen = Kitchen::with_collaborators(config, fetcher.clone(), runner.clone());

        Self {
            dir,
            formula,
            fetcher,
            runner,
            kitchen,
        }
    }

    pub fn prefix(&self) -> PathBuf {
        self.dir.path().join("prefix")
    }
}
