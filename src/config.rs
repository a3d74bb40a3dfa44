//! Configuration management for apkforge.
//!
//! Reads configuration from environment variables (a `.env` file is loaded
//! by `main` before this runs). Everything has a default so the tool works
//! from a checkout without any setup.

use std::path::{Path, PathBuf};

/// Architectures that packages are built for. Noarch packages are
/// symlinked into each of these repositories.
pub const DEFAULT_ARCHITECTURES: &[&str] = &["x86_64", "armhf", "aarch64"];

/// apkforge configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the aports tree (one directory per source package).
    pub aports: PathBuf,
    /// Work directory holding chroots and package repositories.
    pub work: PathBuf,
    /// Parallel jobs for abuild (JOBS= in abuild.conf).
    pub jobs: usize,
    /// Target architectures for noarch propagation.
    pub architectures: Vec<String>,
}

impl Config {
    /// Load configuration from the environment, with defaults.
    ///
    /// Relative `APORTS`/`WORK` paths are resolved against `base_dir`.
    pub fn load(base_dir: &Path) -> Self {
        let resolve = |value: String| {
            let path = PathBuf::from(value);
            if path.is_absolute() {
                path
            } else {
                base_dir.join(path)
            }
        };

        let aports = std::env::var("APORTS")
            .map(resolve)
            .unwrap_or_else(|_| base_dir.join("aports"));

        let work = std::env::var("WORK")
            .map(resolve)
            .unwrap_or_else(|_| base_dir.join("work"));

        let jobs = std::env::var("JOBS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(num_cpus::get);

        let architectures = std::env::var("ARCHITECTURES")
            .map(|s| {
                s.split(',')
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                DEFAULT_ARCHITECTURES
                    .iter()
                    .map(|a| a.to_string())
                    .collect()
            });

        Self {
            aports,
            work,
            jobs,
            architectures,
        }
    }

    /// Per-architecture repository directory on the host.
    pub fn packages_dir(&self, arch: &str) -> PathBuf {
        self.work.join("packages").join(arch)
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  APORTS: {}", self.aports.display());
        println!("  WORK: {}", self.work.display());
        println!("  JOBS: {}", self.jobs);
        println!("  ARCHITECTURES: {}", self.architectures.join(","));
        if self.aports.is_dir() {
            println!("  Aports tree: FOUND");
        } else {
            println!("  Aports tree: NOT FOUND (set APORTS or create ./aports)");
        }
    }
}

/// The architecture of the machine apkforge runs on, in Alpine naming.
pub fn native_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "x86_64",
        "x86" => "x86",
        "aarch64" => "aarch64",
        "arm" => "armhf",
        other => other,
    }
}
