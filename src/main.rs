//! apkforge - chroot-based Alpine package build helper.
//!
//! Decides whether aports need rebuilding, stages them into a build chroot,
//! and keeps per-architecture package repositories indexed and signed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use apkforge::apkbuild::{Apkbuild, MANIFEST_NAME};
use apkforge::aports;
use apkforge::ccache;
use apkforge::chroot::Chroot;
use apkforge::config::{native_arch, Config};
use apkforge::jobs;
use apkforge::repo;
use apkforge::staleness;

#[derive(Parser)]
#[command(name = "apkforge")]
#[command(about = "Chroot-based Alpine package build helper")]
#[command(
    after_help = "QUICK START:\n  apkforge check hello   Does hello need a rebuild?\n  apkforge index         Re-index all package repositories\n  apkforge show config   Show the active configuration"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a package needs to be (re)built
    Check {
        /// Package name
        package: String,
        /// Target architecture (default: the host's)
        #[arg(long)]
        arch: Option<String>,
        /// Check against this APKINDEX.tar.gz instead of searching
        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Find the aport providing a package or subpackage
    Find {
        /// Package or subpackage name
        package: String,
    },

    /// Stage an aport into a build chroot
    Stage {
        /// Package name
        package: String,
        /// Chroot suffix (native, or buildroot_<arch>)
        #[arg(long, default_value = "native")]
        suffix: String,
    },

    /// Regenerate and sign repository indexes
    Index {
        /// Only this architecture (default: all existing repositories)
        #[arg(long)]
        arch: Option<String>,
    },

    /// Symlink a noarch package into every architecture's repository
    Noarch {
        /// Artifact relative to the packages dir, e.g. x86_64/hello-1.0-r0.apk
        arch_apk: String,
    },

    /// Show ccache statistics for a build chroot
    Ccache {
        /// Target architecture (selects buildroot_<arch>; default: native)
        #[arg(long)]
        arch: Option<String>,
    },

    /// Sync the JOBS count in a chroot's abuild.conf
    Jobs {
        /// Chroot suffix (native, or buildroot_<arch>)
        #[arg(long, default_value = "native")]
        suffix: String,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present
    dotenvy::dotenv().ok();
    let base_dir = std::env::current_dir()?;
    let config = Config::load(&base_dir);

    match cli.command {
        Commands::Check {
            package,
            arch,
            index,
        } => {
            let arch = arch.unwrap_or_else(|| native_arch().to_string());
            let aport = aports::find_aport(&config.aports, &package, true)?
                .expect("find_aport with must_exist returns a path");
            let apkbuild = Apkbuild::parse(&aport.join(MANIFEST_NAME))?;
            let necessary =
                staleness::is_necessary(&config, &arch, &apkbuild, index.as_deref())?;
            if necessary {
                println!("{} ({}): needs build", apkbuild.pkgname, arch);
            } else {
                println!("{} ({}): up to date", apkbuild.pkgname, arch);
            }
        }

        Commands::Find { package } => {
            let aport = aports::find_aport(&config.aports, &package, true)?
                .expect("find_aport with must_exist returns a path");
            println!("{}", aport.display());
        }

        Commands::Stage { package, suffix } => {
            require_sudo()?;
            let chroot = Chroot::new(&config.work, &suffix);
            aports::copy_to_buildpath(&config, &chroot, &package, &suffix)?;
            println!("Staged {package} into chroot_{suffix}");
        }

        Commands::Index { arch } => {
            require_sudo()?;
            let chroot = Chroot::new(&config.work, "native");
            repo::index_repo(&config, &chroot, arch.as_deref())?;
        }

        Commands::Noarch { arch_apk } => {
            require_sudo()?;
            let chroot = Chroot::new(&config.work, "native");
            repo::symlink_noarch_package(&config, &chroot, &arch_apk)?;
        }

        Commands::Ccache { arch } => {
            require_sudo()?;
            let suffix = ccache::chroot_suffix(arch.as_deref());
            let chroot = Chroot::new(&config.work, &suffix);
            print!("{}", ccache::ccache_stats(&chroot)?);
        }

        Commands::Jobs { suffix } => {
            require_sudo()?;
            let chroot = Chroot::new(&config.work, &suffix);
            jobs::configure_jobs(&config, &chroot, &suffix)?;
            println!("JOBS={} in chroot_{suffix}", config.jobs);
        }

        Commands::Show { what } => match what {
            ShowTarget::Config => config.print(),
        },
    }

    Ok(())
}

fn require_sudo() -> Result<()> {
    which::which("sudo").context("sudo is required for chroot operations")?;
    Ok(())
}
