//! Command execution inside a build chroot.
//!
//! A chroot is identified by a suffix (`native`, or `buildroot_<arch>`) and
//! lives at `WORK/chroot_<suffix>`. Its lifecycle (creation, mounts) belongs
//! to external tooling; this module only runs commands inside an existing
//! chroot, either as the unprivileged build user or as root, plus elevated
//! commands on the host itself.
//!
//! The [`Runner`] trait is the seam the rest of the crate depends on, so
//! tests can substitute a fake that never touches sudo.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::process::{shell_join, shell_quote, Cmd, CommandResult};

/// Unprivileged user inside every build chroot.
pub const BUILD_USER: &str = "user";

/// Staging directory for a package build, inside the chroot.
pub const BUILD_PATH: &str = "/home/user/build";

/// Per-architecture package repositories, inside the chroot.
pub const PACKAGES_PATH: &str = "/home/user/packages/user";

/// Executes commands for one build environment.
pub trait Runner {
    /// Run a command inside the chroot as the build user.
    ///
    /// `working_dir` is a path inside the chroot.
    fn user(&self, args: &[&str], working_dir: Option<&str>) -> Result<CommandResult>;

    /// Run a command inside the chroot as root.
    fn root(&self, args: &[&str], working_dir: Option<&str>) -> Result<CommandResult>;

    /// Run a command on the host with elevated privileges.
    fn host_root(&self, args: &[&str]) -> Result<CommandResult>;
}

/// A build chroot under `WORK/chroot_<suffix>`.
#[derive(Debug, Clone)]
pub struct Chroot {
    work: PathBuf,
    suffix: String,
}

impl Chroot {
    pub fn new(work: &Path, suffix: &str) -> Self {
        Self {
            work: work.to_path_buf(),
            suffix: suffix.to_string(),
        }
    }

    /// Root of the chroot on the host filesystem.
    pub fn path(&self) -> PathBuf {
        self.work.join(format!("chroot_{}", self.suffix))
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    fn script(args: &[&str], working_dir: Option<&str>) -> String {
        let command = shell_join(args);
        match working_dir {
            Some(dir) => format!("cd {} && {}", shell_quote(dir), command),
            None => command,
        }
    }
}

impl Runner for Chroot {
    fn user(&self, args: &[&str], working_dir: Option<&str>) -> Result<CommandResult> {
        let script = Self::script(args, working_dir);
        Cmd::new("chroot")
            .elevated()
            .arg(self.path().to_string_lossy())
            .args(["su", BUILD_USER, "-s", "/bin/sh", "-c"])
            .arg(&script)
            .run()
    }

    fn root(&self, args: &[&str], working_dir: Option<&str>) -> Result<CommandResult> {
        let script = Self::script(args, working_dir);
        Cmd::new("chroot")
            .elevated()
            .arg(self.path().to_string_lossy())
            .args(["/bin/sh", "-c"])
            .arg(&script)
            .run()
    }

    fn host_root(&self, args: &[&str]) -> Result<CommandResult> {
        let Some((program, rest)) = args.split_first() else {
            return Err(Error::CommandSpawn {
                program: String::new(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            });
        };
        Cmd::new(program).elevated().args(rest).run()
    }
}
