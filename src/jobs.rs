//! Keep the JOBS count in a chroot's abuild.conf in sync.

use std::path::PathBuf;

use crate::chroot::Runner;
use crate::config::Config;
use crate::error::{Error, Result};

/// abuild configuration file, inside the chroot.
pub const ABUILD_CONF: &str = "/etc/abuild.conf";

const JOBS_PREFIX: &str = "export JOBS=";

/// Ensure abuild.conf in `chroot_<suffix>` carries `JOBS=<config.jobs>`.
///
/// Already in sync: zero writes. Out of sync: exactly one rewrite, followed
/// by one verifying re-read; if the rewrite didn't take effect this fails
/// instead of retrying further.
pub fn configure_jobs(config: &Config, runner: &dyn Runner, suffix: &str) -> Result<()> {
    sync(config, runner, suffix, false)
}

fn sync(config: &Config, runner: &dyn Runner, suffix: &str, verify: bool) -> Result<()> {
    let path = abuild_conf_path(config, suffix);
    let desired = format!("{JOBS_PREFIX}{}", config.jobs);

    let content = std::fs::read_to_string(&path)?;
    for line in content.lines() {
        if !line.starts_with(JOBS_PREFIX) {
            continue;
        }
        if line == desired {
            return Ok(());
        }
        if verify {
            return Err(Error::ConfigSync(path));
        }
        let substitution = format!("s/^{JOBS_PREFIX}.*/{desired}/");
        runner.root(&["sed", "-i", "-e", &substitution, ABUILD_CONF], None)?;
        return sync(config, runner, suffix, true);
    }
    Err(Error::ConfigFormat(path))
}

/// Host-side path of a chroot's abuild.conf.
pub fn abuild_conf_path(config: &Config, suffix: &str) -> PathBuf {
    config
        .work
        .join(format!("chroot_{suffix}"))
        .join(ABUILD_CONF.trim_start_matches('/'))
}
