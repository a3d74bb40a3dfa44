//! ccache statistics for a build chroot.

use crate::chroot::Runner;
use crate::error::Result;

/// Chroot suffix for an optional target architecture: cross-compiling
/// builds live in `buildroot_<arch>`, native builds in `native`.
pub fn chroot_suffix(arch: Option<&str>) -> String {
    match arch {
        Some(arch) => format!("buildroot_{arch}"),
        None => "native".to_string(),
    }
}

/// Fetch ccache statistics, as seen by the chroot's build user.
pub fn ccache_stats(runner: &dyn Runner) -> Result<String> {
    let result = runner.user(&["ccache", "-s"], None)?;
    Ok(result.stdout)
}
