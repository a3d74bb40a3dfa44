//! The staleness check: does a package need to be (re)built?
//!
//! Compared to abuild's own check this also works across architectures,
//! and it recognizes changed files in an aport folder even when pkgver and
//! pkgrel did not change, so local iteration doesn't require bumping the
//! release counter.

use std::cmp::Ordering;
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

use crate::apkbuild::Apkbuild;
use crate::apkindex;
use crate::config::Config;
use crate::error::Result;
use crate::version;

/// Decide whether `apkbuild` must be built for `arch`.
///
/// With `index_path` the check runs against that index only; otherwise the
/// most relevant existing index for the architecture is consulted.
///
/// The decision order is load-bearing and must not be shuffled:
/// 1. no published record: build.
/// 2. published version newer than source: warn and skip, never let an
///    older version replace a published one.
/// 3. source version newer: build.
/// 4. versions equal: build only if some file directly in the aport folder
///    is newer than the publish timestamp.
pub fn is_necessary(
    config: &Config,
    arch: &str,
    apkbuild: &Apkbuild,
    index_path: Option<&Path>,
) -> Result<bool> {
    let package = &apkbuild.pkgname;
    let version_new = apkbuild.version();

    let record = match index_path {
        Some(path) => apkindex::read(package, path)?,
        None => apkindex::read_any_index(config, package, arch)?,
    };
    let Some(record) = record else {
        return Ok(true);
    };

    match version::compare(&record.version, &version_new) {
        Ordering::Greater => {
            eprintln!(
                "[WARN] Package '{}' in your aports folder has version {}, \
                 but the binary package repositories already have version {}!",
                package, version_new, record.version
            );
            Ok(false)
        }
        Ordering::Less => Ok(true),
        Ordering::Equal => modified_since(&config.aports.join(package), record.timestamp),
    }
}

/// True if any entry directly under `dir` (one level, not recursive) has a
/// modification time strictly newer than `timestamp`.
///
/// A missing source directory counts as modified: freshness can't be
/// verified, so the caller gets the build verdict.
fn modified_since(dir: &Path, timestamp: u64) -> Result<bool> {
    if !dir.is_dir() {
        return Ok(true);
    }
    let published = UNIX_EPOCH + Duration::from_secs(timestamp);

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        // unreadable mtimes count as modified rather than silently stale
        let newer = entry
            .metadata()
            .and_then(|m| m.modified())
            .map(|mtime| mtime > published)
            .unwrap_or(true);
        if newer {
            return Ok(true);
        }
    }
    Ok(false)
}
