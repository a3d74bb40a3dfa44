//! Aport lookup and staging into a build chroot.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::apkbuild::{Apkbuild, MANIFEST_NAME};
use crate::chroot::{Runner, BUILD_PATH, BUILD_USER};
use crate::config::Config;
use crate::error::{Error, Result};

/// Find the aport that provides a package.
///
/// A directory named like the package wins immediately. Otherwise every
/// `<aports>/*/APKBUILD` is parsed and the first one (in path order, so the
/// tie-break between duplicate subpackage declarations is deterministic)
/// listing the package among its subpackages wins.
///
/// With `must_exist` a miss is an error; otherwise it is `Ok(None)`.
pub fn find_aport(aports: &Path, package: &str, must_exist: bool) -> Result<Option<PathBuf>> {
    let direct = aports.join(package);
    if direct.exists() {
        return Ok(Some(direct));
    }

    let mut manifests: Vec<PathBuf> = WalkDir::new(aports)
        .min_depth(2)
        .max_depth(2)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name() == MANIFEST_NAME)
        .map(|entry| entry.into_path())
        .collect();
    manifests.sort();

    for manifest in manifests {
        let apkbuild = match Apkbuild::parse(&manifest) {
            Ok(apkbuild) => apkbuild,
            Err(e) => {
                eprintln!("[WARN] Skipping unreadable {}: {}", manifest.display(), e);
                continue;
            }
        };
        if apkbuild.subpackages.iter().any(|s| s == package) {
            if let Some(dir) = manifest.parent() {
                return Ok(Some(dir.to_path_buf()));
            }
        }
    }

    if must_exist {
        Err(Error::AportNotFound(package.to_string()))
    } else {
        Ok(None)
    }
}

/// Copy an aport into the chroot's build directory.
///
/// Any previously staged tree is removed first so no files from an earlier
/// build leak into this one, then the copy is handed to the build user.
pub fn copy_to_buildpath(
    config: &Config,
    runner: &dyn Runner,
    package: &str,
    suffix: &str,
) -> Result<()> {
    let aport = config.aports.join(package);
    if !aport.join(MANIFEST_NAME).exists() {
        return Err(Error::InvalidPackage(aport));
    }

    let build_outside = config
        .work
        .join(format!("chroot_{suffix}"))
        .join(BUILD_PATH.trim_start_matches('/'));

    if build_outside.exists() {
        runner
            .root(&["rm", "-rf", BUILD_PATH], None)
            .map_err(|e| staging(package, suffix, e))?;
    }

    let aport_arg = aport.to_string_lossy();
    let build_arg = build_outside.to_string_lossy();
    runner
        .host_root(&["cp", "-r", &aport_arg, &build_arg])
        .map_err(|e| staging(package, suffix, e))?;

    let owner = format!("{BUILD_USER}:{BUILD_USER}");
    runner
        .root(&["chown", "-R", &owner, BUILD_PATH], None)
        .map_err(|e| staging(package, suffix, e))?;

    Ok(())
}

fn staging(package: &str, suffix: &str, source: Error) -> Error {
    Error::Staging {
        package: package.to_string(),
        suffix: suffix.to_string(),
        source: Box::new(source),
    }
}
