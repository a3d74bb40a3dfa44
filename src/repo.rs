//! Repository maintenance: index regeneration and noarch propagation.

use std::path::Path;

use crate::apkindex::INDEX_NAME;
use crate::chroot::{Runner, PACKAGES_PATH};
use crate::config::Config;
use crate::error::{Error, Result};

/// Regenerate and sign the index of one repository, or of every existing
/// per-architecture repository when `arch` is `None`.
///
/// The fresh index is written to a temporary name, signed, and only then
/// renamed over the previous one, so a failure in any step leaves the old
/// index in place.
pub fn index_repo(config: &Config, runner: &dyn Runner, arch: Option<&str>) -> Result<()> {
    let targets = match arch {
        Some(arch) => vec![arch.to_string()],
        None => existing_repo_arches(config)?,
    };

    for arch in targets {
        println!("(native) index {arch} repository");
        let repo_inside = format!("{PACKAGES_PATH}/{arch}");
        let temp_name = format!("{INDEX_NAME}_");

        // sh -c so *.apk expands inside the chroot
        let index_cmd = format!(
            "apk index --output {temp_name} --rewrite-arch {arch} *.apk"
        );
        let steps: Vec<Vec<&str>> = vec![
            vec!["sh", "-c", &index_cmd],
            vec!["abuild-sign", &temp_name],
            vec!["mv", &temp_name, INDEX_NAME],
        ];
        for step in steps {
            runner
                .user(&step, Some(&repo_inside))
                .map_err(|e| Error::Indexing {
                    arch: arch.clone(),
                    source: Box::new(e),
                })?;
        }
    }
    Ok(())
}

/// Make a noarch artifact available to every configured architecture.
///
/// `arch_apk` names an artifact relative to the packages directory, for
/// example `x86_64/hello-1.0-r0.apk`. Every other architecture's repository
/// gets a relative symlink to it and is reindexed; the reference
/// architecture keeps its real file and is only reindexed. Re-running with
/// the same artifact is a no-op apart from the re-signed indexes.
pub fn symlink_noarch_package(config: &Config, runner: &dyn Runner, arch_apk: &str) -> Result<()> {
    let (ref_arch, file_name) = arch_apk
        .split_once('/')
        .ok_or_else(|| Error::NoarchPath(arch_apk.to_string()))?;
    if file_name.is_empty() || file_name.contains('/') {
        return Err(Error::NoarchPath(arch_apk.to_string()));
    }

    for arch in &config.architectures {
        let repo = config.packages_dir(arch);
        std::fs::create_dir_all(&repo)?;

        if arch != ref_arch {
            let link = repo.join(file_name);
            // relative target keeps the packages tree relocatable
            let target = Path::new("..").join(arch_apk);
            if std::fs::symlink_metadata(&link).is_ok() {
                std::fs::remove_file(&link)?;
            }
            std::os::unix::fs::symlink(&target, &link)?;
        }

        index_repo(config, runner, Some(arch))?;
    }
    Ok(())
}

/// Architectures that already have a repository directory, sorted.
fn existing_repo_arches(config: &Config) -> Result<Vec<String>> {
    let packages = config.work.join("packages");
    if !packages.is_dir() {
        return Ok(Vec::new());
    }
    let mut arches: Vec<String> = std::fs::read_dir(&packages)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    arches.sort();
    Ok(arches)
}
