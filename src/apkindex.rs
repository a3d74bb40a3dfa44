//! APKINDEX.tar.gz reading.
//!
//! A repository index is a gzipped tarball containing an `APKINDEX` member:
//! blank-line-separated blocks of `X:value` lines, one block per package.
//! apkforge only needs the published version (`V:`) and the build timestamp
//! (`t:`) for a given package name (`P:`).

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::config::Config;
use crate::error::{Error, Result};

/// Index file name inside every repository directory.
pub const INDEX_NAME: &str = "APKINDEX.tar.gz";

/// Published metadata of one package on one architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    /// Published version, `pkgver-rpkgrel`.
    pub version: String,
    /// Build timestamp, seconds since epoch.
    pub timestamp: u64,
}

/// Look up `package` in the index at `path`.
///
/// Returns `Ok(None)` when the index does not exist or has no record for
/// the package.
pub fn read(package: &str, path: &Path) -> Result<Option<IndexRecord>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = extract_index(path)?;
    parse_record(&content, package, path)
}

/// Look up `package` in the most relevant existing index for `arch`.
///
/// The local user repository is consulted first, then any distribution
/// indexes cached by apk inside the native chroot. The first index with a
/// record wins.
pub fn read_any_index(config: &Config, package: &str, arch: &str) -> Result<Option<IndexRecord>> {
    for path in candidate_indexes(config, arch)? {
        if let Some(record) = read(package, &path)? {
            return Ok(Some(record));
        }
    }
    Ok(None)
}

fn candidate_indexes(config: &Config, arch: &str) -> Result<Vec<PathBuf>> {
    let mut candidates = vec![config.packages_dir(arch).join(INDEX_NAME)];

    let apk_cache = config.work.join("chroot_native/var/cache/apk");
    if apk_cache.is_dir() {
        let mut cached: Vec<PathBuf> = std::fs::read_dir(&apk_cache)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("APKINDEX.") && n.ends_with(".tar.gz"))
            })
            .collect();
        cached.sort();
        candidates.extend(cached);
    }
    Ok(candidates)
}

/// Pull the APKINDEX member out of the tarball as text.
fn extract_index(path: &Path) -> Result<String> {
    let wrap = |source: std::io::Error| Error::IndexRead {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(wrap)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    for entry in archive.entries().map_err(wrap)? {
        let mut entry = entry.map_err(wrap)?;
        let is_index = entry
            .path()
            .map_err(wrap)?
            .file_name()
            .is_some_and(|n| n == "APKINDEX");
        if is_index {
            let mut content = String::new();
            entry.read_to_string(&mut content).map_err(wrap)?;
            return Ok(content);
        }
    }
    Err(Error::IndexParse {
        path: path.to_path_buf(),
        reason: "no APKINDEX member in archive".to_string(),
    })
}

fn parse_record(content: &str, package: &str, path: &Path) -> Result<Option<IndexRecord>> {
    for block in content.split("\n\n") {
        let mut name = None;
        let mut version = None;
        let mut timestamp = None;
        for line in block.lines() {
            match line.split_once(':') {
                Some(("P", v)) => name = Some(v),
                Some(("V", v)) => version = Some(v),
                Some(("t", v)) => timestamp = Some(v),
                _ => {}
            }
        }
        if name != Some(package) {
            continue;
        }
        let version = version.ok_or_else(|| Error::IndexParse {
            path: path.to_path_buf(),
            reason: format!("record for '{package}' has no V: line"),
        })?;
        let timestamp = timestamp
            .and_then(|t| t.trim().parse().ok())
            .ok_or_else(|| Error::IndexParse {
                path: path.to_path_buf(),
                reason: format!("record for '{package}' has no valid t: line"),
            })?;
        return Ok(Some(IndexRecord {
            version: version.to_string(),
            timestamp,
        }));
    }
    Ok(None)
}
