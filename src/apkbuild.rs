//! APKBUILD manifest reading.
//!
//! APKBUILDs are shell scripts, but the metadata apkforge needs (pkgname,
//! pkgver, pkgrel, subpackages) is declared as plain variable assignments
//! in every aport. This reader handles exactly those assignment lines; it
//! does not evaluate shell, so aports computing their metadata at runtime
//! are not supported.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Manifest file name inside every aport directory.
pub const MANIFEST_NAME: &str = "APKBUILD";

/// Metadata of one source package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apkbuild {
    pub pkgname: String,
    pub pkgver: String,
    pub pkgrel: String,
    /// Additional package names this aport produces.
    pub subpackages: Vec<String>,
}

impl Apkbuild {
    /// Parse an APKBUILD file.
    pub fn parse(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let vars = assignments(&content);

        let required = |key: &str| -> Result<String> {
            vars.get(key).cloned().ok_or_else(|| Error::ManifestParse {
                path: path.to_path_buf(),
                reason: format!("missing {key}= assignment"),
            })
        };

        let subpackages = vars
            .get("subpackages")
            .map(|value| {
                value
                    .split_whitespace()
                    // entries may carry ":splitfunc[:arch]" suffixes
                    .map(|s| s.split(':').next().unwrap_or(s).to_string())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            pkgname: required("pkgname")?,
            pkgver: required("pkgver")?,
            pkgrel: required("pkgrel")?,
            subpackages,
        })
    }

    /// Full version as published in an index: `pkgver-rpkgrel`.
    pub fn version(&self) -> String {
        format!("{}-r{}", self.pkgver, self.pkgrel)
    }
}

/// Collect top-level `key=value` assignment lines.
fn assignments(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            continue;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or(value);
        vars.insert(key.to_string(), value.to_string());
    }
    vars
}
