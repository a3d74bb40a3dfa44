//! Error types for apkforge.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in apkforge operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not find aport for package: {0}")]
    AportNotFound(String),

    #[error("path does not contain an APKBUILD file: {}", .0.display())]
    InvalidPackage(PathBuf),

    #[error("invalid APKBUILD at {}: {reason}", .path.display())]
    ManifestParse { path: PathBuf, reason: String },

    #[error("failed to stage '{package}' into chroot_{suffix}")]
    Staging {
        package: String,
        suffix: String,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to index {arch} repository")]
    Indexing {
        arch: String,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to read index {}", .path.display())]
    IndexRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid index {}: {reason}", .path.display())]
    IndexParse { path: PathBuf, reason: String },

    #[error("expected '<arch>/<file.apk>', got: {0}")]
    NoarchPath(String),

    #[error("could not find 'export JOBS=' line in {}", .0.display())]
    ConfigFormat(PathBuf),

    #[error("failed to configure abuild: {}\nTry to delete the file (or zap the chroot).", .0.display())]
    ConfigSync(PathBuf),

    #[error("failed to execute '{program}'. Is it installed?")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' failed (exit code {code}): {stderr}")]
    CommandFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
