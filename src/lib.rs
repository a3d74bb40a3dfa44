//! apkforge library exports.
//!
//! The binary in `main.rs` is a thin CLI over these modules; integration
//! tests drive them directly.

pub mod apkbuild;
pub mod apkindex;
pub mod aports;
pub mod ccache;
pub mod chroot;
pub mod config;
pub mod error;
pub mod jobs;
pub mod process;
pub mod repo;
pub mod staleness;
pub mod version;

pub use error::{Error, Result};
