//! Shared test utilities for apkforge tests.

use std::fs;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use tempfile::TempDir;

use apkforge::apkindex::INDEX_NAME;
use apkforge::chroot::Runner;
use apkforge::config::Config;
use apkforge::error::{Error, Result};
use apkforge::process::CommandResult;

/// Test environment: a temporary aports tree plus work dir, wired together
/// like a real build chroot where the chroot's packages directory is the
/// host packages directory (here via symlink instead of bind mount).
pub struct TestEnv {
    /// Kept alive for the lifetime of the environment.
    pub _temp_dir: TempDir,
    pub config: Config,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let base = temp_dir.path();

        let config = Config {
            aports: base.join("aports"),
            work: base.join("work"),
            jobs: 4,
            architectures: vec!["x86_64".into(), "armhf".into(), "aarch64".into()],
        };

        fs::create_dir_all(&config.aports).unwrap();
        fs::create_dir_all(config.work.join("packages")).unwrap();

        // chroot_native/home/user/packages/user -> WORK/packages
        let inside = config.work.join("chroot_native/home/user/packages");
        fs::create_dir_all(&inside).unwrap();
        std::os::unix::fs::symlink(config.work.join("packages"), inside.join("user")).unwrap();

        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Create an aport with an APKBUILD and one source file.
    pub fn write_aport(&self, name: &str, pkgver: &str, pkgrel: &str) -> PathBuf {
        let dir = self.config.aports.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("APKBUILD"),
            format!("pkgname={name}\npkgver={pkgver}\npkgrel={pkgrel}\n"),
        )
        .unwrap();
        fs::write(dir.join(format!("{name}.post-install")), "#!/bin/sh\n").unwrap();
        dir
    }

    /// Write a real APKINDEX.tar.gz for an architecture's repository.
    pub fn write_index(&self, arch: &str, entries: &[(&str, &str, u64)]) -> PathBuf {
        let dir = self.config.packages_dir(arch);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(INDEX_NAME);
        write_index_at(&path, entries);
        path
    }

    /// Drop a dummy built artifact into an architecture's repository.
    pub fn write_apk(&self, arch: &str, file_name: &str) -> PathBuf {
        let dir = self.config.packages_dir(arch);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(file_name);
        fs::write(&path, b"not a real apk").unwrap();
        path
    }

    pub fn fake_runner(&self) -> FakeRunner {
        FakeRunner::new(self.config.work.join("chroot_native"))
    }
}

/// Write an APKINDEX.tar.gz with the given (package, version, timestamp)
/// records at an arbitrary path.
pub fn write_index_at(path: &Path, entries: &[(&str, &str, u64)]) {
    let mut content = String::new();
    for (name, version, timestamp) in entries {
        content.push_str(&format!("P:{name}\nV:{version}\nt:{timestamp}\n\n"));
    }

    let file = fs::File::create(path).expect("create index file");
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, "APKINDEX", content.as_bytes())
        .unwrap();
    builder.into_inner().unwrap().finish().unwrap();
}

/// A [`Runner`] that emulates the handful of commands apkforge issues,
/// operating directly on the host filesystem under a fake chroot root.
pub struct FakeRunner {
    /// Host path standing in for the chroot root.
    pub root_dir: PathBuf,
    /// Every invocation, recorded as "user|root|host_root: argv...".
    pub calls: Mutex<Vec<String>>,
    /// Return a failure when this program would run.
    pub fail_program: Option<String>,
    /// Make `sed` report success without changing anything.
    pub sed_is_noop: bool,
}

impl FakeRunner {
    pub fn new(root_dir: PathBuf) -> Self {
        Self {
            root_dir,
            calls: Mutex::new(Vec::new()),
            fail_program: None,
            sed_is_noop: false,
        }
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn resolve(&self, inside: &str) -> PathBuf {
        self.root_dir.join(inside.trim_start_matches('/'))
    }

    fn record(&self, kind: &str, args: &[&str]) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{kind}: {}", args.join(" ")));
    }

    fn check_failure(&self, program: &str) -> Result<()> {
        if self.fail_program.as_deref() == Some(program) {
            return Err(Error::CommandFailed {
                program: program.to_string(),
                code: 1,
                stderr: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn emulate(&self, args: &[&str], working_dir: Option<&str>) -> Result<CommandResult> {
        let cwd = working_dir.map(|wd| self.resolve(wd));
        match args {
            ["sh", "-c", script] if script.starts_with("apk index") => {
                self.check_failure("apk")?;
                emulate_apk_index(script, cwd.as_deref().expect("apk index needs a cwd"));
            }
            ["abuild-sign", _file] => {
                self.check_failure("abuild-sign")?;
            }
            ["ccache", "-s"] => {
                self.check_failure("ccache")?;
                return Ok(CommandResult {
                    stdout: "cache hit rate                      85.00 %\n".to_string(),
                    ..ok_result()
                });
            }
            ["mv", from, to] => {
                self.check_failure("mv")?;
                let cwd = cwd.as_deref().expect("mv needs a cwd");
                fs::rename(cwd.join(from), cwd.join(to))?;
            }
            ["rm", "-rf", path] => {
                self.check_failure("rm")?;
                let target = self.resolve(path);
                if target.exists() {
                    fs::remove_dir_all(&target)?;
                }
            }
            ["chown", "-R", _owner, _path] => {
                self.check_failure("chown")?;
            }
            ["sed", "-i", "-e", expr, file] => {
                self.check_failure("sed")?;
                if !self.sed_is_noop {
                    emulate_sed_jobs(expr, &self.resolve(file));
                }
            }
            other => panic!("FakeRunner: unexpected command {other:?}"),
        }
        Ok(ok_result())
    }
}

impl Runner for FakeRunner {
    fn user(&self, args: &[&str], working_dir: Option<&str>) -> Result<CommandResult> {
        self.record("user", args);
        self.emulate(args, working_dir)
    }

    fn root(&self, args: &[&str], working_dir: Option<&str>) -> Result<CommandResult> {
        self.record("root", args);
        self.emulate(args, working_dir)
    }

    fn host_root(&self, args: &[&str]) -> Result<CommandResult> {
        self.record("host_root", args);
        match args {
            ["cp", "-r", from, to] => {
                self.check_failure("cp")?;
                copy_dir_all(Path::new(from), Path::new(to))?;
            }
            other => panic!("FakeRunner: unexpected host command {other:?}"),
        }
        Ok(ok_result())
    }
}

/// `apk index --output <tmp> --rewrite-arch <arch> *.apk`: write a real
/// index at <tmp> listing every .apk in the directory, versions taken from
/// the `name-pkgver-rN.apk` naming convention.
fn emulate_apk_index(script: &str, cwd: &Path) {
    let tokens: Vec<&str> = script.split_whitespace().collect();
    let output = tokens
        .iter()
        .position(|t| *t == "--output")
        .map(|i| tokens[i + 1])
        .expect("apk index emulation needs --output");

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();

    let mut names: Vec<String> = fs::read_dir(cwd)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|n| n.ends_with(".apk"))
        .collect();
    names.sort();

    let mut entries = Vec::new();
    for file_name in &names {
        let stem = file_name.trim_end_matches(".apk");
        let mut parts = stem.rsplitn(3, '-');
        let rel = parts.next().unwrap();
        let ver = parts.next().unwrap();
        let name = parts.next().unwrap();
        entries.push((name.to_string(), format!("{ver}-{rel}"), now));
    }

    let borrowed: Vec<(&str, &str, u64)> = entries
        .iter()
        .map(|(n, v, t)| (n.as_str(), v.as_str(), *t))
        .collect();
    write_index_at(&cwd.join(output), &borrowed);
}

/// `sed -i -e s/^export JOBS=.*/export JOBS=<n>/ <file>`.
fn emulate_sed_jobs(expr: &str, file: &Path) {
    let replacement = expr
        .find(".*/")
        .map(|i| &expr[i + 3..expr.len() - 1])
        .expect("sed emulation expects s/^...*/.../ form");

    let content = fs::read_to_string(file).unwrap();
    let rewritten: Vec<String> = content
        .lines()
        .map(|line| {
            if line.starts_with("export JOBS=") {
                replacement.to_string()
            } else {
                line.to_string()
            }
        })
        .collect();
    fs::write(file, rewritten.join("\n") + "\n").unwrap();
}

fn copy_dir_all(from: &Path, to: &Path) -> std::io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let dest = to.join(entry.file_name());
        if entry.path().is_dir() {
            copy_dir_all(&entry.path(), &dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

pub fn ok_result() -> CommandResult {
    CommandResult {
        status: ExitStatus::from_raw(0),
        stdout: String::new(),
        stderr: String::new(),
    }
}
