//! Host capabilities behind the resolver.
//!
//! Resolution observes the host through three narrow traits: environment
//! variables and OS/arch identity ([`Environment`]), regular-file checks
//! ([`FileProbe`]), and `-version` trial invocations ([`VersionProbe`]).
//! [`System`] implements all three over the live process; tests substitute
//! their own implementations instead of mutating real environment variables
//! or touching disk.

use crate::error::ProbeError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Flag passed to every candidate executable when probing it.
const VERSION_ARG: &str = "-version";

/// Read-only view of the process environment.
pub trait Environment {
    /// Value of an environment variable, `None` when unset (or not
    /// representable as Unicode).
    fn var(&self, name: &str) -> Option<String>;

    /// OS family name, e.g. `"linux"`, `"windows"`, `"macos"`.
    fn os(&self) -> &str;

    /// Machine architecture token, e.g. `"x86_64"`, `"aarch64"`.
    fn arch(&self) -> &str;
}

/// Filesystem probing used to qualify candidate paths.
pub trait FileProbe {
    /// Whether `path` exists and is a regular file (following symlinks).
    fn is_file(&self, path: &Path) -> bool;
}

/// A single trial invocation of a candidate executable.
///
/// Both methods run the executable with `-version` and wait for it to
/// exit. [`check`](VersionProbe::check) discards all output and only
/// reports whether the invocation succeeded; [`banner`](VersionProbe::banner)
/// captures standard output for version extraction. Implementations must
/// spawn at most one child process per call and reap it on every path.
pub trait VersionProbe {
    /// Run `exe -version`, discarding all output.
    fn check(&self, exe: &OsStr) -> Result<(), ProbeError>;

    /// Run `exe -version`, returning the raw bytes of standard output.
    fn banner(&self, exe: &OsStr) -> Result<Vec<u8>, ProbeError>;
}

/// Live host: the real environment, filesystem, and process spawner.
#[derive(Debug, Clone, Copy, Default)]
pub struct System;

impl Environment for System {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn os(&self) -> &str {
        std::env::consts::OS
    }

    fn arch(&self) -> &str {
        std::env::consts::ARCH
    }
}

impl FileProbe for System {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

impl VersionProbe for System {
    fn check(&self, exe: &OsStr) -> Result<(), ProbeError> {
        let status = Command::new(exe)
            .arg(VERSION_ARG)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|error| ProbeError::from_spawn(&error))?;
        if status.success() {
            Ok(())
        } else {
            Err(ProbeError::NonZeroExit {
                code: status.code(),
            })
        }
    }

    fn banner(&self, exe: &OsStr) -> Result<Vec<u8>, ProbeError> {
        let output = Command::new(exe)
            .arg(VERSION_ARG)
            .output()
            .map_err(|error| ProbeError::from_spawn(&error))?;
        if !output.status.success() {
            return Err(ProbeError::NonZeroExit {
                code: output.status.code(),
            });
        }
        Ok(output.stdout)
    }
}

/// Default directory for the bundled `binaries/` tree: alongside the
/// running executable.
pub(crate) fn default_lib_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    exe.parent().map(Path::to_path_buf)
}
