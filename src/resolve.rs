//! Executable resolution: the prioritized four-source search.

use crate::error::LocateError;
use crate::platform::detect_platform_with;
use crate::resolution::{bundled_candidate, prefix_candidate, version_token};
use crate::system::{default_lib_dir, Environment, FileProbe, System, VersionProbe};
use std::ffi::OsStr;
use std::path::PathBuf;
use tracing::debug;

/// Environment variable naming an explicit ffmpeg override.
///
/// A non-empty value short-circuits the whole search and is returned
/// verbatim, without any existence or executability check.
pub const OVERRIDE_ENV: &str = "IMAGEIO_FFMPEG_EXE";

/// Environment variables consulted, in order, for the runtime installation
/// prefix of step 3.
const PREFIX_ENVS: [&str; 2] = ["CONDA_PREFIX", "VIRTUAL_ENV"];

/// Bare command name probed on the system search path in step 4.
const SYSTEM_COMMAND: &str = "ffmpeg";

/// Resolves a usable ffmpeg executable from four prioritized sources.
///
/// The search proceeds in order and stops at the first source that yields
/// a usable result:
///
/// 1. The [`OVERRIDE_ENV`] environment variable, returned verbatim when
///    non-empty and trusted unconditionally.
/// 2. A bundled binary for the detected platform under
///    `<lib_dir>/binaries/`, trusted when present on disk.
/// 3. The conventional ffmpeg location inside the active installation
///    prefix (`CONDA_PREFIX` / `VIRTUAL_ENV`), validated by a `-version`
///    invocation.
/// 4. The bare `ffmpeg` command, validated the same way and returned
///    unqualified so the OS performs its own lookup at use time.
///
/// Every call re-runs the search; nothing is cached. A resolver holds no
/// mutable state, so sharing one between threads is safe.
///
/// [`Resolver::new`] observes the live system. For deterministic tests, or
/// hosts that need to be described rather than observed, build one from
/// explicit capabilities with [`Resolver::with_host`].
pub struct Resolver<E = System, F = System, P = System> {
    env: E,
    files: F,
    probe: P,
    lib_dir: Option<PathBuf>,
}

impl Resolver {
    /// Resolver over the live system, with the bundled-binary directory
    /// next to the running executable.
    pub fn new() -> Self {
        Self::with_host(System, System, System)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, F, P> Resolver<E, F, P>
where
    E: Environment,
    F: FileProbe,
    P: VersionProbe,
{
    /// Build a resolver over explicit host capabilities.
    ///
    /// The bundled-binary directory still defaults to the running
    /// executable's directory; override it with
    /// [`with_lib_dir`](Resolver::with_lib_dir) when the test or embedding
    /// keeps binaries elsewhere.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ffmpeg_locator::{Environment, FileProbe, ProbeError, Resolver, VersionProbe};
    /// use std::ffi::OsStr;
    /// use std::path::Path;
    ///
    /// /// A host with no ffmpeg anywhere.
    /// struct BareHost;
    ///
    /// impl Environment for BareHost {
    ///     fn var(&self, _name: &str) -> Option<String> {
    ///         None
    ///     }
    ///     fn os(&self) -> &str {
    ///         "linux"
    ///     }
    ///     fn arch(&self) -> &str {
    ///         "x86_64"
    ///     }
    /// }
    ///
    /// impl FileProbe for BareHost {
    ///     fn is_file(&self, _path: &Path) -> bool {
    ///         false
    ///     }
    /// }
    ///
    /// impl VersionProbe for BareHost {
    ///     fn check(&self, _exe: &OsStr) -> Result<(), ProbeError> {
    ///         Err(ProbeError::NotFound)
    ///     }
    ///     fn banner(&self, _exe: &OsStr) -> Result<Vec<u8>, ProbeError> {
    ///         Err(ProbeError::NotFound)
    ///     }
    /// }
    ///
    /// let resolver = Resolver::with_host(BareHost, BareHost, BareHost);
    /// assert!(resolver.resolve().is_err());
    /// ```
    pub fn with_host(env: E, files: F, probe: P) -> Self {
        Self {
            env,
            files,
            probe,
            lib_dir: default_lib_dir(),
        }
    }

    /// Override the directory whose `binaries/` subdirectory holds the
    /// bundled platform builds.
    pub fn with_lib_dir(mut self, lib_dir: impl Into<PathBuf>) -> Self {
        self.lib_dir = Some(lib_dir.into());
        self
    }

    /// Resolve an executable reference from the four candidate sources.
    ///
    /// Returns the first usable reference, or [`LocateError::NotFound`]
    /// once every source is exhausted. Probe failures inside steps 3 and 4
    /// are expected outcomes and never surface; they only move the search
    /// along.
    pub fn resolve(&self) -> Result<PathBuf, LocateError> {
        // Step 1: explicit override, trusted verbatim.
        if let Some(exe) = self.override_exe() {
            debug!(exe = %exe.display(), "using override executable");
            return Ok(exe);
        }

        // Computed once per call; feeds the bundled lookup and the prefix
        // path shape.
        let identifier = detect_platform_with(&self.env);

        // Step 2: bundled binary, trusted when present on disk.
        if let Some(exe) = self.bundled_exe(&identifier) {
            debug!(exe = %exe.display(), "using bundled executable");
            return Ok(exe);
        }

        // Step 3: environment-managed binary, validated by invocation.
        if let Some(exe) = self.prefix_exe(&identifier) {
            debug!(exe = %exe.display(), "using environment-prefix executable");
            return Ok(exe);
        }

        // Step 4: bare system command, validated by invocation.
        if let Some(exe) = self.system_exe() {
            debug!("using system ffmpeg command");
            return Ok(exe);
        }

        Err(LocateError::NotFound)
    }

    /// Resolve an executable and report the version token from its banner.
    ///
    /// The probe captures standard output, keeps only the first line and
    /// extracts whatever follows the literal `version` token: an opaque
    /// string such as `4.2.1-static`, with no semantic structure checked.
    pub fn version(&self) -> Result<String, LocateError> {
        let exe = self.resolve()?;
        let banner = self
            .probe
            .banner(exe.as_os_str())
            .map_err(|error| LocateError::Probe {
                exe: exe.clone(),
                error,
            })?;
        version_token(&banner)
    }

    /// Step 1. A non-empty override is returned as-is: no existence check,
    /// no invocation. The escape hatch for callers who know better.
    fn override_exe(&self) -> Option<PathBuf> {
        let value = self.env.var(OVERRIDE_ENV)?;
        if value.is_empty() {
            return None;
        }
        Some(PathBuf::from(value))
    }

    /// Step 2. Bundled builds are packaged and verified upstream, so
    /// presence as a regular file is sufficient; they are not invoked.
    fn bundled_exe(&self, identifier: &str) -> Option<PathBuf> {
        let lib_dir = self.lib_dir.as_deref()?;
        let path = bundled_candidate(lib_dir, identifier)?;
        if self.files.is_file(&path) {
            Some(path)
        } else {
            None
        }
    }

    /// First non-empty prefix variable wins; step 3 probes a single prefix.
    fn runtime_prefix(&self) -> Option<PathBuf> {
        PREFIX_ENVS.iter().find_map(|name| {
            self.env
                .var(name)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
    }

    /// Step 3. An externally managed binary is only trusted after a
    /// successful trial invocation; any probe failure rejects the
    /// candidate and the search continues.
    fn prefix_exe(&self, identifier: &str) -> Option<PathBuf> {
        let prefix = self.runtime_prefix()?;
        let path = prefix_candidate(&prefix, identifier);
        if !self.files.is_file(&path) {
            return None;
        }
        match self.probe.check(path.as_os_str()) {
            Ok(()) => Some(path),
            Err(error) => {
                debug!(exe = %path.display(), %error, "environment-prefix candidate rejected");
                None
            }
        }
    }

    /// Step 4. The bare command is returned unqualified so the OS performs
    /// its own lookup again at actual use time.
    fn system_exe(&self) -> Option<PathBuf> {
        match self.probe.check(OsStr::new(SYSTEM_COMMAND)) {
            Ok(()) => Some(PathBuf::from(SYSTEM_COMMAND)),
            Err(error) => {
                debug!(%error, "system ffmpeg command rejected");
                None
            }
        }
    }
}

/// Locate a usable ffmpeg executable on the live system.
///
/// Equivalent to [`Resolver::new`]`.resolve()`; see [`Resolver`] for the
/// search order.
///
/// # Example
///
/// ```rust,no_run
/// match ffmpeg_locator::locate_ffmpeg() {
///     Ok(exe) => println!("ffmpeg at {}", exe.display()),
///     Err(error) => eprintln!("{error}"),
/// }
/// ```
pub fn locate_ffmpeg() -> Result<PathBuf, LocateError> {
    Resolver::new().resolve()
}

/// Report the version of the ffmpeg the live system resolves to.
///
/// # Example
///
/// ```rust,no_run
/// let version = ffmpeg_locator::ffmpeg_version()?;
/// println!("ffmpeg {version}");
/// # Ok::<(), ffmpeg_locator::LocateError>(())
/// ```
pub fn ffmpeg_version() -> Result<String, LocateError> {
    Resolver::new().version()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, HashSet};
    use std::ffi::OsString;
    use std::path::Path;

    const LIB_DIR: &str = "/opt/app";
    const BUNDLED_LINUX64: &str = "/opt/app/binaries/ffmpeg-linux64-v4.2.2";

    #[derive(Default)]
    struct FakeEnv {
        vars: HashMap<String, String>,
        os: &'static str,
        arch: &'static str,
    }

    impl FakeEnv {
        fn linux() -> Self {
            Self {
                vars: HashMap::new(),
                os: "linux",
                arch: "x86_64",
            }
        }

        fn windows() -> Self {
            Self {
                vars: HashMap::new(),
                os: "windows",
                arch: "x86_64",
            }
        }

        fn set(mut self, name: &str, value: &str) -> Self {
            self.vars.insert(name.to_string(), value.to_string());
            self
        }
    }

    impl Environment for FakeEnv {
        fn var(&self, name: &str) -> Option<String> {
            self.vars.get(name).cloned()
        }

        fn os(&self) -> &str {
            self.os
        }

        fn arch(&self) -> &str {
            self.arch
        }
    }

    #[derive(Default)]
    struct FakeFiles {
        present: HashSet<PathBuf>,
        checks: Cell<usize>,
    }

    impl FakeFiles {
        fn with(paths: &[&str]) -> Self {
            Self {
                present: paths.iter().map(PathBuf::from).collect(),
                checks: Cell::new(0),
            }
        }
    }

    impl FileProbe for FakeFiles {
        fn is_file(&self, path: &Path) -> bool {
            self.checks.set(self.checks.get() + 1);
            self.present.contains(path)
        }
    }

    /// Probe double that records every spawn and answers from fixed tables.
    #[derive(Default)]
    struct FakeProbe {
        runnable: HashSet<OsString>,
        denied: HashSet<OsString>,
        banners: HashMap<OsString, Vec<u8>>,
        spawns: RefCell<Vec<OsString>>,
    }

    impl FakeProbe {
        fn accepting(exes: &[&str]) -> Self {
            Self {
                runnable: exes.iter().map(OsString::from).collect(),
                ..Self::default()
            }
        }

        fn denying(mut self, exe: &str) -> Self {
            self.denied.insert(OsString::from(exe));
            self
        }

        fn with_banner(mut self, exe: &str, banner: &[u8]) -> Self {
            self.banners.insert(OsString::from(exe), banner.to_vec());
            self
        }

        fn spawn_count(&self) -> usize {
            self.spawns.borrow().len()
        }

        fn spawned(&self, exe: &str) -> bool {
            self.spawns.borrow().iter().any(|spawned| spawned == exe)
        }
    }

    impl VersionProbe for FakeProbe {
        fn check(&self, exe: &OsStr) -> Result<(), ProbeError> {
            self.spawns.borrow_mut().push(exe.to_os_string());
            if self.runnable.contains(exe) {
                Ok(())
            } else if self.denied.contains(exe) {
                Err(ProbeError::PermissionDenied)
            } else {
                Err(ProbeError::NotFound)
            }
        }

        fn banner(&self, exe: &OsStr) -> Result<Vec<u8>, ProbeError> {
            self.spawns.borrow_mut().push(exe.to_os_string());
            match self.banners.get(exe) {
                Some(bytes) => Ok(bytes.clone()),
                None => Err(ProbeError::NonZeroExit { code: Some(1) }),
            }
        }
    }

    fn resolver(
        env: FakeEnv,
        files: FakeFiles,
        probe: FakeProbe,
    ) -> Resolver<FakeEnv, FakeFiles, FakeProbe> {
        Resolver::with_host(env, files, probe).with_lib_dir(LIB_DIR)
    }

    #[test]
    fn test_override_is_returned_verbatim_without_any_checks() {
        let r = resolver(
            FakeEnv::linux().set(OVERRIDE_ENV, "/not/even/real/ffmpeg"),
            FakeFiles::default(),
            FakeProbe::default(),
        );

        let exe = r.resolve().unwrap();
        assert_eq!(exe, PathBuf::from("/not/even/real/ffmpeg"));
        assert_eq!(r.files.checks.get(), 0, "override must skip the filesystem");
        assert_eq!(r.probe.spawn_count(), 0, "override must not be invoked");
    }

    #[test]
    fn test_override_may_be_an_arbitrary_string() {
        let r = resolver(
            FakeEnv::linux().set(OVERRIDE_ENV, "my-weird-ffmpeg-shim"),
            FakeFiles::default(),
            FakeProbe::default(),
        );
        assert_eq!(r.resolve().unwrap(), PathBuf::from("my-weird-ffmpeg-shim"));
    }

    #[test]
    fn test_empty_override_is_skipped() {
        let r = resolver(
            FakeEnv::linux().set(OVERRIDE_ENV, ""),
            FakeFiles::default(),
            FakeProbe::default(),
        );
        assert!(matches!(r.resolve(), Err(LocateError::NotFound)));
    }

    #[test]
    fn test_unset_override_is_skipped() {
        let r = resolver(FakeEnv::linux(), FakeFiles::default(), FakeProbe::default());
        assert!(matches!(r.resolve(), Err(LocateError::NotFound)));
    }

    #[test]
    fn test_bundled_binary_wins_without_spawning() {
        let r = resolver(
            FakeEnv::linux(),
            FakeFiles::with(&[BUNDLED_LINUX64]),
            FakeProbe::default(),
        );

        let exe = r.resolve().unwrap();
        assert_eq!(exe, PathBuf::from(BUNDLED_LINUX64));
        assert_eq!(r.probe.spawn_count(), 0, "bundled binaries are not probed");
    }

    #[test]
    fn test_bundled_binary_beats_working_prefix_and_system() {
        let r = resolver(
            FakeEnv::linux().set("CONDA_PREFIX", "/conda"),
            FakeFiles::with(&[BUNDLED_LINUX64, "/conda/bin/ffmpeg"]),
            FakeProbe::accepting(&["/conda/bin/ffmpeg", "ffmpeg"]),
        );

        assert_eq!(r.resolve().unwrap(), PathBuf::from(BUNDLED_LINUX64));
        assert_eq!(r.probe.spawn_count(), 0);
    }

    #[test]
    fn test_unknown_platform_skips_bundled_lookup() {
        let env = FakeEnv {
            vars: HashMap::new(),
            os: "plan9",
            arch: "x86_64",
        };
        let r = resolver(env, FakeFiles::default(), FakeProbe::default());

        assert!(matches!(r.resolve(), Err(LocateError::NotFound)));
        assert_eq!(
            r.files.checks.get(),
            0,
            "no table entry means no filesystem check"
        );
    }

    #[test]
    fn test_prefix_candidate_is_validated_then_chosen() {
        let r = resolver(
            FakeEnv::linux().set("CONDA_PREFIX", "/conda"),
            FakeFiles::with(&["/conda/bin/ffmpeg"]),
            FakeProbe::accepting(&["/conda/bin/ffmpeg"]),
        );

        assert_eq!(r.resolve().unwrap(), PathBuf::from("/conda/bin/ffmpeg"));
        assert!(r.probe.spawned("/conda/bin/ffmpeg"));
    }

    #[test]
    fn test_rejected_prefix_candidate_falls_through_to_system() {
        // Present but not executable: the probe is attempted, fails, and
        // the search moves on to the system command.
        let r = resolver(
            FakeEnv::linux().set("CONDA_PREFIX", "/conda"),
            FakeFiles::with(&["/conda/bin/ffmpeg"]),
            FakeProbe::accepting(&["ffmpeg"]).denying("/conda/bin/ffmpeg"),
        );

        assert_eq!(r.resolve().unwrap(), PathBuf::from("ffmpeg"));
        assert!(r.probe.spawned("/conda/bin/ffmpeg"));
        assert!(r.probe.spawned("ffmpeg"));
    }

    #[test]
    fn test_windows_prefix_probes_library_bin_shape() {
        let r = resolver(
            FakeEnv::windows().set("CONDA_PREFIX", "C:/conda"),
            FakeFiles::with(&["C:/conda/Library/bin/ffmpeg.exe"]),
            FakeProbe::accepting(&["C:/conda/Library/bin/ffmpeg.exe"]),
        );

        assert_eq!(
            r.resolve().unwrap(),
            PathBuf::from("C:/conda/Library/bin/ffmpeg.exe")
        );
    }

    #[test]
    fn test_virtual_env_is_the_fallback_prefix() {
        let r = resolver(
            FakeEnv::linux().set("VIRTUAL_ENV", "/venv"),
            FakeFiles::with(&["/venv/bin/ffmpeg"]),
            FakeProbe::accepting(&["/venv/bin/ffmpeg"]),
        );
        assert_eq!(r.resolve().unwrap(), PathBuf::from("/venv/bin/ffmpeg"));
    }

    #[test]
    fn test_only_the_first_prefix_variable_is_probed() {
        // CONDA_PREFIX wins even when only the virtualenv would have an
        // ffmpeg; step 3 probes a single prefix, it does not iterate.
        let r = resolver(
            FakeEnv::linux()
                .set("CONDA_PREFIX", "/conda")
                .set("VIRTUAL_ENV", "/venv"),
            FakeFiles::with(&["/venv/bin/ffmpeg"]),
            FakeProbe::accepting(&["/venv/bin/ffmpeg"]),
        );

        assert!(matches!(r.resolve(), Err(LocateError::NotFound)));
        assert!(!r.probe.spawned("/venv/bin/ffmpeg"));
    }

    #[test]
    fn test_system_command_is_returned_unqualified() {
        let r = resolver(
            FakeEnv::linux(),
            FakeFiles::default(),
            FakeProbe::accepting(&["ffmpeg"]),
        );
        assert_eq!(r.resolve().unwrap(), PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_exhaustion_is_not_found_and_nothing_else() {
        let r = resolver(FakeEnv::linux(), FakeFiles::default(), FakeProbe::default());
        match r.resolve() {
            Err(LocateError::NotFound) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
        // Only the system command was ever spawned.
        assert_eq!(r.probe.spawn_count(), 1);
        assert!(r.probe.spawned("ffmpeg"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let r = resolver(
            FakeEnv::linux().set("CONDA_PREFIX", "/conda"),
            FakeFiles::with(&["/conda/bin/ffmpeg"]),
            FakeProbe::accepting(&["/conda/bin/ffmpeg"]),
        );

        let first = r.resolve().unwrap();
        let second = r.resolve().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_version_extracts_the_banner_token() {
        let r = resolver(
            FakeEnv::linux(),
            FakeFiles::default(),
            FakeProbe::accepting(&["ffmpeg"]).with_banner(
                "ffmpeg",
                b"ffmpeg version 4.2.1-static https://example.invalid/\nbuilt with gcc\n",
            ),
        );

        assert_eq!(r.version().unwrap(), "4.2.1-static");
        // One spawn to validate during resolution, one to read the banner.
        assert_eq!(r.probe.spawn_count(), 2);
    }

    #[test]
    fn test_version_probe_failure_surfaces_with_the_executable() {
        // Resolution succeeds via the override, but the banner probe fails;
        // callers can tell this apart from NotFound.
        let r = resolver(
            FakeEnv::linux().set(OVERRIDE_ENV, "/weird/tool"),
            FakeFiles::default(),
            FakeProbe::default(),
        );

        match r.version() {
            Err(LocateError::Probe { exe, error }) => {
                assert_eq!(exe, PathBuf::from("/weird/tool"));
                assert_eq!(error, ProbeError::NonZeroExit { code: Some(1) });
            }
            other => panic!("expected Probe error, got {other:?}"),
        }
    }

    #[test]
    fn test_version_parse_failure_surfaces() {
        let r = resolver(
            FakeEnv::linux().set(OVERRIDE_ENV, "/weird/tool"),
            FakeFiles::default(),
            FakeProbe::default().with_banner("/weird/tool", b"no token here\n"),
        );
        assert!(matches!(
            r.version(),
            Err(LocateError::VersionParse { .. })
        ));
    }

    #[test]
    fn test_version_passes_resolution_failure_through() {
        let r = resolver(FakeEnv::linux(), FakeFiles::default(), FakeProbe::default());
        assert!(matches!(r.version(), Err(LocateError::NotFound)));
    }
}
