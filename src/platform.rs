//! Platform identification and the bundled-binary table.
//!
//! A platform identifier is a short token combining OS family and
//! architecture width (`"win64"`, `"osx64"`, `"linux_aarch64"`, ...). The
//! identifier is the lookup key into the fixed table of bundled ffmpeg
//! builds represented by [`BundledPlatform`]. Detection never fails: hosts
//! without a table entry still get an identifier, it simply maps to no
//! bundled binary.

use crate::system::{Environment, System};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// The platforms for which a bundled ffmpeg build is distributed.
///
/// Each variant knows its identifier token and the filename of the build
/// shipped for it under the `binaries/` directory. The set of variants is
/// the whole bundled-binary table: identifiers produced by
/// [`detect_platform`] that match no variant simply have no bundled build.
///
/// # Extensibility
///
/// This enum is marked `#[non_exhaustive]` so new bundles can be added
/// without a breaking release. Always include a wildcard arm when matching
/// on it.
///
/// # Example
///
/// ```rust
/// use ffmpeg_locator::BundledPlatform;
///
/// for platform in BundledPlatform::all() {
///     println!("{}: {}", platform.identifier(), platform.binary_filename());
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
#[non_exhaustive]
pub enum BundledPlatform {
    /// 32-bit Windows.
    Win32,
    /// 64-bit Windows.
    Win64,
    /// 64-bit macOS.
    Osx64,
    /// 32-bit Linux.
    Linux32,
    /// 64-bit Linux.
    Linux64,
    /// 64-bit ARM Linux.
    LinuxAarch64,
}

impl BundledPlatform {
    /// The identifier token this variant corresponds to.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ffmpeg_locator::BundledPlatform;
    ///
    /// assert_eq!(BundledPlatform::Win64.identifier(), "win64");
    /// assert_eq!(BundledPlatform::LinuxAarch64.identifier(), "linux_aarch64");
    /// ```
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Win32 => "win32",
            Self::Win64 => "win64",
            Self::Osx64 => "osx64",
            Self::Linux32 => "linux32",
            Self::Linux64 => "linux64",
            Self::LinuxAarch64 => "linux_aarch64",
        }
    }

    /// Filename of the bundled ffmpeg build for this platform.
    ///
    /// This is the name expected inside the `binaries/` subdirectory of the
    /// resolver's library directory; the packaging that puts it there is a
    /// separate concern.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ffmpeg_locator::BundledPlatform;
    ///
    /// assert_eq!(
    ///     BundledPlatform::Win64.binary_filename(),
    ///     "ffmpeg-win64-v4.2.2.exe"
    /// );
    /// assert_eq!(
    ///     BundledPlatform::Linux64.binary_filename(),
    ///     "ffmpeg-linux64-v4.2.2"
    /// );
    /// ```
    pub fn binary_filename(&self) -> &'static str {
        match self {
            Self::Win32 => "ffmpeg-win32-v4.2.2.exe",
            Self::Win64 => "ffmpeg-win64-v4.2.2.exe",
            Self::Osx64 => "ffmpeg-osx64-v4.2.2",
            Self::Linux32 => "ffmpeg-linux32-v4.2.2",
            Self::Linux64 => "ffmpeg-linux64-v4.2.2",
            Self::LinuxAarch64 => "ffmpeg-linux_aarch64-v4.2.2",
        }
    }

    /// Iterator over every platform with a bundled build.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as IntoEnumIterator>::iter()
    }

    /// Look up the table entry for an identifier token.
    ///
    /// Unknown identifiers return `None`; resolution treats that as "no
    /// bundled binary for this host" and moves on to the next source.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ffmpeg_locator::BundledPlatform;
    ///
    /// assert_eq!(
    ///     BundledPlatform::from_identifier("osx64"),
    ///     Some(BundledPlatform::Osx64)
    /// );
    /// assert_eq!(BundledPlatform::from_identifier("plan9"), None);
    /// ```
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::all().find(|platform| platform.identifier() == identifier)
    }
}

/// Detect the platform identifier of the running host.
///
/// Reads the OS family and machine architecture from the process
/// environment and always produces a non-empty token, even on hosts with no
/// entry in the bundled-binary table.
///
/// # Example
///
/// ```rust
/// use ffmpeg_locator::detect_platform;
///
/// let identifier = detect_platform();
/// assert!(!identifier.is_empty());
/// ```
pub fn detect_platform() -> String {
    detect_platform_with(&System)
}

/// Detect the platform identifier through an explicit [`Environment`].
///
/// This is the injectable variant of [`detect_platform`], for callers that
/// need deterministic detection in tests or against a recorded host
/// description.
///
/// # Example
///
/// ```rust
/// use ffmpeg_locator::{detect_platform_with, Environment};
///
/// struct Win64Host;
///
/// impl Environment for Win64Host {
///     fn var(&self, _name: &str) -> Option<String> {
///         None
///     }
///     fn os(&self) -> &str {
///         "windows"
///     }
///     fn arch(&self) -> &str {
///         "x86_64"
///     }
/// }
///
/// assert_eq!(detect_platform_with(&Win64Host), "win64");
/// ```
pub fn detect_platform_with(env: &impl Environment) -> String {
    identifier_for(env.os(), env.arch())
}

/// Map an OS family and architecture token to a platform identifier.
fn identifier_for(os: &str, arch: &str) -> String {
    if os.is_empty() {
        return "unknown".to_string();
    }
    let bits = arch_bits(arch);
    match os {
        "windows" => format!("win{bits}"),
        "macos" => format!("osx{bits}"),
        "linux" if arch == "aarch64" => "linux_aarch64".to_string(),
        "linux" => format!("linux{bits}"),
        "freebsd" => format!("freebsd{bits}"),
        // Unrecognized systems keep their OS name as the identifier; the
        // bundled-binary lookup simply finds no entry for it.
        other => other.to_string(),
    }
}

/// Pointer width implied by an architecture token.
fn arch_bits(arch: &str) -> u32 {
    match arch {
        "x86" | "arm" | "mips" | "powerpc" => 32,
        "s390x" => 64,
        _ if arch.ends_with("64") => 64,
        _ => 32,
    }
}
