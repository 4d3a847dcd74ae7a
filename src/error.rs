//! Error types for ffmpeg resolution.
//!
//! Two layers mirror the two failure surfaces: [`ProbeError`] describes why a
//! single candidate invocation failed and is recovered internally while the
//! search moves on, while [`LocateError`] is what callers of the public
//! operations actually see.

use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Why a `-version` probe of one candidate executable failed.
///
/// During the prefix and system-command steps of resolution these are
/// expected outcomes, not errors: the candidate is rejected and the search
/// continues. The same kinds surface to callers through
/// [`LocateError::Probe`] when the probe belongs to the version report
/// itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProbeError {
    /// The executable does not exist (or, for a bare command name, is not
    /// on the search path).
    #[error("executable not found")]
    NotFound,

    /// The file exists but the operating system refused to execute it.
    #[error("permission denied")]
    PermissionDenied,

    /// The executable ran but exited with a non-zero status.
    #[error("exited with code {code:?}")]
    NonZeroExit {
        /// Exit code reported by the process, if any.
        code: Option<i32>,
    },

    /// Any other I/O failure while spawning or collecting output.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the underlying I/O failure.
        message: String,
    },
}

impl ProbeError {
    /// Classify a spawn failure into a stable probe outcome.
    pub(crate) fn from_spawn(error: &std::io::Error) -> Self {
        match error.kind() {
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::Io {
                message: error.to_string(),
            },
        }
    }
}

/// Errors surfaced by [`locate_ffmpeg`](crate::locate_ffmpeg),
/// [`ffmpeg_version`](crate::ffmpeg_version) and the corresponding
/// [`Resolver`](crate::Resolver) methods.
///
/// `NotFound` means resolution itself failed; the other variants mean an
/// executable was resolved but its version banner could not be obtained or
/// understood. Callers that only need *an* ffmpeg can treat the latter two
/// as non-fatal.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LocateError {
    /// Every candidate source was exhausted without producing a usable
    /// executable.
    #[error(
        "no ffmpeg executable was found; install ffmpeg or set the \
         IMAGEIO_FFMPEG_EXE environment variable"
    )]
    NotFound,

    /// The resolved executable could not be queried for its version.
    #[error("could not query {exe:?} for its version: {error}")]
    Probe {
        /// The executable reference that was being probed.
        exe: PathBuf,
        /// What went wrong with the probe.
        error: ProbeError,
    },

    /// The banner's first line did not contain a version token.
    #[error("no version token in ffmpeg banner line {line:?}")]
    VersionParse {
        /// The decoded first line of the banner, kept for diagnostics.
        line: String,
    },
}
