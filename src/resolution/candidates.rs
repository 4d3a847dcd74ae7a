//! Candidate path construction for the bundled and prefix sources.

use crate::platform::BundledPlatform;
use std::path::{Path, PathBuf};

/// Subdirectory of the library directory that holds bundled builds.
const BINARIES_SUBDIR: &str = "binaries";

/// Bundled-build path for `identifier` under `lib_dir`.
///
/// `None` when the platform has no entry in the bundled-binary table,
/// which is a normal outcome for unrecognized hosts.
pub(crate) fn bundled_candidate(lib_dir: &Path, identifier: &str) -> Option<PathBuf> {
    let platform = BundledPlatform::from_identifier(identifier)?;
    Some(
        lib_dir
            .join(BINARIES_SUBDIR)
            .join(platform.binary_filename()),
    )
}

/// Conventional location of an environment-managed ffmpeg under an
/// installation prefix.
///
/// Windows-family prefixes keep binaries under `Library\bin`; everything
/// else uses `bin`. The family is decided by the platform identifier so
/// that an injected environment fully controls the shape.
pub(crate) fn prefix_candidate(prefix: &Path, identifier: &str) -> PathBuf {
    if identifier.starts_with("win") {
        prefix.join("Library").join("bin").join("ffmpeg.exe")
    } else {
        prefix.join("bin").join("ffmpeg")
    }
}
