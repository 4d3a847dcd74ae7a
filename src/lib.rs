//! # ffmpeg-locator
//!
//! Runtime discovery of a usable ffmpeg executable and its reported version.
//!
//! This crate answers two questions for programs that shell out to ffmpeg:
//! which executable should be run on this machine, and what version does it
//! claim to be. Candidates are searched in a fixed priority order covering
//! an explicit override, binaries bundled alongside the application, the
//! active conda or virtualenv prefix, and finally the system search path.
//!
//! ## Features
//!
//! - `locate_ffmpeg()` resolving an executable from four prioritized sources
//! - `ffmpeg_version()` reporting the version token from the `-version` banner
//! - `BundledPlatform` enum identifying the platforms with bundled builds
//! - `Resolver` for wiring explicit host capabilities into deterministic tests
//!
//! ## Example
//!
//! ```rust,no_run
//! use ffmpeg_locator::{ffmpeg_version, locate_ffmpeg};
//!
//! fn main() -> Result<(), ffmpeg_locator::LocateError> {
//!     // Which executable would be run on this machine?
//!     let exe = locate_ffmpeg()?;
//!     println!("ffmpeg at {}", exe.display());
//!
//!     // What does it report as its version?
//!     let version = ffmpeg_version()?;
//!     println!("ffmpeg {version}");
//!     Ok(())
//! }
//! ```

mod error;
mod platform;
mod resolution;
mod resolve;
mod system;

pub use error::{LocateError, ProbeError};
pub use platform::{detect_platform, detect_platform_with, BundledPlatform};
pub use resolve::{ffmpeg_version, locate_ffmpeg, OVERRIDE_ENV, Resolver};
pub use system::{Environment, FileProbe, System, VersionProbe};
