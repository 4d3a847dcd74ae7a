//! Version-token extraction from ffmpeg banner output.

use crate::error::LocateError;
use regex::Regex;

/// Locates the literal `version` token and captures the whitespace-delimited
/// token that follows it.
const VERSION_PATTERN: &str = r"version\s*(\S+)";

/// Extract the version token from raw `-version` output.
///
/// Only the first line of the banner is considered, cut at the first `\n`
/// byte before decoding so that undecodable bytes elsewhere in the output
/// cannot break extraction; bytes on the first line itself are decoded
/// lossily. The token is whatever follows the first occurrence of
/// `version`, e.g. `4.2.1-static` or `N-12345-g0123abc`; no semantic
/// version structure is required or checked.
///
/// A first line without a `version` token (or with nothing after it) is a
/// [`LocateError::VersionParse`].
pub(crate) fn version_token(banner: &[u8]) -> Result<String, LocateError> {
    let first_line = banner
        .split(|&byte| byte == b'\n')
        .next()
        .unwrap_or_default();
    let line = String::from_utf8_lossy(first_line);
    let line = line.trim();

    let pattern = Regex::new(VERSION_PATTERN).expect("Invalid version pattern");
    pattern
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str().to_string())
        .ok_or_else(|| LocateError::VersionParse {
            line: line.to_string(),
        })
}
