//! Release version comparison.
//!
//! Versions compare as numeric `(major, minor, patch)` tuples. Pre-release
//! and build suffixes are parsed but ignored, so `1.3.0-beta.2` equals
//! `1.3.0`. Missing components count as zero and a leading `v` is accepted.

use std::cmp::Ordering;

use semver::Version;

use crate::error::UpdateError;

/// Parse a release tag into its numeric core.
pub fn parse_version(raw: &str) -> Result<(u64, u64, u64), UpdateError> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);

    let split = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(split);

    let parts = core.split('.').count();
    let padded = match parts {
        1 => format!("{core}.0.0{suffix}"),
        2 => format!("{core}.0{suffix}"),
        _ => trimmed.to_string(),
    };

    let version =
        Version::parse(&padded).map_err(|_| UpdateError::InvalidVersion(raw.to_string()))?;
    Ok((version.major, version.minor, version.patch))
}

/// Order `candidate` relative to `current`: `Greater` means newer.
pub fn compare_versions(candidate: &str, current: &str) -> Result<Ordering, UpdateError> {
    Ok(parse_version(candidate)?.cmp(&parse_version(current)?))
}
