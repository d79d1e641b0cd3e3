//! Version resolution: explicit > existing catalog pin > latest from registry > `*`.

use std::fmt;

use crate::catalog::{Bucket, CatalogDocument};
use crate::registry::Registry;
use crate::specifier::PackageSpecifier;

pub const WILDCARD_VERSION: &str = "*";

/// Where a resolved version came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSource {
    /// Typed by the user after `@`.
    Explicit,
    /// Already recorded in the target bucket.
    Pinned,
    /// `^<latest>` from the registry.
    Registry,
    /// Registry lookup failed; the reason is kept for the warning.
    Fallback(String),
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSource::Explicit => f.write_str("explicit"),
            VersionSource::Pinned => f.write_str("catalog"),
            VersionSource::Registry => f.write_str("registry"),
            VersionSource::Fallback(_) => f.write_str("fallback"),
        }
    }
}

/// One package's outcome: drives both document mutations and the final report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub package: String,
    pub bucket: Bucket,
    pub version: String,
    pub source: VersionSource,
}

/// Resolve the version to pin for `spec` in `bucket`.
/// The registry is only consulted when neither an explicit version nor a pin exists.
pub fn resolve_version(
    spec: &PackageSpecifier,
    bucket: &Bucket,
    catalog: &CatalogDocument,
    registry: &dyn Registry,
) -> Resolution {
    let (version, source) = if let Some(v) = spec.version.as_deref() {
        (v.to_string(), VersionSource::Explicit)
    } else if let Some(v) = catalog.pinned(bucket, &spec.name) {
        (v, VersionSource::Pinned)
    } else {
        match registry.latest_version(&spec.name) {
            Ok(latest) => (format!("^{}", latest), VersionSource::Registry),
            Err(e) => (WILDCARD_VERSION.to_string(), VersionSource::Fallback(e)),
        }
    };
    Resolution {
        package: spec.name.clone(),
        bucket: bucket.clone(),
        version,
        source,
    }
}
