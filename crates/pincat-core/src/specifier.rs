//! Package specifiers as typed on the command line: `left-pad`, `left-pad@1.2.0`, `@scope/name@^2`.

use std::fmt;

use crate::error::CatalogError;

const MAX_NAME_LEN: usize = 214;

/// A package name plus the version text the user typed after `@`, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpecifier {
    pub name: String,
    pub version: Option<String>,
}

impl fmt::Display for PackageSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}@{}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

fn invalid(raw: &str, reason: &str) -> CatalogError {
    CatalogError::Specifier {
        raw: raw.to_string(),
        reason: reason.to_string(),
    }
}

fn valid_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')
}

fn check_segment(raw: &str, segment: &str, what: &str) -> Result<(), CatalogError> {
    if segment.is_empty() {
        return Err(invalid(raw, &format!("{} is empty", what)));
    }
    if segment.starts_with('.') || segment.starts_with('_') {
        return Err(invalid(raw, &format!("{} cannot start with '.' or '_'", what)));
    }
    if let Some(c) = segment.chars().find(|c| !valid_name_char(*c)) {
        return Err(invalid(raw, &format!("{} contains invalid character '{}'", what, c)));
    }
    Ok(())
}

/// Split a raw token into name and optional version.
/// The scope's leading `@` is never taken as the version separator.
pub fn parse(raw: &str) -> Result<PackageSpecifier, CatalogError> {
    if raw.is_empty() {
        return Err(invalid(raw, "empty specifier"));
    }
    if raw.chars().any(char::is_whitespace) {
        return Err(invalid(raw, "specifier contains whitespace"));
    }

    let (name, version) = if let Some(rest) = raw.strip_prefix('@') {
        let Some((scope, tail)) = rest.split_once('/') else {
            return Err(invalid(raw, "scoped package must look like @scope/name"));
        };
        check_segment(raw, scope, "scope")?;
        let (pkg, version) = match tail.split_once('@') {
            Some((pkg, v)) => (pkg, Some(v)),
            None => (tail, None),
        };
        check_segment(raw, pkg, "package name")?;
        (format!("@{}/{}", scope, pkg), version)
    } else {
        let (pkg, version) = match raw.split_once('@') {
            Some((pkg, v)) => (pkg, Some(v)),
            None => (raw, None),
        };
        if pkg.contains('/') || pkg.contains(':') {
            return Err(invalid(raw, "paths, URLs and git specifiers are not registry packages"));
        }
        check_segment(raw, pkg, "package name")?;
        (pkg.to_string(), version)
    };

    if name.len() > MAX_NAME_LEN {
        return Err(invalid(raw, "package name is longer than 214 characters"));
    }
    if version == Some("") {
        return Err(invalid(raw, "version after '@' is empty"));
    }

    Ok(PackageSpecifier {
        name,
        version: version.map(String::from),
    })
}

/// Parse every token, stopping at the first malformed one.
pub fn parse_all(raws: &[String]) -> Result<Vec<PackageSpecifier>, CatalogError> {
    raws.iter().map(|r| parse(r)).collect()
}
