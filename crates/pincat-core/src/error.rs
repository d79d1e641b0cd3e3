//! Error taxonomy for pincat runs.
//! Every variant is fatal: the run aborts and the CLI exits non-zero.
//! Registry lookups are not represented here; they fall back to `*` instead of failing.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Checked before anything is read or written: missing manifest, no packages, bad flag.
    Precondition(String),
    /// A package specifier that could not be split into name and version.
    Specifier { raw: String, reason: String },
    /// Reading, parsing, serializing or writing one of the two documents.
    Document {
        path: String,
        operation: String,
        source: String,
    },
    /// Interactive catalog selection failed (closed input, terminal error).
    Prompt(String),
    /// The package manager could not be started or exited unsuccessfully.
    Install {
        command: String,
        status: Option<i32>,
    },
}

impl CatalogError {
    pub fn document(path: &std::path::Path, operation: &str, source: impl fmt::Display) -> Self {
        CatalogError::Document {
            path: path.display().to_string(),
            operation: operation.to_string(),
            source: source.to_string(),
        }
    }

    /// Short category name, used as a prefix in the log file.
    pub fn category(&self) -> &'static str {
        match self {
            CatalogError::Precondition(_) => "precondition",
            CatalogError::Specifier { .. } => "specifier",
            CatalogError::Document { .. } => "document",
            CatalogError::Prompt(_) => "prompt",
            CatalogError::Install { .. } => "install",
        }
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Precondition(msg) => write!(f, "{}", msg),
            CatalogError::Specifier { raw, reason } => {
                write!(f, "Invalid package specifier \"{}\": {}", raw, reason)
            }
            CatalogError::Document {
                path,
                operation,
                source,
            } => write!(f, "Failed to {} {}: {}", operation, path, source),
            CatalogError::Prompt(msg) => write!(f, "Catalog selection failed: {}", msg),
            CatalogError::Install { command, status } => {
                write!(f, "Failed to install packages with {}", command)?;
                match status {
                    Some(code) => write!(f, " (exit code {}).", code),
                    None => write!(f, "."),
                }
            }
        }
    }
}

impl std::error::Error for CatalogError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn install_error_mentions_command_and_code() {
        let err = CatalogError::Install {
            command: "pnpm".to_string(),
            status: Some(2),
        };
        assert_eq!(
            err.to_string(),
            "Failed to install packages with pnpm (exit code 2)."
        );
        assert_eq!(err.category(), "install");
    }

    #[test]
    fn document_error_names_path_and_operation() {
        let err = CatalogError::document(Path::new("package.json"), "parse", "expected value");
        assert_eq!(
            err.to_string(),
            "Failed to parse package.json: expected value"
        );
    }
}
