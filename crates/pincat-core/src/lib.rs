//! Core library for pincat: specifiers, catalog/manifest documents, version resolution,
//! catalog selection and install delegation. Used by the CLI binary.

pub mod args;
pub mod catalog;
pub mod config;
pub mod error;
pub mod install;
pub mod manifest;
pub mod registry;
pub mod resolve;
pub mod select;
pub mod session;
pub mod specifier;
pub mod utils;

// Re-export main API for CLI
pub use args::{wants_help_or_version, Invocation};
pub use catalog::{Bucket, CatalogDocument, CATALOG_FILE};
pub use config::{load_config, Config, Lookup};
pub use error::CatalogError;
pub use install::{CommandPackageManager, PackageManager};
pub use manifest::{DependencyKind, Manifest, MANIFEST_FILE};
pub use registry::{HttpRegistry, NpmView, Registry};
pub use resolve::{resolve_version, Resolution, VersionSource, WILDCARD_VERSION};
pub use select::{select_catalog, CatalogPrompt, TerminalPrompt};
pub use session::{apply_resolution, run_add, Collaborators, Project, Reporter};
pub use specifier::PackageSpecifier;
pub use utils::{log, pincat_home};
