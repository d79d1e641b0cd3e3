//! pnpm-workspace.yaml as a catalog document.
//! `catalog` holds the default bucket; `catalogs.<name>` holds named buckets.
//! Keys pincat does not manage (`packages`, build settings, ...) are kept as-is, in order.

use std::fmt;
use std::fs;
use std::path::Path;

use serde_yaml_ng::{Mapping, Value};

use crate::error::CatalogError;

pub const CATALOG_FILE: &str = "pnpm-workspace.yaml";

const DEFAULT_NAME: &str = "default";
const CATALOG_KEY: &str = "catalog";
const CATALOGS_KEY: &str = "catalogs";

/// Where a package's pin lives: the unnamed default catalog or a named one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Bucket {
    Default,
    Named(String),
}

impl Bucket {
    /// `default` always means the unnamed catalog.
    pub fn from_name(name: &str) -> Self {
        if name == DEFAULT_NAME {
            Bucket::Default
        } else {
            Bucket::Named(name.to_string())
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Bucket::Default => DEFAULT_NAME,
            Bucket::Named(n) => n,
        }
    }

    /// The dependency value written into package.json for this bucket.
    pub fn reference(&self) -> String {
        match self {
            Bucket::Default => "catalog:".to_string(),
            Bucket::Named(n) => format!("catalog:{}", n),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogDocument {
    root: Mapping,
}

fn key(s: &str) -> Value {
    Value::String(s.to_string())
}

impl CatalogDocument {
    /// Parse YAML text. Empty or `null` content is an empty document.
    pub fn from_yaml(text: &str) -> Result<Self, String> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_yaml_ng::from_str(text).map_err(|e| e.to_string())?;
        match value {
            Value::Null => Ok(Self::default()),
            Value::Mapping(root) => Ok(Self { root }),
            _ => Err("top level must be a mapping".to_string()),
        }
    }

    /// Load from disk; a missing file is an empty document (created on save).
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|e| CatalogError::document(path, "read", e))?;
        Self::from_yaml(&text).map_err(|e| CatalogError::document(path, "parse", e))
    }

    pub fn to_yaml(&self) -> Result<String, String> {
        if self.root.is_empty() {
            return Ok(String::new());
        }
        serde_yaml_ng::to_string(&self.root).map_err(|e| e.to_string())
    }

    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let text = self
            .to_yaml()
            .map_err(|e| CatalogError::document(path, "serialize", e))?;
        fs::write(path, text).map_err(|e| CatalogError::document(path, "write", e))
    }

    /// Names of the named catalogs, in document order.
    pub fn catalog_names(&self) -> Vec<String> {
        self.root
            .get(CATALOGS_KEY)
            .and_then(Value::as_mapping)
            .map(|m| {
                m.keys()
                    .filter_map(|k| k.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn bucket_map(&self, bucket: &Bucket) -> Option<&Mapping> {
        match bucket {
            Bucket::Default => self.root.get(CATALOG_KEY)?.as_mapping(),
            Bucket::Named(name) => self
                .root
                .get(CATALOGS_KEY)?
                .as_mapping()?
                .get(name.as_str())?
                .as_mapping(),
        }
    }

    /// Version recorded for `package` in `bucket`, if any.
    /// Unquoted numbers come back in YAML's number form: `foo: 2` reads as `2`,
    /// `foo: 1.10` as the float `1.1`.
    pub fn pinned(&self, bucket: &Bucket, package: &str) -> Option<String> {
        match self.bucket_map(bucket)?.get(package)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Set `bucket[package] = version`, creating the bucket (and `catalogs`) if needed.
    /// A non-mapping value in the way is replaced.
    pub fn pin(&mut self, bucket: &Bucket, package: &str, version: &str) {
        let map = match bucket {
            Bucket::Default => ensure_mapping(&mut self.root, CATALOG_KEY),
            Bucket::Named(name) => {
                let catalogs = ensure_mapping(&mut self.root, CATALOGS_KEY);
                ensure_mapping(catalogs, name)
            }
        };
        map.insert(key(package), key(version));
    }
}

fn ensure_mapping<'a>(parent: &'a mut Mapping, name: &str) -> &'a mut Mapping {
    let slot = parent
        .entry(key(name))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if !slot.is_mapping() {
        *slot = Value::Mapping(Mapping::new());
    }
    match slot {
        Value::Mapping(m) => m,
        _ => unreachable!("slot was just set to a mapping"),
    }
}
