//! package.json as a manifest document: only `dependencies` / `devDependencies` are touched.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::CatalogError;

pub const MANIFEST_FILE: &str = "package.json";

/// Which dependency map of package.json receives the catalog reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    Prod,
    Dev,
}

impl DependencyKind {
    pub fn from_dev_flag(dev: bool) -> Self {
        if dev {
            DependencyKind::Dev
        } else {
            DependencyKind::Prod
        }
    }

    pub fn field(self) -> &'static str {
        match self {
            DependencyKind::Prod => "dependencies",
            DependencyKind::Dev => "devDependencies",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    root: Map<String, Value>,
}

impl Manifest {
    pub fn from_json(text: &str) -> Result<Self, String> {
        let v: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
        match v {
            Value::Object(root) => Ok(Self { root }),
            _ => Err("top level must be an object".to_string()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let s = fs::read_to_string(path).map_err(|e| CatalogError::document(path, "read", e))?;
        Self::from_json(&s).map_err(|e| CatalogError::document(path, "parse", e))
    }

    /// Pretty-printed with 2-space indent and a trailing newline.
    pub fn to_json(&self) -> Result<String, String> {
        let mut s = serde_json::to_string_pretty(&self.root).map_err(|e| e.to_string())?;
        s.push('\n');
        Ok(s)
    }

    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let s = self
            .to_json()
            .map_err(|e| CatalogError::document(path, "serialize", e))?;
        fs::write(path, s).map_err(|e| CatalogError::document(path, "write", e))
    }

    pub fn dependency(&self, kind: DependencyKind, name: &str) -> Option<&str> {
        self.root
            .get(kind.field())
            .and_then(|d| d.as_object())
            .and_then(|d| d.get(name))
            .and_then(|v| v.as_str())
    }

    /// Set `<kind>[name] = spec`, creating the map when absent or not an object.
    pub fn set_dependency(&mut self, kind: DependencyKind, name: &str, spec: &str) {
        let slot = self
            .root
            .entry(kind.field())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        if let Some(deps) = slot.as_object_mut() {
            deps.insert(name.to_string(), Value::String(spec.to_string()));
        }
    }
}
