//! Optional config from .pincatrc or ~/.pincatrc (JSON), registry settings from .npmrc.
//! Environment variables override both.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";
pub const DEFAULT_PACKAGE_MANAGER: &str = "pnpm";
pub const DEFAULT_NPM: &str = "npm";

/// How the latest published version of a package is looked up.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Lookup {
    /// `npm view <pkg> version` as a subprocess.
    NpmView,
    /// GET `<registry>/<pkg>/latest`.
    Http,
}

impl Lookup {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "npm" | "npm-view" => Some(Lookup::NpmView),
            "http" | "registry" => Some(Lookup::Http),
            _ => None,
        }
    }
}

/// Effective settings for one run.
#[derive(Clone, Debug)]
pub struct Config {
    pub package_manager: String,
    pub npm: String,
    pub lookup: Lookup,
    pub registry: String,
    pub auth_token: Option<String>,
    pub scoped_registries: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            package_manager: DEFAULT_PACKAGE_MANAGER.to_string(),
            npm: DEFAULT_NPM.to_string(),
            lookup: Lookup::NpmView,
            registry: DEFAULT_REGISTRY.to_string(),
            auth_token: None,
            scoped_registries: HashMap::new(),
        }
    }
}

impl Config {
    /// Registry base URL for a package, honoring `@scope:registry=` entries.
    pub fn registry_for(&self, package: &str) -> &str {
        if package.starts_with('@') {
            if let Some((scope, _)) = package.split_once('/') {
                if let Some(url) = self.scoped_registries.get(scope) {
                    return url;
                }
            }
        }
        &self.registry
    }
}

/// Settings pincat reads from .npmrc.
#[derive(Default, Clone, Debug)]
pub struct NpmRcConfig {
    pub registry: Option<String>,
    pub auth_token: Option<String>,
    pub scoped_registries: HashMap<String, String>,
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Load config from .pincatrc in dir, then ~/.pincatrc, then .npmrc, then env.
/// Missing or invalid files fall back to defaults.
pub fn load_config(dir: &Path) -> Config {
    let mut cfg = Config::default();
    let npmrc = load_npmrc(dir);
    if let Some(r) = npmrc.registry {
        cfg.registry = r;
    }
    cfg.auth_token = npmrc.auth_token;
    cfg.scoped_registries = npmrc.scoped_registries;

    let candidates = [
        Some(dir.join(".pincatrc")),
        home_dir().map(|h| h.join(".pincatrc")),
    ];
    for path in candidates.iter().flatten() {
        if path.is_file() {
            if let Ok(s) = std::fs::read_to_string(path) {
                if let Ok(v) = serde_json::from_str::<serde_json::Value>(&s) {
                    apply_rc(&mut cfg, &v);
                }
            }
            break;
        }
    }

    if let Some(pm) = env_nonempty("PINCAT_PACKAGE_MANAGER") {
        cfg.package_manager = pm;
    }
    if let Some(npm) = env_nonempty("PINCAT_NPM") {
        cfg.npm = npm;
    }
    if let Some(lookup) = env_nonempty("PINCAT_LOOKUP").and_then(|v| Lookup::parse(&v)) {
        cfg.lookup = lookup;
    }
    if let Some(r) = env_nonempty("PINCAT_REGISTRY").or_else(|| env_nonempty("NPM_CONFIG_REGISTRY")) {
        cfg.registry = r.trim_end_matches('/').to_string();
    }
    if let Some(t) = env_nonempty("NPM_TOKEN").or_else(|| env_nonempty("NODE_AUTH_TOKEN")) {
        cfg.auth_token = Some(t);
    }
    cfg
}

fn apply_rc(cfg: &mut Config, v: &serde_json::Value) {
    if let Some(pm) = v.get("packageManager").and_then(|x| x.as_str()) {
        if !pm.trim().is_empty() {
            cfg.package_manager = pm.trim().to_string();
        }
    }
    if let Some(npm) = v.get("npm").and_then(|x| x.as_str()) {
        if !npm.trim().is_empty() {
            cfg.npm = npm.trim().to_string();
        }
    }
    if let Some(lookup) = v.get("lookup").and_then(|x| x.as_str()).and_then(Lookup::parse) {
        cfg.lookup = lookup;
    }
    if let Some(r) = v.get("registry").and_then(|x| x.as_str()) {
        if !r.trim().is_empty() {
            cfg.registry = r.trim().trim_end_matches('/').to_string();
        }
    }
}

fn read_npmrc(path: &Path) -> NpmRcConfig {
    let mut out = NpmRcConfig::default();
    let Ok(s) = std::fs::read_to_string(path) else {
        return out;
    };
    parse_npmrc(&s, &mut out);
    out
}

fn parse_npmrc(s: &str, out: &mut NpmRcConfig) {
    for raw in s.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };
        let key = k.trim();
        let mut value = v.trim().to_string();
        if value.starts_with("${") && value.ends_with('}') && value.len() > 3 {
            let env_key = &value[2..value.len() - 1];
            if let Ok(env_val) = std::env::var(env_key) {
                value = env_val;
            }
        }
        if key == "registry" {
            out.registry = Some(value.trim_end_matches('/').to_string());
            continue;
        }
        if let Some(scope) = key.strip_suffix(":registry") {
            if scope.starts_with('@') && scope.len() > 1 {
                out.scoped_registries
                    .insert(scope.to_string(), value.trim_end_matches('/').to_string());
            }
            continue;
        }
        if key.ends_with(":_authToken") {
            out.auth_token = Some(value);
        }
    }
}

/// Load .npmrc from project then home, with project taking precedence.
pub fn load_npmrc(dir: &Path) -> NpmRcConfig {
    let project = read_npmrc(&dir.join(".npmrc"));
    let home_cfg = home_dir()
        .map(|h| read_npmrc(&h.join(".npmrc")))
        .unwrap_or_default();
    let mut scoped_registries = home_cfg.scoped_registries;
    scoped_registries.extend(project.scoped_registries);
    NpmRcConfig {
        registry: project.registry.or(home_cfg.registry),
        auth_token: project.auth_token.or(home_cfg.auth_token),
        scoped_registries,
    }
}
