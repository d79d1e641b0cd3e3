//! Latest-version lookup against the npm registry.
//! Default is `npm view <pkg> version` as a subprocess; `lookup: "http"` reads `<registry>/<pkg>/latest`.
//! Failures are returned as strings: the resolver turns them into a `*` pin, never an abort.

use std::process::{Command, Stdio};

use crate::config::{Config, Lookup};

/// Narrow seam over the registry so resolution can be tested without a network.
pub trait Registry {
    /// Latest published version of `package`, e.g. `2.3.4`.
    fn latest_version(&self, package: &str) -> Result<String, String>;
}

/// Validate and normalize a version string returned by the registry.
fn parse_latest(package: &str, raw: &str) -> Result<String, String> {
    let v = raw.trim().trim_matches(|c| c == '\'' || c == '"');
    if v.is_empty() {
        return Err(format!("registry returned no version for {}", package));
    }
    semver::Version::parse(v)
        .map(|parsed| parsed.to_string())
        .map_err(|e| format!("registry returned invalid version \"{}\" for {}: {}", v, package, e))
}

/// Read `version` from a `<pkg>/latest` manifest body.
fn version_from_body(package: &str, body: &str) -> Result<String, String> {
    let v: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| format!("invalid manifest for {}@latest: {}", package, e))?;
    let version = v
        .get("version")
        .and_then(|x| x.as_str())
        .ok_or_else(|| format!("No version in manifest for {}@latest", package))?;
    parse_latest(package, version)
}

/// `npm view <pkg> version`.
pub struct NpmView {
    pub program: String,
}

impl NpmView {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Registry for NpmView {
    fn latest_version(&self, package: &str) -> Result<String, String> {
        let out = Command::new(&self.program)
            .args(["view", package, "version"])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| format!("{} view: {}", self.program, e))?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let first = stderr.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
            return Err(match out.status.code() {
                Some(code) => format!("{} view exited with {}: {}", self.program, code, first),
                None => format!("{} view was terminated: {}", self.program, first),
            });
        }
        let stdout = String::from_utf8_lossy(&out.stdout);
        // Multi-line output happens when a range matches several versions; take the last.
        let line = stdout.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
        let line = line.rsplit(' ').next().unwrap_or(line);
        parse_latest(package, line)
    }
}

/// GET `<registry>/<pkg>/latest` and read its `version` field.
pub struct HttpRegistry {
    config: Config,
}

impl HttpRegistry {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn url(&self, package: &str) -> String {
        let path = if package.starts_with('@') {
            package.replace('/', "%2F")
        } else {
            package.to_string()
        };
        format!(
            "{}/{}/latest",
            self.config.registry_for(package).trim_end_matches('/'),
            path
        )
    }
}

impl Registry for HttpRegistry {
    fn latest_version(&self, package: &str) -> Result<String, String> {
        let url = self.url(package);
        let mut req = ureq::get(&url).set("Accept", "application/json");
        if let Some(token) = self.config.auth_token.as_deref().filter(|t| !t.is_empty()) {
            req = req.set("Authorization", &format!("Bearer {}", token));
        }
        let body = match req.call() {
            Ok(resp) => resp.into_string().map_err(|e| format!("{}: {}", url, e))?,
            Err(ureq::Error::Status(code, _)) => {
                return Err(format!("{} responded with HTTP {}", url, code))
            }
            Err(e) => return Err(format!("{}: {}", url, e)),
        };
        version_from_body(package, &body)
    }
}

/// Registry lookup selected by config.
pub fn from_config(config: &Config) -> Box<dyn Registry> {
    match config.lookup {
        Lookup::NpmView => Box::new(NpmView::new(config.npm.clone())),
        Lookup::Http => Box::new(HttpRegistry::new(config.clone())),
    }
}
