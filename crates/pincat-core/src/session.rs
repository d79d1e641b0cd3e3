//! One `pincat` run: validate, parse, then per package select/resolve/mutate,
//! then persist both documents once and hand over to the package manager.
//! No rollback: documents written before a failed install stay written.

use std::path::{Path, PathBuf};

use crate::args::Invocation;
use crate::catalog::{CatalogDocument, CATALOG_FILE};
use crate::error::CatalogError;
use crate::install::PackageManager;
use crate::manifest::{DependencyKind, Manifest, MANIFEST_FILE};
use crate::registry::Registry;
use crate::resolve::{resolve_version, Resolution, VersionSource};
use crate::select::{select_catalog, CatalogPrompt};
use crate::specifier;
use crate::utils;

/// Progress and outcome feedback. Purely observational.
pub trait Reporter {
    /// About to resolve the version of `package`.
    fn resolving(&mut self, package: &str);
    /// Resolved from an explicit version, a pin, or the registry.
    fn resolved(&mut self, resolution: &Resolution);
    /// Registry lookup failed; `*` was pinned instead.
    fn fell_back(&mut self, resolution: &Resolution, reason: &str);
    /// Called once per package after the package manager succeeded.
    fn installed(&mut self, resolution: &Resolution);
}

/// The external services a run talks to.
pub struct Collaborators<'a> {
    pub registry: &'a dyn Registry,
    pub prompt: &'a mut dyn CatalogPrompt,
    pub package_manager: &'a dyn PackageManager,
    pub reporter: &'a mut dyn Reporter,
}

/// The project directory holding package.json and pnpm-workspace.yaml.
#[derive(Debug, Clone)]
pub struct Project {
    dir: PathBuf,
}

impl Project {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.dir.join(CATALOG_FILE)
    }
}

/// Record a resolution in both documents: the version goes into the bucket,
/// the bucket's catalog reference goes into the chosen dependency map.
pub fn apply_resolution(
    resolution: &Resolution,
    catalog: &mut CatalogDocument,
    manifest: &mut Manifest,
    kind: DependencyKind,
) {
    catalog.pin(&resolution.bucket, &resolution.package, &resolution.version);
    manifest.set_dependency(kind, &resolution.package, &resolution.bucket.reference());
}

/// Run the whole add workflow. Returns the resolutions in input order.
pub fn run_add(
    project: &Project,
    invocation: &Invocation,
    with: Collaborators<'_>,
) -> Result<Vec<Resolution>, CatalogError> {
    let Collaborators {
        registry,
        prompt,
        package_manager,
        reporter,
    } = with;

    let manifest_path = project.manifest_path();
    if !manifest_path.is_file() {
        return Err(CatalogError::Precondition(
            "package.json not found in current directory, please run this command in the root of your project: pnpm init"
                .to_string(),
        ));
    }
    if invocation.packages.is_empty() {
        return Err(CatalogError::Precondition(
            "Please specify packages to install".to_string(),
        ));
    }

    let specs = specifier::parse_all(&invocation.packages)?;

    let catalog_path = project.catalog_path();
    let mut catalog = CatalogDocument::load(&catalog_path)?;
    let mut manifest = Manifest::load(&manifest_path)?;
    let kind = DependencyKind::from_dev_flag(invocation.dev);

    utils::log(&format!(
        "Adding {} package(s) to {} in {}",
        specs.len(),
        kind.field(),
        project.dir().display()
    ));

    let mut resolutions = Vec::with_capacity(specs.len());
    for spec in &specs {
        let bucket = select_catalog(invocation.catalog.as_deref(), &spec.name, &catalog, prompt)?;
        reporter.resolving(&spec.name);
        let resolution = resolve_version(spec, &bucket, &catalog, registry);
        match &resolution.source {
            VersionSource::Fallback(reason) => {
                utils::log(&format!(
                    "Failed to get {} version ({}), using {}",
                    resolution.package, reason, resolution.version
                ));
                reporter.fell_back(&resolution, reason);
            }
            source => {
                utils::log(&format!(
                    "Resolved {}@{} from {} into catalog {}",
                    resolution.package, resolution.version, source, resolution.bucket
                ));
                reporter.resolved(&resolution);
            }
        }
        apply_resolution(&resolution, &mut catalog, &mut manifest, kind);
        resolutions.push(resolution);
    }

    catalog.save(&catalog_path)?;
    manifest.save(&manifest_path)?;
    utils::log(&format!(
        "Wrote {} and {}",
        catalog_path.display(),
        manifest_path.display()
    ));

    let command = package_manager.name().to_string();
    match package_manager.add(&invocation.passthrough) {
        Ok(Some(0)) => {}
        Ok(status) => {
            utils::log(&format!("{} add exited with {:?}", command, status));
            return Err(CatalogError::Install { command, status });
        }
        Err(e) => {
            utils::log(&e);
            return Err(CatalogError::Install {
                command,
                status: None,
            });
        }
    }

    for resolution in &resolutions {
        reporter.installed(resolution);
    }
    Ok(resolutions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Bucket;
    use std::cell::RefCell;
    use std::fs;

    struct FakeRegistry(Result<String, String>);

    impl Registry for FakeRegistry {
        fn latest_version(&self, _: &str) -> Result<String, String> {
            self.0.clone()
        }
    }

    struct ScriptedPrompt {
        answers: Vec<Bucket>,
        asked: Vec<(String, Vec<String>)>,
    }

    impl CatalogPrompt for ScriptedPrompt {
        fn choose(&mut self, package: &str, existing: &[String]) -> Result<Bucket, CatalogError> {
            self.asked.push((package.to_string(), existing.to_vec()));
            if self.answers.is_empty() {
                return Err(CatalogError::Prompt("no more answers".to_string()));
            }
            Ok(self.answers.remove(0))
        }
    }

    struct FakePm {
        exit: Option<i32>,
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl FakePm {
        fn exiting(exit: Option<i32>) -> Self {
            Self {
                exit,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl PackageManager for FakePm {
        fn name(&self) -> &str {
            "pnpm"
        }

        fn add(&self, args: &[String]) -> Result<Option<i32>, String> {
            self.calls.borrow_mut().push(args.to_vec());
            Ok(self.exit)
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl Reporter for Recorder {
        fn resolving(&mut self, package: &str) {
            self.events.push(format!("resolving {}", package));
        }
        fn resolved(&mut self, r: &Resolution) {
            self.events.push(format!("resolved {}@{}", r.package, r.version));
        }
        fn fell_back(&mut self, r: &Resolution, _: &str) {
            self.events.push(format!("fallback {}@{}", r.package, r.version));
        }
        fn installed(&mut self, r: &Resolution) {
            self.events.push(format!("installed {}@{} {}", r.package, r.version, r.bucket));
        }
    }

    struct Fixture {
        _td: tempfile::TempDir,
        project: Project,
    }

    fn fixture(manifest: Option<&str>, workspace: Option<&str>) -> Fixture {
        let td = tempfile::tempdir().expect("tmp");
        let project = Project::new(td.path());
        if let Some(m) = manifest {
            fs::write(project.manifest_path(), m).expect("write manifest");
        }
        if let Some(w) = workspace {
            fs::write(project.catalog_path(), w).expect("write workspace");
        }
        Fixture { _td: td, project }
    }

    fn invocation(args: &[&str]) -> Invocation {
        Invocation::parse(args.iter().copied()).unwrap()
    }

    fn run(
        fx: &Fixture,
        args: &[&str],
        registry: Result<&str, &str>,
        prompt: &mut ScriptedPrompt,
        pm: &FakePm,
        rec: &mut Recorder,
    ) -> Result<Vec<Resolution>, CatalogError> {
        let reg = FakeRegistry(registry.map(String::from).map_err(String::from));
        run_add(
            &fx.project,
            &invocation(args),
            Collaborators {
                registry: &reg,
                prompt,
                package_manager: pm,
                reporter: rec,
            },
        )
    }

    fn no_prompt() -> ScriptedPrompt {
        ScriptedPrompt {
            answers: Vec::new(),
            asked: Vec::new(),
        }
    }

    fn read_catalog(fx: &Fixture) -> CatalogDocument {
        CatalogDocument::load(&fx.project.catalog_path()).unwrap()
    }

    fn read_manifest(fx: &Fixture) -> Manifest {
        Manifest::load(&fx.project.manifest_path()).unwrap()
    }

    #[test]
    fn default_catalog_run_updates_both_documents() {
        let fx = fixture(Some(r#"{"name":"app"}"#), None);
        let pm = FakePm::exiting(Some(0));
        let mut rec = Recorder::default();
        let out = run(&fx, &["-c", "default", "left-pad"], Ok("1.3.0"), &mut no_prompt(), &pm, &mut rec)
            .unwrap();
        assert_eq!(out[0].version, "^1.3.0");
        assert_eq!(
            read_manifest(&fx).dependency(DependencyKind::Prod, "left-pad"),
            Some("catalog:")
        );
        assert_eq!(
            read_catalog(&fx).pinned(&Bucket::Default, "left-pad").as_deref(),
            Some("^1.3.0")
        );
        assert_eq!(*pm.calls.borrow(), vec![vec!["left-pad".to_string()]]);
        assert_eq!(
            rec.events,
            vec![
                "resolving left-pad",
                "resolved left-pad@^1.3.0",
                "installed left-pad@^1.3.0 default"
            ]
        );
    }

    #[test]
    fn named_catalog_dev_run_leaves_prod_dependency_alone() {
        let fx = fixture(
            Some(r#"{"name":"app","dependencies":{"left-pad":"^1.0.0"}}"#),
            Some("packages:\n  - apps/*\n"),
        );
        let pm = FakePm::exiting(Some(0));
        run(
            &fx,
            &["-D", "-c", "node16", "left-pad@1.3.0"],
            Err("unused"),
            &mut no_prompt(),
            &pm,
            &mut Recorder::default(),
        )
        .unwrap();
        let manifest = read_manifest(&fx);
        assert_eq!(manifest.dependency(DependencyKind::Dev, "left-pad"), Some("catalog:node16"));
        assert_eq!(manifest.dependency(DependencyKind::Prod, "left-pad"), Some("^1.0.0"));
        let catalog = read_catalog(&fx);
        assert_eq!(
            catalog.pinned(&Bucket::from_name("node16"), "left-pad").as_deref(),
            Some("1.3.0")
        );
        assert_eq!(*pm.calls.borrow(), vec![vec!["-D".to_string(), "left-pad@1.3.0".to_string()]]);
        let text = fs::read_to_string(fx.project.catalog_path()).unwrap();
        assert!(text.contains("apps/*"));
    }

    #[test]
    fn registry_failure_pins_wildcard_and_succeeds() {
        let fx = fixture(Some("{}"), None);
        let pm = FakePm::exiting(Some(0));
        let mut rec = Recorder::default();
        let out = run(&fx, &["-c", "default", "ghost"], Err("E404"), &mut no_prompt(), &pm, &mut rec)
            .unwrap();
        assert_eq!(out[0].version, "*");
        assert!(rec.events.contains(&"fallback ghost@*".to_string()));
        assert_eq!(read_catalog(&fx).pinned(&Bucket::Default, "ghost").as_deref(), Some("*"));
    }

    #[test]
    fn missing_manifest_writes_nothing_and_runs_nothing() {
        let fx = fixture(None, None);
        let pm = FakePm::exiting(Some(0));
        let err = run(&fx, &["-c", "default", "left-pad"], Ok("1.0.0"), &mut no_prompt(), &pm, &mut Recorder::default())
            .unwrap_err();
        assert_eq!(err.category(), "precondition");
        assert!(!fx.project.catalog_path().exists());
        assert!(!fx.project.manifest_path().exists());
        assert!(pm.calls.borrow().is_empty());
    }

    #[test]
    fn empty_package_list_writes_nothing() {
        let manifest = r#"{"name":"app"}"#;
        let fx = fixture(Some(manifest), None);
        let pm = FakePm::exiting(Some(0));
        let err = run(&fx, &["-D"], Ok("1.0.0"), &mut no_prompt(), &pm, &mut Recorder::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "Please specify packages to install");
        assert!(!fx.project.catalog_path().exists());
        assert_eq!(fs::read_to_string(fx.project.manifest_path()).unwrap(), manifest);
        assert!(pm.calls.borrow().is_empty());
    }

    #[test]
    fn malformed_specifier_aborts_before_prompting() {
        let fx = fixture(Some("{}"), None);
        let pm = FakePm::exiting(Some(0));
        let mut prompt = ScriptedPrompt {
            answers: vec![Bucket::Default],
            asked: Vec::new(),
        };
        let err = run(&fx, &["good", "bad@"], Ok("1.0.0"), &mut prompt, &pm, &mut Recorder::default())
            .unwrap_err();
        assert_eq!(err.category(), "specifier");
        assert!(prompt.asked.is_empty());
        assert!(!fx.project.catalog_path().exists());
        assert!(pm.calls.borrow().is_empty());
    }

    #[test]
    fn prompt_sees_catalogs_created_earlier_in_the_run() {
        let fx = fixture(Some("{}"), Some("catalogs:\n  node16: {}\n"));
        let pm = FakePm::exiting(Some(0));
        let mut prompt = ScriptedPrompt {
            answers: vec![Bucket::from_name("fresh"), Bucket::from_name("fresh")],
            asked: Vec::new(),
        };
        let out = run(&fx, &["a@1", "b"], Ok("2.0.0"), &mut prompt, &pm, &mut Recorder::default())
            .unwrap();
        assert_eq!(prompt.asked[0], ("a".to_string(), vec!["node16".to_string()]));
        assert_eq!(
            prompt.asked[1],
            ("b".to_string(), vec!["node16".to_string(), "fresh".to_string()])
        );
        assert_eq!(out[1].version, "^2.0.0");
        let manifest = read_manifest(&fx);
        assert_eq!(manifest.dependency(DependencyKind::Prod, "a"), Some("catalog:fresh"));
    }

    #[test]
    fn later_package_observes_earlier_pin() {
        let fx = fixture(Some("{}"), None);
        let pm = FakePm::exiting(Some(0));
        let out = run(
            &fx,
            &["-c", "default", "left-pad@1.2.0", "left-pad"],
            Err("offline"),
            &mut no_prompt(),
            &pm,
            &mut Recorder::default(),
        )
        .unwrap();
        assert_eq!(out[1].version, "1.2.0");
        assert_eq!(out[1].source, VersionSource::Pinned);
    }

    #[test]
    fn failed_install_keeps_written_documents() {
        let fx = fixture(Some("{}"), None);
        let pm = FakePm::exiting(Some(1));
        let mut rec = Recorder::default();
        let err = run(&fx, &["-c", "default", "left-pad@1.0.0"], Ok("1.0.0"), &mut no_prompt(), &pm, &mut rec)
            .unwrap_err();
        assert_eq!(
            err,
            CatalogError::Install {
                command: "pnpm".to_string(),
                status: Some(1)
            }
        );
        assert_eq!(
            read_catalog(&fx).pinned(&Bucket::Default, "left-pad").as_deref(),
            Some("1.0.0")
        );
        assert!(!rec.events.iter().any(|e| e.starts_with("installed")));
    }

    #[test]
    fn running_twice_is_idempotent() {
        let fx = fixture(Some(r#"{"name":"app","version":"0.0.0"}"#), Some("packages:\n  - pkgs/*\n"));
        let pm = FakePm::exiting(Some(0));
        let args = ["-c", "node16", "-D", "left-pad@1.3.0", "@types/node@^16"];
        run(&fx, &args, Err("unused"), &mut no_prompt(), &pm, &mut Recorder::default()).unwrap();
        let catalog_first = fs::read_to_string(fx.project.catalog_path()).unwrap();
        let manifest_first = fs::read_to_string(fx.project.manifest_path()).unwrap();
        run(&fx, &args, Err("unused"), &mut no_prompt(), &pm, &mut Recorder::default()).unwrap();
        assert_eq!(fs::read_to_string(fx.project.catalog_path()).unwrap(), catalog_first);
        assert_eq!(fs::read_to_string(fx.project.manifest_path()).unwrap(), manifest_first);
    }
}
