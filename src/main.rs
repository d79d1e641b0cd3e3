//! Thin CLI layer: split args, styled output, spinner per package, and call into pincat-core.
//! Crash-proof: panic caught and reported; all errors return Result.

use clap::{Arg, ArgAction, Command};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::env;
use std::io::{self, IsTerminal};
use std::time::Duration;

use pincat_core::{
    CatalogError, Collaborators, CommandPackageManager, Invocation, Project, Reporter,
    Resolution, TerminalPrompt,
};

// ---- UI helpers (no-op when stdout isn't a TTY) ----

fn use_color() -> bool {
    io::stdout().is_terminal() && env::var("NO_COLOR").unwrap_or_default().is_empty()
}

fn success(msg: &str) {
    if use_color() {
        println!("{}", msg.green());
    } else {
        println!("{}", msg);
    }
}

fn error(msg: &str) {
    if use_color() {
        eprintln!("{}", msg.red());
    } else {
        eprintln!("{}", msg);
    }
}

fn warning(msg: &str) {
    if use_color() {
        eprintln!("{}", msg.yellow());
    } else {
        eprintln!("{}", msg);
    }
}

fn dim_err(msg: &str) {
    if use_color() {
        eprintln!("{}", msg.dimmed());
    } else {
        eprintln!("{}", msg);
    }
}

fn package_label(name: &str, version: &str) -> String {
    let s = format!("{}@{}", name, version);
    if use_color() {
        s.blue().to_string()
    } else {
        s
    }
}

fn bucket_label(name: &str) -> String {
    if use_color() {
        name.yellow().to_string()
    } else {
        name.to_string()
    }
}

/// Spinner while a version is looked up; plain lines when stderr isn't a TTY.
struct ConsoleReporter {
    spinner: Option<ProgressBar>,
    animate: bool,
}

impl ConsoleReporter {
    fn new() -> Self {
        Self {
            spinner: None,
            animate: io::stderr().is_terminal(),
        }
    }

    fn stop(&mut self) {
        if let Some(sp) = self.spinner.take() {
            sp.finish_and_clear();
        }
    }
}

impl Reporter for ConsoleReporter {
    fn resolving(&mut self, package: &str) {
        self.stop();
        if !self.animate {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠁⠂⠄⠈⠐⠠⠰⠸⠹")
                .template("{spinner:.dim} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("get the version of {}...", package));
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    fn resolved(&mut self, r: &Resolution) {
        self.stop();
        success(&format!("✔ Got {} ({})", package_label(&r.package, &r.version), r.source));
    }

    fn fell_back(&mut self, r: &Resolution, reason: &str) {
        self.stop();
        warning(&format!(
            "✖ Failed to get {} version, use {} instead.",
            r.package, r.version
        ));
        dim_err(&format!("  {}", reason));
    }

    fn installed(&mut self, r: &Resolution) {
        self.stop();
        success(&format!(
            "Installed {} into catalog: {}",
            package_label(&r.package, &r.version),
            bucket_label(r.bucket.name())
        ));
    }
}

impl Drop for ConsoleReporter {
    fn drop(&mut self) {
        self.stop();
    }
}

fn cli() -> Command {
    Command::new("pincat")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Add dependencies through pnpm catalogs: pin once in pnpm-workspace.yaml, reference from package.json")
        .override_usage("pincat [-D|--save-dev] [-c <NAME>] <PACKAGE>... [pnpm add flags]")
        .after_help(
            "Examples:\n  pincat react react-dom\n  pincat -D -c node16 @types/node\n  pincat -c default lodash@^4.17.21\n\nOther flags are passed to `pnpm add` unchanged; write flags that take a value as --flag=value.",
        )
        .arg(
            Arg::new("save-dev")
                .short('D')
                .long("save-dev")
                .action(ArgAction::SetTrue)
                .help("Reference the catalog from devDependencies"),
        )
        .arg(
            Arg::new("catalog")
                .short('c')
                .long("catalog")
                .value_name("NAME")
                .help("Catalog for every package (\"default\" or a name); asks per package when omitted"),
        )
        .arg(
            Arg::new("package")
                .num_args(0..)
                .help("Package specifiers: left-pad, left-pad@1.3.0, @scope/name@^2"),
        )
}

fn print_help_or_version(args: &[String]) -> Result<(), CatalogError> {
    let mut cmd = cli();
    let version_only = !args.iter().any(|a| a == "-h" || a == "--help");
    if version_only {
        print!("{}", cmd.render_version());
        return Ok(());
    }
    cmd.print_long_help()
        .map_err(|e| CatalogError::Precondition(e.to_string()))
}

fn run() -> Result<(), CatalogError> {
    let args: Vec<String> = env::args().skip(1).collect();
    if pincat_core::wants_help_or_version(&args) {
        return print_help_or_version(&args);
    }

    let invocation = Invocation::parse(args)?;
    let cwd = env::current_dir()
        .map_err(|e| CatalogError::Precondition(format!("Cannot read current directory: {}", e)))?;
    let config = pincat_core::load_config(&cwd);
    pincat_core::log(&format!(
        "pincat {} (package manager: {}, lookup: {:?})",
        env!("CARGO_PKG_VERSION"),
        config.package_manager,
        config.lookup
    ));

    let registry = pincat_core::registry::from_config(&config);
    let package_manager = CommandPackageManager::new(config.package_manager.clone());
    let mut prompt = TerminalPrompt::new(io::stdin().lock(), io::stdout());
    let mut reporter = ConsoleReporter::new();

    pincat_core::run_add(
        &Project::new(cwd),
        &invocation,
        Collaborators {
            registry: registry.as_ref(),
            prompt: &mut prompt,
            package_manager: &package_manager,
            reporter: &mut reporter,
        },
    )?;
    Ok(())
}

fn main() {
    if !use_color() {
        colored::control::set_override(false);
    }

    let code = match std::panic::catch_unwind(run) {
        Ok(Ok(())) => 0,
        Ok(Err(e)) => {
            pincat_core::log(&format!("[{}] {}", e.category(), e));
            error(&e.to_string());
            1
        }
        Err(_) => {
            error("An unexpected error occurred. Please report this issue.");
            1
        }
    };
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_lists_the_flags_the_parser_handles() {
        let mut cmd = cli();
        let mut flags = Vec::new();
        for arg in cmd.get_arguments() {
            if let Some(s) = arg.get_short() {
                flags.push(format!("-{}", s));
            }
            if let Some(l) = arg.get_long() {
                flags.push(format!("--{}", l));
            }
        }
        flags.sort();
        assert_eq!(flags, vec!["--catalog", "--save-dev", "-D", "-c"]);

        let help = cmd.render_long_help().to_string();
        for flag in &flags {
            assert!(help.contains(flag.as_str()), "{} missing from help", flag);
            let inv = Invocation::parse([flag.as_str(), "node16", "left-pad"]).unwrap();
            assert!(inv.dev || inv.catalog.is_some(), "{} not handled", flag);
            assert!(!inv.packages.contains(flag), "{} taken as a package", flag);
        }
    }
}
