//! Delegating the real install to the package manager (`pnpm add ...`).

use std::process::{Command, Stdio};

use crate::utils;

/// Narrow seam over the package manager so runs can be tested without pnpm.
pub trait PackageManager {
    /// Display name, e.g. `pnpm`.
    fn name(&self) -> &str;

    /// Run `<pm> add <args...>` and wait for it.
    /// `Ok(Some(code))` is the exit code, `Ok(None)` means killed by a signal.
    fn add(&self, args: &[String]) -> Result<Option<i32>, String>;
}

/// The real package manager as a child process sharing our stdin/stdout/stderr.
pub struct CommandPackageManager {
    program: String,
}

impl CommandPackageManager {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PackageManager for CommandPackageManager {
    fn name(&self) -> &str {
        &self.program
    }

    fn add(&self, args: &[String]) -> Result<Option<i32>, String> {
        let mut full = vec!["add".to_string()];
        full.extend(args.iter().cloned());
        utils::log(&format!("Running {}", utils::display_command(&self.program, &full)));
        let status = Command::new(&self.program)
            .args(&full)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| format!("Failed to execute {}: {}", self.program, e))?;
        Ok(status.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn reports_exit_codes() {
        assert_eq!(CommandPackageManager::new("true").add(&[]).unwrap(), Some(0));
        assert_eq!(
            CommandPackageManager::new("false").add(&["left-pad".to_string()]).unwrap(),
            Some(1)
        );
    }

    #[test]
    fn missing_program_is_error() {
        let pm = CommandPackageManager::new("pincat-definitely-not-installed-pnpm");
        assert!(pm.add(&[]).is_err());
        assert_eq!(pm.name(), "pincat-definitely-not-installed-pnpm");
    }
}
