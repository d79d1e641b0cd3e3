use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;

pub const LOG_FILE: &str = "logs.txt";

/// Returns pincat's home directory. Uses PINCAT_HOME if set; otherwise ~/.pincat.
/// Falls back to ./.pincat when no home directory can be determined.
pub fn pincat_home() -> PathBuf {
    if let Ok(dir) = env::var("PINCAT_HOME") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pincat")
}

fn echo_enabled() -> bool {
    env::var("PINCAT_LOG")
        .map(|v| v.eq_ignore_ascii_case("debug") || v.eq_ignore_ascii_case("trace"))
        .unwrap_or(false)
}

#[cfg(not(test))]
fn log_path() -> PathBuf {
    pincat_home().join(LOG_FILE)
}

// Unit tests never touch the user's log.
#[cfg(test)]
fn log_path() -> PathBuf {
    env::temp_dir().join("pincat-unit-tests").join(LOG_FILE)
}

/// Append a timestamped line to the log file. Never fails the caller.
pub fn log(message: &str) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let log_message = format!("[{}] {}", timestamp, message);

    if echo_enabled() {
        eprintln!("{}", log_message);
    }

    let path = log_path();
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }

    let mut should_write = true;
    if let Ok(contents) = fs::read_to_string(&path) {
        if let Some(last_line) = contents.lines().last() {
            if last_line == log_message {
                should_write = false;
            }
        }
    }

    if should_write {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&path) {
            let _ = writeln!(file, "{}", log_message);
        }
    }
}

/// Render an argument list the way a shell user would type it (for logs and messages).
pub fn display_command(program: &str, args: &[String]) -> String {
    let mut out = program.to_string();
    for a in args {
        out.push(' ');
        if a.is_empty() || a.chars().any(char::is_whitespace) {
            out.push('"');
            out.push_str(a);
            out.push('"');
        } else {
            out.push_str(a);
        }
    }
    out
}
