//! Choosing the catalog bucket for each package: `-c <name>` for all, or ask per package.

use std::io::{BufRead, Write};

use crate::catalog::{Bucket, CatalogDocument};
use crate::error::CatalogError;

const NEW_CATALOG_LABEL: &str = "<new catalog>";

/// Interactive choice of a bucket for one package.
pub trait CatalogPrompt {
    /// `existing` lists the named catalogs already in the document, in order.
    fn choose(&mut self, package: &str, existing: &[String]) -> Result<Bucket, CatalogError>;
}

/// Flag wins for every package; otherwise the prompt is asked.
pub fn select_catalog(
    flag: Option<&str>,
    package: &str,
    catalog: &CatalogDocument,
    prompt: &mut dyn CatalogPrompt,
) -> Result<Bucket, CatalogError> {
    match flag {
        Some(name) => Ok(Bucket::from_name(name)),
        None => prompt.choose(package, &catalog.catalog_names()),
    }
}

enum Choice {
    Existing(Bucket),
    CreateNew,
}

/// Numbered list prompt over any line reader (stdin in the CLI, a byte slice in tests).
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_answer(&mut self) -> Result<String, CatalogError> {
        let mut line = String::new();
        let n = self
            .input
            .read_line(&mut line)
            .map_err(|e| CatalogError::Prompt(e.to_string()))?;
        if n == 0 {
            return Err(CatalogError::Prompt(
                "input closed before a catalog was chosen (pass -c <name> to skip the prompt)"
                    .to_string(),
            ));
        }
        Ok(line.trim().to_string())
    }

    fn say(&mut self, text: &str) -> Result<(), CatalogError> {
        write!(self.output, "{}", text)
            .and_then(|_| self.output.flush())
            .map_err(|e| CatalogError::Prompt(e.to_string()))
    }

    fn pick(&mut self, package: &str, options: &[String]) -> Result<Choice, CatalogError> {
        let mut menu = format!("? select catalog for {}\n", package);
        for (i, name) in options.iter().enumerate() {
            menu.push_str(&format!("  {}) {}\n", i + 1, name));
        }
        let create_index = options.len() + 1;
        menu.push_str(&format!("  {}) {}\n", create_index, NEW_CATALOG_LABEL));
        self.say(&menu)?;
        loop {
            self.say("> ")?;
            let answer = self.read_answer()?;
            if let Ok(n) = answer.parse::<usize>() {
                if n >= 1 && n <= options.len() {
                    return Ok(Choice::Existing(Bucket::from_name(&options[n - 1])));
                }
                if n == create_index {
                    return Ok(Choice::CreateNew);
                }
            } else if answer == NEW_CATALOG_LABEL {
                return Ok(Choice::CreateNew);
            } else if options.iter().any(|o| *o == answer) {
                return Ok(Choice::Existing(Bucket::from_name(&answer)));
            }
            self.say(&format!("  please enter a number between 1 and {}\n", create_index))?;
        }
    }

    fn ask_new_name(&mut self, package: &str) -> Result<Bucket, CatalogError> {
        loop {
            self.say(&format!("? enter new catalog name for {}: ", package))?;
            let answer = self.read_answer()?;
            if !answer.is_empty() {
                return Ok(Bucket::from_name(&answer));
            }
            self.say("  catalog name is required\n")?;
        }
    }
}

impl<R: BufRead, W: Write> CatalogPrompt for TerminalPrompt<R, W> {
    fn choose(&mut self, package: &str, existing: &[String]) -> Result<Bucket, CatalogError> {
        let mut options = vec![Bucket::Default.name().to_string()];
        options.extend(existing.iter().filter(|n| n.as_str() != "default").cloned());
        match self.pick(package, &options)? {
            Choice::Existing(bucket) => Ok(bucket),
            Choice::CreateNew => self.ask_new_name(package),
        }
    }
}
