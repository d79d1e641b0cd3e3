//! Splitting the command line into pincat's own flags, package specifiers and pass-through args.
//! Everything except the catalog flag is forwarded to `pnpm add` in its original order.

use crate::error::CatalogError;

/// One parsed command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Raw specifier tokens, in input order.
    pub packages: Vec<String>,
    /// `-D` / `--save-dev`.
    pub dev: bool,
    /// `-c <name>` / `--catalog <name>`; last one wins.
    pub catalog: Option<String>,
    /// Original arguments minus the catalog flag and its value.
    pub passthrough: Vec<String>,
}

fn catalog_value(raw: &str, value: Option<String>) -> Result<String, CatalogError> {
    match value {
        Some(v) if !v.trim().is_empty() && !v.starts_with('-') => Ok(v),
        _ => Err(CatalogError::Precondition(format!(
            "{} requires a catalog name",
            raw
        ))),
    }
}

/// Leading `D`s of a short-flag cluster, then an optional `c` whose value is the rest
/// of the cluster or the next argument: `-Dc x`, `-cx`, `-DD`.
fn expand_cluster<I>(arg: &str, inv: &mut Invocation, rest: &mut I) -> Result<bool, CatalogError>
where
    I: Iterator<Item = String>,
{
    let body = match arg.strip_prefix('-') {
        Some(b) if b.len() > 1 && !b.starts_with('-') => b,
        _ => return Ok(false),
    };
    let tail = body.trim_start_matches('D');
    let dev = tail.len() < body.len();
    if let Some(attached) = tail.strip_prefix('c') {
        let value = if attached.is_empty() {
            rest.next()
        } else {
            Some(attached.strip_prefix('=').unwrap_or(attached).to_string())
        };
        inv.catalog = Some(catalog_value(arg, value)?);
    } else if !tail.is_empty() {
        if dev {
            return Err(CatalogError::Precondition(format!(
                "{}: combine -D only with -c, pass other flags separately",
                arg
            )));
        }
        return Ok(false);
    }
    if dev {
        inv.dev = true;
        inv.passthrough.push("-D".to_string());
    }
    Ok(true)
}

impl Invocation {
    /// Parse arguments (without the program name).
    pub fn parse<I, S>(args: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inv = Invocation::default();
        let mut iter = args.into_iter().map(Into::<String>::into);
        let mut positional_only = false;
        while let Some(arg) = iter.next() {
            if positional_only {
                inv.packages.push(arg.clone());
                inv.passthrough.push(arg);
                continue;
            }
            match arg.as_str() {
                "--" => {
                    positional_only = true;
                    inv.passthrough.push(arg);
                }
                "-D" | "--save-dev" => {
                    inv.dev = true;
                    inv.passthrough.push(arg);
                }
                "-c" | "--catalog" => {
                    inv.catalog = Some(catalog_value(&arg, iter.next())?);
                }
                _ => {
                    if let Some(v) = arg
                        .strip_prefix("--catalog=")
                        .or_else(|| arg.strip_prefix("-c="))
                    {
                        inv.catalog = Some(catalog_value(&arg, Some(v.to_string()))?);
                    } else if arg.starts_with('-') && arg.len() > 1 {
                        if !expand_cluster(&arg, &mut inv, &mut iter)? {
                            inv.passthrough.push(arg);
                        }
                    } else {
                        inv.packages.push(arg.clone());
                        inv.passthrough.push(arg);
                    }
                }
            }
        }
        Ok(inv)
    }
}

/// Does the command line ask for help or version instead of a run?
pub fn wants_help_or_version(args: &[String]) -> bool {
    args.iter()
        .take_while(|a| a.as_str() != "--")
        .any(|a| matches!(a.as_str(), "-h" | "--help" | "-V" | "--version"))
}
