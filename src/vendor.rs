//! Declarative dependency copying.
//!
//! Third-party packages are described by a small list of vendor specs in the
//! project manifest. Each spec names a bower package and, where the package
//! layout demands it, a nested source directory and explicit glob patterns.
//! The resolver compiles every spec into a concrete [`CopyInstruction`];
//! the executor expands the globs against the package directory and copies
//! each match into the build tree. An instruction is never mutated after
//! resolution, and a glob matching nothing is an error rather than a silent
//! no-op.

use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const VENDOR_ROOT: &str = "bower_components";

/// One entry of the manifest's `[[vendor]]` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PackageSpec {
    /// Package name. The default source pattern is `<name>.js`.
    #[serde(default)]
    pub name: Option<String>,
    /// Directory the package was installed under, when it differs from the
    /// package name (e.g. package `text` living in `requirejs-text`).
    #[serde(default)]
    pub dir: Option<String>,
    /// Subpath prefix joined onto every source pattern.
    #[serde(default)]
    pub path: Option<String>,
    /// Working directory override. A leading `/` makes it absolute;
    /// otherwise it is nested inside the package directory.
    #[serde(default)]
    pub cwd: Option<String>,
    /// Source glob pattern(s) relative to the working directory.
    #[serde(default)]
    pub src: Option<SourcePatterns>,
}

/// A single pattern or an ordered list of patterns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SourcePatterns {
    One(String),
    Many(Vec<String>),
}

/// Per-file inclusion rule applied by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyFilter {
    /// Leave an existing destination file untouched (first run wins).
    SkipIfDestExists,
}

/// A fully resolved copy operation. `cwd` may be relative to the project
/// root or absolute; `src` patterns are relative to `cwd`.
///
/// With `expand` set, patterns are glob-expanded and matches keep their
/// relative paths under `dest`; without it, each source is a literal file
/// path and `dest` is the destination file itself.
#[derive(Debug, Clone, PartialEq)]
pub struct CopyInstruction {
    pub cwd: PathBuf,
    pub src: Vec<String>,
    pub dest: PathBuf,
    pub expand: bool,
    pub filter: Option<CopyFilter>,
}

/// What the executor did for one instruction.
#[derive(Debug, Default)]
pub struct CopySummary {
    pub copied: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// Compile the vendor spec list into copy instructions, in input order.
///
/// Fails fast on the first malformed spec, before anything touches the
/// filesystem.
pub fn resolve_vendor_specs(
    specs: &[PackageSpec],
    build_root: &Path,
) -> Result<Vec<CopyInstruction>, String> {
    specs
        .iter()
        .map(|spec| resolve_spec(spec, build_root))
        .collect()
}

fn resolve_spec(spec: &PackageSpec, build_root: &Path) -> Result<CopyInstruction, String> {
    let package_dir = spec
        .dir
        .as_deref()
        .or(spec.name.as_deref())
        .ok_or_else(|| "Vendor spec must set at least one of `name` or `dir`".to_string())?;

    let patterns = match &spec.src {
        None => {
            let name = spec.name.as_deref().ok_or_else(|| {
                format!("Vendor spec for `{package_dir}` has no `src` and no `name` to default from")
            })?;
            vec![format!("{name}.js")]
        }
        Some(SourcePatterns::One(pattern)) => vec![pattern.clone()],
        Some(SourcePatterns::Many(patterns)) => patterns.clone(),
    };

    let prefix = spec.path.as_deref().unwrap_or("");
    let src: Vec<String> = patterns
        .iter()
        .map(|pattern| join_segments(&[prefix, pattern.as_str()]))
        .collect();

    let cwd = match spec.cwd.as_deref() {
        Some(cwd) if cwd.starts_with('/') => PathBuf::from(cwd),
        Some(cwd) => PathBuf::from(join_segments(&[VENDOR_ROOT, package_dir, cwd])),
        None => PathBuf::from(join_segments(&[VENDOR_ROOT, package_dir])),
    };

    let instruction = CopyInstruction {
        cwd,
        src,
        dest: build_root.join(VENDOR_ROOT).join(package_dir),
        expand: true,
        filter: None,
    };
    debug!(
        package = package_dir,
        cwd = %instruction.cwd.display(),
        patterns = ?instruction.src,
        "Resolved vendor spec"
    );
    Ok(instruction)
}

/// Join path segments with `/`, dropping empty ones.
fn join_segments(segments: &[&str]) -> String {
    segments
        .iter()
        .filter(|segment| !segment.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}

/// Carry out one instruction. Relative working directories are resolved
/// against `base_dir`.
pub fn execute(instruction: &CopyInstruction, base_dir: &Path) -> Result<CopySummary, String> {
    let cwd = base_dir.join(&instruction.cwd);
    let mut summary = CopySummary::default();

    if instruction.expand {
        for pattern in &instruction.src {
            for relative in expand_pattern(&cwd, pattern)? {
                let from = cwd.join(&relative);
                let to = instruction.dest.join(&relative);
                copy_one(&from, &to, instruction.filter, &mut summary)?;
            }
        }
    } else {
        for source in &instruction.src {
            let from = cwd.join(source);
            if !from.is_file() {
                return Err(format!("Missing source file {}", from.display()));
            }
            copy_one(&from, &instruction.dest, instruction.filter, &mut summary)?;
        }
    }

    Ok(summary)
}

fn copy_one(
    from: &Path,
    to: &Path,
    filter: Option<CopyFilter>,
    summary: &mut CopySummary,
) -> Result<(), String> {
    if filter == Some(CopyFilter::SkipIfDestExists) && to.exists() {
        info!(dest = %to.display(), "Destination already exists, keeping it");
        summary.skipped.push(to.to_path_buf());
        return Ok(());
    }

    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("Failed to create {}: {err}", parent.display()))?;
    }
    fs::copy(from, to)
        .map_err(|err| format!("Failed to copy {} to {}: {err}", from.display(), to.display()))?;
    summary.copied.push(to.to_path_buf());
    Ok(())
}

/// Expand one glob pattern against `cwd`, returning matched file paths
/// relative to `cwd` in sorted order. Zero matches is an error.
fn expand_pattern(cwd: &Path, pattern: &str) -> Result<Vec<PathBuf>, String> {
    if !cwd.is_dir() {
        return Err(format!(
            "Working directory {} does not exist (is the package installed?)",
            cwd.display()
        ));
    }

    let matcher = glob_to_regex(pattern)?;
    let mut matches = Vec::new();
    for entry in WalkDir::new(cwd).min_depth(1) {
        let entry =
            entry.map_err(|err| format!("Failed to walk {}: {err}", cwd.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(cwd)
            .map_err(|err| format!("Failed to relativize {}: {err}", entry.path().display()))?
            .to_path_buf();
        let candidate = relative.to_string_lossy().replace('\\', "/");
        if matcher.is_match(&candidate) {
            matches.push(relative);
        }
    }
    matches.sort();

    if matches.is_empty() {
        return Err(format!(
            "No files matched pattern `{pattern}` under {}",
            cwd.display()
        ));
    }
    Ok(matches)
}

/// Compile a glob pattern to an anchored regex. `*` and `?` stay within one
/// path segment; `**/` spans zero or more directories.
fn glob_to_regex(pattern: &str) -> Result<Regex, String> {
    let mut regex = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    if chars.peek() == Some(&'/') {
                        chars.next();
                        regex.push_str("(?:[^/]*/)*");
                    } else {
                        regex.push_str(".*");
                    }
                } else {
                    regex.push_str("[^/]*");
                }
            }
            '?' => regex.push_str("[^/]"),
            '.' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' | '|' | '\\' => {
                regex.push('\\');
                regex.push(c);
            }
            other => regex.push(other),
        }
    }
    regex.push('$');
    Regex::new(&regex).map_err(|err| format!("Invalid glob pattern `{pattern}`: {err}"))
}
