use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::vendor::PackageSpec;

const MANIFEST_FILENAME: &str = "websmith.toml";

/// Project manifest (`websmith.toml`), read once per run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectManifest {
    pub project: ProjectSection,
    pub thrift: ThriftSection,
    /// Declarative third-party copy list, in significant order.
    #[serde(default)]
    pub vendor: Vec<PackageSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectSection {
    pub name: String,
    /// Directory (relative to the project root) holding the build tree and
    /// the persistent config store.
    #[serde(default = "default_runtime_dir")]
    pub runtime_dir: String,
}

/// Thrift generation settings. The artifact file names are configuration
/// constants: the Thrift compiler derives them from the IDL, and the
/// pipeline must agree with it rather than guess.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ThriftSection {
    pub service: String,
    /// Interface definition consumed by the generator, project-relative.
    pub spec_file: String,
    /// Generated types artifact, e.g. `taxon_types.js`.
    pub types_artifact: String,
    /// Generated client artifact, e.g. `TaxonService.js`.
    pub client_artifact: String,
    /// The vendored Thrift browser runtime, project-relative.
    pub runtime_library: String,
}

fn default_runtime_dir() -> String {
    "runtime".to_string()
}

pub fn read_project_manifest(project_root: &Path) -> Result<ProjectManifest, String> {
    let manifest_path = project_root.join(MANIFEST_FILENAME);
    let contents = fs::read_to_string(&manifest_path)
        .map_err(|err| format!("Failed to read {}: {err}", manifest_path.display()))?;
    let manifest: ProjectManifest = toml::from_str(&contents)
        .map_err(|err| format!("Failed to parse {MANIFEST_FILENAME}: {err}"))?;
    Ok(manifest)
}

pub fn ensure_dir(path: &Path) -> Result<(), String> {
    fs::create_dir_all(path)
        .map_err(|err| format!("Failed to create directory {}: {err}", path.display()))
}

/// Command to spawn the Apache Thrift compiler.
///
/// Resolved from PATH up front so a missing installation surfaces as one
/// actionable error before the staging directory is touched.
#[derive(Debug, Clone)]
pub struct ThriftCommand {
    thrift_path: PathBuf,
}

impl ThriftCommand {
    pub fn new() -> Result<Self, String> {
        let thrift_path = which::which("thrift").map_err(|_| {
            "Failed to locate `thrift`: executable not found. \
             Make sure the Apache Thrift compiler is installed and available in PATH."
                .to_string()
        })?;
        Ok(Self { thrift_path })
    }

    /// Create a new tokio::process::Command for spawning the compiler.
    pub fn tokio_command(&self) -> tokio::process::Command {
        tokio::process::Command::new(&self.thrift_path)
    }

    /// Format the command for display/logging.
    pub fn display(&self) -> String {
        format!("thrift ({})", self.thrift_path.display())
    }
}

/// Command to spawn bower for package installation.
#[derive(Debug, Clone)]
pub struct BowerCommand {
    bower_path: PathBuf,
}

impl BowerCommand {
    pub fn new() -> Result<Self, String> {
        let bower_path = which::which("bower").map_err(|_| {
            "Failed to locate `bower`: executable not found. \
             Make sure bower is installed (npm install -g bower) and available in PATH."
                .to_string()
        })?;
        Ok(Self { bower_path })
    }

    pub fn tokio_command(&self) -> tokio::process::Command {
        tokio::process::Command::new(&self.bower_path)
    }
}

/// Install the third-party packages listed in bower.json. Installation only;
/// nothing is linked or copied out of `bower_components` here.
pub async fn bower_install(project_root: &Path) -> Result<(), String> {
    let bower = BowerCommand::new()?;
    let mut cmd = bower.tokio_command();
    cmd.arg("install").current_dir(project_root);
    let output = cmd
        .output()
        .await
        .map_err(|err| format!("Failed to run bower install: {err}"))?;

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "bower install failed with status {status}. Stdout: {stdout} Stderr: {stderr}",
            status = output.status
        ));
    }

    Ok(())
}

// Spinner utilities for CLI operations
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());
    spinner
}

pub fn format_elapsed_ms(start: Instant) -> String {
    let elapsed = start.elapsed();
    if elapsed.as_secs() == 0 {
        return format!("{}ms", elapsed.as_millis());
    }
    let seconds = elapsed.as_secs();
    let remaining_ms = elapsed.subsec_millis();
    format!("{seconds}s {remaining_ms}ms")
}
