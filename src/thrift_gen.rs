//! The Thrift module sub-pipeline: run the external code generator into a
//! fresh staging area, then wrap each artifact as an AMD module inside the
//! build tree.

use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::common::{ProjectManifest, ThriftCommand, ensure_dir};
use crate::layout::RuntimeLayout;
use crate::transform::{ArtifactKind, transform_artifact};

/// Generate and wrap the Thrift client modules.
///
/// Steps, in order: recreate the staging directory, invoke the Thrift
/// compiler against the configured interface definition, then transform the
/// generated types artifact, the generated client artifact, and the vendored
/// runtime library into `js/thrift/` inside the build tree. Any failure
/// aborts before the next artifact is written.
pub async fn generate_thrift_modules(
    manifest: &ProjectManifest,
    layout: &RuntimeLayout,
) -> Result<(), String> {
    info!(
        service = %manifest.thrift.service,
        "Generating Thrift client modules"
    );

    let staging = layout.staging_dir();
    if staging.exists() {
        fs::remove_dir_all(&staging)
            .map_err(|err| format!("Failed to remove staging directory: {err}"))?;
    }
    ensure_dir(&staging)?;

    run_generator(manifest, layout).await?;
    wrap_generated_artifacts(manifest, layout)?;

    Ok(())
}

/// Transform the three artifacts into AMD modules under `js/thrift/` in the
/// build tree: the generated types and client files from the staging area,
/// and the vendored runtime library. Artifacts are processed in dependency
/// order and a failed transform writes nothing for that artifact.
pub fn wrap_generated_artifacts(
    manifest: &ProjectManifest,
    layout: &RuntimeLayout,
) -> Result<(), String> {
    let generated = layout.generated_dir();
    let module_dir = layout.thrift_module_dir();
    ensure_dir(&module_dir)?;

    wrap_into_module(
        &generated.join(&manifest.thrift.types_artifact),
        ArtifactKind::ServiceTypes,
        &module_dir,
    )?;
    wrap_into_module(
        &generated.join(&manifest.thrift.client_artifact),
        ArtifactKind::ServiceClient,
        &module_dir,
    )?;
    wrap_into_module(
        &layout.project_root().join(&manifest.thrift.runtime_library),
        ArtifactKind::RuntimeLibrary,
        &module_dir,
    )?;

    Ok(())
}

async fn run_generator(manifest: &ProjectManifest, layout: &RuntimeLayout) -> Result<(), String> {
    let thrift = ThriftCommand::new()?;
    let spec_file = layout.project_root().join(&manifest.thrift.spec_file);
    if !spec_file.is_file() {
        return Err(format!(
            "Thrift interface definition not found at {}",
            spec_file.display()
        ));
    }

    debug!(
        command = %thrift.display(),
        spec = %spec_file.display(),
        staging = %layout.staging_dir().display(),
        "Invoking the Thrift compiler"
    );

    let output = thrift
        .tokio_command()
        .arg("-gen")
        .arg("js:jquery")
        .arg("-o")
        .arg(layout.staging_dir())
        .arg(&spec_file)
        .current_dir(layout.project_root())
        .output()
        .await
        .map_err(|err| format!("Failed to run the Thrift compiler: {err}"))?;

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "Thrift generation failed with status {status}. Stdout: {stdout} Stderr: {stderr}",
            status = output.status
        ));
    }

    Ok(())
}

/// Read one artifact, apply its rewrite, and write the wrapped module under
/// `module_dir` keeping the artifact's file name. Nothing is written when
/// the transform fails.
fn wrap_into_module(source: &Path, kind: ArtifactKind, module_dir: &Path) -> Result<(), String> {
    let content = fs::read_to_string(source)
        .map_err(|err| format!("Failed to read artifact {}: {err}", source.display()))?;
    let wrapped = transform_artifact(kind, &content)?;

    let file_name = source
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format!("Invalid artifact file name: {}", source.display()))?;
    let dest = module_dir.join(file_name);
    fs::write(&dest, wrapped)
        .map_err(|err| format!("Failed to write {}: {err}", dest.display()))?;

    debug!(artifact = ?kind, dest = %dest.display(), "Wrapped Thrift artifact");
    Ok(())
}
