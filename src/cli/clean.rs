use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{resolve_project_root, run_cli_async};
use crate::common::read_project_manifest;
use crate::layout::RuntimeLayout;

#[derive(Args, Debug, Clone)]
pub struct CleanArgs {
    #[arg(
        value_name = "PROJECT_PATH",
        help = "The path to the project. Defaults to current working directory"
    )]
    pub project_path: Option<PathBuf>,
}

pub async fn run(args: CleanArgs) -> i32 {
    run_cli_async(|| run_inner(args)).await
}

/// Remove the build tree and the staging area. The persistent config store
/// and the packaging output are left alone.
async fn run_inner(args: CleanArgs) -> Result<(), String> {
    let project_root = resolve_project_root(args.project_path);
    let manifest = read_project_manifest(&project_root)?;
    let layout = RuntimeLayout::new(&project_root, &manifest.project.runtime_dir);

    remove_if_present(&layout.build_dir())?;
    remove_if_present(&layout.staging_dir())?;

    println!("🧹 Build tree and staging area removed");
    Ok(())
}

fn remove_if_present(dir: &Path) -> Result<(), String> {
    if dir.exists() {
        fs::remove_dir_all(dir)
            .map_err(|err| format!("Failed to remove {}: {err}", dir.display()))?;
    }
    Ok(())
}
