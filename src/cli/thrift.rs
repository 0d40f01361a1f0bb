use clap::Args;
use std::path::PathBuf;
use std::time::Instant;

use crate::cli::{resolve_project_root, run_cli_async};
use crate::common::{format_elapsed_ms, read_project_manifest, spinner};
use crate::layout::RuntimeLayout;
use crate::thrift_gen::generate_thrift_modules;

#[derive(Args, Debug, Clone)]
pub struct ThriftArgs {
    #[arg(
        value_name = "PROJECT_PATH",
        help = "The path to the project. Defaults to current working directory"
    )]
    pub project_path: Option<PathBuf>,
}

pub async fn run(args: ThriftArgs) -> i32 {
    run_cli_async(|| run_inner(args)).await
}

/// Run the Thrift sub-pipeline alone, leaving the rest of the build tree as
/// it is. Useful after editing the interface definition.
async fn run_inner(args: ThriftArgs) -> Result<(), String> {
    let start_time = Instant::now();
    let project_root = resolve_project_root(args.project_path);
    let manifest = read_project_manifest(&project_root)?;
    let layout = RuntimeLayout::new(&project_root, &manifest.project.runtime_dir);

    let sp = spinner("⚙️  Generating Thrift modules...");
    let result = generate_thrift_modules(&manifest, &layout).await;
    sp.finish_and_clear();
    result?;

    println!(
        "✅ Thrift modules generated in {}",
        format_elapsed_ms(start_time)
    );
    Ok(())
}
