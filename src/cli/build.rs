use clap::Args;
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

use crate::cli::{resolve_project_root, run_cli_async};
use crate::common::{
    ProjectManifest, bower_install, format_elapsed_ms, read_project_manifest, spinner,
};
use crate::layout::RuntimeLayout;
use crate::thrift_gen::generate_thrift_modules;
use crate::vendor::{CopyFilter, CopyInstruction, execute, resolve_vendor_specs};

/// Sample config shipped with the project source; seeds the config store on
/// the first run only.
const SAMPLE_CONFIG: &str = "src/config/sample.yml";
const SOURCE_JS_DIR: &str = "src/js";
const SOURCE_HTDOCS_DIR: &str = "src/htdocs";
const CONFIG_STORE_SRC: &str = "config/local.yml";
const PACKAGE_SCRIPTS_PATTERN: &str = "js/**/*";

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[arg(
        value_name = "PROJECT_PATH",
        help = "The path to the project. Defaults to current working directory"
    )]
    pub project_path: Option<PathBuf>,
}

pub async fn run(args: BuildArgs) -> i32 {
    run_cli_async(|| run_inner(args)).await
}

/// The outer pipeline, as a strict linear sequence: install packages, seed
/// the config store, copy vendored dependencies, copy project source and
/// assets, refresh the active config, generate the Thrift modules, and copy
/// the script assets into the packaging output. No step starts before its
/// predecessor completes and nothing is retried.
async fn run_inner(args: BuildArgs) -> Result<(), String> {
    let start_time = Instant::now();
    let project_root = resolve_project_root(args.project_path);
    let manifest = read_project_manifest(&project_root)?;
    let layout = RuntimeLayout::new(&project_root, &manifest.project.runtime_dir);

    println!(
        "Assembling \x1b[33m{}\x1b[0m into {}",
        manifest.project.name,
        layout.build_dir().display()
    );

    let sp = spinner("📦 Installing bower packages...");
    let install = bower_install(&project_root).await;
    sp.finish_and_clear();
    install?;
    println!("✅ Bower packages installed");

    seed_config_store(&layout)?;
    copy_vendor_files(&manifest, &layout)?;
    copy_project_source(&layout)?;
    copy_active_config(&layout)?;

    generate_thrift_modules(&manifest, &layout).await?;
    println!("✅ Thrift modules generated");

    package_scripts(&layout)?;

    println!(
        "\n🎉 Build tree assembled in {}\n",
        format_elapsed_ms(start_time)
    );
    Ok(())
}

/// Copy the sample config into the persistent config store, first run only.
/// An existing store file is hand-maintained and must never be overwritten.
fn seed_config_store(layout: &RuntimeLayout) -> Result<(), String> {
    let instruction = CopyInstruction {
        cwd: PathBuf::new(),
        src: vec![SAMPLE_CONFIG.to_string()],
        dest: layout.config_store(),
        expand: false,
        filter: Some(CopyFilter::SkipIfDestExists),
    };
    let summary = execute(&instruction, layout.project_root())?;
    if summary.skipped.is_empty() {
        println!("✅ Runtime config seeded from the sample");
    } else {
        println!("✅ Runtime config already present, left untouched");
    }
    Ok(())
}

fn copy_vendor_files(manifest: &ProjectManifest, layout: &RuntimeLayout) -> Result<(), String> {
    let instructions = resolve_vendor_specs(&manifest.vendor, &layout.build_dir())?;
    let mut copied = 0;
    for instruction in &instructions {
        let summary = execute(instruction, layout.project_root())?;
        copied += summary.copied.len();
    }
    debug!(
        packages = instructions.len(),
        files = copied,
        "Vendored dependencies copied"
    );
    println!("✅ {copied} vendored files copied");
    Ok(())
}

fn copy_project_source(layout: &RuntimeLayout) -> Result<(), String> {
    let instructions = [
        CopyInstruction {
            cwd: PathBuf::from(SOURCE_JS_DIR),
            src: vec!["**/*".to_string()],
            dest: layout.build_path("js"),
            expand: true,
            filter: None,
        },
        // Files for in-browser eyeball testing and development.
        CopyInstruction {
            cwd: PathBuf::from(SOURCE_HTDOCS_DIR),
            src: vec!["**/*".to_string()],
            dest: layout.build_path("htdocs"),
            expand: true,
            filter: None,
        },
    ];
    for instruction in &instructions {
        execute(instruction, layout.project_root())?;
    }
    println!("✅ Project source copied");
    Ok(())
}

/// Refresh the active client config from the persisted store. Unlike the
/// seeding step this always overwrites.
fn copy_active_config(layout: &RuntimeLayout) -> Result<(), String> {
    let instruction = CopyInstruction {
        cwd: layout.runtime_dir().to_path_buf(),
        src: vec![CONFIG_STORE_SRC.to_string()],
        dest: layout.active_config(),
        expand: false,
        filter: None,
    };
    execute(&instruction, layout.project_root())?;
    Ok(())
}

fn package_scripts(layout: &RuntimeLayout) -> Result<(), String> {
    let instruction = CopyInstruction {
        cwd: layout.build_dir().to_path_buf(),
        src: vec![PACKAGE_SCRIPTS_PATTERN.to_string()],
        dest: layout.packaging_dir(),
        expand: true,
        filter: None,
    };
    let summary = execute(&instruction, layout.project_root())?;
    println!(
        "✅ {} script assets packaged into {}",
        summary.copied.len(),
        layout.packaging_dir().display()
    );
    Ok(())
}
