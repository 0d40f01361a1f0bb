#![forbid(unsafe_code)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod cli;
pub mod common;
pub mod layout;
pub mod thrift_gen;
pub mod transform;
pub mod vendor;

pub use thrift_gen::generate_thrift_modules;

#[derive(Parser)]
#[command(
    name = "websmith",
    version,
    about = "\x1b[33mwebsmith\x1b[0m assembles the browser client build tree 🛠️"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 🔨 Assemble the full build tree
    Build(cli::build::BuildArgs),
    /// ⚙️ Generate the Thrift client modules alone
    Thrift(cli::thrift::ThriftArgs),
    /// 🧹 Remove the build tree and staging area
    Clean(cli::clean::CleanArgs),
}

pub async fn run_cli(args: Vec<String>) -> i32 {
    match Cli::try_parse_from(args) {
        Ok(cli) => match cli.command {
            Some(Commands::Build(build_args)) => cli::build::run(build_args).await,
            Some(Commands::Thrift(thrift_args)) => cli::thrift::run(thrift_args).await,
            Some(Commands::Clean(clean_args)) => cli::clean::run(clean_args).await,
            None => {
                let mut cmd = Cli::command();
                let _ = cmd.print_help();
                println!();
                0
            }
        },
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    }
}

pub fn init_tracing() {
    let crate_root = module_path!().to_string();

    // WEBSMITH_LOG controls log level: "trace", "debug", "info", "warn",
    // "error", or a full tracing filter spec like "websmith=debug"
    let filter = match std::env::var("WEBSMITH_LOG") {
        Ok(level) if is_plain_level(&level) => {
            format!("{crate_root}={level}")
        }
        Ok(spec) => spec,
        Err(_) => format!("{crate_root}=info"),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}
