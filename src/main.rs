use std::process::ExitCode;

fn main() -> ExitCode {
    websmith::init_tracing();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to create tokio runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(websmith::run_cli(std::env::args().collect()));
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
