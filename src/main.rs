use anyhow::Result;
use clap::Parser;
use deep_research_rs::cli;
use deep_research_rs::generator::workflow::{exit_code, launch};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "deep_research_rs=debug"
    } else {
        "deep_research_rs=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = cli::Args::parse();
    let request = args.request();
    let config = args.into_config()?;

    init_tracing(config.verbose);

    // 工作流内部已输出过错误信息，这里只负责退出码
    let result = launch(&config, &request).await;
    Ok(ExitCode::from(exit_code(&result)))
}
