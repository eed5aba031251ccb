use clap::Parser;
use gigboard::cli::commands::Cli;
use gigboard::cli::handlers;
use tracing_subscriber::EnvFilter;

/// Log filter, e.g. `GIGBOARD_LOG=gigboard=debug`
const LOG_ENV: &str = "GIGBOARD_LOG";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = handlers::dispatch(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
