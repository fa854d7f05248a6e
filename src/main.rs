use anyhow::Result;
use clap::Parser;
use teams_transcript_bot::{
    app,
    cli::{handle_config_command, handle_fetch_command, Cli, CliCommand},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(CliCommand::Version) => {
            println!("teams-transcript-bot {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(CliCommand::Fetch(args)) => handle_fetch_command(args).await,
        Some(CliCommand::Config(args)) => handle_config_command(args),
        Some(CliCommand::Serve(args)) => app::run_service(args.port).await,
        None => app::run_service(None).await,
    }
}
