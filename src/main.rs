use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stripfeed::app::AppContext;
use stripfeed::cli::{commands, Cli, Commands};
use stripfeed::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stripfeed={}", default_level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = Config::load()?;
    let ctx = AppContext::new(config, cli.db)?;

    match cli.command {
        Commands::Run(args) => {
            commands::run(&ctx, &args).await?;
        }
        Commands::Sources => {
            commands::list_sources(&ctx)?;
        }
        Commands::Watermarks => {
            commands::list_watermarks(&ctx)?;
        }
    }

    Ok(())
}
