//! storysync CLI entry point.

use clap::Parser;

use storysync::cli::{commands, handle_error, AppContext, Cli, Commands};
use storysync::infrastructure::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(&cli).await {
        handle_error(err, cli.json);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.load_config()?;
    let _log_guard = logging::init(&config.logging)?;
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Serve(_) => commands::serve::execute(ctx).await,
        Commands::Sync => commands::sync::execute(ctx, cli.json).await,
        Commands::Cards => commands::cards::execute(ctx, cli.json).await,
    }
}
