// AspirePath - Command-Line Entry Point

use clap::Parser;

use aspirepath::cli::{self, Cli};
use aspirepath::utils::logging::init_tracing;
use aspirepath::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?.get_config().clone();
    init_tracing(&config.log_level);

    let state = AppState::new(config)?;
    cli::run(cli.command, cli.config.as_deref(), &state).await
}
