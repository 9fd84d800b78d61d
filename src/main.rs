use clap::Parser;
use intellibot::{
    cli::{self, Cli},
    config::{get_config, init_config},
    AppState,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("intellibot=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    init_config()?;
    let config = get_config()?;
    init_tracing(config.log_json);

    let app_state = AppState::new(config)?;
    cli::run(args, app_state).await
}
