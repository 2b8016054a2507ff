use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use pyannote_sidecar::{cli::Cli, Server};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn setup_logging(cli: &Cli) -> Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("info".parse()?)
        .add_directive("ort=error".parse()?)
        .add_directive("hf_hub=error".parse()?)
        .add_directive("symphonia=error".parse()?);

    let env_filter = if cli.debug {
        env_filter.add_directive("pyannote_sidecar=debug".parse()?)
    } else {
        env_filter
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stdout))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli)?;

    let addr = SocketAddr::from(([127, 0, 0, 1], cli.port));
    Server::new(addr).start().await
}
