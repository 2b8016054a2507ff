use clap::Parser;

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    long_about = None,
    name = "pyannote-sidecar"
)]
pub struct Cli {
    /// Port to run the sidecar on
    #[arg(short = 'p', long, default_value_t = 8786)]
    pub port: u16,

    /// Enable debug logging for sidecar modules
    #[arg(long)]
    pub debug: bool,
}
