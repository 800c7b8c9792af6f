// ABOUTME: Entry point for the sshhook webhook binary.
// ABOUTME: Parses CLI flags, sets up logging and runs the callback server.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sshhook")]
#[command(about = "Authentication and configuration webhook for ContainerSSH")]
struct Cli {
    /// Path to webhook config file
    #[arg(short, long, env = "SSHHOOK_CONFIG", default_value = "webhook.yaml")]
    config: PathBuf,

    /// Listen address, overriding the config file (e.g. ":8080" or "127.0.0.1:9000")
    #[arg(long, env = "SSHHOOK_LISTEN")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    sshhook_log::init_for("sshhook");

    let cli = Cli::parse();
    sshhook::run(&cli.config, cli.listen).await
}
