use std::path::PathBuf;

use clap::Parser;

/// Bulwark request-safety gateway
#[derive(Debug, Parser)]
#[command(name = "bulwark", about = "Request sanitization and error handling for HTTP APIs")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "bulwark.toml", env = "BULWARK_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "BULWARK_LISTEN")]
    pub listen: Option<std::net::SocketAddr>,
}
