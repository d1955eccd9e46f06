use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "qrstudio")]
#[command(about = "QR code generator, batch renderer and decoder", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the web UI and JSON API
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to (overrides server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,

    /// Path to a TOML configuration file (defaults to $QRSTUDIO_CONFIG, then config/qrstudio.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
