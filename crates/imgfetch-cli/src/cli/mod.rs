//! CLI for the imgfetch remote image fetcher.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_config_path, run_fetch, run_sources};

/// Top-level CLI for imgfetch.
#[derive(Debug, Parser)]
#[command(name = "imgfetch")]
#[command(about = "imgfetch: fetch remote images through origin and size policy", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch a remote image the way the image service would.
    Fetch(FetchArgs),

    /// List registered image source types.
    Sources,

    /// Print the configuration file path.
    ConfigPath,
}

/// Options for `imgfetch fetch`. Flags override values from the config file.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Remote image URL (passed to the source as the `url` query parameter).
    pub url: String,

    /// Write the image here instead of deriving a name from the URL.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Read configuration from this file instead of the XDG config path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Comma-separated origins allowed as fetch targets (e.g. https://a.example.com,https://b.example.com).
    #[arg(long, value_name = "CSV")]
    pub allowed_origins: Option<String>,

    /// Maximum image size in bytes, checked with a HEAD request (0 disables).
    #[arg(long, value_name = "BYTES")]
    pub max_size: Option<i64>,

    /// Static credential sent upstream as the Authorization header.
    #[arg(long, value_name = "CREDENTIAL")]
    pub authorization: Option<String>,

    /// Forward the inbound credential upstream when no static one is set.
    #[arg(long)]
    pub auth_forwarding: bool,

    /// Credential to place on the simulated inbound request as X-Forward-Authorization.
    #[arg(long, value_name = "CREDENTIAL")]
    pub forward_authorization: Option<String>,

    /// Whole-request timeout in seconds for each upstream request.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Fetch(args) => run_fetch(args).await?,
            CliCommand::Sources => run_sources()?,
            CliCommand::ConfigPath => run_config_path()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
