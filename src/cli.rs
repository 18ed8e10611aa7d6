use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::proxy::ProxySelection;

#[derive(Debug, Parser)]
#[command(
    name = "aniroll",
    version,
    about = "Roll a random anime episode and stream it through a proxy"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub options: GlobalOptions,
}

#[derive(Debug, Default, Args)]
pub struct GlobalOptions {
    /// Proxy the media and poster URLs are rewritten through
    #[arg(long, value_enum, global = true)]
    pub proxy: Option<ProxySelection>,

    /// Base URL of the local proxy (overrides ANIROLL_PROXY_URL)
    #[arg(long, value_name = "URL", global = true)]
    pub local_proxy_url: Option<String>,

    /// Base URL of the episode metadata API (overrides ANIROLL_API_URL)
    #[arg(long, value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Video player executable (overrides ANIROLL_PLAYER)
    #[arg(long, value_name = "PATH", global = true)]
    pub player: Option<PathBuf>,

    /// Read timeout for the metadata request in seconds (overrides ANIROLL_TIMEOUT_SECS)
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Build a placeholder poster URL when the episode has no thumbnail image
    #[arg(long, global = true)]
    pub poster_placeholder: bool,

    /// Pick from these AniList ids instead of the built-in catalog
    #[arg(long = "id", value_name = "ANILIST_ID", global = true)]
    pub ids: Vec<u32>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive player screen (default)
    Tui,
    /// Resolve one random episode and print its URLs
    Resolve {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Launch the player once resolved
        #[arg(long)]
        play: bool,
    },
    /// List the catalog ids
    Catalog,
}
