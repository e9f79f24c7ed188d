use clap::{Parser, Subcommand};

/// TUI and CLI for searching and downloading Modrinth mods
#[derive(Parser, Debug, Clone)]
#[command(name = "rust-modrinth-downloader")]
#[command(about = "TUI and CLI for searching and downloading Modrinth mods", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Run in CLI mode (no TUI)
    #[arg(long, global = true)]
    pub headless: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Search the mod catalog
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Show a project's metadata and icon availability
    Info {
        /// Project slug (e.g., "sodium")
        slug: String,
    },

    /// List available versions of a project
    Versions {
        /// Project slug (e.g., "sodium")
        slug: String,
    },

    /// Download a version's primary file
    Download {
        /// Project slug (e.g., "sodium")
        slug: String,

        /// Version number or id (default: newest)
        #[arg(long)]
        version: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<String>,
    },
}
