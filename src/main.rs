//! # Phase2 Search (`phase2-search`)
//!
//! Starts the search tool server, or runs a single search from the shell.
//!
//! ## Usage
//!
//! ```bash
//! export SUPABASE_DB_PASSWORD=...
//! export OPENAI_API_KEY=...
//!
//! phase2-search                                   # same as `serve`
//! phase2-search --config ./phase2.toml serve
//! phase2-search search "homepage redesign" --limit 3
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use phase2_search::config::{self, LoggingConfig};
use phase2_search::models::Query;
use phase2_search::{logging, server};

/// Semantic search over the Phase2 Technology website content.
///
/// Credentials are read from `SUPABASE_DB_PASSWORD` and `OPENAI_API_KEY`;
/// everything else has defaults and may be set in an optional TOML file.
#[derive(Parser)]
#[command(name = "phase2-search", version, about)]
struct Cli {
    /// Path to an optional configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP tool server (default).
    Serve,

    /// Run one search and print the JSON response.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results to return (default 5, max 20).
        #[arg(long, allow_hyphen_values = true)]
        limit: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = match config::load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            logging::init_logging(&LoggingConfig::default());
            tracing::error!("{}", e);
            return Err(e.into());
        }
    };
    logging::init_logging(&cfg.logging);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Search { query, limit } => {
            let services = server::build_services(&cfg)?;
            let outcome = services.search.search(Query::new(query, limit)).await;
            services.store.close().await;

            let response = outcome?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
