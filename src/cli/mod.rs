//! Command-line interface.

pub mod commands;
pub mod context;
pub mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

pub use context::AppContext;

#[derive(Parser, Debug)]
#[command(name = "storysync")]
#[command(about = "Keeps a story outline, JSON card index and narrative text in sync", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (replaces .storysync/config.yaml and local.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory holding the store files
    #[arg(short, long, global = true)]
    pub data_dir: Option<String>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile the stores, then watch them and serve the REST API
    Serve(commands::serve::ServeArgs),

    /// Run the startup reconciliation once and exit
    Sync,

    /// Print the card index
    Cards,
}

impl Cli {
    /// Load configuration and apply command-line overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match self.config {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };

        if let Some(ref data_dir) = self.data_dir {
            config.data_dir.clone_from(data_dir);
        }
        if let Commands::Serve(ref args) = self.command {
            if let Some(port) = args.port {
                config.server.port = port;
            }
        }

        ConfigLoader::validate(&config)?;
        Ok(config)
    }
}

/// Print `err` and exit with a failure status.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "ok": false,
            "error": format!("{err:#}"),
        });
        println!("{body}");
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
