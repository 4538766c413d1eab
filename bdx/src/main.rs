#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use bdx::commands;
use bdx::config::{self, Config};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, error, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "bagdex")]
#[command(about = "Rebuild and inspect the metadata index of segmented recordings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long, global = true, help = "Config file (.toml or .json)")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, action = ArgAction::Count, help = "Increase log verbosity (-v info, -vv debug)")]
    verbose: u8,

    #[arg(long, value_name = "PATH", help = "Write a default config file and exit")]
    gen_config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the index file of a recording from its segment files
    Reindex {
        #[arg(help = "Path to recording directory")]
        path: PathBuf,
        #[arg(short, long, help = "Storage format of the segments (default: sqlite3)")]
        storage_id: Option<String>,
        #[arg(long, help = "Compression format to record in the index")]
        compression_format: Option<String>,
        #[arg(long, help = "Compression mode to record in the index")]
        compression_mode: Option<String>,
    },
    /// List segment files in index order
    Segments {
        #[arg(help = "Path to recording directory")]
        path: PathBuf,
        #[arg(short, long, help = "Storage format of the segments (default: sqlite3)")]
        storage_id: Option<String>,
    },
    /// Show the existing index file of a recording
    Info {
        #[arg(help = "Path to recording directory")]
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Some(path) = &cli.gen_config {
        if let Err(e) = config::generate_config(path) {
            eprintln!("Failed to generate config: {}", e);
            std::process::exit(1);
        }
        println!("Generated default config at: {}", path.display());
        return;
    }

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        },
    };

    init_tracing(cli.verbose, config.log_filter.as_deref());

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        std::process::exit(2);
    };

    let result = match command {
        Commands::Reindex {
            path,
            storage_id,
            compression_format,
            compression_mode,
        } => {
            config.apply_overrides(storage_id, compression_format, compression_mode);
            debug!(target: "bagdex::cli", config = ?config, "Effective configuration");
            commands::reindex_recording(&path, &config)
        },
        Commands::Segments { path, storage_id } => {
            config.apply_overrides(storage_id, None, None);
            commands::list_segments(&path, &config.storage_id)
        },
        Commands::Info { path } => commands::show_info(&path),
    };

    if let Err(e) = result {
        if e.is_soft() {
            warn!(target: "bagdex::cli", error = %e, "Nothing to do");
            eprintln!("Warning: {}", e);
            return;
        }
        error!(target: "bagdex::cli", kind = ?e.kind(), error = %e, "Command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8, configured: Option<&str>) {
    let default_filter = match verbose {
        0 => configured.unwrap_or("warn"),
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(verbose > 1).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
