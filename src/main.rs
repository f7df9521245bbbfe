//! Issue Tree - Main Server
//!
//! Serves the issue tree API, or validates a tree file offline.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use issue_tree::tree::{build_issue_tree_yaml, hash_issue_tree, validate_issue_tree, OutlineOptions};
use issue_tree::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "issue-tree-server")]
#[command(about = "Issue Tree Server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Port to listen on (overrides config.yaml and SERVER_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the YAML config file
        #[arg(short, long, env = "CONFIG_PATH")]
        config: Option<PathBuf>,
    },

    /// Validate an issue tree JSON file and print its outline and fingerprint
    Validate {
        /// JSON file holding `{root: ...}` or a bare root node
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, config } => {
            let mut config = Config::from_yaml_and_env(config.as_deref())?;
            if let Some(port) = port {
                config.server_port = port;
            }
            issue_tree::start_server(config).await
        }
        Commands::Validate { file } => run_validate(&file),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,issue_tree=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn run_validate(file: &PathBuf) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    match validate_issue_tree(&value) {
        Ok(tree) => {
            print!("{}", build_issue_tree_yaml(&tree, OutlineOptions::default()));
            println!();
            println!("nodes: {}", tree.root.node_count());
            println!("hash:  {}", hash_issue_tree(&tree));
            Ok(())
        }
        Err(err) => {
            eprintln!("{} is not a valid issue tree:", file.display());
            for issue in &err.issues {
                eprintln!("  - {}", issue);
            }
            std::process::exit(1);
        }
    }
}
