//! Type hierarchy inspector
//!
//! Loads a hierarchy configuration and answers questions about it, so a
//! configuration can be checked before an application dispatches through it.
//!
//! Run with: `opdispatch-inspect [OPTIONS] <COMMAND>`

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use opdispatch::config::resolve_tag;
use opdispatch::{HierarchyConfig, TypeHierarchy};

#[derive(Parser)]
#[command(name = "opdispatch-inspect")]
#[command(about = "Inspect operator dispatch type hierarchies")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Hierarchy configuration file
    #[arg(short = 'c', long, env = "OPDISPATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Start from the numeric tower even if the configuration does not ask for it
    #[arg(long)]
    numeric: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every declared edge as JSON
    Show,
    /// Check whether SUB is a subtype of SUP (exits with 1 if not)
    IsSubtype {
        #[arg(value_name = "SUB")]
        sub: String,
        #[arg(value_name = "SUP")]
        sup: String,
    },
    /// List the direct supertypes of a type
    Supertypes {
        #[arg(value_name = "TYPE")]
        name: String,
    },
    /// Print a sample configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Commands::Show => {
            let hierarchy = build_hierarchy(&cli)?;
            println!("{}", serde_json::to_string_pretty(&hierarchy.to_name_map())?);
        }
        Commands::IsSubtype { sub, sup } => {
            let hierarchy = build_hierarchy(&cli)?;
            let holds = hierarchy.is_subtype(&resolve_tag(sub), &resolve_tag(sup));
            println!("{}", holds);
            if !holds {
                std::process::exit(1);
            }
        }
        Commands::Supertypes { name } => {
            let hierarchy = build_hierarchy(&cli)?;
            for sup in hierarchy.supertypes(&resolve_tag(name)) {
                println!("{}", sup);
            }
        }
        Commands::Config => {
            print!("{}", HierarchyConfig::sample().to_toml_string()?);
        }
    }

    Ok(())
}

fn build_hierarchy(cli: &Cli) -> Result<TypeHierarchy> {
    let mut config = match &cli.config {
        Some(path) => {
            debug!("Loading hierarchy from {}", path.display());
            HierarchyConfig::load(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => HierarchyConfig::new(),
    };
    config.numeric_tower |= cli.numeric;

    let hierarchy = config.build().context("Invalid type hierarchy")?;
    info!("Loaded {} subtype edges", hierarchy.edge_count());
    Ok(hierarchy)
}
