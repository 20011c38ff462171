//! rulesync CLI
//!
//! Drives the reconciler against a local state directory that stands in for
//! the remote settings API (`<state-dir>/remote`) and the unit snapshot
//! store (`<state-dir>/snapshots`).
//!
//! # Commands
//!
//! - `create-parent` - Create an empty shared rule list
//! - `materialize` - Apply a unit's rules for the first time
//! - `reconcile` - Move a unit to a new rule set
//! - `observe` - Report which of a unit's rules are still present
//! - `retract` - Remove a unit's rules
//! - `show` - Dump a shared rule list

mod commands;

use clap::{Parser, Subcommand};
use commands::OutputFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Reconcile independently-managed rules inside shared auto-tags.
#[derive(Parser)]
#[command(name = "rulesync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the state directory
    #[arg(global = true, short, long, env = "RULESYNC_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty shared rule list
    CreateParent {
        /// Key of the shared parent
        #[arg(short, long)]
        parent: String,
    },

    /// Apply a unit's rules to a shared parent for the first time
    Materialize {
        /// Key of the shared parent
        #[arg(short, long)]
        parent: String,

        /// Unit id (generated if omitted)
        #[arg(short, long)]
        unit: Option<String>,

        /// JSON file holding the unit's rules
        #[arg(short, long)]
        rules: PathBuf,
    },

    /// Move a unit from its previous rules to a new set
    Reconcile {
        /// Key of the shared parent
        #[arg(short, long)]
        parent: String,

        /// Unit id
        #[arg(short, long)]
        unit: String,

        /// JSON file holding the unit's rules
        #[arg(short, long)]
        rules: PathBuf,
    },

    /// Report which of a unit's rules are still present remotely
    Observe {
        /// Unit id
        #[arg(short, long)]
        unit: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Remove a unit's rules from its shared parent
    Retract {
        /// Unit id
        #[arg(short, long)]
        unit: String,
    },

    /// Dump the rule list of a shared parent
    Show {
        /// Key of the shared parent
        #[arg(short, long)]
        parent: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so json output stays clean
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("rulesync CLI v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let state_dir = cli.state_dir.ok_or(commands::CliError::MissingStateDir)?;
    let state = commands::LocalState::open(&state_dir)?;
    tracing::debug!(state_dir = %state_dir.display(), "opened local state");

    match cli.command {
        Commands::CreateParent { parent } => {
            commands::parent::create_parent(&state, &parent)?;
        }
        Commands::Materialize {
            parent,
            unit,
            rules,
        } => {
            commands::apply::materialize(&state, &parent, unit.as_deref(), &rules)?;
        }
        Commands::Reconcile {
            parent,
            unit,
            rules,
        } => {
            commands::apply::reconcile(&state, &parent, &unit, &rules)?;
        }
        Commands::Observe { unit, format } => {
            commands::observe::run(&state, &unit, format)?;
        }
        Commands::Retract { unit } => {
            commands::apply::retract(&state, &unit)?;
        }
        Commands::Show { parent, format } => {
            commands::show::run(&state, &parent, format)?;
        }
        Commands::Version => {}
    }

    Ok(())
}
