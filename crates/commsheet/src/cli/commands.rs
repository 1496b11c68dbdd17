//! Command argument structures for the `commsheet` CLI.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Arguments for generating a comm sheet.
#[derive(Debug, Args)]
pub struct GenerateCommand {
    /// Departure airport identifier (e.g. KADH, or "adh")
    #[arg(long, value_name = "ID")]
    pub from: String,

    /// Destination airport identifier
    #[arg(long, value_name = "ID")]
    pub to: String,

    /// Intermediate stop, optionally with an intention
    /// (touch_and_go, stop_and_go, full_stop, taxi_back);
    /// repeatable, in route order
    #[arg(long = "via", value_name = "ID[:INTENTION]")]
    pub via: Vec<String>,

    /// Flight rules (vfr or ifr)
    #[arg(long, default_value = "vfr")]
    pub rules: String,

    /// Call sign, e.g. "Skyhawk 12345"
    #[arg(long, default_value = "")]
    pub callsign: String,

    /// Include expected ATC responses in the output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub atc: bool,

    /// Output the generated sheet as JSON
    #[arg(long)]
    pub json: bool,
}

/// Library browsing and management.
#[derive(Debug, Subcommand)]
pub enum LibraryCommand {
    /// Show the effective library (master + overrides + user calls)
    Show {
        /// Restrict to one block id (e.g. taxi_out)
        #[arg(long)]
        block: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the library customizations to a JSON bundle
    Export {
        /// Destination file
        output: PathBuf,
    },

    /// Import a JSON bundle, replacing current customizations
    Import {
        /// Source file
        input: PathBuf,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Reset customizations to factory state (user content is kept)
    RestoreDefaults {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Promote the current library as the default applied at every start
    SetDefault,

    /// Clear the promoted default library
    ClearDefault,
}

/// Saved-sheet management.
#[derive(Debug, Subcommand)]
pub enum SheetsCommand {
    /// List saved sheets
    List,

    /// Delete a saved sheet
    Delete {
        /// Sheet id (from `sheets list`)
        id: String,
    },
}

/// Arguments for airport directory search.
#[derive(Debug, Args)]
pub struct AirportsCommand {
    /// Search term: identifier, name, or city
    pub query: String,
}

/// Configuration inspection.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the current configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default configuration file path
    Path,

    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the standard path)
        file: Option<PathBuf>,
    },
}
