//! Command-line interface for commsheet.
//!
//! This module provides the CLI structure for the `commsheet` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AirportsCommand, ConfigCommand, GenerateCommand, LibraryCommand, SheetsCommand,
};

/// commsheet - build and customize radio phraseology sheets
///
/// An offline comm-sheet engine: expands a route into an ordered script of
/// radio calls, layered with your personal library of edits, reorderings,
/// and additions.
#[derive(Debug, Parser)]
#[command(name = "commsheet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a comm sheet for a route
    Generate(GenerateCommand),

    /// Browse and manage the call library
    #[command(subcommand)]
    Library(LibraryCommand),

    /// Manage saved sheets
    #[command(subcommand)]
    Sheets(SheetsCommand),

    /// Search the airport directory
    Airports(AirportsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "commsheet");
    }

    #[test]
    fn test_parse_generate() {
        let args = vec![
            "commsheet",
            "generate",
            "--from",
            "KADH",
            "--to",
            "KOKC",
            "--callsign",
            "Skyhawk 12345",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Generate(cmd) => {
                assert_eq!(cmd.from, "KADH");
                assert_eq!(cmd.to, "KOKC");
                assert_eq!(cmd.rules, "vfr");
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_parse_generate_with_via() {
        let args = vec![
            "commsheet",
            "generate",
            "--from",
            "KADH",
            "--to",
            "KOKC",
            "--via",
            "KOUN:touch_and_go",
            "--via",
            "KPWA",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Generate(cmd) => {
                assert_eq!(cmd.via, vec!["KOUN:touch_and_go", "KPWA"]);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_parse_library_show() {
        let args = vec!["commsheet", "library", "show"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Library(LibraryCommand::Show { .. })
        ));
    }

    #[test]
    fn test_parse_library_export() {
        let args = vec!["commsheet", "library", "export", "backup.json"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Library(LibraryCommand::Export { .. })
        ));
    }

    #[test]
    fn test_parse_airports() {
        let args = vec!["commsheet", "airports", "tulsa"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Airports(cmd) => assert_eq!(cmd.query, "tulsa"),
            _ => panic!("expected airports"),
        }
    }

    #[test]
    fn test_parse_with_config_and_verbosity() {
        let args = vec!["commsheet", "-c", "/custom/config.toml", "-v", "config", "path"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Verbose);
    }

    #[test]
    fn test_quiet_wins() {
        let args = vec!["commsheet", "-q", "config", "path"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Quiet);
    }
}
