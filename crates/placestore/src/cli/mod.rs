//! Command-line interface for placestore.
//!
//! This module provides the CLI structure and output rendering for the
//! `placectl` binary.

mod commands;
pub mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, EditCommand, IdCommand, ListCommand, MapCommand, OutputFormat,
    SortKeyArg, StatsCommand,
};

use crate::logging::Verbosity;

/// placectl - Keep a list of places you care about
///
/// Stores named places with a category, notes and a favorite flag in a
/// local database.
#[derive(Debug, Parser)]
#[command(name = "placectl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Use this database instead of the configured one
    #[arg(long, global = true, value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors; command output is still printed
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Save a new place
    Add(AddCommand),

    /// Change fields of a saved place
    Edit(EditCommand),

    /// Flip the favorite flag of a place
    Favorite(IdCommand),

    /// Remove a place
    Delete(IdCommand),

    /// List saved places
    List(ListCommand),

    /// Show one place in detail
    Show(IdCommand),

    /// Show map annotations and the starting region
    Map(MapCommand),

    /// Show database statistics
    Stats(StatsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}
