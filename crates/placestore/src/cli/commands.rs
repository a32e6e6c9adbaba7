//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::place::{Coordinate, PlaceDraft, PlaceId, PlacePatch};
use crate::query::{ListQuery, SortKey, SortOrder};

/// `--at` parser; kept as a plain function so clap gets a `String` error.
fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    raw.parse().map_err(|e: crate::Error| e.to_string())
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Name of the place
    pub name: String,

    /// Category, e.g. "Cafe" or "Park"
    #[arg(short, long, default_value = "")]
    pub category: String,

    /// Location as "LAT,LON" in degrees
    #[arg(
        short,
        long,
        value_name = "LAT,LON",
        allow_hyphen_values = true,
        value_parser = parse_coordinate
    )]
    pub at: Option<Coordinate>,

    /// Free-text notes
    #[arg(short, long, default_value = "")]
    pub notes: String,

    /// Mark as favorite
    #[arg(short, long)]
    pub favorite: bool,

    /// Print the stored place as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl AddCommand {
    /// The draft this command describes.
    #[must_use]
    pub fn to_draft(&self) -> PlaceDraft {
        PlaceDraft::new(self.name.clone())
            .with_category(self.category.clone())
            .with_coordinate(self.at.unwrap_or_default())
            .with_notes(self.notes.clone())
            .favorite(self.favorite)
    }
}

/// Edit command arguments.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Id of the place to edit
    pub id: PlaceId,

    /// New name
    #[arg(long)]
    pub name: Option<String>,

    /// New category
    #[arg(short, long)]
    pub category: Option<String>,

    /// New location as "LAT,LON" in degrees
    #[arg(
        short,
        long,
        value_name = "LAT,LON",
        allow_hyphen_values = true,
        value_parser = parse_coordinate
    )]
    pub at: Option<Coordinate>,

    /// New notes
    #[arg(short, long)]
    pub notes: Option<String>,

    /// Set or clear the favorite flag
    #[arg(short, long)]
    pub favorite: Option<bool>,

    /// Print the updated place as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl EditCommand {
    /// The patch this command describes.
    #[must_use]
    pub fn to_patch(&self) -> PlacePatch {
        let mut patch = PlacePatch::new();
        patch.name.clone_from(&self.name);
        patch.category.clone_from(&self.category);
        patch.notes.clone_from(&self.notes);
        patch.is_favorite = self.favorite;
        if let Some(at) = self.at {
            patch = patch.coordinate(at);
        }
        patch
    }
}

/// Arguments for commands that address one place.
#[derive(Debug, Args)]
pub struct IdCommand {
    /// Id of the place
    pub id: PlaceId,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Sort key (defaults to the configured one)
    #[arg(short, long, value_enum)]
    pub sort: Option<SortKeyArg>,

    /// Sort in descending order
    #[arg(short, long)]
    pub desc: bool,

    /// Only show favorites
    #[arg(long)]
    pub favorites: bool,

    /// Only show places in this category
    #[arg(short, long)]
    pub category: Option<String>,

    /// Only show places whose name, category or notes contain this text
    #[arg(long)]
    pub search: Option<String>,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

impl ListCommand {
    /// Build the query, falling back to `default` for the sort order.
    #[must_use]
    pub fn to_query(&self, default: ListQuery) -> ListQuery {
        let mut query = default.favorites_only(self.favorites);
        if let Some(sort) = self.sort {
            query = query.sort_by(sort.into());
        }
        if self.desc {
            query = query.order(SortOrder::Descending);
        }
        if let Some(category) = &self.category {
            query = query.category(category.clone());
        }
        if let Some(search) = &self.search {
            query = query.search(search.clone());
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        query
    }
}

/// Map command arguments.
#[derive(Debug, Args)]
pub struct MapCommand {
    /// Only show favorites
    #[arg(long)]
    pub favorites: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Sort key argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKeyArg {
    /// By name
    Name,
    /// By category
    Category,
    /// By creation time
    Created,
    /// By last modification time
    Updated,
}

impl From<SortKeyArg> for SortKey {
    fn from(arg: SortKeyArg) -> Self {
        match arg {
            SortKeyArg::Name => Self::Name,
            SortKeyArg::Category => Self::Category,
            SortKeyArg::Created => Self::CreatedAt,
            SortKeyArg::Updated => Self::UpdatedAt,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
