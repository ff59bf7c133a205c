//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::form::Field;

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only show records whose name, surname or location contains this text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Record field values given on the command line.
#[derive(Debug, Clone, Default, Args)]
pub struct RecordFields {
    /// Given name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Family name
    #[arg(short, long)]
    pub surname: Option<String>,

    /// Age
    #[arg(short, long)]
    pub age: Option<String>,

    /// Where the person is from
    #[arg(short, long)]
    pub location: Option<String>,
}

impl RecordFields {
    /// The fields that were given, paired with their values.
    #[must_use]
    pub fn provided(&self) -> Vec<(Field, &str)> {
        [
            (Field::Name, &self.name),
            (Field::Surname, &self.surname),
            (Field::Age, &self.age),
            (Field::Location, &self.location),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect()
    }
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Values for the new record; missing fields are left empty
    #[command(flatten)]
    pub fields: RecordFields,
}

/// Edit command arguments.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Position of the record to edit (as shown by `list`)
    pub position: usize,

    /// New values; fields not given keep their current value
    #[command(flatten)]
    pub fields: RecordFields,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Position of the record to delete (as shown by `list`)
    pub position: usize,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
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
