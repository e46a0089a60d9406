//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde_json::Value;

use crate::validation::SneezeCandidate;

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to listen on (overrides `server.bind_address`)
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,
}

/// Record command arguments.
#[derive(Debug, Args)]
pub struct RecordCommand {
    /// How strong the sneeze was, 1 (tiny) to 5 (massive)
    #[arg(allow_hyphen_values = true)]
    pub intensity: String,

    /// Where it happened
    #[arg(short, long)]
    pub location: Option<String>,

    /// Anything worth remembering about it
    #[arg(short, long)]
    pub notes: Option<String>,

    /// When it happened (RFC 3339, "YYYY-MM-DD HH:MM", or "YYYY-MM-DD"); defaults to now
    #[arg(short, long)]
    pub date: Option<String>,

    /// Output the stored record as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl RecordCommand {
    /// Turn the arguments into the same loose candidate the HTTP API receives.
    #[must_use]
    pub fn to_candidate(&self) -> SneezeCandidate {
        SneezeCandidate {
            intensity: Some(Value::String(self.intensity.clone())),
            location: self.location.clone(),
            notes: self.notes.clone(),
            date: self.date.clone().map(Value::String),
        }
    }
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
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
