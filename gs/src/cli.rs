//! CLI argument parsing for gallerystore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gs")]
#[command(author, version, about = "Inspect the shared infographic gallery", long_about = None)]
pub struct Cli {
    /// Path to the gallery store directory
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List saved infographics, newest first
    List {
        /// Only show records from this domain
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// Show one record in full
    Show {
        /// Record ID
        #[arg(required = true)]
        id: String,
    },

    /// List the distinct domains present in the gallery
    Domains,

    /// Rewrite the log with one entry per record
    Compact,
}
