//! Command-line interface for Medlist.

mod commands;

use clap::{Parser, Subcommand};

/// Medlist - drug search and personal medication lists backed by RxNav
#[derive(Parser)]
#[command(name = "medlist")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default)
    #[command(alias = "-d", alias = "--daemon")]
    Serve,

    /// Run one drug search against RxNav and print the enriched results
    #[command(alias = "s")]
    Search {
        /// Drug name
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Write a default config.toml if none exists
    Init,
}

pub use commands::*;
