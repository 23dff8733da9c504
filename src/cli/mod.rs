//! Command-line interface for muster.

use clap::{Parser, Subcommand};

/// Muster - army list storage service
#[derive(Parser)]
#[command(name = "muster")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default)
    #[command(alias = "daemon")]
    Serve,

    /// List registered users
    #[command(alias = "ls")]
    Users,

    /// Grant the admin flag to a user
    Promote {
        username: String,

        /// Revoke instead of grant
        #[arg(long)]
        revoke: bool,
    },

    /// Validate configuration and print it with secrets redacted
    CheckConfig,
}
