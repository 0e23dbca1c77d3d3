use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// SQLite file (overrides the configuration)
    #[arg(long)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or migrate every table
    Init,

    /// List registered task types
    Tasks,

    /// Print the tasks visible in a session as JSON
    Fetch {
        /// Task table; omit for every task of the selected patient
        #[arg(long, default_value = "")]
        table: String,

        /// Selected patient
        #[arg(long)]
        patient: Option<i64>,

        /// Fetch as a locked session
        #[arg(long)]
        locked: bool,

        /// Order newest first
        #[arg(long)]
        sort: bool,
    },

    /// Create and save an empty task, printing its primary key
    New {
        table: String,

        /// Patient the task belongs to
        #[arg(long)]
        patient: Option<i64>,
    },

    /// Read or write stored variables
    Var {
        #[command(subcommand)]
        command: VarCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum VarCommands {
    /// Print every stored variable name
    List,

    /// Print one variable's value
    Get { name: String },

    /// Set a variable, creating it if needed
    Set {
        name: String,
        /// integer, boolean, real or text
        #[arg(value_name = "TYPE")]
        ty: String,
        value: String,
    },
}
