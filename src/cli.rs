// src/cli.rs
//! CLI definitions for packsmith
//!
//! The command implementations live in `main.rs`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "packsmith")]
#[command(author = "Packsmith Contributors")]
#[command(version)]
#[command(about = "Run packaging pipeline processors", long_about = None)]
pub struct Cli {
    /// Configuration file (default: <config dir>/packsmith/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available processors
    List,

    /// Show a processor's input and output variables
    Info {
        /// Processor name (e.g. ChocolateyPackager)
        processor: String,
    },

    /// Run one processor and print the resulting variables as JSON
    Run {
        /// Processor name (e.g. ChocolateyPackager)
        processor: String,

        /// Input variables from a TOML or JSON file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Set a variable (KEY=VALUE, VALUE parsed as JSON when possible)
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,
    },
}
