// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use packsmith::processor::{self, ProcessorEnv};
use packsmith::{Config, ProcessorContext};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

mod cli;

use cli::{Cli, Commands};

/// Parse `KEY=VALUE`; the value is JSON when it parses as JSON, else a string
fn parse_var(assignment: &str) -> Result<(String, Value)> {
    let (key, value) = assignment
        .split_once('=')
        .with_context(|| format!("Expected KEY=VALUE, got '{}'", assignment))?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Empty variable name in '{}'", assignment);
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Load input variables from a `.json` or TOML file
fn load_input(path: &Path) -> Result<ProcessorEnv> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file {}", path.display()))?;
    let env = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?
    } else {
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?
    };
    Ok(env)
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::discover()?,
    };
    Ok(config)
}

fn cmd_list() {
    for processor in processor::registry() {
        println!("{:<20} {}", processor.name(), processor.description());
    }
}

fn cmd_info(name: &str) -> Result<()> {
    let processor = processor::find(name)
        .with_context(|| format!("Unknown processor '{}'. Run 'packsmith list'.", name))?;

    println!("{}", processor.name());
    println!("  {}", processor.description());
    println!();
    println!("Input variables:");
    for var in processor.input_variables() {
        let mut flags = Vec::new();
        if var.required {
            flags.push("required".to_string());
        }
        if let Some(default) = var.default {
            flags.push(format!("default: {}", default));
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" ({})", flags.join(", "))
        };
        println!("  {}{}", var.name, flags);
        println!("      {}", var.description);
    }
    println!();
    println!("Output variables:");
    for var in processor.output_variables() {
        println!("  {}", var.name);
        println!("      {}", var.description);
    }
    Ok(())
}

fn cmd_run(name: &str, input: Option<&Path>, vars: &[String], config: Config) -> Result<()> {
    let processor = processor::find(name)
        .with_context(|| format!("Unknown processor '{}'. Run 'packsmith list'.", name))?;

    let mut env = match input {
        Some(path) => load_input(path)?,
        None => ProcessorEnv::new(),
    };
    for assignment in vars {
        let (key, value) = parse_var(assignment)?;
        env.set(&key, value);
    }
    debug!("Input variables: {}", env.len());

    let ctx = ProcessorContext::new(config);
    processor::execute(processor.as_ref(), &mut env, &ctx)
        .with_context(|| format!("{} failed", processor.name()))?;

    info!("{} completed", processor.name());
    println!("{}", serde_json::to_string_pretty(&env)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::List) => {
            cmd_list();
            Ok(())
        }
        Some(Commands::Info { processor }) => cmd_info(&processor),
        Some(Commands::Run {
            processor,
            input,
            vars,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            cmd_run(&processor, input.as_deref(), &vars, config)
        }
        None => {
            println!("packsmith v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'packsmith --help' for usage information");
            Ok(())
        }
    }
}
