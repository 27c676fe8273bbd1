// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # agentstack CLI
//!
//! The `agentstack` binary declares the travel-planner agent stack and hands
//! it to a deployment engine.
//!
//! ## Commands
//!
//! - `agentstack synth` - Print or write the synthesized template
//! - `agentstack plan` - Show the creation order without applying
//! - `agentstack deploy` - Apply through the template hand-off or a dry run
//! - `agentstack diff --against FILE` - Compare with an earlier template
//! - `agentstack config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;

use agentstack_cli::commands::{self, ConfigCommand, DeployArgs, DiffArgs, PlanArgs, SynthArgs};
use agentstack_cli::request::GlobalArgs;

/// agentstack - Provision a multi-capability travel-planning agent
#[derive(Parser)]
#[command(name = "agentstack")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to stack configuration file (overrides discovery)
    #[arg(long, global = true, env = "AGENTSTACK_CONFIG_PATH", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Context override, repeatable (apiKey, agentName, agentInstruction, agentModel, agentDescription)
    #[arg(short = 'c', long = "context", global = true, value_name = "KEY=VALUE")]
    context: Vec<String>,

    /// Pin the naming suffix instead of drawing one (100-9999)
    #[arg(long, global = true, value_name = "N")]
    suffix: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "AGENTSTACK_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the deployment template
    #[command(name = "synth")]
    Synth(SynthArgs),

    /// Show the deployment plan
    #[command(name = "plan")]
    Plan(PlanArgs),

    /// Apply the deployment plan
    #[command(name = "deploy")]
    Deploy(DeployArgs),

    /// Diff against a previously synthesized template
    #[command(name = "diff")]
    Diff(DiffArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; STOCK_PORTFOLIO usually comes from it
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(&cli.log_level)?;
    if let Ok(path) = dotenv {
        debug!("Loaded environment from {:?}", path);
    }

    let globals = GlobalArgs {
        config: cli.config,
        context: cli.context,
        suffix: cli.suffix,
    };

    match cli.command {
        Some(Commands::Synth(args)) => commands::synth::execute(args, &globals).await,
        Some(Commands::Plan(args)) => commands::plan::execute(args, &globals).await,
        Some(Commands::Deploy(args)) => commands::deploy::execute(args, &globals).await,
        Some(Commands::Diff(args)) => commands::diff::execute(args, &globals).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, &globals).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}
