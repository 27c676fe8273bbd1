// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use agentstack_core::domain::run_context::ConfigResolver;
use agentstack_core::domain::stack_config::StackConfigManifest;

use crate::request::{environment_snapshot, GlobalArgs};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file and overrides
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./agentstack.yaml")]
        output: PathBuf,

        /// Include every field with comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, globals: &GlobalArgs) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(globals, paths).await,
        ConfigCommand::Validate { file } => {
            let mut globals = globals.clone();
            if file.is_some() {
                globals.config = file;
            }
            validate(&globals).await
        }
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(globals: &GlobalArgs, show_paths: bool) -> Result<()> {
    let manifest = globals.load_manifest()?;
    let environment = environment_snapshot();
    let resolved = ConfigResolver::resolve(
        &manifest.metadata.name,
        &manifest.spec,
        &globals.context_overrides()?,
        &environment,
    )
    .context("Failed to resolve configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &globals.config {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. AGENTSTACK_CONFIG_PATH: {}",
            std::env::var("AGENTSTACK_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./agentstack.yaml");
        println!("  4. ~/.agentstack/config.yaml");
        println!();
    }

    println!("{}", "Resolved configuration:".bold());
    println!();
    println!("{}", "Stack:".bold());
    println!("  Name: {}", resolved.stack_name);
    println!("  API key: {}", resolved.api_key);
    println!("  Invoke grant: {:?}", resolved.invoke_grant);
    println!();

    println!("{}", "Agent:".bold());
    println!("  Name: {}", resolved.agent.name);
    println!("  Model: {}", resolved.agent.model);
    println!("  Description: {}", resolved.agent.description.trim());
    println!(
        "  Instruction: {} lines",
        resolved.agent.instruction.trim().lines().count()
    );
    println!();

    println!("{}", "Compute units:".bold());
    for unit in &resolved.units {
        println!("  {} → {}", unit.name.bold(), unit.capability);
        println!("    Package: {}", unit.package_dir);
        println!("    Schema: {}", unit.schema_key);
        println!("    Timeout: {}s", unit.timeout.as_secs());
        for key in unit.environment.keys() {
            println!("    Env: {}", key);
        }
    }
    println!();

    Ok(())
}

async fn validate(globals: &GlobalArgs) -> Result<()> {
    println!("Validating configuration...");

    let manifest = globals.load_manifest()?;
    manifest
        .validate()
        .context("Configuration validation failed")?;

    let environment = environment_snapshot();
    ConfigResolver::resolve(
        &manifest.metadata.name,
        &manifest.spec,
        &globals.context_overrides()?,
        &environment,
    )
    .context("Configuration does not resolve")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/stack-config-with-examples.yaml")
    } else {
        include_str!("../../templates/stack-config-minimal.yaml")
    };

    // The bundled samples must stay loadable
    StackConfigManifest::from_yaml_str(sample).context("Bundled sample is invalid")?;

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
