// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `agentstack synth`: print or write the synthesized template.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use agentstack_core::application::ProvisionStackUseCase;

use crate::request::GlobalArgs;

#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Write the template to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub async fn execute(args: SynthArgs, globals: &GlobalArgs) -> Result<()> {
    let plan = super::planning_use_case().plan(globals.to_request()?).await?;
    let rendered = serde_json::to_string_pretty(&plan.template)?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("Failed to write template to {:?}", path))?;
            eprintln!(
                "{}",
                format!(
                    "✓ Template for suffix {} written: {}",
                    plan.suffix(),
                    path.display()
                )
                .green()
            );
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
