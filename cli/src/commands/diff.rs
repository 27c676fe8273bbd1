// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `agentstack diff`: compare against a previously synthesized template.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use agentstack_core::application::ProvisionStackUseCase;
use agentstack_core::domain::naming::NamingSuffix;
use agentstack_core::infrastructure::template::SUFFIX_METADATA_KEY;
use agentstack_core::infrastructure::TemplateDiff;

use crate::request::GlobalArgs;

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Template written by an earlier `synth` or `deploy`
    #[arg(long, value_name = "FILE")]
    pub against: PathBuf,
}

pub async fn execute(args: DiffArgs, globals: &GlobalArgs) -> Result<()> {
    let content = std::fs::read_to_string(&args.against)
        .with_context(|| format!("Failed to read template {:?}", args.against))?;
    let previous: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Template {:?} is not valid JSON", args.against))?;

    let mut request = globals.to_request()?;
    // Reuse the earlier run's suffix unless one is pinned explicitly
    if request.suffix.is_none() {
        request.suffix = previous["Metadata"][SUFFIX_METADATA_KEY]
            .as_u64()
            .and_then(|v| u16::try_from(v).ok())
            .and_then(|v| NamingSuffix::new(v).ok());
    }

    let plan = super::planning_use_case().plan(request).await?;
    let diff = TemplateDiff::between(&previous, &plan.template);

    if diff.suffix_changed {
        println!(
            "{}",
            "Naming suffix differs: every resource is replaced.".yellow()
        );
    }
    if diff.is_empty() {
        println!("{}", "✓ No differences".green());
        return Ok(());
    }

    for id in &diff.added {
        println!("{} {}", "+".green(), id);
    }
    for id in &diff.removed {
        println!("{} {}", "-".red(), id);
    }
    for id in &diff.modified {
        println!("{} {}", "~".yellow(), id);
    }
    for key in &diff.outputs_added {
        println!("{} output {}", "+".green(), key);
    }
    for key in &diff.outputs_removed {
        println!("{} output {}", "-".red(), key);
    }
    for key in &diff.outputs_modified {
        println!("{} output {}", "~".yellow(), key);
    }
    println!();
    println!(
        "{}",
        format!(
            "{} added, {} removed, {} modified",
            diff.added.len(),
            diff.removed.len(),
            diff.modified.len()
        )
        .dimmed()
    );
    Ok(())
}
