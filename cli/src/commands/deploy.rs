// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `agentstack deploy`: plan and hand the plan to a deployment engine.
//!
//! Without `--dry-run` the template and plan manifest are written to
//! `--out` for an external apply engine. With `--dry-run` every node is
//! materialized with a synthetic ARN; `--fail-on NAME=REASON` rehearses a
//! provider failure on one resource.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use agentstack_core::application::ProvisionStackUseCase;
use agentstack_core::domain::engine::DeploymentEngine;
use agentstack_core::domain::events::ProvisioningEvent;
use agentstack_core::infrastructure::event_bus::{EventBus, EventReceiver};
use agentstack_core::infrastructure::{DryRunEngine, TemplateDirectoryEngine};

use crate::request::GlobalArgs;

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Output directory for the template hand-off
    #[arg(long, value_name = "DIR", default_value = "cdk.out")]
    pub out: PathBuf,

    /// Materialize synthetic resources instead of writing the hand-off
    #[arg(long)]
    pub dry_run: bool,

    /// Inject a failure for a physical name (dry run only), NAME=REASON
    #[arg(long = "fail-on", value_name = "NAME=REASON", requires = "dry_run")]
    pub fail_on: Vec<String>,
}

fn engine(args: &DeployArgs) -> Result<Arc<dyn DeploymentEngine>> {
    if !args.dry_run {
        return Ok(Arc::new(TemplateDirectoryEngine::new(args.out.clone())));
    }

    let mut engine = DryRunEngine::new();
    for spec in &args.fail_on {
        let (name, reason) = spec
            .split_once('=')
            .with_context(|| format!("Invalid --fail-on '{}', expected NAME=REASON", spec))?;
        engine = engine.with_failure(name, reason);
    }
    Ok(Arc::new(engine))
}

pub async fn execute(args: DeployArgs, globals: &GlobalArgs) -> Result<()> {
    let event_bus = Arc::new(EventBus::default());
    let printer = tokio::spawn(print_events(event_bus.subscribe()));
    let use_case = super::use_case(engine(&args)?, event_bus);

    let plan = match use_case.plan(globals.to_request()?).await {
        Ok(plan) => plan,
        Err(e) => {
            printer.abort();
            return Err(e);
        }
    };

    let result = use_case.apply(&plan).await;
    // A terminal event is always published by apply
    let _ = printer.await;

    match result {
        Ok(report) => {
            println!();
            println!(
                "{}",
                format!(
                    "✓ Run {} complete ({} engine, suffix {})",
                    report.run_id,
                    report.engine,
                    plan.suffix()
                )
                .green()
            );
            for artifact in &report.artifacts {
                println!("  {} {}", "wrote".dimmed(), artifact.display());
            }
            if !report.outputs.is_empty() {
                println!("{}", "Outputs:".bold());
                for (key, value) in &report.outputs {
                    println!("  {} = {}", key, value);
                }
            }
            Ok(())
        }
        Err(e) => {
            eprintln!();
            eprintln!("{}", "Plan at time of failure:".yellow());
            eprint!("{}", plan.render());
            Err(e)
        }
    }
}

async fn print_events(mut events: EventReceiver) {
    while let Ok(event) = events.recv().await {
        match &event {
            ProvisioningEvent::RunStarted {
                stack_name, suffix, ..
            } => {
                println!("{} {} (suffix {})", "Provisioning".bold(), stack_name, suffix);
            }
            ProvisioningEvent::PlanReady { node_count, .. } => {
                println!("  planned {} resources", node_count);
            }
            ProvisioningEvent::NodeApplied {
                node, physical_name, ..
            } => {
                println!("  {} {} ({})", "✓".green(), physical_name, node.as_str().dimmed());
            }
            ProvisioningEvent::RunSucceeded { .. } => {}
            ProvisioningEvent::RunFailed {
                physical_name, reason, ..
            } => {
                eprintln!(
                    "  {} {}: {}",
                    "✗".red(),
                    physical_name.as_deref().unwrap_or("run"),
                    reason
                );
            }
        }
        if event.is_terminal() {
            break;
        }
    }
}
