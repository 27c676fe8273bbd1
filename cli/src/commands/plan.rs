// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `agentstack plan`: show what would be created, in order.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use agentstack_core::application::ProvisionStackUseCase;

use crate::request::GlobalArgs;

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Print the creation order as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: PlanArgs, globals: &GlobalArgs) -> Result<()> {
    let plan = super::planning_use_case().plan(globals.to_request()?).await?;

    if args.json {
        let steps: Vec<serde_json::Value> = plan
            .steps()
            .map(|node| {
                serde_json::json!({
                    "node": node.id,
                    "kind": node.kind(),
                    "physical_name": node.physical_name,
                    "depends_on": node.all_dependencies(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&steps)?);
        return Ok(());
    }

    println!("{}", "Deployment plan:".bold());
    print!("{}", plan.render());
    println!();
    println!(
        "{}",
        format!("{} resources, nothing applied", plan.order.len()).dimmed()
    );
    Ok(())
}
