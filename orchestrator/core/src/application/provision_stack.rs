// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Provision Stack Use Case
//!
//! Application service for one provisioning run: resolve configuration,
//! declare the graph, plan, and hand the plan to a deployment engine.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Orchestrate a single provisioning run, fail fast
//! - **Collaborators:**
//!   - Domain: ResourceGraph, DeploymentPlan, RunContext
//!   - Infrastructure: DeploymentEngine, TemplateSynthesizer, EventBus

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

use crate::application::orchestrator::StackOrchestrator;
use crate::domain::engine::{ApplyReport, DeploymentEngine};
use crate::domain::events::ProvisioningEvent;
use crate::domain::naming::NamingSuffix;
use crate::domain::plan::DeploymentPlan;
use crate::domain::run_context::{ConfigResolver, ContextOverrides, RunContext};
use crate::domain::stack_config::StackConfigManifest;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::template::TemplateSynthesizer;

/// Everything one run needs, gathered by the caller.
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub manifest: StackConfigManifest,
    pub context: ContextOverrides,
    /// Snapshot of the deploying process environment.
    pub environment: HashMap<String, String>,
    /// Pin the naming suffix; a fresh one is drawn when `None`.
    pub suffix: Option<NamingSuffix>,
}

impl ProvisionRequest {
    pub fn new(manifest: StackConfigManifest) -> Self {
        Self {
            manifest,
            context: ContextOverrides::new(),
            environment: HashMap::new(),
            suffix: None,
        }
    }
}

/// Provision Stack Use Case
#[async_trait]
pub trait ProvisionStackUseCase: Send + Sync {
    /// Resolve configuration and build the plan. No engine call.
    ///
    /// # Errors
    ///
    /// - Manifest validation failures
    /// - ConfigError: blank or unknown override, missing environment value
    /// - GraphError: structural bug in the declaration
    async fn plan(&self, request: ProvisionRequest) -> Result<DeploymentPlan>;

    /// Apply a plan. The first failing node is reported by physical name.
    async fn apply(&self, plan: &DeploymentPlan) -> Result<ApplyReport>;

    /// `plan` followed by `apply`.
    async fn provision(&self, request: ProvisionRequest) -> Result<(DeploymentPlan, ApplyReport)> {
        let plan = self.plan(request).await?;
        let report = self.apply(&plan).await?;
        Ok((plan, report))
    }
}

/// Standard implementation of ProvisionStackUseCase
pub struct StandardProvisionStackUseCase {
    engine: Arc<dyn DeploymentEngine>,
    event_bus: Arc<EventBus>,
}

impl StandardProvisionStackUseCase {
    pub fn new(engine: Arc<dyn DeploymentEngine>, event_bus: Arc<EventBus>) -> Self {
        Self { engine, event_bus }
    }
}

#[async_trait]
impl ProvisionStackUseCase for StandardProvisionStackUseCase {
    async fn plan(&self, request: ProvisionRequest) -> Result<DeploymentPlan> {
        // Step 1: Validate the manifest and resolve every field once
        request
            .manifest
            .validate()
            .context("Invalid stack configuration")?;
        let stack_name = request.manifest.metadata.name.clone();
        let config = ConfigResolver::resolve(
            &stack_name,
            &request.manifest.spec,
            &request.context,
            &request.environment,
        )
        .context("Failed to resolve stack configuration")?;

        // Step 2: Draw (or pin) the suffix for this run
        let ctx = match request.suffix {
            Some(suffix) => RunContext::with_suffix(config, suffix),
            None => RunContext::new(config),
        };
        self.event_bus.publish(ProvisioningEvent::RunStarted {
            run_id: ctx.run_id,
            stack_name: stack_name.clone(),
            suffix: ctx.suffix.value(),
            started_at: Utc::now(),
        });

        // Step 3: Declare the graph and synthesize the template
        let graph = StackOrchestrator::build(&ctx).context("Failed to declare resource graph")?;
        counter!("agentstack.graph.nodes_declared").increment(graph.nodes().len() as u64);
        let template = TemplateSynthesizer::new(&graph).synthesize(&stack_name);

        let plan = DeploymentPlan::new(ctx.run_id, stack_name, graph, template)
            .context("Failed to order resource graph")?;

        self.event_bus.publish(ProvisioningEvent::PlanReady {
            run_id: plan.run_id,
            node_count: plan.order.len(),
            output_count: plan.graph.outputs().len(),
            planned_at: Utc::now(),
        });
        info!(
            run_id = %plan.run_id,
            suffix = %plan.suffix(),
            nodes = plan.order.len(),
            "Deployment plan ready"
        );

        Ok(plan)
    }

    async fn apply(&self, plan: &DeploymentPlan) -> Result<ApplyReport> {
        info!(run_id = %plan.run_id, engine = self.engine.name(), "Applying deployment plan");

        match self.engine.apply(plan).await {
            Ok(report) => {
                for applied in &report.applied {
                    self.event_bus.publish(ProvisioningEvent::NodeApplied {
                        run_id: plan.run_id,
                        node: applied.node.clone(),
                        physical_name: applied.physical_name.clone(),
                        applied_at: Utc::now(),
                    });
                }
                self.event_bus.publish(ProvisioningEvent::RunSucceeded {
                    run_id: plan.run_id,
                    engine: report.engine.clone(),
                    applied: report.applied.len(),
                    completed_at: Utc::now(),
                });
                counter!("agentstack.runs", "outcome" => "succeeded").increment(1);
                Ok(report)
            }
            Err(e) => {
                let failing = e.failing_node();
                let node = failing.map(|(node, _)| node.clone());
                let physical_name = failing.and_then(|(_, name)| name.map(str::to_string));

                error!(
                    run_id = %plan.run_id,
                    node = ?node,
                    physical_name = ?physical_name,
                    "Provisioning failed: {}",
                    e
                );
                self.event_bus.publish(ProvisioningEvent::RunFailed {
                    run_id: plan.run_id,
                    node: node.clone(),
                    physical_name: physical_name.clone(),
                    reason: e.to_string(),
                    failed_at: Utc::now(),
                });
                counter!("agentstack.runs", "outcome" => "failed").increment(1);

                let at = physical_name
                    .or_else(|| node.map(|n| n.to_string()))
                    .unwrap_or_else(|| self.engine.name().to_string());
                Err(anyhow::Error::new(e).context(format!("Provisioning failed at '{}'", at)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::engine::DryRunEngine;

    #[tokio::test]
    async fn test_plan_uses_pinned_suffix() {
        let use_case = StandardProvisionStackUseCase::new(
            Arc::new(DryRunEngine::new()),
            Arc::new(EventBus::new(16)),
        );
        let mut request = ProvisionRequest::new(StackConfigManifest::default());
        request.suffix = Some(NamingSuffix::new(4242).unwrap());

        let plan = use_case.plan(request).await.unwrap();
        assert_eq!(plan.suffix().value(), 4242);
        assert_eq!(plan.order.len(), 7);
        assert_eq!(plan.template_file_name(), "travel-planner-4242.template.json");
    }

    #[tokio::test]
    async fn test_failed_run_names_physical_resource() {
        let event_bus = Arc::new(EventBus::new(64));
        let mut events = event_bus.subscribe();
        let use_case = StandardProvisionStackUseCase::new(
            Arc::new(DryRunEngine::new().with_failure("agent-assets-555", "BucketAlreadyExists")),
            event_bus,
        );
        let mut request = ProvisionRequest::new(StackConfigManifest::default());
        request.suffix = Some(NamingSuffix::new(555).unwrap());

        let err = use_case.provision(request).await.unwrap_err();
        assert!(err.to_string().contains("agent-assets-555"));

        let mut saw_failure = false;
        while let Ok(event) = events.try_recv() {
            if let ProvisioningEvent::RunFailed { physical_name, .. } = event {
                assert_eq!(physical_name.as_deref(), Some("agent-assets-555"));
                saw_failure = true;
            }
        }
        assert!(saw_failure);
    }
}
