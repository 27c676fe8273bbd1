// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Dry-Run Deployment Engine
//!
//! Walks a plan in creation order and materializes every node with a
//! synthetic ARN, without touching a provider account. Before a node is
//! created, every node it depends on or references must already exist; this
//! is the same guarantee a real engine relies on.
//!
//! Failures can be injected by physical name to rehearse a provider error
//! such as a name collision on an unlucky suffix.

use async_trait::async_trait;
use metrics::counter;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::engine::{AppliedNode, ApplyReport, DeploymentEngine, EngineError};
use crate::domain::graph::{Attribute, Deferred, NodeId, ResourceNode};
use crate::domain::plan::DeploymentPlan;
use crate::domain::resource::ResourceKind;

const ENGINE_NAME: &str = "dry-run";
const DEFAULT_ACCOUNT: &str = "123456789012";
const DEFAULT_REGION: &str = "us-east-1";

pub struct DryRunEngine {
    account_id: String,
    region: String,
    /// physical name -> injected failure reason
    failures: HashMap<String, String>,
}

struct Materialized {
    arn: String,
    name: String,
}

impl DryRunEngine {
    pub fn new() -> Self {
        Self {
            account_id: DEFAULT_ACCOUNT.to_string(),
            region: DEFAULT_REGION.to_string(),
            failures: HashMap::new(),
        }
    }

    pub fn with_account(mut self, account_id: impl Into<String>, region: impl Into<String>) -> Self {
        self.account_id = account_id.into();
        self.region = region.into();
        self
    }

    /// Fail the node whose physical name is `physical_name` with `reason`.
    pub fn with_failure(mut self, physical_name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.failures.insert(physical_name.into(), reason.into());
        self
    }

    fn synthetic_arn(&self, node: &ResourceNode) -> String {
        let name = &node.physical_name;
        match node.kind() {
            ResourceKind::Identity | ResourceKind::AggregateIdentity => {
                format!("arn:aws:iam::{}:role/{}", self.account_id, name)
            }
            ResourceKind::StorageContainer => format!("arn:aws:s3:::{}", name),
            ResourceKind::ComputeUnit => format!(
                "arn:aws:lambda:{}:{}:function:{}",
                self.region, self.account_id, name
            ),
            ResourceKind::OrchestratingAgent => {
                let agent_id = Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
                    .simple()
                    .to_string()
                    .to_uppercase();
                format!(
                    "arn:aws:bedrock:{}:{}:agent/{}",
                    self.region,
                    self.account_id,
                    &agent_id[..10]
                )
            }
        }
    }
}

impl Default for DryRunEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a deferred value, or name the node that does not exist yet.
fn resolve(value: &Deferred, created: &HashMap<NodeId, Materialized>) -> Result<String, NodeId> {
    match value {
        Deferred::Literal(literal) => Ok(literal.clone()),
        Deferred::Attribute { node, attribute } => {
            let materialized = created.get(node).ok_or_else(|| node.clone())?;
            Ok(match attribute {
                Attribute::Arn => materialized.arn.clone(),
                Attribute::Name => materialized.name.clone(),
            })
        }
        Deferred::Join { separator, parts } => {
            let resolved = parts
                .iter()
                .map(|part| resolve(part, created))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(resolved.join(separator))
        }
    }
}

#[async_trait]
impl DeploymentEngine for DryRunEngine {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    async fn apply(&self, plan: &DeploymentPlan) -> Result<ApplyReport, EngineError> {
        let mut report = ApplyReport::new(plan.run_id, ENGINE_NAME);
        let mut created: HashMap<NodeId, Materialized> = HashMap::new();

        for id in &plan.order {
            let node = plan
                .graph
                .node(id)
                .ok_or_else(|| EngineError::UnknownNode(id.clone()))?;

            for dependency in node.all_dependencies() {
                if !created.contains_key(&dependency) {
                    return Err(EngineError::UnresolvedReference {
                        node: id.clone(),
                        reference: dependency,
                    });
                }
            }
            for value in node.spec.deferred_values() {
                resolve(value, &created).map_err(|reference| EngineError::UnresolvedReference {
                    node: id.clone(),
                    reference,
                })?;
            }

            if let Some(reason) = self.failures.get(&node.physical_name) {
                counter!("agentstack.engine.nodes_failed", "engine" => ENGINE_NAME).increment(1);
                warn!(
                    node = %id,
                    physical_name = %node.physical_name,
                    "Dry-run node failed: {}",
                    reason
                );
                return Err(EngineError::NodeFailed {
                    node: id.clone(),
                    physical_name: node.physical_name.clone(),
                    reason: reason.clone(),
                });
            }

            let arn = self.synthetic_arn(node);
            debug!(node = %id, arn = %arn, "Dry-run node created");
            counter!("agentstack.engine.nodes_applied", "engine" => ENGINE_NAME).increment(1);

            created.insert(
                id.clone(),
                Materialized {
                    arn: arn.clone(),
                    name: node.physical_name.clone(),
                },
            );
            report.applied.push(AppliedNode {
                node: id.clone(),
                kind: node.kind(),
                physical_name: node.physical_name.clone(),
                arn,
            });
        }

        for output in plan.graph.outputs() {
            match resolve(&output.value, &created) {
                Ok(value) => {
                    report.outputs.insert(output.key.clone(), value);
                }
                Err(reference) => {
                    warn!(output = %output.key, reference = %reference, "Output left unresolved");
                }
            }
        }

        info!(
            run_id = %plan.run_id,
            applied = report.applied.len(),
            outputs = report.outputs.len(),
            "Dry run complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::{ResourceGraph, StackOutput};
    use crate::domain::naming::NamingSuffix;
    use crate::domain::resource::{RemovalPolicy, ResourceSpec, StorageSpec};

    fn bucket(id: &str) -> ResourceNode {
        ResourceNode::new(
            NodeId::new(id),
            id,
            ResourceSpec::StorageContainer(StorageSpec {
                bucket_name: id.to_string(),
                removal_policy: RemovalPolicy::Retain,
            }),
        )
    }

    fn plan() -> DeploymentPlan {
        let mut graph = ResourceGraph::new(NamingSuffix::new(300).unwrap());
        graph.add_node(bucket("first")).unwrap();
        graph
            .add_node(bucket("second").depends_on([&NodeId::new("first")]))
            .unwrap();
        graph
            .add_output(StackOutput::new(
                "Both",
                Deferred::join(
                    ",",
                    vec![
                        Deferred::name_of(&NodeId::new("first")),
                        Deferred::arn_of(&NodeId::new("second")),
                    ],
                ),
            ))
            .unwrap();
        DeploymentPlan::new(Uuid::new_v4(), "test", graph, serde_json::json!({})).unwrap()
    }

    #[tokio::test]
    async fn test_applies_in_order_and_resolves_outputs() {
        let report = DryRunEngine::new().apply(&plan()).await.unwrap();
        let names: Vec<&str> = report.applied.iter().map(|a| a.physical_name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(report.outputs["Both"], "first,arn:aws:s3:::second");
    }

    #[tokio::test]
    async fn test_injected_failure_stops_run() {
        let engine = DryRunEngine::new().with_failure("second", "BucketAlreadyExists");
        let err = engine.apply(&plan()).await.unwrap_err();
        match &err {
            EngineError::NodeFailed {
                node, physical_name, reason,
            } => {
                assert_eq!(node.as_str(), "second");
                assert_eq!(physical_name, "second");
                assert_eq!(reason, "BucketAlreadyExists");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.failing_node().and_then(|(_, name)| name), Some("second"));
    }

    #[tokio::test]
    async fn test_out_of_order_plan_is_rejected() {
        let mut plan = plan();
        plan.order.reverse();
        let err = DryRunEngine::new().apply(&plan).await.unwrap_err();
        assert!(matches!(err, EngineError::UnresolvedReference { .. }));
    }
}
