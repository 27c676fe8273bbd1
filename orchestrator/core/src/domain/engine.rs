// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Deployment Engine Port
//!
//! The boundary between the orchestrator and whatever materializes the
//! graph against a provider account. The orchestrator hands over a complete
//! [`DeploymentPlan`] and never retries: ordering beyond declared edges,
//! parallelism, rollback and cleanup are the engine's business.
//!
//! | Implementation | Behaviour |
//! |----------------|-----------|
//! | `DryRunEngine` | walks the plan in order, materializes synthetic ARNs |
//! | `TemplateDirectoryEngine` | writes the template and plan manifest to disk |

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::domain::graph::NodeId;
use crate::domain::plan::DeploymentPlan;
use crate::domain::resource::ResourceKind;

#[async_trait]
pub trait DeploymentEngine: Send + Sync {
    /// Short engine name for reports and events.
    fn name(&self) -> &'static str;

    /// Apply the plan, stopping at the first failing node.
    async fn apply(&self, plan: &DeploymentPlan) -> Result<ApplyReport, EngineError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct AppliedNode {
    pub node: NodeId,
    pub kind: ResourceKind,
    pub physical_name: String,
    pub arn: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub run_id: Uuid,
    pub engine: String,
    /// Nodes materialized, in the order they were created.
    pub applied: Vec<AppliedNode>,
    /// Run outputs the engine could resolve.
    pub outputs: BTreeMap<String, String>,
    /// Files handed off to an external engine.
    pub artifacts: Vec<PathBuf>,
}

impl ApplyReport {
    pub fn new(run_id: Uuid, engine: &str) -> Self {
        Self {
            run_id,
            engine: engine.to_string(),
            applied: Vec::new(),
            outputs: BTreeMap::new(),
            artifacts: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Provider-side failure of one node (permission denied, quota, name
    /// collision...). The reason is passed through uninterpreted.
    #[error("Resource '{physical_name}' ({node}) failed: {reason}")]
    NodeFailed {
        node: NodeId,
        physical_name: String,
        reason: String,
    },

    #[error("Node '{node}' references '{reference}' which has not been created")]
    UnresolvedReference { node: NodeId, reference: NodeId },

    #[error("Plan lists node '{0}' which is not in the graph")]
    UnknownNode(NodeId),

    #[error("Failed to write deployment artifacts: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// The failing node and its derived name, when the failure is node-local.
    pub fn failing_node(&self) -> Option<(&NodeId, Option<&str>)> {
        match self {
            EngineError::NodeFailed {
                node, physical_name, ..
            } => Some((node, Some(physical_name.as_str()))),
            EngineError::UnresolvedReference { node, .. } | EngineError::UnknownNode(node) => {
                Some((node, None))
            }
            EngineError::Io(_) | EngineError::Serialization(_) => None,
        }
    }
}
