// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deployment Plan
//!
//! Everything the deployment engine receives, frozen before any mutation:
//! the graph, one valid creation order and the synthesized template. A plan
//! can always be printed, so a run that later fails leaves its full intent
//! inspectable.

use serde::Serialize;
use std::fmt::Write as _;
use uuid::Uuid;

use crate::domain::graph::{GraphError, NodeId, ResourceGraph, ResourceNode};
use crate::domain::naming::NamingSuffix;

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentPlan {
    pub run_id: Uuid,
    pub stack_name: String,
    pub graph: ResourceGraph,
    pub order: Vec<NodeId>,
    pub template: serde_json::Value,
}

impl DeploymentPlan {
    pub fn new(
        run_id: Uuid,
        stack_name: impl Into<String>,
        graph: ResourceGraph,
        template: serde_json::Value,
    ) -> Result<Self, GraphError> {
        let order = graph.topological_order()?;
        Ok(Self {
            run_id,
            stack_name: stack_name.into(),
            graph,
            order,
            template,
        })
    }

    pub fn suffix(&self) -> NamingSuffix {
        self.graph.suffix()
    }

    /// Nodes in creation order.
    pub fn steps(&self) -> impl Iterator<Item = &ResourceNode> {
        self.order.iter().filter_map(|id| self.graph.node(id))
    }

    /// `<stack>-<suffix>.template.json`
    pub fn template_file_name(&self) -> String {
        format!("{}-{}.template.json", self.stack_name, self.suffix())
    }

    /// Human-readable plan listing, one line per node in creation order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Stack {} (run {}, suffix {})",
            self.stack_name,
            self.run_id,
            self.suffix()
        );
        for (index, node) in self.steps().enumerate() {
            let _ = write!(
                out,
                "{:>3}. [{}] {} -> {}",
                index + 1,
                node.kind(),
                node.id,
                node.physical_name
            );
            let dependencies = node.all_dependencies();
            if !dependencies.is_empty() {
                let names: Vec<&str> = dependencies.iter().map(NodeId::as_str).collect();
                let _ = write!(out, "  (after {})", names.join(", "));
            }
            out.push('\n');
        }
        if !self.graph.outputs().is_empty() {
            out.push_str("Outputs:\n");
            for output in self.graph.outputs() {
                let _ = writeln!(out, "  - {}", output.key);
            }
        }
        out
    }
}
