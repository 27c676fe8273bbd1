// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Resource Graph Domain Model
//!
//! The orchestrator's only product: a static directed acyclic graph of
//! resource nodes, their typed properties, explicit ordering edges and the
//! run outputs published for downstream consumers.
//!
//! # Design Principles
//!
//! 1. **Acyclic by construction:** a node may only depend on, or reference,
//!    nodes inserted before it. Insertion rejects anything else.
//! 2. **Lazy cross-references:** values produced by another node are carried
//!    as [`Deferred`] handles and resolved by the deployment engine.
//! 3. **Immutability:** nodes are never mutated after insertion.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};
use tracing::debug;

use crate::domain::naming::NamingSuffix;
use crate::domain::resource::{ResourceKind, ResourceSpec};

// ============================================================================
// Value Objects: Identifiers and deferred values
// ============================================================================

/// Logical identifier of a node within one graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Alphanumeric form used as a template logical id.
    pub fn logical_id(&self) -> String {
        self.0.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attribute a node publishes once it exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Arn,
    Name,
}

/// A value that may not exist until the deployment engine materializes the
/// node producing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deferred {
    Literal(String),
    Attribute { node: NodeId, attribute: Attribute },
    Join { separator: String, parts: Vec<Deferred> },
}

impl Deferred {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn arn_of(node: &NodeId) -> Self {
        Self::Attribute {
            node: node.clone(),
            attribute: Attribute::Arn,
        }
    }

    pub fn name_of(node: &NodeId) -> Self {
        Self::Attribute {
            node: node.clone(),
            attribute: Attribute::Name,
        }
    }

    pub fn join(separator: impl Into<String>, parts: Vec<Deferred>) -> Self {
        Self::Join {
            separator: separator.into(),
            parts,
        }
    }

    /// `self` followed by a literal tail, e.g. `<bucket arn>/*`.
    pub fn with_suffix(&self, tail: &str) -> Self {
        Self::join("", vec![self.clone(), Self::literal(tail)])
    }

    /// Nodes this value cannot be resolved without.
    pub fn references(&self) -> Vec<&NodeId> {
        match self {
            Deferred::Literal(_) => Vec::new(),
            Deferred::Attribute { node, .. } => vec![node],
            Deferred::Join { parts, .. } => parts.iter().flat_map(|p| p.references()).collect(),
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Deferred::Literal(value) => Some(value),
            _ => None,
        }
    }
}

// ============================================================================
// Entities: nodes and outputs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub id: NodeId,
    /// Human-readable name derived for this run (role, function, bucket...).
    pub physical_name: String,
    pub spec: ResourceSpec,
    /// Explicit ordering edges.
    #[serde(default)]
    pub depends_on: BTreeSet<NodeId>,
}

impl ResourceNode {
    pub fn new(id: NodeId, physical_name: impl Into<String>, spec: ResourceSpec) -> Self {
        Self {
            id,
            physical_name: physical_name.into(),
            spec,
            depends_on: BTreeSet::new(),
        }
    }

    pub fn depends_on<'a>(mut self, nodes: impl IntoIterator<Item = &'a NodeId>) -> Self {
        self.depends_on.extend(nodes.into_iter().cloned());
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.spec.kind()
    }

    /// Nodes referenced through deferred values.
    pub fn references(&self) -> BTreeSet<NodeId> {
        self.spec
            .deferred_values()
            .into_iter()
            .flat_map(|value| value.references())
            .cloned()
            .collect()
    }

    /// Explicit edges plus implicit edges from references.
    pub fn all_dependencies(&self) -> BTreeSet<NodeId> {
        let mut all = self.depends_on.clone();
        all.extend(self.references());
        all
    }
}

/// A value published for downstream consumption once the run completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackOutput {
    pub key: String,
    pub value: Deferred,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StackOutput {
    pub fn new(key: impl Into<String>, value: Deferred) -> Self {
        Self {
            key: key.into(),
            value,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// ============================================================================
// Aggregate Root: ResourceGraph
// ============================================================================

/// Resource graph for one provisioning run.
///
/// # Invariants
/// - Node ids (and their logical ids) are unique
/// - Every dependency and reference names a node inserted earlier
/// - Output keys are unique and only reference existing nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceGraph {
    suffix: NamingSuffix,
    nodes: Vec<ResourceNode>,
    outputs: Vec<StackOutput>,
}

impl ResourceGraph {
    pub fn new(suffix: NamingSuffix) -> Self {
        Self {
            suffix,
            nodes: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn suffix(&self) -> NamingSuffix {
        self.suffix
    }

    /// Insert a node, rejecting anything that would reference the future.
    pub fn add_node(&mut self, node: ResourceNode) -> Result<(), GraphError> {
        if self.contains(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        let logical_id = node.id.logical_id();
        if logical_id.is_empty() {
            return Err(GraphError::InvalidNodeId(node.id));
        }
        if let Some(clash) = self.nodes.iter().find(|n| n.id.logical_id() == logical_id) {
            return Err(GraphError::LogicalIdClash {
                node: node.id,
                existing: clash.id.clone(),
            });
        }

        for dependency in &node.depends_on {
            if !self.contains(dependency) {
                return Err(GraphError::UnknownDependency {
                    node: node.id.clone(),
                    dependency: dependency.clone(),
                });
            }
        }

        for reference in node.references() {
            if !self.contains(&reference) {
                return Err(GraphError::DanglingReference {
                    node: node.id.clone(),
                    reference,
                });
            }
        }

        debug!(
            node = %node.id,
            kind = %node.kind(),
            physical_name = %node.physical_name,
            "Declared resource node"
        );
        self.nodes.push(node);
        Ok(())
    }

    pub fn add_output(&mut self, output: StackOutput) -> Result<(), GraphError> {
        if self.outputs.iter().any(|o| o.key == output.key) {
            return Err(GraphError::DuplicateOutput(output.key));
        }
        for reference in output.value.references() {
            if !self.contains(reference) {
                return Err(GraphError::UnknownOutputReference {
                    output: output.key.clone(),
                    reference: reference.clone(),
                });
            }
        }
        self.outputs.push(output);
        Ok(())
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.iter().any(|n| &n.id == id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&ResourceNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    pub fn nodes_of_kind(&self, kind: ResourceKind) -> Vec<&ResourceNode> {
        self.nodes.iter().filter(|n| n.kind() == kind).collect()
    }

    pub fn outputs(&self) -> &[StackOutput] {
        &self.outputs
    }

    pub fn output(&self, key: &str) -> Option<&StackOutput> {
        self.outputs.iter().find(|o| o.key == key)
    }

    /// Topological order over explicit and implicit edges (Kahn's algorithm).
    ///
    /// Among ready nodes the earliest declared is taken first, so the result
    /// is deterministic and equals declaration order whenever that is valid.
    /// Graphs built through [`ResourceGraph::add_node`] always succeed; a
    /// deserialized graph may not.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, GraphError> {
        let position: HashMap<&NodeId, usize> =
            self.nodes.iter().enumerate().map(|(i, n)| (&n.id, i)).collect();

        let mut in_degree = vec![0usize; self.nodes.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];

        for (index, node) in self.nodes.iter().enumerate() {
            for dependency in node.all_dependencies() {
                let Some(&dep_index) = position.get(&dependency) else {
                    return Err(GraphError::UnknownDependency {
                        node: node.id.clone(),
                        dependency,
                    });
                };
                in_degree[index] += 1;
                dependents[dep_index].push(index);
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = (0..self.nodes.len())
            .filter(|&i| in_degree[i] == 0)
            .map(Reverse)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(Reverse(index)) = ready.pop() {
            order.push(self.nodes[index].id.clone());
            for &dependent in &dependents[index] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        if order.len() != self.nodes.len() {
            let stuck = self
                .nodes
                .iter()
                .enumerate()
                .filter(|(i, _)| in_degree[*i] > 0)
                .map(|(_, n)| n.id.clone())
                .collect();
            return Err(GraphError::Cycle(stuck));
        }

        Ok(order)
    }
}

// ============================================================================
// Domain Errors
// ============================================================================

/// Structural errors. Any of these is a programming error in the
/// orchestrator, never a runtime condition of the provider.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Node '{0}' declared twice")]
    DuplicateNode(NodeId),

    #[error("Node id '{0}' has no alphanumeric characters")]
    InvalidNodeId(NodeId),

    #[error("Node '{node}' maps to the same logical id as '{existing}'")]
    LogicalIdClash { node: NodeId, existing: NodeId },

    #[error("Node '{node}' depends on undeclared node '{dependency}'")]
    UnknownDependency { node: NodeId, dependency: NodeId },

    #[error("Node '{node}' references undeclared node '{reference}'")]
    DanglingReference { node: NodeId, reference: NodeId },

    #[error("Output '{0}' declared twice")]
    DuplicateOutput(String),

    #[error("Output '{output}' references undeclared node '{reference}'")]
    UnknownOutputReference { output: String, reference: NodeId },

    #[error("Dependency cycle among nodes: {0:?}")]
    Cycle(Vec<NodeId>),
}
