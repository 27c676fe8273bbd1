// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Orchestrating-Agent Provisioner
//!
//! Declares the agent with one capability binding per target, in the order
//! given. Each binding pairs a compute unit's invocable reference with the
//! location of its schema document. Schema contents and reachability are
//! not checked here; a bad key or an unreachable unit fails at apply time.

use tracing::info;

use crate::domain::graph::{Deferred, GraphError, NodeId, ResourceGraph, ResourceNode, StackOutput};
use crate::domain::provisioner::{AgentHandle, ComputeHandle, IdentityHandle, StorageHandle};
use crate::domain::resource::{AgentSpec, CapabilityBinding, ResourceSpec};

/// Output key under which the agent ARN is published.
pub const AGENT_ARN_OUTPUT: &str = "BedrockAgentArn";

#[derive(Debug, Clone)]
pub struct CapabilityTarget<'a> {
    pub compute: &'a ComputeHandle,
    pub name: String,
    pub schema_key: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct AgentProps<'a> {
    pub node_id: NodeId,
    pub agent_name: String,
    pub model: String,
    pub instruction: String,
    pub description: String,
    pub execution_identity: &'a IdentityHandle,
    pub storage: &'a StorageHandle,
    pub targets: Vec<CapabilityTarget<'a>>,
}

pub struct AgentProvisioner;

impl AgentProvisioner {
    pub fn provision(
        graph: &mut ResourceGraph,
        props: AgentProps<'_>,
    ) -> Result<AgentHandle, GraphError> {
        let capability_bindings: Vec<CapabilityBinding> = props
            .targets
            .iter()
            .map(|target| CapabilityBinding {
                name: target.name.clone(),
                executor: target.compute.arn.clone(),
                bucket: props.storage.bucket.clone(),
                schema_key: target.schema_key.clone(),
                description: target.description.clone(),
            })
            .collect();

        let depends_on: Vec<&NodeId> = [&props.execution_identity.node, &props.storage.node]
            .into_iter()
            .chain(props.targets.iter().map(|t| &t.compute.node))
            .collect();

        let node = ResourceNode::new(
            props.node_id.clone(),
            props.agent_name.clone(),
            ResourceSpec::OrchestratingAgent(AgentSpec {
                agent_name: props.agent_name.clone(),
                foundation_model: props.model,
                instruction: props.instruction,
                description: props.description,
                execution_role: props.execution_identity.arn.clone(),
                capability_bindings,
            }),
        )
        .depends_on(depends_on);
        graph.add_node(node)?;

        let arn = Deferred::arn_of(&props.node_id);
        graph.add_output(StackOutput::new(AGENT_ARN_OUTPUT, arn.clone()))?;

        info!(
            agent = %props.agent_name,
            capabilities = props.targets.len(),
            "Orchestrating agent declared"
        );

        Ok(AgentHandle {
            node: props.node_id,
            agent_name: props.agent_name,
            arn,
        })
    }
}
