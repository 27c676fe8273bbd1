// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Aggregate Identity Provisioner
//!
//! The identity the orchestrating agent runs as. Its policy names every
//! compute identity and the storage container, so it cannot be well-formed
//! before those exist; the node therefore carries explicit edges to all of
//! them in addition to the implicit edges of its references.

use tracing::info;

use crate::domain::graph::{Deferred, GraphError, NodeId, ResourceGraph, ResourceNode, StackOutput};
use crate::domain::policy::{PolicyStatement, TrustPrincipal};
use crate::domain::provisioner::{IdentityHandle, StorageHandle};
use crate::domain::resource::{IdentitySpec, ResourceSpec};

#[derive(Debug, Clone)]
pub struct AggregateIdentityProps<'a> {
    pub node_id: NodeId,
    pub role_name: String,
    /// Compute identities the agent may invoke through.
    pub invokable: &'a [IdentityHandle],
    pub storage: &'a StorageHandle,
}

impl AggregateIdentityProps<'_> {
    /// The invokable identity ARNs as one comma-separated value.
    pub fn joined_identity_arns(&self) -> Deferred {
        Deferred::join(",", self.invokable.iter().map(|i| i.arn.clone()).collect())
    }
}

pub struct AggregateIdentityProvisioner;

impl AggregateIdentityProvisioner {
    pub fn provision(
        graph: &mut ResourceGraph,
        props: AggregateIdentityProps<'_>,
    ) -> Result<IdentityHandle, GraphError> {
        let statements = vec![
            PolicyStatement::allow(
                ["lambda:InvokeFunction"],
                props.invokable.iter().map(|i| i.arn.clone()).collect(),
            ),
            PolicyStatement::allow(
                ["s3:GetObject", "s3:ListBucket"],
                vec![props.storage.arn.clone(), props.storage.arn.with_suffix("/*")],
            ),
            PolicyStatement::allow(
                ["bedrock:InvokeModel"],
                vec![Deferred::literal("arn:aws:bedrock:*::foundation-model/*")],
            ),
        ];

        let depends_on: Vec<&NodeId> = props
            .invokable
            .iter()
            .map(|i| &i.node)
            .chain(std::iter::once(&props.storage.node))
            .collect();

        let node = ResourceNode::new(
            props.node_id.clone(),
            props.role_name.clone(),
            ResourceSpec::AggregateIdentity(IdentitySpec {
                role_name: props.role_name.clone(),
                trust: TrustPrincipal::AgentExecution,
                statements,
            }),
        )
        .depends_on(depends_on);
        graph.add_node(node)?;

        let arn = Deferred::arn_of(&props.node_id);
        graph.add_output(StackOutput::new(
            format!("{}AgentRoleArn", props.node_id.logical_id()),
            arn.clone(),
        ))?;
        graph.add_output(
            StackOutput::new(
                format!("{}InvokableRoleArns", props.node_id.logical_id()),
                props.joined_identity_arns(),
            )
            .with_description("Compute identities the agent may invoke"),
        )?;

        info!(
            role = %props.role_name,
            invokable = props.invokable.len(),
            "Aggregate identity declared"
        );

        Ok(IdentityHandle {
            node: props.node_id,
            role_name: props.role_name,
            arn,
        })
    }
}
