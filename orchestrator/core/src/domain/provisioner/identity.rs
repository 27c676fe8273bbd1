// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use tracing::info;

use crate::domain::graph::{Deferred, GraphError, NodeId, ResourceGraph, ResourceNode, StackOutput};
use crate::domain::policy::{PolicyStatement, TrustPrincipal};
use crate::domain::provisioner::IdentityHandle;
use crate::domain::resource::{IdentitySpec, ResourceSpec};

#[derive(Debug, Clone)]
pub struct IdentityProps {
    pub node_id: NodeId,
    pub role_name: String,
    pub trust: TrustPrincipal,
}

/// Execution identity for a single compute unit.
pub struct IdentityProvisioner;

impl IdentityProvisioner {
    pub fn provision(
        graph: &mut ResourceGraph,
        props: IdentityProps,
    ) -> Result<IdentityHandle, GraphError> {
        let mut statements = vec![PolicyStatement::log_write()];
        if props.trust == TrustPrincipal::ComputeExecution {
            statements.push(PolicyStatement::agent_runtime_access());
        }

        let spec = IdentitySpec {
            role_name: props.role_name.clone(),
            trust: props.trust,
            statements,
        };
        graph.add_node(ResourceNode::new(
            props.node_id.clone(),
            props.role_name.clone(),
            ResourceSpec::Identity(spec),
        ))?;

        let arn = Deferred::arn_of(&props.node_id);
        graph.add_output(StackOutput::new(
            format!("{}LambdaRoleArn", props.node_id.logical_id()),
            arn.clone(),
        ))?;

        info!(role = %props.role_name, "Identity declared");

        Ok(IdentityHandle {
            node: props.node_id,
            role_name: props.role_name,
            arn,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::naming::NamingSuffix;

    #[test]
    fn test_compute_identity_policy() {
        let mut graph = ResourceGraph::new(NamingSuffix::new(321).unwrap());
        let handle = IdentityProvisioner::provision(
            &mut graph,
            IdentityProps {
                node_id: NodeId::new("TravelLambdaIamConstruct-321"),
                role_name: "travel-agent-lambda-role-321".to_string(),
                trust: TrustPrincipal::ComputeExecution,
            },
        )
        .unwrap();

        let node = graph.node(&handle.node).unwrap();
        let identity = node.spec.as_identity().unwrap();
        assert_eq!(identity.trust.service(), "lambda.amazonaws.com");
        assert_eq!(identity.statements.len(), 2);
        assert_eq!(identity.statements[1].actions, vec!["bedrock:*"]);
        assert!(node.depends_on.is_empty());

        let output = graph.output("TravelLambdaIamConstruct321LambdaRoleArn").unwrap();
        assert_eq!(output.value, handle.arn);
    }
}
