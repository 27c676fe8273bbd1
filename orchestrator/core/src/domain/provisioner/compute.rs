// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Compute Provisioner
//!
//! Declares one container-packaged compute unit:
//!
//! 1. a log destination with 30-day retention, destroyed with the unit
//! 2. the unit itself, bound to its identity, with the API key and any extra
//!    environment entries injected and a 300 second timeout
//! 3. an invoke grant for the agent runtime's service principal
//!
//! The grant is not tied to a particular agent instance; see
//! [`InvokeGrantScope`] for the optional account restriction.

use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

use crate::domain::constants;
use crate::domain::graph::{Deferred, GraphError, NodeId, ResourceGraph, ResourceNode, StackOutput};
use crate::domain::policy::AGENT_SERVICE_PRINCIPAL;
use crate::domain::provisioner::{ComputeHandle, IdentityHandle};
use crate::domain::resource::{
    ComputeSpec, InvokeGrant, InvokeGrantScope, LogDestinationSpec, RemovalPolicy, ResourceSpec,
};
use crate::domain::secret::Secret;

#[derive(Debug, Clone)]
pub struct ComputeProps<'a> {
    pub node_id: NodeId,
    pub function_name: String,
    pub log_group_name: String,
    pub package_dir: String,
    pub identity: &'a IdentityHandle,
    pub api_key: Secret,
    pub environment: BTreeMap<String, String>,
    pub timeout: Duration,
    pub invoke_grant: InvokeGrantScope,
}

pub struct ComputeProvisioner;

impl ComputeProvisioner {
    pub fn provision(
        graph: &mut ResourceGraph,
        props: ComputeProps<'_>,
    ) -> Result<ComputeHandle, GraphError> {
        let mut secrets = BTreeMap::new();
        secrets.insert(constants::API_KEY_VAR.to_string(), props.api_key);

        let spec = ComputeSpec {
            function_name: props.function_name.clone(),
            package_dir: props.package_dir,
            role: props.identity.arn.clone(),
            environment: props.environment,
            secrets,
            timeout: props.timeout,
            log_destination: LogDestinationSpec {
                name: props.log_group_name.clone(),
                retention_days: constants::LOG_RETENTION_DAYS,
                removal_policy: RemovalPolicy::Destroy,
            },
            invoke_grant: InvokeGrant {
                principal: AGENT_SERVICE_PRINCIPAL.to_string(),
                scope: props.invoke_grant,
            },
        };

        let node = ResourceNode::new(
            props.node_id.clone(),
            props.function_name.clone(),
            ResourceSpec::ComputeUnit(spec),
        )
        .depends_on([&props.identity.node]);
        graph.add_node(node)?;

        let arn = Deferred::arn_of(&props.node_id);
        let log_destination = Deferred::literal(props.log_group_name);
        let logical_id = props.node_id.logical_id();

        graph.add_output(
            StackOutput::new(format!("{}FunctionArn", logical_id), arn.clone())
                .with_description(format!("ARN for {}", props.function_name)),
        )?;
        graph.add_output(
            StackOutput::new(format!("{}LogGroup", logical_id), log_destination.clone())
                .with_description(format!("CloudWatch Log Group for {}", props.function_name)),
        )?;

        info!(
            function = %props.function_name,
            role = %props.identity.role_name,
            "Compute unit declared"
        );

        Ok(ComputeHandle {
            node: props.node_id,
            function_name: props.function_name,
            arn,
            log_destination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::naming::NamingSuffix;
    use crate::domain::policy::TrustPrincipal;
    use crate::domain::provisioner::{IdentityProps, IdentityProvisioner};

    #[test]
    fn test_compute_unit_binds_identity_and_secret() {
        let suffix = NamingSuffix::new(2024).unwrap();
        let names = suffix.unit_names("travel");
        let mut graph = ResourceGraph::new(suffix);
        let identity = IdentityProvisioner::provision(
            &mut graph,
            IdentityProps {
                node_id: names.identity_node.clone(),
                role_name: names.role_name.clone(),
                trust: TrustPrincipal::ComputeExecution,
            },
        )
        .unwrap();

        let handle = ComputeProvisioner::provision(
            &mut graph,
            ComputeProps {
                node_id: names.compute_node.clone(),
                function_name: names.function_name.clone(),
                log_group_name: names.log_group_name.clone(),
                package_dir: "lib/assets/lambda/travel".to_string(),
                identity: &identity,
                api_key: Secret::new("serp-123"),
                environment: BTreeMap::from([("MODE".to_string(), "test".to_string())]),
                timeout: constants::COMPUTE_TIMEOUT,
                invoke_grant: InvokeGrantScope::Service,
            },
        )
        .unwrap();

        let node = graph.node(&handle.node).unwrap();
        let compute = node.spec.as_compute().unwrap();
        assert_eq!(compute.role, identity.arn);
        assert_eq!(compute.secrets["API_KEY"].expose(), "serp-123");
        assert_eq!(compute.environment["MODE"], "test");
        assert_eq!(compute.timeout, Duration::from_secs(300));
        assert_eq!(compute.log_destination.retention_days, 30);
        assert_eq!(compute.log_destination.removal_policy, RemovalPolicy::Destroy);
        assert_eq!(compute.invoke_grant.principal, "bedrock.amazonaws.com");
        assert_eq!(node.depends_on.iter().collect::<Vec<_>>(), vec![&identity.node]);

        let log_output = graph.output("TravelLambdaConstruct2024LogGroup").unwrap();
        assert_eq!(
            log_output.value,
            Deferred::literal("/aws/lambda/travel-agent-lambda-2024")
        );
        assert_eq!(
            graph.output("TravelLambdaConstruct2024FunctionArn").unwrap().description.as_deref(),
            Some("ARN for travel-agent-lambda-2024")
        );
    }
}
