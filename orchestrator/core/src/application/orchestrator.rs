// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Stack Orchestrator
//!
//! Wires the provisioners together for one run. The order of calls is the
//! order of declaration, and every cross-reference is passed as a handle
//! returned by an earlier call:
//!
//! 1. one execution identity per compute unit
//! 2. the storage container
//! 3. the aggregate identity (all compute identities + storage)
//! 4. one compute unit per configured unit, bound to its identity
//! 5. the orchestrating agent with one capability binding per unit
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Collaborators:** Domain provisioners, ResourceGraph

use tracing::info;

use crate::domain::graph::{GraphError, ResourceGraph};
use crate::domain::policy::TrustPrincipal;
use crate::domain::provisioner::{
    AgentProps, AgentProvisioner, AggregateIdentityProps, AggregateIdentityProvisioner,
    CapabilityTarget, ComputeHandle, ComputeProps, ComputeProvisioner, IdentityHandle,
    IdentityProps, IdentityProvisioner, StorageProps, StorageProvisioner,
};
use crate::domain::run_context::RunContext;

pub struct StackOrchestrator;

impl StackOrchestrator {
    /// Declare the full resource graph for `ctx`.
    ///
    /// Pure: no provider calls, no I/O. The same context always yields the
    /// same graph.
    pub fn build(ctx: &RunContext) -> Result<ResourceGraph, GraphError> {
        let suffix = ctx.suffix;
        let config = &ctx.config;
        let mut graph = ResourceGraph::new(suffix);

        let identities: Vec<IdentityHandle> = config
            .units
            .iter()
            .map(|unit| {
                let names = suffix.unit_names(&unit.name);
                IdentityProvisioner::provision(
                    &mut graph,
                    IdentityProps {
                        node_id: names.identity_node,
                        role_name: names.role_name,
                        trust: TrustPrincipal::ComputeExecution,
                    },
                )
            })
            .collect::<Result<_, _>>()?;

        let storage = StorageProvisioner::provision(
            &mut graph,
            StorageProps {
                node_id: suffix.storage_node(),
                bucket_name: suffix.bucket_name(),
            },
        )?;

        let agent_identity = AggregateIdentityProvisioner::provision(
            &mut graph,
            AggregateIdentityProps {
                node_id: suffix.agent_role_node(),
                role_name: suffix.agent_role_name(),
                invokable: &identities,
                storage: &storage,
            },
        )?;

        let computes: Vec<ComputeHandle> = config
            .units
            .iter()
            .zip(&identities)
            .map(|(unit, identity)| {
                let names = suffix.unit_names(&unit.name);
                ComputeProvisioner::provision(
                    &mut graph,
                    ComputeProps {
                        node_id: names.compute_node,
                        function_name: names.function_name,
                        log_group_name: names.log_group_name,
                        package_dir: unit.package_dir.clone(),
                        identity,
                        api_key: config.api_key.clone(),
                        environment: unit.environment.clone(),
                        timeout: unit.timeout,
                        invoke_grant: config.invoke_grant,
                    },
                )
            })
            .collect::<Result<_, _>>()?;

        let targets = config
            .units
            .iter()
            .zip(&computes)
            .map(|(unit, compute)| CapabilityTarget {
                compute,
                name: unit.capability.clone(),
                schema_key: unit.schema_key.clone(),
                description: unit.description.clone(),
            })
            .collect();

        AgentProvisioner::provision(
            &mut graph,
            AgentProps {
                node_id: suffix.agent_node(),
                agent_name: config.agent.name.clone(),
                model: config.agent.model.clone(),
                instruction: config.agent.instruction.clone(),
                description: config.agent.description.clone(),
                execution_identity: &agent_identity,
                storage: &storage,
                targets,
            },
        )?;

        info!(
            run_id = %ctx.run_id,
            suffix = %suffix,
            nodes = graph.nodes().len(),
            outputs = graph.outputs().len(),
            "Resource graph declared"
        );

        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::naming::NamingSuffix;
    use crate::domain::resource::ResourceKind;
    use crate::domain::run_context::{ConfigResolver, ContextOverrides};
    use crate::domain::stack_config::StackConfigSpec;
    use std::collections::HashMap;

    fn context(suffix: u16) -> RunContext {
        let config = ConfigResolver::resolve(
            "travel-planner",
            &StackConfigSpec::default(),
            &ContextOverrides::new(),
            &HashMap::new(),
        )
        .unwrap();
        RunContext::with_suffix(config, NamingSuffix::new(suffix).unwrap())
    }

    #[test]
    fn test_default_graph_shape() {
        let graph = StackOrchestrator::build(&context(1234)).unwrap();
        assert_eq!(graph.nodes().len(), 7);
        assert_eq!(graph.nodes_of_kind(ResourceKind::Identity).len(), 2);
        assert_eq!(graph.nodes_of_kind(ResourceKind::StorageContainer).len(), 1);
        assert_eq!(graph.nodes_of_kind(ResourceKind::AggregateIdentity).len(), 1);
        assert_eq!(graph.nodes_of_kind(ResourceKind::ComputeUnit).len(), 2);
        assert_eq!(graph.nodes_of_kind(ResourceKind::OrchestratingAgent).len(), 1);
    }

    #[test]
    fn test_build_is_deterministic_for_fixed_suffix() {
        let first = serde_json::to_value(StackOrchestrator::build(&context(777)).unwrap()).unwrap();
        let second = serde_json::to_value(StackOrchestrator::build(&context(777)).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
