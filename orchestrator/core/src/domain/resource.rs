// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Resource Node Specifications
//!
//! Typed properties for each kind of node the orchestrator declares. A node's
//! spec only ever points at other nodes through [`Deferred`] values, which
//! the deployment engine resolves after the producing node exists.
//!
//! | Kind | Expands to (at synthesis) |
//! |------|---------------------------|
//! | `Identity` | execution role + inline policy |
//! | `StorageContainer` | object-storage bucket |
//! | `AggregateIdentity` | agent execution role + inline policy |
//! | `ComputeUnit` | log group + function + invoke permission |
//! | `OrchestratingAgent` | agent with one action group per binding |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::domain::graph::Deferred;
use crate::domain::policy::{PolicyStatement, TrustPrincipal};
use crate::domain::secret::Secret;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Identity,
    StorageContainer,
    AggregateIdentity,
    ComputeUnit,
    OrchestratingAgent,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ResourceKind::Identity => "identity",
            ResourceKind::StorageContainer => "storage-container",
            ResourceKind::AggregateIdentity => "aggregate-identity",
            ResourceKind::ComputeUnit => "compute-unit",
            ResourceKind::OrchestratingAgent => "orchestrating-agent",
        };
        f.write_str(label)
    }
}

/// What happens to a resource when the stack is torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    Destroy,
    Retain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentitySpec {
    pub role_name: String,
    pub trust: TrustPrincipal,
    pub statements: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSpec {
    pub bucket_name: String,
    pub removal_policy: RemovalPolicy,
}

/// Log destination owned by exactly one compute unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogDestinationSpec {
    pub name: String,
    pub retention_days: u16,
    pub removal_policy: RemovalPolicy,
}

/// How far the agent runtime's invoke grant reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvokeGrantScope {
    /// Any caller authenticated as the agent service principal.
    #[default]
    Service,
    /// Only the agent service acting on behalf of the deploying account.
    Account,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeGrant {
    pub principal: String,
    pub scope: InvokeGrantScope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeSpec {
    pub function_name: String,
    /// Build context directory of the container image. Opaque here.
    pub package_dir: String,
    pub role: Deferred,
    pub environment: BTreeMap<String, String>,
    pub secrets: BTreeMap<String, Secret>,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub log_destination: LogDestinationSpec,
    pub invoke_grant: InvokeGrant,
}

/// One agent action group backed by a compute unit and a schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityBinding {
    pub name: String,
    pub executor: Deferred,
    pub bucket: Deferred,
    pub schema_key: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub agent_name: String,
    pub foundation_model: String,
    pub instruction: String,
    pub description: String,
    pub execution_role: Deferred,
    pub capability_bindings: Vec<CapabilityBinding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceSpec {
    Identity(IdentitySpec),
    StorageContainer(StorageSpec),
    AggregateIdentity(IdentitySpec),
    ComputeUnit(ComputeSpec),
    OrchestratingAgent(AgentSpec),
}

impl ResourceSpec {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceSpec::Identity(_) => ResourceKind::Identity,
            ResourceSpec::StorageContainer(_) => ResourceKind::StorageContainer,
            ResourceSpec::AggregateIdentity(_) => ResourceKind::AggregateIdentity,
            ResourceSpec::ComputeUnit(_) => ResourceKind::ComputeUnit,
            ResourceSpec::OrchestratingAgent(_) => ResourceKind::OrchestratingAgent,
        }
    }

    /// Every deferred value embedded in this spec.
    pub fn deferred_values(&self) -> Vec<&Deferred> {
        match self {
            ResourceSpec::Identity(identity) | ResourceSpec::AggregateIdentity(identity) => identity
                .statements
                .iter()
                .flat_map(|s| s.resources.iter())
                .collect(),
            ResourceSpec::StorageContainer(_) => Vec::new(),
            ResourceSpec::ComputeUnit(compute) => vec![&compute.role],
            ResourceSpec::OrchestratingAgent(agent) => {
                let mut values = vec![&agent.execution_role];
                for binding in &agent.capability_bindings {
                    values.push(&binding.executor);
                    values.push(&binding.bucket);
                }
                values
            }
        }
    }

    pub fn as_identity(&self) -> Option<&IdentitySpec> {
        match self {
            ResourceSpec::Identity(identity) | ResourceSpec::AggregateIdentity(identity) => {
                Some(identity)
            }
            _ => None,
        }
    }

    pub fn as_compute(&self) -> Option<&ComputeSpec> {
        match self {
            ResourceSpec::ComputeUnit(compute) => Some(compute),
            _ => None,
        }
    }

    pub fn as_agent(&self) -> Option<&AgentSpec> {
        match self {
            ResourceSpec::OrchestratingAgent(agent) => Some(agent),
            _ => None,
        }
    }
}
