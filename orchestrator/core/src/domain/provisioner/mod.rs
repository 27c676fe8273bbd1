// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Provisioners
//!
//! Each provisioner declares one node (plus its run outputs) into a
//! [`ResourceGraph`](crate::domain::graph::ResourceGraph) and returns a typed
//! handle. Handles are the only way to reference another provisioner's
//! outputs, so a node can never reference something that has not been
//! declared yet.
//!
//! | Provisioner | Handle | Depends on |
//! |-------------|--------|------------|
//! | [`IdentityProvisioner`] | [`IdentityHandle`] | none |
//! | [`StorageProvisioner`] | [`StorageHandle`] | none |
//! | [`AggregateIdentityProvisioner`] | [`IdentityHandle`] | identities, storage |
//! | [`ComputeProvisioner`] | [`ComputeHandle`] | its identity |
//! | [`AgentProvisioner`] | [`AgentHandle`] | aggregate identity, storage, compute units |

mod agent;
mod aggregate_identity;
mod compute;
mod identity;
mod storage;

pub use agent::{AgentProps, AgentProvisioner, CapabilityTarget};
pub use aggregate_identity::{AggregateIdentityProps, AggregateIdentityProvisioner};
pub use compute::{ComputeProps, ComputeProvisioner};
pub use identity::{IdentityProps, IdentityProvisioner};
pub use storage::{StorageProps, StorageProvisioner};

use crate::domain::graph::{Deferred, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityHandle {
    pub node: NodeId,
    pub role_name: String,
    pub arn: Deferred,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageHandle {
    pub node: NodeId,
    /// Resolves to the bucket name.
    pub bucket: Deferred,
    pub arn: Deferred,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeHandle {
    pub node: NodeId,
    pub function_name: String,
    /// Invocable reference.
    pub arn: Deferred,
    pub log_destination: Deferred,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentHandle {
    pub node: NodeId,
    pub agent_name: String,
    pub arn: Deferred,
}
