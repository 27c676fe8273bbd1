// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use tracing::info;

use crate::domain::graph::{Deferred, GraphError, NodeId, ResourceGraph, ResourceNode};
use crate::domain::provisioner::StorageHandle;
use crate::domain::resource::{RemovalPolicy, ResourceSpec, StorageSpec};

#[derive(Debug, Clone)]
pub struct StorageProps {
    pub node_id: NodeId,
    pub bucket_name: String,
}

/// Object-storage container holding the capability schema documents.
///
/// The documents are uploaded out of band; the container outlives the stack
/// so they are not lost on teardown.
pub struct StorageProvisioner;

impl StorageProvisioner {
    pub fn provision(
        graph: &mut ResourceGraph,
        props: StorageProps,
    ) -> Result<StorageHandle, GraphError> {
        graph.add_node(ResourceNode::new(
            props.node_id.clone(),
            props.bucket_name.clone(),
            ResourceSpec::StorageContainer(StorageSpec {
                bucket_name: props.bucket_name.clone(),
                removal_policy: RemovalPolicy::Retain,
            }),
        ))?;

        info!(bucket = %props.bucket_name, "Storage container declared");

        Ok(StorageHandle {
            bucket: Deferred::name_of(&props.node_id),
            arn: Deferred::arn_of(&props.node_id),
            node: props.node_id,
        })
    }
}
