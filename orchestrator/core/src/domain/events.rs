// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::graph::NodeId;

/// Lifecycle of one provisioning run, as published on the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProvisioningEvent {
    RunStarted {
        run_id: Uuid,
        stack_name: String,
        suffix: u16,
        started_at: DateTime<Utc>,
    },
    PlanReady {
        run_id: Uuid,
        node_count: usize,
        output_count: usize,
        planned_at: DateTime<Utc>,
    },
    NodeApplied {
        run_id: Uuid,
        node: NodeId,
        physical_name: String,
        applied_at: DateTime<Utc>,
    },
    RunSucceeded {
        run_id: Uuid,
        engine: String,
        applied: usize,
        completed_at: DateTime<Utc>,
    },
    RunFailed {
        run_id: Uuid,
        node: Option<NodeId>,
        physical_name: Option<String>,
        reason: String,
        failed_at: DateTime<Utc>,
    },
}

impl ProvisioningEvent {
    pub fn run_id(&self) -> Uuid {
        match self {
            ProvisioningEvent::RunStarted { run_id, .. }
            | ProvisioningEvent::PlanReady { run_id, .. }
            | ProvisioningEvent::NodeApplied { run_id, .. }
            | ProvisioningEvent::RunSucceeded { run_id, .. }
            | ProvisioningEvent::RunFailed { run_id, .. } => *run_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProvisioningEvent::RunSucceeded { .. } | ProvisioningEvent::RunFailed { .. }
        )
    }
}
