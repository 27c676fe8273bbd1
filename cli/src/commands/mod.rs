// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the agentstack CLI

pub mod config;
pub mod deploy;
pub mod diff;
pub mod plan;
pub mod synth;

pub use self::config::ConfigCommand;
pub use self::deploy::DeployArgs;
pub use self::diff::DiffArgs;
pub use self::plan::PlanArgs;
pub use self::synth::SynthArgs;

use std::sync::Arc;

use agentstack_core::application::StandardProvisionStackUseCase;
use agentstack_core::domain::engine::DeploymentEngine;
use agentstack_core::infrastructure::event_bus::EventBus;
use agentstack_core::infrastructure::DryRunEngine;

/// Use case for commands that only plan; the engine is never called.
pub(crate) fn planning_use_case() -> StandardProvisionStackUseCase {
    use_case(Arc::new(DryRunEngine::new()), Arc::new(EventBus::default()))
}

pub(crate) fn use_case(
    engine: Arc<dyn DeploymentEngine>,
    event_bus: Arc<EventBus>,
) -> StandardProvisionStackUseCase {
    StandardProvisionStackUseCase::new(engine, event_bus)
}
