// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod orchestrator;
pub mod provision_stack;

// Re-export use cases for convenience
pub use orchestrator::StackOrchestrator;
pub use provision_stack::{ProvisionRequest, ProvisionStackUseCase, StandardProvisionStackUseCase};
