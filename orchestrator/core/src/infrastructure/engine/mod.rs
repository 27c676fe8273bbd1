// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deployment engine adapters.

mod dry_run;
mod template_dir;

pub use dry_run::DryRunEngine;
pub use template_dir::{PlanManifest, TemplateDirectoryEngine, PLAN_MANIFEST_FILE};
