// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod diff;
pub mod engine;
pub mod event_bus;
pub mod template;

pub use diff::TemplateDiff;
pub use engine::{DryRunEngine, TemplateDirectoryEngine};
pub use template::TemplateSynthesizer;
