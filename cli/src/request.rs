// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Turns global command-line flags into a provisioning request.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;

use agentstack_core::application::ProvisionRequest;
use agentstack_core::domain::naming::NamingSuffix;
use agentstack_core::domain::run_context::ContextOverrides;
use agentstack_core::domain::stack_config::StackConfigManifest;

/// Flags shared by every command that builds a graph.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    /// Raw `key=value` context overrides
    pub context: Vec<String>,
    pub suffix: Option<u16>,
}

impl GlobalArgs {
    pub fn load_manifest(&self) -> Result<StackConfigManifest> {
        StackConfigManifest::load_or_default(self.config.clone())
            .context("Failed to load stack configuration")
    }

    pub fn context_overrides(&self) -> Result<ContextOverrides> {
        ContextOverrides::parse_pairs(&self.context).context("Invalid --context override")
    }

    pub fn naming_suffix(&self) -> Result<Option<NamingSuffix>> {
        self.suffix
            .map(NamingSuffix::new)
            .transpose()
            .context("Invalid --suffix")
    }

    /// Build the request from the flags and the process environment.
    pub fn to_request(&self) -> Result<ProvisionRequest> {
        self.to_request_with_env(environment_snapshot())
    }

    pub fn to_request_with_env(&self, environment: HashMap<String, String>) -> Result<ProvisionRequest> {
        Ok(ProvisionRequest {
            manifest: self.load_manifest()?,
            context: self.context_overrides()?,
            environment,
            suffix: self.naming_suffix()?,
        })
    }
}

/// Snapshot of the process environment. Entries that are not valid UTF-8
/// are skipped.
pub fn environment_snapshot() -> HashMap<String, String> {
    utf8_entries(std::env::vars_os())
}

fn utf8_entries<I>(vars: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                tracing::debug!("Skipping non UTF-8 environment entry {:?}", key.ok());
                None
            }
        })
        .collect()
}
