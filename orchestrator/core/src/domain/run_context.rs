// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Run Context & Configuration Resolution
//!
//! Resolves the effective configuration of one provisioning run. Each field
//! is looked up independently with the precedence
//!
//! 1. deployment-time context override (`-c agentModel=...`)
//! 2. stack manifest (`spec.agent.model`)
//! 3. compile-time default (`constants::AGENT_MODEL`)
//!
//! Resolution is a pure function of its inputs: the process environment is
//! passed in as a snapshot, so resolving twice from the same inputs yields
//! the same configuration. The only randomness of a run is its naming
//! suffix, drawn when the [`RunContext`] is created.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Run-scoped configuration, resolved once before any node exists

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::constants;
use crate::domain::naming::NamingSuffix;
use crate::domain::resource::InvokeGrantScope;
use crate::domain::secret::Secret;
use crate::domain::stack_config::{ComputeUnitConfig, StackConfigSpec};

pub const CTX_API_KEY: &str = "apiKey";
pub const CTX_AGENT_NAME: &str = "agentName";
pub const CTX_AGENT_INSTRUCTION: &str = "agentInstruction";
pub const CTX_AGENT_MODEL: &str = "agentModel";
pub const CTX_AGENT_DESCRIPTION: &str = "agentDescription";

/// Context keys accepted on the command line.
pub const CONTEXT_KEYS: [&str; 5] = [
    CTX_API_KEY,
    CTX_AGENT_NAME,
    CTX_AGENT_INSTRUCTION,
    CTX_AGENT_MODEL,
    CTX_AGENT_DESCRIPTION,
];

// ============================================================================
// Context overrides
// ============================================================================

/// Deployment-time overrides, keyed by context key.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ContextOverrides(BTreeMap<String, String>);

impl ContextOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<(), ConfigError> {
        if !CONTEXT_KEYS.contains(&key) {
            return Err(ConfigError::UnknownContextKey(key.to_string()));
        }
        self.0.insert(key.to_string(), value.into());
        Ok(())
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Result<Self, ConfigError> {
        self.set(key, value)?;
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Parse `key=value` pairs. The value may itself contain `=`.
    pub fn parse_pairs<I, S>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| ConfigError::MalformedContextPair(pair.to_string()))?;
            overrides.set(key.trim(), value)?;
        }
        Ok(overrides)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ContextOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.0 {
            if key == CTX_API_KEY {
                map.entry(key, &"***");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

// ============================================================================
// Resolved configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    pub instruction: String,
    pub model: String,
    pub description: String,
}

/// A compute unit with its environment fully materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedUnit {
    pub name: String,
    pub package_dir: String,
    pub capability: String,
    pub schema_key: String,
    pub description: String,
    pub environment: BTreeMap<String, String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub stack_name: String,
    pub api_key: Secret,
    pub agent: AgentConfig,
    pub units: Vec<ResolvedUnit>,
    pub invoke_grant: InvokeGrantScope,
}

pub struct ConfigResolver;

impl ConfigResolver {
    /// Resolve every field once. Fails before any resource node is built.
    pub fn resolve(
        stack_name: &str,
        spec: &StackConfigSpec,
        context: &ContextOverrides,
        environment: &HashMap<String, String>,
    ) -> Result<ResolvedConfig, ConfigError> {
        let api_key = pick(CTX_API_KEY, context, spec.api_key.as_deref(), constants::API_KEY);
        if spec.strict && api_key == constants::API_KEY {
            return Err(ConfigError::MissingRequired(CTX_API_KEY));
        }

        let agent = AgentConfig {
            name: pick(CTX_AGENT_NAME, context, spec.agent.name.as_deref(), constants::AGENT_NAME),
            instruction: pick(
                CTX_AGENT_INSTRUCTION,
                context,
                spec.agent.instruction.as_deref(),
                constants::AGENT_INSTRUCTION,
            ),
            model: pick(CTX_AGENT_MODEL, context, spec.agent.model.as_deref(), constants::AGENT_MODEL),
            description: pick(
                CTX_AGENT_DESCRIPTION,
                context,
                spec.agent.description.as_deref(),
                constants::AGENT_DESCRIPTION,
            ),
        };

        let units = spec
            .units
            .iter()
            .map(|unit| resolve_unit(unit, environment))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResolvedConfig {
            stack_name: stack_name.to_string(),
            api_key: Secret::new(api_key),
            agent,
            units,
            invoke_grant: spec.invoke_grant,
        })
    }
}

/// Context override, then manifest value, then default. A blank value counts
/// as absent at every layer.
fn pick(
    key: &'static str,
    context: &ContextOverrides,
    manifest: Option<&str>,
    default: &str,
) -> String {
    let present = |value: &&str| !value.trim().is_empty();
    let value = context
        .get(key)
        .filter(present)
        .or(manifest.filter(present))
        .unwrap_or(default);
    value.to_string()
}

fn resolve_unit(
    unit: &ComputeUnitConfig,
    environment: &HashMap<String, String>,
) -> Result<ResolvedUnit, ConfigError> {
    let mut resolved_env = unit.environment.clone();

    for binding in &unit.env_from {
        let value = match (environment.get(&binding.variable), &binding.default) {
            (Some(value), _) => value.clone(),
            (None, Some(default)) => default.clone(),
            (None, None) => {
                return Err(ConfigError::MissingEnvironment {
                    unit: unit.name.clone(),
                    variable: binding.variable.clone(),
                })
            }
        };

        if binding.json {
            serde_json::from_str::<serde_json::Value>(&value).map_err(|e| {
                ConfigError::InvalidEnvironmentValue {
                    variable: binding.variable.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        resolved_env.insert(binding.variable.clone(), value);
    }

    Ok(ResolvedUnit {
        name: unit.name.clone(),
        package_dir: unit.package_dir.clone(),
        capability: unit.capability.clone(),
        schema_key: unit.schema_key.clone(),
        description: unit.description.clone(),
        environment: resolved_env,
        timeout: unit.timeout,
    })
}

// ============================================================================
// Run context
// ============================================================================

/// Per-run state owned by the top-level orchestrator.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub suffix: NamingSuffix,
    pub config: ResolvedConfig,
}

impl RunContext {
    /// New run with a freshly drawn suffix.
    pub fn new(config: ResolvedConfig) -> Self {
        Self::with_suffix(config, NamingSuffix::generate())
    }

    pub fn with_suffix(config: ResolvedConfig, suffix: NamingSuffix) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            suffix,
            config,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown context key '{0}' (expected one of apiKey, agentName, agentInstruction, agentModel, agentDescription)")]
    UnknownContextKey(String),

    #[error("Malformed context override '{0}', expected key=value")]
    MalformedContextPair(String),

    #[error("'{0}' must be supplied: the compiled-in default is a placeholder")]
    MissingRequired(&'static str),

    #[error("Environment variable {variable} required by unit '{unit}' is not set and has no default")]
    MissingEnvironment { unit: String, variable: String },

    #[error("Environment variable {variable} is not valid JSON: {reason}")]
    InvalidEnvironmentValue { variable: String, reason: String },
}
