// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Policy statements and trust principals attached to identities.

use serde::{Deserialize, Serialize};

use crate::domain::graph::Deferred;

/// Service principal of the agent runtime.
pub const AGENT_SERVICE_PRINCIPAL: &str = "bedrock.amazonaws.com";

/// Service principal of the compute runtime.
pub const COMPUTE_SERVICE_PRINCIPAL: &str = "lambda.amazonaws.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "Allow",
            Effect::Deny => "Deny",
        }
    }
}

/// Who may assume an identity. Fixed per identity class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrustPrincipal {
    ComputeExecution,
    AgentExecution,
}

impl TrustPrincipal {
    pub fn service(&self) -> &'static str {
        match self {
            TrustPrincipal::ComputeExecution => COMPUTE_SERVICE_PRINCIPAL,
            TrustPrincipal::AgentExecution => AGENT_SERVICE_PRINCIPAL,
        }
    }
}

/// A single permission statement. Resources may reference other nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<Deferred>,
}

impl PolicyStatement {
    pub fn allow<A, S>(actions: A, resources: Vec<Deferred>) -> Self
    where
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            effect: Effect::Allow,
            actions: actions.into_iter().map(Into::into).collect(),
            resources,
        }
    }

    /// Log-write capabilities over every log resource.
    pub fn log_write() -> Self {
        Self::allow(
            [
                "logs:CreateLogGroup",
                "logs:CreateLogStream",
                "logs:PutLogEvents",
                "logs:DescribeLogStreams",
            ],
            vec![Deferred::literal("arn:aws:logs:*:*:*")],
        )
    }

    /// Unrestricted access to the agent runtime API.
    pub fn agent_runtime_access() -> Self {
        Self::allow(["bedrock:*"], vec![Deferred::literal("*")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trust_principals() {
        assert_eq!(TrustPrincipal::ComputeExecution.service(), "lambda.amazonaws.com");
        assert_eq!(TrustPrincipal::AgentExecution.service(), "bedrock.amazonaws.com");
    }

    #[test]
    fn test_log_write_statement() {
        let statement = PolicyStatement::log_write();
        assert_eq!(statement.effect, Effect::Allow);
        assert_eq!(statement.actions.len(), 4);
        assert_eq!(statement.resources, vec![Deferred::literal("arn:aws:logs:*:*:*")]);
    }
}
