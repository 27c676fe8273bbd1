// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Naming / Collision Strategy
//!
//! Every provisioning run draws one random suffix and derives all physical
//! resource names and node ids from it. Two runs against the same account
//! only collide when they draw the same suffix; that collision is reported by
//! the deployment engine at apply time, never detected here.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Run-scoped naming suffix and derived resource names

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::graph::NodeId;

/// Inclusive lower bound of the suffix range.
pub const SUFFIX_MIN: u16 = 100;

/// Exclusive upper bound of the suffix range.
pub const SUFFIX_MAX: u16 = 10_000;

/// Random suffix shared by every resource name in one provisioning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct NamingSuffix(u16);

impl NamingSuffix {
    /// Draw a fresh suffix from the thread-local generator.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::rng())
    }

    /// Draw a suffix uniformly from `[SUFFIX_MIN, SUFFIX_MAX)` using `rng`.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.random_range(SUFFIX_MIN..SUFFIX_MAX))
    }

    /// Pin a specific suffix (reproducible synth, tests).
    pub fn new(value: u16) -> Result<Self, NamingError> {
        if !(SUFFIX_MIN..SUFFIX_MAX).contains(&value) {
            return Err(NamingError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    /// `<base>-<suffix>`
    pub fn hyphenated(&self, base: &str) -> String {
        format!("{}-{}", base, self.0)
    }

    /// Names for one compute unit (`travel`, `portfolio`, ...).
    pub fn unit_names(&self, unit: &str) -> UnitNames {
        let function_name = self.hyphenated(&format!("{}-agent-lambda", unit));
        let title = title_case(unit);
        UnitNames {
            role_name: self.hyphenated(&format!("{}-agent-lambda-role", unit)),
            log_group_name: format!("/aws/lambda/{}", function_name),
            function_name,
            identity_node: NodeId::new(self.hyphenated(&format!("{}LambdaIamConstruct", title))),
            compute_node: NodeId::new(self.hyphenated(&format!("{}LambdaConstruct", title))),
        }
    }

    /// Role name of the identity the agent runs as.
    pub fn agent_role_name(&self) -> String {
        format!("AmazonBedrockExecutionRoleForAgents_{}", self.0)
    }

    pub fn agent_role_node(&self) -> NodeId {
        NodeId::new(self.hyphenated("BedrockIamConstruct"))
    }

    pub fn bucket_name(&self) -> String {
        self.hyphenated("agent-assets")
    }

    pub fn storage_node(&self) -> NodeId {
        NodeId::new(self.hyphenated("agent-assets"))
    }

    pub fn agent_node(&self) -> NodeId {
        NodeId::new(self.hyphenated("BedrockConstruct"))
    }
}

impl TryFrom<u16> for NamingSuffix {
    type Error = NamingError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NamingSuffix> for u16 {
    fn from(suffix: NamingSuffix) -> Self {
        suffix.0
    }
}

impl std::fmt::Display for NamingSuffix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derived names for a single compute unit within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitNames {
    pub function_name: String,
    pub role_name: String,
    pub log_group_name: String,
    pub identity_node: NodeId,
    pub compute_node: NodeId,
}

#[derive(Debug, thiserror::Error)]
pub enum NamingError {
    #[error("Naming suffix {0} outside [{min}, {max})", min = SUFFIX_MIN, max = SUFFIX_MAX)]
    OutOfRange(u16),
}

/// `portfolio` -> `Portfolio`, `stock-quotes` -> `StockQuotes`
fn title_case(unit: &str) -> String {
    unit.split(|c: char| c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_suffix_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let suffix = NamingSuffix::generate_with(&mut rng);
            assert!((SUFFIX_MIN..SUFFIX_MAX).contains(&suffix.value()));
        }
    }

    #[test]
    fn test_generated_suffix_covers_range_edges() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut low_half = 0;
        let mut high_half = 0;
        for _ in 0..2_000 {
            if NamingSuffix::generate_with(&mut rng).value() < 5_050 {
                low_half += 1;
            } else {
                high_half += 1;
            }
        }
        // Uniform draw: both halves get a healthy share
        assert!(low_half > 800 && high_half > 800);
    }

    #[test]
    fn test_pinned_suffix_validation() {
        assert!(NamingSuffix::new(100).is_ok());
        assert!(NamingSuffix::new(9_999).is_ok());
        assert!(NamingSuffix::new(99).is_err());
        assert!(NamingSuffix::new(10_000).is_err());
    }

    #[test]
    fn test_unit_names_share_suffix() {
        let suffix = NamingSuffix::new(4711).unwrap();
        let names = suffix.unit_names("portfolio");
        assert_eq!(names.function_name, "portfolio-agent-lambda-4711");
        assert_eq!(names.role_name, "portfolio-agent-lambda-role-4711");
        assert_eq!(names.log_group_name, "/aws/lambda/portfolio-agent-lambda-4711");
        assert_eq!(names.identity_node.as_str(), "PortfolioLambdaIamConstruct-4711");
        assert_eq!(names.compute_node.as_str(), "PortfolioLambdaConstruct-4711");
        assert_eq!(suffix.agent_role_name(), "AmazonBedrockExecutionRoleForAgents_4711");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("travel"), "Travel");
        assert_eq!(title_case("stock-quotes"), "StockQuotes");
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<NamingSuffix>("42").is_err());
        let suffix: NamingSuffix = serde_json::from_str("512").unwrap();
        assert_eq!(suffix.value(), 512);
    }
}
