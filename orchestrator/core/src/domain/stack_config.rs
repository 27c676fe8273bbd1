// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Stack Configuration Manifest
//
// Optional YAML layer between the compile-time defaults and the
// deployment-time context overrides:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Agent settings (name, model, instruction, description)
// - Compute unit catalogue (package, capability, schema key, environment)
// - Invoke grant scope and strict mode

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::constants;
use crate::domain::resource::InvokeGrantScope;

pub const API_VERSION: &str = "agentstack.dev/v1";
pub const KIND: &str = "StackConfig";

/// Upper bound the compute runtime accepts for a single invocation.
const MAX_COMPUTE_TIMEOUT: Duration = Duration::from_secs(900);

/// Top-level stack configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfigManifest {
    /// API version (must be "agentstack.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "StackConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: StackConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Stack name, used as the template description prefix
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfigSpec {
    /// Agent settings; unset fields fall back to compile-time defaults
    #[serde(default)]
    pub agent: AgentOverrides,

    /// API key injected into every compute unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Compute units, in capability-binding order
    #[serde(default = "default_units")]
    pub units: Vec<ComputeUnitConfig>,

    /// Reach of the agent runtime's invoke grant on each compute unit
    #[serde(default)]
    pub invoke_grant: InvokeGrantScope,

    /// Refuse to resolve while the API key is still the placeholder
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One independently deployable compute unit and its agent capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeUnitConfig {
    /// Short unit name (DNS label), e.g. "travel"
    pub name: String,

    /// Container build context directory
    pub package_dir: String,

    /// Action group name the agent sees
    pub capability: String,

    /// Object key of the capability schema inside the storage container
    pub schema_key: String,

    pub description: String,

    /// Static environment entries
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,

    /// Entries read from the deploying process environment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_from: Vec<EnvBinding>,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

/// Environment entry captured from the deploying process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvBinding {
    pub variable: String,

    /// Used verbatim when the variable is unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Value must parse as JSON
    #[serde(default)]
    pub json: bool,
}

fn default_timeout() -> Duration {
    constants::COMPUTE_TIMEOUT
}

/// The travel and portfolio units the agent ships with.
pub fn default_units() -> Vec<ComputeUnitConfig> {
    vec![
        ComputeUnitConfig {
            name: constants::TRAVEL_UNIT.to_string(),
            package_dir: constants::TRAVEL_PACKAGE_DIR.to_string(),
            capability: constants::TRAVEL_CAPABILITY.to_string(),
            schema_key: constants::TRAVEL_SCHEMA_KEY.to_string(),
            description: constants::TRAVEL_CAPABILITY_DESCRIPTION.to_string(),
            environment: BTreeMap::new(),
            env_from: vec![],
            timeout: default_timeout(),
        },
        ComputeUnitConfig {
            name: constants::PORTFOLIO_UNIT.to_string(),
            package_dir: constants::PORTFOLIO_PACKAGE_DIR.to_string(),
            capability: constants::PORTFOLIO_CAPABILITY.to_string(),
            schema_key: constants::PORTFOLIO_SCHEMA_KEY.to_string(),
            description: constants::PORTFOLIO_CAPABILITY_DESCRIPTION.to_string(),
            environment: BTreeMap::new(),
            env_from: vec![EnvBinding {
                variable: constants::STOCK_PORTFOLIO_VAR.to_string(),
                default: Some(constants::STOCK_PORTFOLIO_DEFAULT.to_string()),
                json: true,
            }],
            timeout: default_timeout(),
        },
    ]
}

impl Default for StackConfigSpec {
    fn default() -> Self {
        Self {
            agent: AgentOverrides::default(),
            api_key: None,
            units: default_units(),
            invoke_grant: InvokeGrantScope::default(),
            strict: false,
        }
    }
}

impl Default for StackConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "travel-planner".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: StackConfigSpec::default(),
        }
    }
}

impl StackConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. AGENTSTACK_CONFIG_PATH environment variable
    /// 2. ./agentstack.yaml (working directory)
    /// 3. ~/.agentstack/config.yaml (user home)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("AGENTSTACK_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./agentstack.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".agentstack").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading stack configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load stack config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading stack configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No stack configuration file found. Using compile-time defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("AGENTSTACK_STRICT") {
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => {
                    tracing::info!("Environment override: AGENTSTACK_STRICT=true");
                    self.spec.strict = true;
                }
                "false" | "0" | "no" | "off" => {
                    tracing::info!("Environment override: AGENTSTACK_STRICT=false");
                    self.spec.strict = false;
                }
                _ => {
                    tracing::warn!(
                        "Invalid value for AGENTSTACK_STRICT: '{}'. Expected true/false. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.units.is_empty() {
            anyhow::bail!("spec.units must declare at least one compute unit");
        }

        let mut unit_names = HashSet::new();
        let mut capabilities = HashSet::new();
        for unit in &self.spec.units {
            validate_unit_name(&unit.name)?;

            if !unit_names.insert(unit.name.as_str()) {
                anyhow::bail!("Duplicate compute unit name: {}", unit.name);
            }

            if unit.capability.is_empty() {
                anyhow::bail!("Capability name cannot be empty for unit: {}", unit.name);
            }
            if !capabilities.insert(unit.capability.as_str()) {
                anyhow::bail!("Duplicate capability name: {}", unit.capability);
            }

            if unit.package_dir.is_empty() {
                anyhow::bail!("package_dir cannot be empty for unit: {}", unit.name);
            }

            if unit.schema_key.is_empty() {
                anyhow::bail!("schema_key cannot be empty for unit: {}", unit.name);
            }

            if unit.timeout.is_zero() || unit.timeout > MAX_COMPUTE_TIMEOUT {
                anyhow::bail!(
                    "Timeout for unit {} must be between 1s and {}s",
                    unit.name,
                    MAX_COMPUTE_TIMEOUT.as_secs()
                );
            }

            if unit.environment.contains_key(constants::API_KEY_VAR)
                || unit.env_from.iter().any(|b| b.variable == constants::API_KEY_VAR)
            {
                anyhow::bail!(
                    "{} is reserved for the injected API key (unit: {})",
                    constants::API_KEY_VAR,
                    unit.name
                );
            }
        }

        Ok(())
    }
}

/// Unit names feed physical resource names: lowercase alphanumerics and
/// hyphens, starting and ending alphanumeric, at most 32 characters.
pub fn validate_unit_name(name: &str) -> anyhow::Result<()> {
    if name.is_empty() || name.len() > 32 {
        anyhow::bail!("Unit name '{}' must be 1-32 characters", name);
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        anyhow::bail!("Unit name '{}' must be lowercase alphanumeric + hyphens", name);
    }

    let starts_ok = name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    let ends_ok = name.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
    if !starts_ok || !ends_ok {
        anyhow::bail!("Unit name '{}' must start and end with alphanumeric", name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = StackConfigManifest::default();
        assert_eq!(manifest.api_version, API_VERSION);
        assert_eq!(manifest.kind, KIND);
        assert_eq!(manifest.spec.units.len(), 2);
        assert_eq!(manifest.spec.units[0].name, "travel");
        assert_eq!(manifest.spec.units[1].name, "portfolio");
        assert_eq!(manifest.spec.invoke_grant, InvokeGrantScope::Service);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_minimal_yaml_uses_default_units() {
        let yaml = r#"
apiVersion: agentstack.dev/v1
kind: StackConfig
metadata:
  name: demo
spec:
  agent:
    model: vendor.model-x-v2
"#;
        let manifest = StackConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.spec.agent.model.as_deref(), Some("vendor.model-x-v2"));
        assert!(manifest.spec.agent.name.is_none());
        assert_eq!(manifest.spec.units, default_units());
        assert!(!manifest.spec.strict);
    }

    #[test]
    fn test_unit_yaml_with_timeout_and_env() {
        let yaml = r#"
apiVersion: agentstack.dev/v1
kind: StackConfig
metadata:
  name: demo
spec:
  invoke_grant: account
  units:
    - name: weather
      package_dir: lib/assets/lambda/weather
      capability: weather-api
      schema_key: api-schema/weather_schema.json
      description: Forecasts
      timeout: 2m
      environment:
        UNITS: metric
      env_from:
        - variable: WEATHER_REGION
          default: eu
"#;
        let manifest = StackConfigManifest::from_yaml_str(yaml).unwrap();
        let unit = &manifest.spec.units[0];
        assert_eq!(unit.timeout, Duration::from_secs(120));
        assert_eq!(unit.environment.get("UNITS").map(String::as_str), Some("metric"));
        assert_eq!(unit.env_from[0].default.as_deref(), Some("eu"));
        assert!(!unit.env_from[0].json);
        assert_eq!(manifest.spec.invoke_grant, InvokeGrantScope::Account);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut manifest = StackConfigManifest::default();

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.spec.units[1].name = "travel".to_string();
        assert!(manifest.validate().is_err());
        manifest.spec.units[1].name = "portfolio".to_string();

        manifest.spec.units[0].timeout = Duration::from_secs(901);
        assert!(manifest.validate().is_err());
        manifest.spec.units[0].timeout = Duration::from_secs(300);

        manifest.spec.units[0]
            .environment
            .insert("API_KEY".to_string(), "shadow".to_string());
        assert!(manifest.validate().is_err());
        manifest.spec.units[0].environment.clear();

        manifest.spec.units.clear();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_unit_name_validation() {
        assert!(validate_unit_name("travel").is_ok());
        assert!(validate_unit_name("stock-quotes2").is_ok());
        assert!(validate_unit_name("Travel").is_err());
        assert!(validate_unit_name("travel_api").is_err());
        assert!(validate_unit_name("-travel").is_err());
        assert!(validate_unit_name("").is_err());
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agentstack.yaml");
        StackConfigManifest::default().to_yaml_file(&path).unwrap();

        let loaded = StackConfigManifest::load_or_default(Some(path)).unwrap();
        assert_eq!(loaded.metadata.name, "travel-planner");
        assert_eq!(loaded.spec.units, default_units());
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let result = StackConfigManifest::load_or_default(Some(PathBuf::from(
            "/nonexistent/agentstack.yaml",
        )));
        assert!(result.is_err());
    }
}
