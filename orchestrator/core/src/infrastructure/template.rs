// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Template Synthesis
//!
//! Renders a [`ResourceGraph`] as a CloudFormation-style JSON document, the
//! hand-off format external apply/diff engines consume.
//!
//! | Node kind | Template resources |
//! |-----------|--------------------|
//! | identity, aggregate identity | `AWS::IAM::Role` `{L}`, `AWS::IAM::Policy` `{L}Policy` |
//! | storage container | `AWS::S3::Bucket` `{L}` (retained) |
//! | compute unit | `AWS::Logs::LogGroup` `{L}LogGroup`, `AWS::Lambda::Function` `{L}`, `AWS::Lambda::Permission` `{L}InvokePermission` |
//! | orchestrating agent | `AWS::Bedrock::Agent` `{L}` |
//!
//! `{L}` is the node's logical id. Deferred values become `Ref`,
//! `Fn::GetAtt` and `Fn::Join` intrinsics; ordering edges become `DependsOn`
//! over every template resource of the dependency node.

use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

use crate::domain::graph::{Attribute, Deferred, NodeId, ResourceGraph, ResourceNode};
use crate::domain::resource::{
    AgentSpec, ComputeSpec, IdentitySpec, InvokeGrantScope, RemovalPolicy, ResourceKind,
    ResourceSpec, StorageSpec,
};

const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";
const POLICY_VERSION: &str = "2012-10-17";

/// Template metadata key carrying the run's naming suffix.
pub const SUFFIX_METADATA_KEY: &str = "agentstack:suffix";

pub struct TemplateSynthesizer<'g> {
    graph: &'g ResourceGraph,
}

impl<'g> TemplateSynthesizer<'g> {
    pub fn new(graph: &'g ResourceGraph) -> Self {
        Self { graph }
    }

    /// Synthesize the full template. Deterministic for a given graph.
    pub fn synthesize(&self, stack_name: &str) -> Value {
        let mut resources = Map::new();
        for node in self.graph.nodes() {
            for (logical_id, resource) in self.expand(node) {
                resources.insert(logical_id, resource);
            }
        }

        let mut outputs = Map::new();
        for output in self.graph.outputs() {
            let mut entry = Map::new();
            entry.insert("Value".to_string(), self.render(&output.value));
            if let Some(description) = &output.description {
                entry.insert("Description".to_string(), json!(description));
            }
            outputs.insert(output.key.clone(), Value::Object(entry));
        }

        json!({
            "AWSTemplateFormatVersion": TEMPLATE_FORMAT_VERSION,
            "Description": format!("{} (suffix {})", stack_name, self.graph.suffix()),
            "Metadata": {
                SUFFIX_METADATA_KEY: self.graph.suffix().value(),
                "agentstack:stack": stack_name,
            },
            "Resources": resources,
            "Outputs": outputs,
        })
    }

    /// Template logical ids a node expands to, primary resource first.
    pub fn resource_ids(node: &ResourceNode) -> Vec<String> {
        let logical = node.id.logical_id();
        match node.kind() {
            ResourceKind::Identity | ResourceKind::AggregateIdentity => {
                vec![logical.clone(), format!("{}Policy", logical)]
            }
            ResourceKind::StorageContainer | ResourceKind::OrchestratingAgent => vec![logical],
            ResourceKind::ComputeUnit => vec![
                format!("{}LogGroup", logical),
                logical.clone(),
                format!("{}InvokePermission", logical),
            ],
        }
    }

    fn expand(&self, node: &ResourceNode) -> Vec<(String, Value)> {
        let logical = node.id.logical_id();
        let depends_on = self.depends_on(node);

        let mut expanded = match &node.spec {
            ResourceSpec::Identity(identity) | ResourceSpec::AggregateIdentity(identity) => {
                self.identity(&logical, identity)
            }
            ResourceSpec::StorageContainer(storage) => vec![(logical, storage_bucket(storage))],
            ResourceSpec::ComputeUnit(compute) => self.compute(&logical, compute),
            ResourceSpec::OrchestratingAgent(agent) => vec![(logical, self.agent(agent))],
        };

        if !depends_on.is_empty() {
            for (_, resource) in expanded.iter_mut() {
                merge_depends_on(resource, &depends_on);
            }
        }
        expanded
    }

    /// Every template resource of every node `node` depends on.
    fn depends_on(&self, node: &ResourceNode) -> BTreeSet<String> {
        node.all_dependencies()
            .iter()
            .filter_map(|id| self.graph.node(id))
            .flat_map(Self::resource_ids)
            .collect()
    }

    fn identity(&self, logical: &str, identity: &IdentitySpec) -> Vec<(String, Value)> {
        let role = json!({
            "Type": "AWS::IAM::Role",
            "Properties": {
                "RoleName": identity.role_name,
                "AssumeRolePolicyDocument": {
                    "Version": POLICY_VERSION,
                    "Statement": [{
                        "Effect": "Allow",
                        "Principal": { "Service": identity.trust.service() },
                        "Action": "sts:AssumeRole",
                    }],
                },
            },
        });

        let statements: Vec<Value> = identity
            .statements
            .iter()
            .map(|statement| {
                json!({
                    "Effect": statement.effect.as_str(),
                    "Action": statement.actions,
                    "Resource": statement
                        .resources
                        .iter()
                        .map(|r| self.render(r))
                        .collect::<Vec<_>>(),
                })
            })
            .collect();

        let policy_id = format!("{}Policy", logical);
        let policy = json!({
            "Type": "AWS::IAM::Policy",
            "Properties": {
                "PolicyName": policy_id,
                "Roles": [{ "Ref": logical }],
                "PolicyDocument": {
                    "Version": POLICY_VERSION,
                    "Statement": statements,
                },
            },
        });

        vec![(logical.to_string(), role), (policy_id, policy)]
    }

    fn compute(&self, logical: &str, compute: &ComputeSpec) -> Vec<(String, Value)> {
        let log_group_id = format!("{}LogGroup", logical);
        let log_group = json!({
            "Type": "AWS::Logs::LogGroup",
            "Properties": {
                "LogGroupName": compute.log_destination.name,
                "RetentionInDays": compute.log_destination.retention_days,
            },
            "DeletionPolicy": deletion_policy(compute.log_destination.removal_policy),
            "UpdateReplacePolicy": deletion_policy(compute.log_destination.removal_policy),
        });

        let mut variables = Map::new();
        for (key, value) in &compute.environment {
            variables.insert(key.clone(), json!(value));
        }
        for (key, secret) in &compute.secrets {
            variables.insert(key.clone(), json!(secret.expose()));
        }

        let function = json!({
            "Type": "AWS::Lambda::Function",
            "Properties": {
                "FunctionName": compute.function_name,
                "PackageType": "Image",
                "Code": {
                    "ImageUri": {
                        "Fn::Sub": format!(
                            "${{AWS::AccountId}}.dkr.ecr.${{AWS::Region}}.${{AWS::URLSuffix}}/agentstack-assets:{}",
                            compute.function_name
                        ),
                    },
                },
                "Role": self.render(&compute.role),
                "Timeout": compute.timeout.as_secs(),
                "Environment": { "Variables": variables },
                "LoggingConfig": { "LogGroup": { "Ref": log_group_id } },
            },
            "DependsOn": [log_group_id],
            "Metadata": {
                "aws:asset:path": compute.package_dir,
                "aws:asset:property": "Code.ImageUri",
            },
        });

        let mut permission_properties = Map::new();
        permission_properties.insert("Action".to_string(), json!("lambda:InvokeFunction"));
        permission_properties.insert(
            "FunctionName".to_string(),
            json!({ "Fn::GetAtt": [logical, "Arn"] }),
        );
        permission_properties.insert("Principal".to_string(), json!(compute.invoke_grant.principal));
        if compute.invoke_grant.scope == InvokeGrantScope::Account {
            permission_properties.insert(
                "SourceAccount".to_string(),
                json!({ "Ref": "AWS::AccountId" }),
            );
        }
        let permission = json!({
            "Type": "AWS::Lambda::Permission",
            "Properties": permission_properties,
        });

        vec![
            (log_group_id.clone(), log_group),
            (logical.to_string(), function),
            (format!("{}InvokePermission", logical), permission),
        ]
    }

    fn agent(&self, agent: &AgentSpec) -> Value {
        let action_groups: Vec<Value> = agent
            .capability_bindings
            .iter()
            .map(|binding| {
                json!({
                    "ActionGroupName": binding.name,
                    "Description": binding.description,
                    "ActionGroupExecutor": { "Lambda": self.render(&binding.executor) },
                    "ApiSchema": {
                        "S3": {
                            "S3BucketName": self.render(&binding.bucket),
                            "S3ObjectKey": binding.schema_key,
                        },
                    },
                })
            })
            .collect();

        json!({
            "Type": "AWS::Bedrock::Agent",
            "Properties": {
                "AgentName": agent.agent_name,
                "AgentResourceRoleArn": self.render(&agent.execution_role),
                "FoundationModel": agent.foundation_model,
                "Instruction": agent.instruction,
                "Description": agent.description,
                "AutoPrepare": true,
                "ActionGroups": action_groups,
            },
        })
    }

    /// Render a deferred value as a literal or an intrinsic function.
    pub fn render(&self, value: &Deferred) -> Value {
        match value {
            Deferred::Literal(literal) => json!(literal),
            Deferred::Attribute { node, attribute } => self.render_attribute(node, *attribute),
            Deferred::Join { separator, parts } => {
                let rendered: Vec<Value> = parts.iter().map(|p| self.render(p)).collect();
                json!({ "Fn::Join": [separator, rendered] })
            }
        }
    }

    fn render_attribute(&self, node: &NodeId, attribute: Attribute) -> Value {
        let logical = node.logical_id();
        match attribute {
            Attribute::Name => json!({ "Ref": logical }),
            Attribute::Arn => {
                let arn_attribute = match self.graph.node(node).map(ResourceNode::kind) {
                    Some(ResourceKind::OrchestratingAgent) => "AgentArn",
                    _ => "Arn",
                };
                json!({ "Fn::GetAtt": [logical, arn_attribute] })
            }
        }
    }
}

fn storage_bucket(storage: &StorageSpec) -> Value {
    json!({
        "Type": "AWS::S3::Bucket",
        "Properties": { "BucketName": storage.bucket_name },
        "DeletionPolicy": deletion_policy(storage.removal_policy),
        "UpdateReplacePolicy": deletion_policy(storage.removal_policy),
    })
}

fn deletion_policy(policy: RemovalPolicy) -> &'static str {
    match policy {
        RemovalPolicy::Destroy => "Delete",
        RemovalPolicy::Retain => "Retain",
    }
}

/// Union `extra` into the resource's `DependsOn`, keeping it sorted.
fn merge_depends_on(resource: &mut Value, extra: &BTreeSet<String>) {
    let Some(object) = resource.as_object_mut() else {
        return;
    };
    let mut all: BTreeSet<String> = object
        .get("DependsOn")
        .and_then(Value::as_array)
        .map(|existing| {
            existing
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    all.extend(extra.iter().cloned());
    object.insert("DependsOn".to_string(), json!(all));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::naming::NamingSuffix;
    use crate::domain::policy::TrustPrincipal;
    use crate::domain::provisioner::{
        IdentityProps, IdentityProvisioner, StorageProps, StorageProvisioner,
    };

    fn small_graph() -> ResourceGraph {
        let suffix = NamingSuffix::new(2500).unwrap();
        let names = suffix.unit_names("travel");
        let mut graph = ResourceGraph::new(suffix);
        IdentityProvisioner::provision(
            &mut graph,
            IdentityProps {
                node_id: names.identity_node,
                role_name: names.role_name,
                trust: TrustPrincipal::ComputeExecution,
            },
        )
        .unwrap();
        StorageProvisioner::provision(
            &mut graph,
            StorageProps {
                node_id: suffix.storage_node(),
                bucket_name: suffix.bucket_name(),
            },
        )
        .unwrap();
        graph
    }

    #[test]
    fn test_identity_expands_to_role_and_policy() {
        let graph = small_graph();
        let template = TemplateSynthesizer::new(&graph).synthesize("travel-planner");
        let resources = &template["Resources"];

        let role = &resources["TravelLambdaIamConstruct2500"];
        assert_eq!(role["Type"], "AWS::IAM::Role");
        assert_eq!(role["Properties"]["RoleName"], "travel-agent-lambda-role-2500");
        assert_eq!(
            role["Properties"]["AssumeRolePolicyDocument"]["Statement"][0]["Principal"]["Service"],
            "lambda.amazonaws.com"
        );

        let policy = &resources["TravelLambdaIamConstruct2500Policy"];
        assert_eq!(policy["Properties"]["Roles"][0]["Ref"], "TravelLambdaIamConstruct2500");
        assert_eq!(
            policy["Properties"]["PolicyDocument"]["Statement"][1]["Action"][0],
            "bedrock:*"
        );
    }

    #[test]
    fn test_bucket_is_retained() {
        let graph = small_graph();
        let template = TemplateSynthesizer::new(&graph).synthesize("travel-planner");
        let bucket = &template["Resources"]["agentassets2500"];
        assert_eq!(bucket["Properties"]["BucketName"], "agent-assets-2500");
        assert_eq!(bucket["DeletionPolicy"], "Retain");
        assert!(bucket.get("DependsOn").is_none());
    }

    #[test]
    fn test_render_deferred_values() {
        let graph = small_graph();
        let synthesizer = TemplateSynthesizer::new(&graph);
        let bucket = NodeId::new("agent-assets-2500");

        assert_eq!(synthesizer.render(&Deferred::name_of(&bucket)), json!({ "Ref": "agentassets2500" }));
        assert_eq!(
            synthesizer.render(&Deferred::arn_of(&bucket).with_suffix("/*")),
            json!({ "Fn::Join": ["", [{ "Fn::GetAtt": ["agentassets2500", "Arn"] }, "/*"]] })
        );
    }

    #[test]
    fn test_metadata_carries_suffix() {
        let graph = small_graph();
        let template = TemplateSynthesizer::new(&graph).synthesize("travel-planner");
        assert_eq!(template["Metadata"][SUFFIX_METADATA_KEY], 2500);
        assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
    }
}
