// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::collections::{BTreeSet, HashMap};

use agentstack_core::application::StackOrchestrator;
use agentstack_core::domain::constants;
use agentstack_core::domain::graph::{Deferred, NodeId, ResourceGraph};
use agentstack_core::domain::naming::NamingSuffix;
use agentstack_core::domain::resource::{InvokeGrantScope, ResourceKind};
use agentstack_core::domain::run_context::{
    ConfigError, ConfigResolver, ContextOverrides, RunContext, CTX_AGENT_MODEL,
};
use agentstack_core::domain::stack_config::StackConfigSpec;
use agentstack_core::infrastructure::TemplateSynthesizer;

fn build_with(
    spec: &StackConfigSpec,
    context: &ContextOverrides,
    env: &HashMap<String, String>,
    suffix: u16,
) -> ResourceGraph {
    let config = ConfigResolver::resolve("travel-planner", spec, context, env).unwrap();
    let ctx = RunContext::with_suffix(config, NamingSuffix::new(suffix).unwrap());
    StackOrchestrator::build(&ctx).unwrap()
}

fn build(suffix: u16) -> ResourceGraph {
    build_with(
        &StackConfigSpec::default(),
        &ContextOverrides::new(),
        &HashMap::new(),
        suffix,
    )
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[test]
fn scenario_a_default_stack_shape() {
    let graph = build(4711);

    assert_eq!(graph.nodes_of_kind(ResourceKind::Identity).len(), 2);
    assert_eq!(graph.nodes_of_kind(ResourceKind::StorageContainer).len(), 1);
    assert_eq!(graph.nodes_of_kind(ResourceKind::AggregateIdentity).len(), 1);
    assert_eq!(graph.nodes_of_kind(ResourceKind::ComputeUnit).len(), 2);

    let agents = graph.nodes_of_kind(ResourceKind::OrchestratingAgent);
    assert_eq!(agents.len(), 1);
    let agent = agents[0].spec.as_agent().unwrap();
    assert_eq!(agent.capability_bindings.len(), 2);
    assert_eq!(agent.capability_bindings[0].name, "travel-api");
    assert_eq!(agent.capability_bindings[0].schema_key, "api-schema/travel_schema.json");
    assert_eq!(agent.capability_bindings[1].name, "portfolio-api");
    assert_eq!(agent.capability_bindings[1].schema_key, "api-schema/portfolio_schema.json");
    assert_eq!(agent.agent_name, constants::AGENT_NAME);
    assert_eq!(agent.foundation_model, constants::AGENT_MODEL);
}

#[test]
fn scenario_b_model_override_only_on_agent() {
    let model = "vendor.model-x-v2";
    let context = ContextOverrides::new().with(CTX_AGENT_MODEL, model).unwrap();
    let graph = build_with(&StackConfigSpec::default(), &context, &HashMap::new(), 2048);

    let agent = graph.nodes_of_kind(ResourceKind::OrchestratingAgent)[0];
    assert_eq!(agent.spec.as_agent().unwrap().foundation_model, model);

    for node in graph.nodes() {
        if node.kind() == ResourceKind::OrchestratingAgent {
            continue;
        }
        let rendered = serde_json::to_string(node).unwrap();
        assert!(!rendered.contains(model), "{} mentions the model", node.id);
    }

    let template = TemplateSynthesizer::new(&graph).synthesize("travel-planner");
    let rendered = serde_json::to_string(&template).unwrap();
    assert_eq!(count_occurrences(&rendered, model), 1);
}

#[test]
fn scenario_c_aggregate_identity_references_and_edges() {
    let suffix = NamingSuffix::new(3141).unwrap();
    let graph = build(suffix.value());

    let travel = suffix.unit_names("travel");
    let portfolio = suffix.unit_names("portfolio");
    let storage = suffix.storage_node();

    let aggregate = graph.node(&suffix.agent_role_node()).unwrap();
    let expected: BTreeSet<NodeId> = [
        travel.identity_node.clone(),
        portfolio.identity_node.clone(),
        storage.clone(),
    ]
    .into_iter()
    .collect();
    assert_eq!(aggregate.depends_on, expected);
    assert_eq!(aggregate.all_dependencies(), expected);

    let identity = aggregate.spec.as_identity().unwrap();
    let resources: Vec<&Deferred> = identity
        .statements
        .iter()
        .flat_map(|s| s.resources.iter())
        .collect();
    assert!(resources.contains(&&Deferred::arn_of(&travel.identity_node)));
    assert!(resources.contains(&&Deferred::arn_of(&portfolio.identity_node)));
    assert!(resources.contains(&&Deferred::arn_of(&storage)));
}

#[test]
fn scenario_d_portfolio_environment_defaults_to_empty_object() {
    let graph = build(999);
    let portfolio = graph
        .node(&NamingSuffix::new(999).unwrap().unit_names("portfolio").compute_node)
        .unwrap();
    let compute = portfolio.spec.as_compute().unwrap();
    assert_eq!(compute.environment["STOCK_PORTFOLIO"], "{}");
}

#[test]
fn portfolio_environment_taken_from_process_environment() {
    let env = HashMap::from([(
        "STOCK_PORTFOLIO".to_string(),
        r#"{"AAPL": 10}"#.to_string(),
    )]);
    let graph = build_with(&StackConfigSpec::default(), &ContextOverrides::new(), &env, 999);
    let suffix = NamingSuffix::new(999).unwrap();
    let compute = graph
        .node(&suffix.unit_names("portfolio").compute_node)
        .unwrap()
        .spec
        .as_compute()
        .unwrap();
    assert_eq!(compute.environment["STOCK_PORTFOLIO"], r#"{"AAPL": 10}"#);

    let travel = graph
        .node(&suffix.unit_names("travel").compute_node)
        .unwrap()
        .spec
        .as_compute()
        .unwrap();
    assert!(!travel.environment.contains_key("STOCK_PORTFOLIO"));
}

#[test]
fn malformed_portfolio_environment_is_rejected_before_build() {
    let env = HashMap::from([("STOCK_PORTFOLIO".to_string(), "not json".to_string())]);
    let err = ConfigResolver::resolve(
        "travel-planner",
        &StackConfigSpec::default(),
        &ContextOverrides::new(),
        &env,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvironmentValue { .. }));
}

#[test]
fn every_physical_name_shares_the_suffix() {
    let graph = build(8080);
    for node in graph.nodes() {
        assert!(
            node.physical_name.contains("8080") || node.kind() == ResourceKind::OrchestratingAgent,
            "{} lacks the suffix",
            node.physical_name
        );
        assert!(node.id.as_str().ends_with("8080"), "{} lacks the suffix", node.id);
    }
    for node in graph.nodes_of_kind(ResourceKind::ComputeUnit) {
        let compute = node.spec.as_compute().unwrap();
        assert!(compute.log_destination.name.ends_with("-8080"));
    }
}

#[test]
fn topological_order_respects_every_edge() {
    let graph = build(5150);
    let order = graph.topological_order().unwrap();
    assert_eq!(order.len(), graph.nodes().len());

    let position: HashMap<&NodeId, usize> = order.iter().enumerate().map(|(i, n)| (n, i)).collect();
    for node in graph.nodes() {
        for dependency in node.all_dependencies() {
            assert!(
                position[&dependency] < position[&node.id],
                "{} must come after {}",
                node.id,
                dependency
            );
        }
    }

    // Identity -> compute, aggregate -> agent, compute -> agent
    let suffix = NamingSuffix::new(5150).unwrap();
    let agent = graph.node(&suffix.agent_node()).unwrap();
    let agent_deps = agent.all_dependencies();
    assert!(agent_deps.contains(&suffix.agent_role_node()));
    assert!(agent_deps.contains(&suffix.unit_names("travel").compute_node));
    assert!(agent_deps.contains(&suffix.unit_names("portfolio").compute_node));
    let travel = graph.node(&suffix.unit_names("travel").compute_node).unwrap();
    assert!(travel
        .all_dependencies()
        .contains(&suffix.unit_names("travel").identity_node));
}

#[test]
fn run_outputs_published() {
    let graph = build(1200);
    let keys: BTreeSet<&str> = graph.outputs().iter().map(|o| o.key.as_str()).collect();

    for expected in [
        "BedrockAgentArn",
        "TravelLambdaConstruct1200FunctionArn",
        "TravelLambdaConstruct1200LogGroup",
        "PortfolioLambdaConstruct1200FunctionArn",
        "PortfolioLambdaConstruct1200LogGroup",
        "TravelLambdaIamConstruct1200LambdaRoleArn",
        "PortfolioLambdaIamConstruct1200LambdaRoleArn",
        "BedrockIamConstruct1200AgentRoleArn",
    ] {
        assert!(keys.contains(expected), "missing output {}", expected);
    }

    let log_group = graph
        .outputs()
        .iter()
        .find(|o| o.key == "PortfolioLambdaConstruct1200LogGroup")
        .unwrap();
    assert_eq!(
        log_group.value,
        Deferred::literal("/aws/lambda/portfolio-agent-lambda-1200")
    );
    assert_eq!(
        log_group.description.as_deref(),
        Some("CloudWatch Log Group for portfolio-agent-lambda-1200")
    );

    let arn = graph
        .outputs()
        .iter()
        .find(|o| o.key == "TravelLambdaConstruct1200FunctionArn")
        .unwrap();
    assert_eq!(
        arn.value,
        Deferred::arn_of(&NodeId::new("TravelLambdaConstruct-1200"))
    );
    assert_eq!(arn.description.as_deref(), Some("ARN for travel-agent-lambda-1200"));
}

#[test]
fn synthesis_is_deterministic_for_pinned_suffix() {
    let first = TemplateSynthesizer::new(&build(6000)).synthesize("travel-planner");
    let second = TemplateSynthesizer::new(&build(6000)).synthesize("travel-planner");
    assert_eq!(first, second);
}

#[test]
fn template_wires_compute_and_agent() {
    let graph = build(7070);
    let template = TemplateSynthesizer::new(&graph).synthesize("travel-planner");
    let resources = &template["Resources"];

    let function = &resources["TravelLambdaConstruct7070"];
    assert_eq!(function["Type"], "AWS::Lambda::Function");
    assert_eq!(function["Properties"]["FunctionName"], "travel-agent-lambda-7070");
    assert_eq!(function["Properties"]["Timeout"], 300);
    assert_eq!(
        function["Properties"]["Role"],
        serde_json::json!({ "Fn::GetAtt": ["TravelLambdaIamConstruct7070", "Arn"] })
    );
    assert_eq!(
        function["Properties"]["Environment"]["Variables"]["API_KEY"],
        constants::API_KEY
    );
    let depends_on = function["DependsOn"].as_array().unwrap();
    assert!(depends_on.contains(&serde_json::json!("TravelLambdaIamConstruct7070Policy")));
    assert!(depends_on.contains(&serde_json::json!("TravelLambdaConstruct7070LogGroup")));

    let log_group = &resources["TravelLambdaConstruct7070LogGroup"];
    assert_eq!(log_group["Properties"]["RetentionInDays"], 30);
    assert_eq!(log_group["DeletionPolicy"], "Delete");

    let permission = &resources["TravelLambdaConstruct7070InvokePermission"];
    assert_eq!(permission["Properties"]["Principal"], "bedrock.amazonaws.com");
    assert!(permission["Properties"].get("SourceAccount").is_none());

    let agent = &resources["BedrockConstruct7070"];
    assert_eq!(agent["Type"], "AWS::Bedrock::Agent");
    let groups = agent["Properties"]["ActionGroups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(
        groups[1]["ApiSchema"]["S3"]["S3BucketName"],
        serde_json::json!({ "Ref": "agentassets7070" })
    );
    assert_eq!(
        template["Outputs"]["BedrockAgentArn"]["Value"],
        serde_json::json!({ "Fn::GetAtt": ["BedrockConstruct7070", "AgentArn"] })
    );
}

#[test]
fn account_scoped_invoke_grant_adds_source_account() {
    let spec = StackConfigSpec {
        invoke_grant: InvokeGrantScope::Account,
        ..StackConfigSpec::default()
    };
    let graph = build_with(&spec, &ContextOverrides::new(), &HashMap::new(), 4321);
    let template = TemplateSynthesizer::new(&graph).synthesize("travel-planner");
    assert_eq!(
        template["Resources"]["PortfolioLambdaConstruct4321InvokePermission"]["Properties"]
            ["SourceAccount"],
        serde_json::json!({ "Ref": "AWS::AccountId" })
    );
}

#[test]
fn resolving_twice_yields_identical_configuration() {
    let context = ContextOverrides::parse_pairs(["apiKey=serp-1", "agentName=planner"]).unwrap();
    let first = ConfigResolver::resolve(
        "travel-planner",
        &StackConfigSpec::default(),
        &context,
        &HashMap::new(),
    )
    .unwrap();
    let second = ConfigResolver::resolve(
        "travel-planner",
        &StackConfigSpec::default(),
        &context,
        &HashMap::new(),
    )
    .unwrap();

    assert_eq!(first.api_key, second.api_key);
    assert_eq!(first.agent, second.agent);
    assert_eq!(first.units, second.units);
}
