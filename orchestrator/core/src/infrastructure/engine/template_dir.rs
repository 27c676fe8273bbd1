// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Template Directory Engine
//
// Hands the plan off to an external apply engine by writing two files into an
// output directory:
// - `<stack>-<suffix>.template.json`: the synthesized template
// - `plan.json`: run id, suffix and creation order for operators
//
// Nothing is created in a provider account, so the report lists artifacts
// only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

use crate::domain::engine::{ApplyReport, DeploymentEngine, EngineError};
use crate::domain::graph::NodeId;
use crate::domain::plan::DeploymentPlan;
use crate::domain::resource::ResourceKind;

const ENGINE_NAME: &str = "template-dir";

pub const PLAN_MANIFEST_FILE: &str = "plan.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanManifest {
    pub run_id: Uuid,
    pub stack_name: String,
    pub suffix: u16,
    pub template_file: String,
    pub steps: Vec<PlanStep>,
    pub written_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub node: NodeId,
    pub kind: ResourceKind,
    pub physical_name: String,
    pub depends_on: Vec<NodeId>,
}

pub struct TemplateDirectoryEngine {
    out_dir: PathBuf,
}

impl TemplateDirectoryEngine {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &PathBuf {
        &self.out_dir
    }
}

#[async_trait]
impl DeploymentEngine for TemplateDirectoryEngine {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    async fn apply(&self, plan: &DeploymentPlan) -> Result<ApplyReport, EngineError> {
        tokio::fs::create_dir_all(&self.out_dir).await?;

        let template_file = plan.template_file_name();
        let template_path = self.out_dir.join(&template_file);
        let template = serde_json::to_vec_pretty(&plan.template)?;
        tokio::fs::write(&template_path, template).await?;

        let manifest = PlanManifest {
            run_id: plan.run_id,
            stack_name: plan.stack_name.clone(),
            suffix: plan.suffix().value(),
            template_file,
            steps: plan
                .steps()
                .map(|node| PlanStep {
                    node: node.id.clone(),
                    kind: node.kind(),
                    physical_name: node.physical_name.clone(),
                    depends_on: node.all_dependencies().into_iter().collect(),
                })
                .collect(),
            written_at: Utc::now(),
        };
        let manifest_path = self.out_dir.join(PLAN_MANIFEST_FILE);
        tokio::fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest)?).await?;

        info!(
            template = %template_path.display(),
            manifest = %manifest_path.display(),
            "Deployment artifacts written"
        );

        let mut report = ApplyReport::new(plan.run_id, ENGINE_NAME);
        report.artifacts = vec![template_path, manifest_path];
        Ok(report)
    }
}
