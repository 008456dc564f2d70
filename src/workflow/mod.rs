//! Pipeline generation shared by all scanners.
//!
//! Scanners assemble a [`PipelineBuilder`] from a config descriptor; the
//! builder adds the common prologue (SSH key for private repositories, clone)
//! and epilogue (deploy) and renders YAML text.

pub mod model;
pub mod steps;

pub use model::{App, PipelineDefinition, Step, TriggerItem, Workflow};

use std::collections::BTreeMap;

pub const PRIMARY_WORKFLOW: &str = "primary";
pub const DEPLOY_WORKFLOW: &str = "deploy";

/// Whether the repository needs an SSH key to be cloned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepoAccess {
    #[default]
    Public,
    Private,
}

impl RepoAccess {
    pub fn from_private_flag(private: bool) -> Self {
        if private {
            RepoAccess::Private
        } else {
            RepoAccess::Public
        }
    }
}

pub struct PipelineBuilder {
    project_type: String,
    repo_access: RepoAccess,
    workflows: BTreeMap<String, Workflow>,
}

impl PipelineBuilder {
    pub fn new(project_type: impl Into<String>, repo_access: RepoAccess) -> Self {
        Self {
            project_type: project_type.into(),
            repo_access,
            workflows: BTreeMap::new(),
        }
    }

    /// Adds a workflow wrapped in the common prologue and epilogue.
    pub fn workflow(mut self, name: &str, summary: &str, body: Vec<Step>) -> Self {
        let mut steps = Vec::with_capacity(body.len() + 3);
        if self.repo_access == RepoAccess::Private {
            steps.push(steps::activate_ssh_key());
        }
        steps.push(steps::git_clone());
        steps.extend(body);
        steps.push(steps::deploy_to_bitrise_io());

        self.workflows.insert(
            name.to_string(),
            Workflow {
                summary: Some(summary.to_string()),
                steps,
            },
        );
        self
    }

    pub fn build(self) -> PipelineDefinition {
        let trigger_map = if self.workflows.contains_key(PRIMARY_WORKFLOW) {
            vec![
                TriggerItem {
                    push_branch: Some("*".to_string()),
                    pull_request_source_branch: None,
                    workflow: PRIMARY_WORKFLOW.to_string(),
                },
                TriggerItem {
                    push_branch: None,
                    pull_request_source_branch: Some("*".to_string()),
                    workflow: PRIMARY_WORKFLOW.to_string(),
                },
            ]
        } else {
            Vec::new()
        };

        PipelineDefinition {
            format_version: model::FORMAT_VERSION.to_string(),
            default_step_lib_source: model::DEFAULT_STEP_LIB_SOURCE.to_string(),
            project_type: self.project_type,
            app: App::default(),
            trigger_map,
            workflows: self.workflows,
        }
    }

    pub fn render(self) -> anyhow::Result<String> {
        self.build().to_yaml()
    }
}
