//! Typed pipeline definition rendered into the YAML text stored in config maps.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

pub const FORMAT_VERSION: &str = "13";
pub const DEFAULT_STEP_LIB_SOURCE: &str = "https://github.com/bitrise-io/bitrise-steplib.git";

/// A step reference with its inputs, serialized as `{ "<id>": { inputs: [...] } }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub id: String,
    pub title: Option<String>,
    pub inputs: Vec<(String, String)>,
}

impl Step {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            inputs: Vec::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn input(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inputs.push((key.into(), value.into()));
        self
    }
}

#[derive(Serialize)]
struct StepBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    inputs: Vec<BTreeMap<&'a str, &'a str>>,
}

impl Serialize for Step {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let body = StepBody {
            title: self.title.as_deref(),
            inputs: self
                .inputs
                .iter()
                .map(|(k, v)| BTreeMap::from([(k.as_str(), v.as_str())]))
                .collect(),
        };
        let mut map = serializer.serialize_map(Some(1))?;
        if body.title.is_none() && body.inputs.is_empty() {
            map.serialize_entry(&self.id, &BTreeMap::<String, String>::new())?;
        } else {
            map.serialize_entry(&self.id, &body)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Workflow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request_source_branch: Option<String>,
    pub workflow: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct App {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub envs: Vec<BTreeMap<String, String>>,
}

impl App {
    fn is_empty(&self) -> bool {
        self.envs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineDefinition {
    pub format_version: String,
    pub default_step_lib_source: String,
    pub project_type: String,
    #[serde(skip_serializing_if = "App::is_empty")]
    pub app: App,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trigger_map: Vec<TriggerItem>,
    pub workflows: BTreeMap<String, Workflow>,
}

impl PipelineDefinition {
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_without_inputs() {
        let yaml = serde_yaml::to_string(&Step::new("git-clone@8")).unwrap();
        assert_eq!(yaml.trim(), "git-clone@8: {}");
    }

    #[test]
    fn test_step_with_inputs() {
        let step = Step::new("gradle-runner@2")
            .input("gradle_task", "$GRADLE_TASK")
            .input("gradlew_path", "$PROJECT_LOCATION/gradlew");
        let yaml = serde_yaml::to_string(&step).unwrap();
        assert!(yaml.contains("gradle-runner@2:"));
        assert!(yaml.contains("- gradle_task:"));
        assert!(yaml.contains("$PROJECT_LOCATION/gradlew"));
    }

    #[test]
    fn test_step_title() {
        let yaml = serde_yaml::to_string(&Step::new("script@1").title("Do anything")).unwrap();
        assert!(yaml.contains("title: Do anything"));
    }
}
