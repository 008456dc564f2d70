//! Interactive mode: walk one scanner's option tree down to a config.

use super::prompt::Prompter;
use super::WalkError;
use crate::models::{OptionNode, OptionType, ScanResultModel};
use serde_yaml::{Mapping, Value};
use tracing::debug;

/// Scanner trees are finite, so a walk this long means a malformed tree.
pub const MAX_WALK_STEPS: usize = 64;

const SCANNER_PROMPT: &str = "Select the project type";

/// The config a walk arrived at and the answers given on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub scanner: String,
    pub config_name: String,
    pub envs: Vec<(String, String)>,
}

impl Resolution {
    /// `config_text` with the collected answers appended to `app.envs`.
    pub fn render_pipeline(&self, config_text: &str) -> Result<String, WalkError> {
        let mut doc: Value =
            serde_yaml::from_str(config_text).map_err(|e| WalkError::Render(e.to_string()))?;
        let root = doc
            .as_mapping_mut()
            .ok_or_else(|| WalkError::Render("pipeline is not a mapping".to_string()))?;

        if !root.contains_key("app") {
            root.insert(Value::from("app"), Value::Mapping(Mapping::new()));
        }
        let app = root
            .get_mut("app")
            .and_then(Value::as_mapping_mut)
            .ok_or_else(|| WalkError::Render("app is not a mapping".to_string()))?;

        if !app.contains_key("envs") {
            app.insert(Value::from("envs"), Value::Sequence(Vec::new()));
        }
        let envs = app
            .get_mut("envs")
            .and_then(Value::as_sequence_mut)
            .ok_or_else(|| WalkError::Render("app.envs is not a list".to_string()))?;

        for (key, value) in &self.envs {
            let mut env = Mapping::new();
            env.insert(Value::from(key.as_str()), Value::from(value.as_str()));
            envs.push(Value::Mapping(env));
        }
        serde_yaml::to_string(&doc).map_err(|e| WalkError::Render(e.to_string()))
    }
}

pub struct OptionWalker<'a, P: Prompter> {
    result: &'a ScanResultModel,
    prompter: P,
}

impl<'a, P: Prompter> OptionWalker<'a, P> {
    pub fn new(result: &'a ScanResultModel, prompter: P) -> Self {
        Self { result, prompter }
    }

    pub fn into_prompter(self) -> P {
        self.prompter
    }

    /// Picks a scanner (asking only when several contributed options) and
    /// walks its tree.
    pub fn walk(&mut self) -> Result<Resolution, WalkError> {
        let scanners = self.result.detected_scanner_names();
        let scanner = match scanners.as_slice() {
            [] => return Err(WalkError::NoOptions),
            [only] => only.clone(),
            _ => {
                let index = self.prompter.select(SCANNER_PROMPT, &scanners)?;
                scanners[index].clone()
            }
        };
        self.walk_scanner(&scanner)
    }

    pub fn walk_scanner(&mut self, scanner: &str) -> Result<Resolution, WalkError> {
        let result = self.result;
        let mut node = result
            .scanner_to_options
            .get(scanner)
            .ok_or_else(|| WalkError::UnknownScanner(scanner.to_string()))?;
        let mut envs = Vec::new();

        for _ in 0..MAX_WALK_STEPS {
            if let Some(config) = node.config() {
                if result.config_text(scanner, config).is_none() {
                    return Err(WalkError::MissingConfig {
                        scanner: scanner.to_string(),
                        config: config.to_string(),
                    });
                }
                debug!(scanner, config, envs = envs.len(), "Option walk finished");
                return Ok(Resolution {
                    scanner: scanner.to_string(),
                    config_name: config.to_string(),
                    envs,
                });
            }

            if node.title.is_empty() {
                node = first_child(node)?;
                continue;
            }

            let value = self.answer(node)?;
            if !node.env_key.is_empty() {
                envs.push((node.env_key.clone(), value.clone()));
            }
            node = match node.child(&value) {
                Some(child) => child,
                None if node.kind.is_optional() || node.kind.is_user_input() => first_child(node)?,
                None => {
                    return Err(WalkError::MissingChoice {
                        title: node.title.clone(),
                        value,
                    })
                }
            };
        }
        Err(WalkError::TooDeep(MAX_WALK_STEPS))
    }

    fn answer(&mut self, node: &OptionNode) -> Result<String, WalkError> {
        if node.kind.is_user_input() {
            return self.prompter.input(&node.title);
        }
        let values = node.values();
        if let [only] = values.as_slice() {
            return Ok(only.clone());
        }
        if node.kind == OptionType::OptionalSelector {
            return self.prompter.select_or_custom(&node.title, &values);
        }
        let index = self.prompter.select(&node.title, &values)?;
        values
            .get(index)
            .cloned()
            .ok_or_else(|| WalkError::MissingChoice {
                title: node.title.clone(),
                value: index.to_string(),
            })
    }
}

fn first_child(node: &OptionNode) -> Result<&OptionNode, WalkError> {
    node.any_child()
        .map(|(_, child)| child)
        .ok_or_else(|| WalkError::MissingChoice {
            title: node.title.clone(),
            value: String::new(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConfigMap, USER_INPUT_VALUE};
    use crate::walker::prompt::ScriptedPrompter;

    fn with_tree(scanner: &str, root: OptionNode) -> ScanResultModel {
        let mut result = ScanResultModel::new();
        let configs: ConfigMap = root
            .config_names()
            .into_iter()
            .map(|name| (name, "format_version: '13'\nworkflows: {}\n".to_string()))
            .collect();
        result.scanner_to_options.insert(scanner.to_string(), root);
        result.scanner_to_configs.insert(scanner.to_string(), configs);
        result
    }

    fn android_tree() -> OptionNode {
        let mut tasks = OptionNode::new("Gradle task", "", "GRADLE_TASK", OptionType::Selector);
        for task in ["assembleDebug", "assembleRelease", "bundleRelease"] {
            tasks.add_config(task, "android-config");
        }
        let mut root = OptionNode::new("Project location", "", "PROJECT_LOCATION", OptionType::Selector);
        root.add_option(".", tasks);
        root
    }

    #[test]
    fn test_single_child_is_auto_selected_and_recorded() {
        let result = with_tree("android", android_tree());
        let mut walker = OptionWalker::new(&result, ScriptedPrompter::new(["bundleRelease"]));
        let resolution = walker.walk().unwrap();

        assert_eq!(resolution.config_name, "android-config");
        assert_eq!(
            resolution.envs,
            vec![
                ("PROJECT_LOCATION".to_string(), ".".to_string()),
                ("GRADLE_TASK".to_string(), "bundleRelease".to_string())
            ]
        );
        assert_eq!(walker.into_prompter().asked(), &["Gradle task".to_string()]);
    }

    #[test]
    fn test_multiple_scanners_prompt_for_project_type() {
        let mut result = with_tree("android", android_tree());
        let mut flutter = OptionNode::new("Project location", "", "LOCATION", OptionType::Selector);
        flutter.add_config("app", "flutter-config");
        let other = with_tree("flutter", flutter);
        result.scanner_to_options.extend(other.scanner_to_options);
        result.scanner_to_configs.extend(other.scanner_to_configs);

        let mut walker = OptionWalker::new(&result, ScriptedPrompter::new(["flutter"]));
        let resolution = walker.walk().unwrap();
        assert_eq!(resolution.scanner, "flutter");
        assert_eq!(resolution.config_name, "flutter-config");
    }

    #[test]
    fn test_user_input_accepts_free_text() {
        let mut root = OptionNode::new("Project location", "", "PROJECT_LOCATION", OptionType::UserInput);
        root.add_config(USER_INPUT_VALUE, "default-android-config");
        let result = with_tree("android", root);

        let mut walker = OptionWalker::new(&result, ScriptedPrompter::new(["sub/app"]));
        let resolution = walker.walk().unwrap();
        assert_eq!(resolution.config_name, "default-android-config");
        assert_eq!(
            resolution.envs,
            vec![("PROJECT_LOCATION".to_string(), "sub/app".to_string())]
        );
    }

    #[test]
    fn test_optional_selector_accepts_custom_value() {
        let mut root = OptionNode::new("Configuration", "", "CONFIG", OptionType::OptionalSelector);
        root.add_config("Debug", "xamarin-config");
        root.add_config("Release", "xamarin-config");
        let result = with_tree("xamarin", root);

        let mut walker = OptionWalker::new(&result, ScriptedPrompter::new(["Staging"]));
        let resolution = walker.walk().unwrap();
        assert_eq!(resolution.envs, vec![("CONFIG".to_string(), "Staging".to_string())]);
    }

    #[test]
    fn test_untitled_node_descends_without_recording() {
        let mut inner = OptionNode::new("", "", "HIDDEN", OptionType::Selector);
        inner.add_config("x", "fastlane-config");
        let result = with_tree("fastlane", inner);

        let mut walker = OptionWalker::new(&result, ScriptedPrompter::new(Vec::<String>::new()));
        let resolution = walker.walk().unwrap();
        assert!(resolution.envs.is_empty());
    }

    #[test]
    fn test_walk_is_bounded() {
        let mut node = OptionNode::leaf("deep-config");
        for depth in 0..(MAX_WALK_STEPS + 5) {
            let mut parent = OptionNode::new(format!("Level {}", depth), "", "", OptionType::Selector);
            parent.add_option("next", node);
            node = parent;
        }
        let result = with_tree("deep", node);
        let mut walker = OptionWalker::new(&result, ScriptedPrompter::new(Vec::<String>::new()));
        assert!(matches!(walker.walk(), Err(WalkError::TooDeep(MAX_WALK_STEPS))));
    }

    #[test]
    fn test_no_options() {
        let result = ScanResultModel::new();
        let mut walker = OptionWalker::new(&result, ScriptedPrompter::new(Vec::<String>::new()));
        assert!(matches!(walker.walk(), Err(WalkError::NoOptions)));
    }

    #[test]
    fn test_render_pipeline_appends_envs() {
        let resolution = Resolution {
            scanner: "android".to_string(),
            config_name: "android-config".to_string(),
            envs: vec![("GRADLE_TASK".to_string(), "assembleRelease".to_string())],
        };
        let rendered = resolution
            .render_pipeline("format_version: '13'\napp:\n  envs:\n  - EXISTING: yes\nworkflows: {}\n")
            .unwrap();
        let doc: Value = serde_yaml::from_str(&rendered).unwrap();
        let envs = doc["app"]["envs"].as_sequence().unwrap();
        assert_eq!(envs.len(), 2);
        assert_eq!(envs[1]["GRADLE_TASK"].as_str(), Some("assembleRelease"));
    }

    #[test]
    fn test_render_pipeline_creates_app_section() {
        let resolution = Resolution {
            scanner: "android".to_string(),
            config_name: "android-config".to_string(),
            envs: vec![("PROJECT_LOCATION".to_string(), ".".to_string())],
        };
        let rendered = resolution.render_pipeline("format_version: '13'\n").unwrap();
        let doc: Value = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(doc["app"]["envs"][0]["PROJECT_LOCATION"].as_str(), Some("."));
    }
}
