//! Option tree: the decision structure a scanner hands to its consumers.
//!
//! Every node asks one question (title, env key, type). An internal node maps
//! each answer to an owned child; a terminal node names the config the answers
//! lead to. Leaf-ness is an explicit variant of [`OptionBody`], never inferred
//! from an empty child map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Value used as the single child key of user-input nodes.
pub const USER_INPUT_VALUE: &str = "_";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionTreeError {
    #[error("option '{0}' has both a value map and a config")]
    BothChildrenAndConfig(String),

    #[error("option '{0}' has neither a value map nor a config")]
    NeitherChildrenNorConfig(String),
}

/// Kind of question a node asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionType {
    #[serde(rename = "selector")]
    Selector,
    #[serde(rename = "selector_optional")]
    OptionalSelector,
    #[serde(rename = "user_input")]
    UserInput,
    #[serde(rename = "user_input_optional")]
    OptionalUserInput,
}

impl OptionType {
    /// Optional types accept a value that is not one of the child keys.
    pub fn is_optional(&self) -> bool {
        matches!(self, OptionType::OptionalSelector | OptionType::OptionalUserInput)
    }

    pub fn is_user_input(&self) -> bool {
        matches!(self, OptionType::UserInput | OptionType::OptionalUserInput)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionBody {
    Branch(BTreeMap<String, OptionNode>),
    Leaf { config: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOptionNode", into = "RawOptionNode")]
pub struct OptionNode {
    pub title: String,
    pub summary: String,
    pub env_key: String,
    pub kind: OptionType,
    pub body: OptionBody,
}

impl OptionNode {
    /// Creates an internal node without children yet.
    pub fn new(
        title: impl Into<String>,
        summary: impl Into<String>,
        env_key: impl Into<String>,
        kind: OptionType,
    ) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            env_key: env_key.into(),
            kind,
            body: OptionBody::Branch(BTreeMap::new()),
        }
    }

    /// Creates a terminal node pointing at `config`.
    pub fn leaf(config: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            summary: String::new(),
            env_key: String::new(),
            kind: OptionType::Selector,
            body: OptionBody::Leaf {
                config: config.into(),
            },
        }
    }

    /// Adds (or replaces) the child reached by answering `value`.
    ///
    /// A terminal node turns into an internal node; it never holds both.
    pub fn add_option(&mut self, value: impl Into<String>, child: OptionNode) {
        match &mut self.body {
            OptionBody::Branch(children) => {
                children.insert(value.into(), child);
            }
            OptionBody::Leaf { .. } => {
                let mut children = BTreeMap::new();
                children.insert(value.into(), child);
                self.body = OptionBody::Branch(children);
            }
        }
    }

    pub fn add_config(&mut self, value: impl Into<String>, config: impl Into<String>) {
        self.add_option(value, OptionNode::leaf(config));
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.body, OptionBody::Leaf { .. })
    }

    pub fn config(&self) -> Option<&str> {
        match &self.body {
            OptionBody::Leaf { config } => Some(config),
            OptionBody::Branch(_) => None,
        }
    }

    pub fn children(&self) -> Option<&BTreeMap<String, OptionNode>> {
        match &self.body {
            OptionBody::Branch(children) => Some(children),
            OptionBody::Leaf { .. } => None,
        }
    }

    /// Choice keys in their stable (sorted) order.
    pub fn values(&self) -> Vec<String> {
        self.children()
            .map(|children| children.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn child(&self, value: &str) -> Option<&OptionNode> {
        self.children().and_then(|children| children.get(value))
    }

    /// First child in key order; every subtree of a dimension has the same shape.
    pub fn any_child(&self) -> Option<(&str, &OptionNode)> {
        self.children()
            .and_then(|children| children.iter().next())
            .map(|(value, node)| (value.as_str(), node))
    }

    /// Terminal nodes and childless branches, the places a new dimension hangs off.
    pub fn leaves_mut(&mut self) -> Vec<&mut OptionNode> {
        let mut out = Vec::new();
        collect_leaves(self, &mut out);
        out
    }

    /// Replaces every open end of the tree with a copy of `node`.
    pub fn attach_to_leaves(&mut self, node: &OptionNode) {
        for leaf in self.leaves_mut() {
            *leaf = node.clone();
        }
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match &self.body {
            OptionBody::Leaf { .. } => 1,
            OptionBody::Branch(children) => {
                1 + children.values().map(OptionNode::depth).max().unwrap_or(0)
            }
        }
    }

    /// Distinct config names referenced by terminal nodes, sorted.
    pub fn config_names(&self) -> Vec<String> {
        let mut names = std::collections::BTreeSet::new();
        self.visit(&mut |node| {
            if let Some(config) = node.config() {
                names.insert(config.to_string());
            }
        });
        names.into_iter().collect()
    }

    /// Checks that no internal node is left without children.
    pub fn validate(&self) -> Result<(), OptionTreeError> {
        match &self.body {
            OptionBody::Leaf { .. } => Ok(()),
            OptionBody::Branch(children) if children.is_empty() => {
                Err(OptionTreeError::NeitherChildrenNorConfig(self.title.clone()))
            }
            OptionBody::Branch(children) => children.values().try_for_each(OptionNode::validate),
        }
    }

    fn visit(&self, f: &mut dyn FnMut(&OptionNode)) {
        f(self);
        if let OptionBody::Branch(children) = &self.body {
            for child in children.values() {
                child.visit(f);
            }
        }
    }
}

fn collect_leaves<'a>(node: &'a mut OptionNode, out: &mut Vec<&'a mut OptionNode>) {
    let open = matches!(&node.body, OptionBody::Branch(children) if !children.is_empty());
    if !open {
        out.push(node);
        return;
    }
    if let OptionBody::Branch(children) = &mut node.body {
        for child in children.values_mut() {
            collect_leaves(child, out);
        }
    }
}

/// Wire shape of a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawOptionNode {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    summary: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    env_key: String,
    #[serde(rename = "type", default = "default_type")]
    kind: OptionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value_map: Option<BTreeMap<String, OptionNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config: Option<String>,
}

fn default_type() -> OptionType {
    OptionType::Selector
}

impl TryFrom<RawOptionNode> for OptionNode {
    type Error = OptionTreeError;

    fn try_from(raw: RawOptionNode) -> Result<Self, Self::Error> {
        let body = match (raw.value_map, raw.config) {
            (Some(children), None) if !children.is_empty() => OptionBody::Branch(children),
            (None, Some(config)) if !config.is_empty() => OptionBody::Leaf { config },
            (Some(children), Some(_)) if !children.is_empty() => {
                return Err(OptionTreeError::BothChildrenAndConfig(raw.title))
            }
            _ => return Err(OptionTreeError::NeitherChildrenNorConfig(raw.title)),
        };
        Ok(Self {
            title: raw.title,
            summary: raw.summary,
            env_key: raw.env_key,
            kind: raw.kind,
            body,
        })
    }
}

impl From<OptionNode> for RawOptionNode {
    fn from(node: OptionNode) -> Self {
        let (value_map, config) = match node.body {
            OptionBody::Branch(children) => (Some(children), None),
            OptionBody::Leaf { config } => (None, Some(config)),
        };
        Self {
            title: node.title,
            summary: node.summary,
            env_key: node.env_key,
            kind: node.kind,
            value_map,
            config,
        }
    }
}
