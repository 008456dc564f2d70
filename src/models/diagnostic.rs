//! Warnings and errors recorded per scanner, optionally with remediation hints.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key under which the classifier stores its title/description pair.
pub const DETAILED_ERROR_KEY: &str = "DETAILED_ERROR";

/// Structured remediation hints attached to a warning or error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recommendation(BTreeMap<String, Value>);

impl Recommendation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detailed_error(title: impl Into<String>, description: impl Into<String>) -> Self {
        let mut recommendation = Self::new();
        recommendation.insert(
            DETAILED_ERROR_KEY,
            serde_json::json!({
                "Title": title.into(),
                "Description": description.into(),
            }),
        );
        recommendation
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn title(&self) -> Option<&str> {
        self.get(DETAILED_ERROR_KEY)?.get("Title")?.as_str()
    }

    pub fn description(&self) -> Option<&str> {
        self.get(DETAILED_ERROR_KEY)?.get("Description")?.as_str()
    }
}

/// A warning or error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Diagnostic {
    Plain(String),
    WithRecommendation {
        error: String,
        recommendations: Recommendation,
    },
}

impl Diagnostic {
    pub fn plain(message: impl Into<String>) -> Self {
        Diagnostic::Plain(message.into())
    }

    pub fn with_recommendation(message: impl Into<String>, recommendation: Recommendation) -> Self {
        Diagnostic::WithRecommendation {
            error: message.into(),
            recommendations: recommendation,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Diagnostic::Plain(message) => message,
            Diagnostic::WithRecommendation { error, .. } => error,
        }
    }

    pub fn recommendation(&self) -> Option<&Recommendation> {
        match self {
            Diagnostic::Plain(_) => None,
            Diagnostic::WithRecommendation {
                recommendations, ..
            } => Some(recommendations),
        }
    }
}
