//! Maps raw scanner error text to structured remediation hints.
//!
//! Each tag owns an ordered rule list; rules are evaluated top to bottom and
//! the first match wins. Messages no rule recognizes still get a generic
//! recommendation that embeds the raw text verbatim.

pub mod rules;

use crate::models::Recommendation;
use rules::Rule;
use std::sync::OnceLock;

/// Where in the scan the failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    DetectPlatformFailed,
    OptionsFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub title: String,
    pub description: String,
}

fn rules_for(tag: Tag) -> &'static [Rule] {
    static DETECT: OnceLock<Vec<Rule>> = OnceLock::new();
    static OPTIONS: OnceLock<Vec<Rule>> = OnceLock::new();
    match tag {
        Tag::DetectPlatformFailed => DETECT.get_or_init(rules::detect_platform_rules),
        Tag::OptionsFailed => OPTIONS.get_or_init(rules::options_rules),
    }
}

fn generic_detail(tag: Tag, raw: &str) -> ErrorDetail {
    let title = match tag {
        Tag::DetectPlatformFailed => "We couldn’t detect your project type.",
        Tag::OptionsFailed => "We couldn’t parse your project files.",
    };
    ErrorDetail {
        title: title.to_string(),
        description: format!(
            "Our auto-configurator returned the following error:\n{}",
            raw
        ),
    }
}

/// Name of the first rule matching `raw`, if any.
pub fn matching_rule(tag: Tag, raw: &str) -> Option<&'static str> {
    rules_for(tag)
        .iter()
        .find(|rule| rule.pattern.is_match(raw))
        .map(|rule| rule.name)
}

pub fn classify(tag: Tag, raw: &str) -> Recommendation {
    let detail = rules_for(tag)
        .iter()
        .find_map(|rule| rule.pattern.captures(raw).map(|c| (rule.build)(&c)))
        .unwrap_or_else(|| generic_detail(tag, raw));
    Recommendation::detailed_error(detail.title, detail.description)
}
