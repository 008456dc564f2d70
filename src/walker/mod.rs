//! Consumers of a scan result: verbatim serialization for CI and
//! interactive resolution of one option path.

pub mod ci;
pub mod interactive;
pub mod prompt;

pub use ci::{render, write_result, ArtifactFormat};
pub use interactive::{OptionWalker, Resolution, MAX_WALK_STEPS};
pub use prompt::{Prompter, ScriptedPrompter, TerminalPrompter};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("No scanner produced options")]
    NoOptions,

    #[error("Unknown scanner: {0}")]
    UnknownScanner(String),

    #[error("Option tree is deeper than {0} steps")]
    TooDeep(usize),

    #[error("Option '{title}' has no choice '{value}'")]
    MissingChoice { title: String, value: String },

    #[error("Config '{config}' not found for scanner '{scanner}'")]
    MissingConfig { scanner: String, config: String },

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Failed to render pipeline: {0}")]
    Render(String),
}
