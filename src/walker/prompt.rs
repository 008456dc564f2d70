//! Question answering for the interactive walker.

use super::WalkError;
use dialoguer::{Input, Select};
use std::collections::VecDeque;

/// Label of the extra entry optional selectors offer.
pub const CUSTOM_VALUE_LABEL: &str = "Enter a custom value";

pub trait Prompter {
    /// Index of the chosen item.
    fn select(&mut self, title: &str, items: &[String]) -> Result<usize, WalkError>;

    /// Free-form answer.
    fn input(&mut self, title: &str) -> Result<String, WalkError>;

    /// One of `items`, or a value the user types in.
    fn select_or_custom(&mut self, title: &str, items: &[String]) -> Result<String, WalkError> {
        let mut entries = items.to_vec();
        entries.push(CUSTOM_VALUE_LABEL.to_string());
        let index = self.select(title, &entries)?;
        match items.get(index) {
            Some(item) => Ok(item.clone()),
            None => self.input(title),
        }
    }
}

/// Prompts on the terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn select(&mut self, title: &str, items: &[String]) -> Result<usize, WalkError> {
        Select::new()
            .with_prompt(title)
            .items(items)
            .default(0)
            .interact()
            .map_err(|e| WalkError::Prompt(e.to_string()))
    }

    fn input(&mut self, title: &str) -> Result<String, WalkError> {
        Input::<String>::new()
            .with_prompt(title)
            .interact_text()
            .map_err(|e| WalkError::Prompt(e.to_string()))
    }
}

/// Answers from a fixed script, recording every question it was asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    fn next_answer(&mut self, title: &str) -> Result<String, WalkError> {
        self.asked.push(title.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| WalkError::Prompt(format!("no scripted answer for '{}'", title)))
    }
}

impl Prompter for ScriptedPrompter {
    /// Scripted answers name the item, not its index.
    fn select(&mut self, title: &str, items: &[String]) -> Result<usize, WalkError> {
        let answer = self.next_answer(title)?;
        items
            .iter()
            .position(|item| *item == answer)
            .ok_or_else(|| WalkError::Prompt(format!("'{}' is not a choice of '{}'", answer, title)))
    }

    fn input(&mut self, title: &str) -> Result<String, WalkError> {
        self.next_answer(title)
    }

    fn select_or_custom(&mut self, title: &str, items: &[String]) -> Result<String, WalkError> {
        self.next_answer(title).map(|answer| {
            items
                .iter()
                .find(|item| **item == answer)
                .cloned()
                .unwrap_or(answer)
        })
    }
}
