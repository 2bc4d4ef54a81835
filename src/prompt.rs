//! Interactive input.
//!
//! Orchestrators talk to the user only through [`Prompter`]. Every method
//! returning `Option` yields `None` when the user dismisses the prompt, which
//! callers treat as cancelling the whole operation.

use anyhow::{Result, bail};
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect, Select};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warn,
    Error,
}

pub trait Prompter {
    /// Asks for a directory, offering `default`.
    fn pick_directory(&mut self, prompt: &str, default: &Path) -> Result<Option<PathBuf>>;

    /// Asks for a single file path.
    fn pick_file(&mut self, prompt: &str) -> Result<Option<PathBuf>>;

    /// Multi-selection; returns the chosen indices in `items` order.
    fn pick_files(&mut self, prompt: &str, items: &[String]) -> Result<Option<Vec<usize>>>;

    /// Single selection.
    fn choose(&mut self, prompt: &str, items: &[String]) -> Result<Option<usize>>;

    /// Yes/no; a dismissed prompt counts as "no".
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;

    /// Free text, re-asked until `validate` accepts it.
    fn input(
        &mut self,
        prompt: &str,
        validate: &dyn Fn(&str) -> Result<(), String>,
    ) -> Result<Option<String>>;

    fn message(&mut self, level: Level, text: &str);
}

/// Terminal prompts.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn pick_directory(&mut self, prompt: &str, default: &Path) -> Result<Option<PathBuf>> {
        let value: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default.display().to_string())
            .allow_empty(true)
            .interact_text()?;
        Ok(non_empty(value).map(PathBuf::from))
    }

    fn pick_file(&mut self, prompt: &str) -> Result<Option<PathBuf>> {
        let value: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(non_empty(value).map(PathBuf::from))
    }

    fn pick_files(&mut self, prompt: &str, items: &[String]) -> Result<Option<Vec<usize>>> {
        let picked = MultiSelect::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .interact_opt()?;
        Ok(picked.filter(|p| !p.is_empty()))
    }

    fn choose(&mut self, prompt: &str, items: &[String]) -> Result<Option<usize>> {
        Ok(Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt()?)
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact_opt()?
            .unwrap_or(false))
    }

    fn input(
        &mut self,
        prompt: &str,
        validate: &dyn Fn(&str) -> Result<(), String>,
    ) -> Result<Option<String>> {
        let value: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .validate_with(|s: &String| -> Result<(), String> {
                if s.trim().is_empty() {
                    Ok(())
                } else {
                    validate(s.trim())
                }
            })
            .interact_text()?;
        Ok(non_empty(value))
    }

    fn message(&mut self, level: Level, text: &str) {
        match level {
            Level::Info => println!("{} {}", "info:".blue().bold(), text),
            Level::Success => println!("{} {}", "ok:".green().bold(), text),
            Level::Warn => eprintln!("{} {}", "warn:".yellow().bold(), text),
            Level::Error => eprintln!("{} {}", "error:".red().bold(), text),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// One queued answer for [`ScriptedPrompter`].
#[derive(Debug, Clone)]
pub enum Answer {
    Directory(Option<PathBuf>),
    File(Option<PathBuf>),
    Files(Option<Vec<usize>>),
    Choice(Option<usize>),
    Confirm(bool),
    Text(Option<String>),
}

/// Replays queued answers in order; used for non-interactive runs and tests.
///
/// Rejected text answers are recorded as errors and the next answer is
/// consumed, just as a terminal user would be asked again.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    pub prompts: Vec<String>,
    pub messages: Vec<(Level, String)>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    /// Whether any recorded message at `level` contains `needle`.
    pub fn said(&self, level: Level, needle: &str) -> bool {
        self.messages
            .iter()
            .any(|(l, text)| *l == level && text.contains(needle))
    }

    fn next(&mut self, prompt: &str) -> Result<Answer> {
        self.prompts.push(prompt.to_string());
        match self.answers.pop_front() {
            Some(answer) => Ok(answer),
            None => bail!("No scripted answer left for prompt '{}'", prompt),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn pick_directory(&mut self, prompt: &str, _default: &Path) -> Result<Option<PathBuf>> {
        match self.next(prompt)? {
            Answer::Directory(dir) => Ok(dir),
            other => bail!("Expected a directory answer for '{}', got {:?}", prompt, other),
        }
    }

    fn pick_file(&mut self, prompt: &str) -> Result<Option<PathBuf>> {
        match self.next(prompt)? {
            Answer::File(file) => Ok(file),
            other => bail!("Expected a file answer for '{}', got {:?}", prompt, other),
        }
    }

    fn pick_files(&mut self, prompt: &str, items: &[String]) -> Result<Option<Vec<usize>>> {
        match self.next(prompt)? {
            Answer::Files(picked) => {
                if picked.iter().flatten().any(|&i| i >= items.len()) {
                    bail!("Scripted selection out of range for '{}'", prompt);
                }
                Ok(picked.filter(|p| !p.is_empty()))
            }
            other => bail!("Expected a multi-selection for '{}', got {:?}", prompt, other),
        }
    }

    fn choose(&mut self, prompt: &str, items: &[String]) -> Result<Option<usize>> {
        match self.next(prompt)? {
            Answer::Choice(Some(i)) if i >= items.len() => {
                bail!("Scripted choice {} out of range for '{}'", i, prompt)
            }
            Answer::Choice(choice) => Ok(choice),
            other => bail!("Expected a choice for '{}', got {:?}", prompt, other),
        }
    }

    fn confirm(&mut self, prompt: &str, _default: bool) -> Result<bool> {
        match self.next(prompt)? {
            Answer::Confirm(yes) => Ok(yes),
            other => bail!("Expected a confirmation for '{}', got {:?}", prompt, other),
        }
    }

    fn input(
        &mut self,
        prompt: &str,
        validate: &dyn Fn(&str) -> Result<(), String>,
    ) -> Result<Option<String>> {
        loop {
            match self.next(prompt)? {
                Answer::Text(None) => return Ok(None),
                Answer::Text(Some(text)) => match validate(text.trim()) {
                    Ok(()) => return Ok(non_empty(text)),
                    Err(reason) => self.messages.push((Level::Error, reason)),
                },
                other => bail!("Expected text for '{}', got {:?}", prompt, other),
            }
        }
    }

    fn message(&mut self, level: Level, text: &str) {
        self.messages.push((level, text.to_string()));
    }
}
