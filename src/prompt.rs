//! User prompt abstraction.
//!
//! Workflows never talk to the terminal directly. They ask a [`Prompter`],
//! which in production is backed by `dialoguer` and in tests by a scripted
//! double that answers from a queue.

use std::io::{self, BufRead, IsTerminal};

use dialoguer::{BasicHistory, Confirm, Input, MultiSelect, Select, theme::ColorfulTheme};

use crate::error::{GitcliError, GitcliResult};

/// Interactive input capability.
///
/// Escaping a prompt yields [`GitcliError::Cancelled`].
pub trait Prompter {
    /// Yes/no question.
    fn confirm(&mut self, prompt: &str, default: bool) -> GitcliResult<bool>;

    /// Pick one of `items`; returns its index.
    fn select(&mut self, prompt: &str, items: &[String], default: usize) -> GitcliResult<usize>;

    /// Pick any number of `items`; returns their indices.
    fn multi_select(&mut self, prompt: &str, items: &[String]) -> GitcliResult<Vec<usize>>;

    /// Free text. An empty answer selects `default` when one is given.
    fn input(&mut self, prompt: &str, default: Option<&str>) -> GitcliResult<String>;

    /// One REPL line; `None` at end of input.
    fn read_command(&mut self, prompt: &str) -> GitcliResult<Option<String>>;
}

/// Ask the user to type `yes` before a destructive step.
pub fn typed_confirmation(prompter: &mut dyn Prompter, warning: &str) -> GitcliResult<bool> {
    let answer = prompter.input(&format!("{warning} Type 'yes' to continue"), None)?;
    Ok(answer.trim() == "yes")
}

/// Tab completion over the known command names.
struct CommandCompletion {
    names: Vec<String>,
}

impl dialoguer::Completion for CommandCompletion {
    fn get(&self, input: &str) -> Option<String> {
        let needle = input.trim_start().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        let matches: Vec<&String> = self
            .names
            .iter()
            .filter(|n| n.starts_with(&needle))
            .collect();
        match matches.as_slice() {
            [only] => Some((*only).clone()),
            _ => None,
        }
    }
}

/// [`Prompter`] backed by `dialoguer` on the controlling terminal.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
    history: BasicHistory,
    completion: CommandCompletion,
}

impl TerminalPrompter {
    /// `command_names` feed tab completion in the REPL.
    pub fn new(command_names: Vec<String>) -> Self {
        Self {
            theme: ColorfulTheme::default(),
            history: BasicHistory::new().max_entries(200).no_duplicates(true),
            completion: CommandCompletion {
                names: command_names,
            },
        }
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, prompt: &str, default: bool) -> GitcliResult<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact_opt()?
            .ok_or(GitcliError::Cancelled)
    }

    fn select(&mut self, prompt: &str, items: &[String], default: usize) -> GitcliResult<usize> {
        Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(default.min(items.len().saturating_sub(1)))
            .interact_opt()?
            .ok_or(GitcliError::Cancelled)
    }

    fn multi_select(&mut self, prompt: &str, items: &[String]) -> GitcliResult<Vec<usize>> {
        MultiSelect::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .interact_opt()?
            .ok_or(GitcliError::Cancelled)
    }

    fn input(&mut self, prompt: &str, default: Option<&str>) -> GitcliResult<String> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        Ok(input.interact_text()?)
    }

    fn read_command(&mut self, prompt: &str) -> GitcliResult<Option<String>> {
        if !io::stdin().is_terminal() {
            // Piped input: plain line reads so scripts can drive the REPL
            print!("{prompt}");
            io::Write::flush(&mut io::stdout())?;
            let mut line = String::new();
            let read = io::stdin().lock().read_line(&mut line)?;
            return Ok((read > 0).then(|| line.trim().to_string()));
        }
        let line = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt.trim_end())
            .allow_empty(true)
            .completion_with(&self.completion)
            .history_with(&mut self.history)
            .interact_text()?;
        Ok(Some(line))
    }
}
