//! Commit message suggestions learned from recent history.

use std::path::Path;

use crate::config::Config;
use crate::error::GitcliResult;
use crate::git::GitRunner;

/// Fallback when nothing better is known.
pub const DEFAULT_MESSAGE: &str = "Update files";

const CONVENTIONAL_PREFIXES: [&str; 7] = [
    "feat:", "fix:", "docs:", "style:", "refactor:", "test:", "chore:",
];

/// Message style the user's recent commits follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryPattern {
    Conventional,
    Wip,
}

/// Detect a style from recent subjects (newest first). Needs at least two.
pub fn detect_pattern(subjects: &[String]) -> Option<HistoryPattern> {
    if subjects.len() < 2 {
        return None;
    }
    let conventional = subjects
        .iter()
        .filter(|s| CONVENTIONAL_PREFIXES.iter().any(|p| s.starts_with(p)))
        .count();
    if conventional >= 3 {
        return Some(HistoryPattern::Conventional);
    }
    let wip = subjects
        .iter()
        .filter(|s| s.to_lowercase().starts_with("wip"))
        .count();
    (wip >= 3).then_some(HistoryPattern::Wip)
}

fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

/// Build a message for `files` in the given style.
pub fn suggest_for(files: &[String], pattern: Option<HistoryPattern>) -> String {
    if files.is_empty() {
        return DEFAULT_MESSAGE.to_string();
    }
    let count = files.len();
    let names: Vec<&str> = files.iter().take(3).map(|f| file_name(f)).collect();

    match pattern {
        Some(HistoryPattern::Conventional) => {
            let lowered: Vec<String> = files.iter().map(|f| f.to_lowercase()).collect();
            let prefix = if lowered.iter().any(|f| f.contains("test")) {
                "test"
            } else if lowered
                .iter()
                .any(|f| f.ends_with(".md") || f.contains("readme"))
            {
                "docs"
            } else if count == 1 {
                "feat"
            } else {
                "chore"
            };
            if count == 1 {
                format!("{prefix}: update {}", names[0])
            } else {
                format!("{prefix}: update {count} files")
            }
        }
        Some(HistoryPattern::Wip) => "WIP".to_string(),
        None if count == 1 => format!("Update {}", names[0]),
        None if count <= 3 => format!("Update {}", names.join(", ")),
        None => format!("Update {count} files"),
    }
}

/// Suggested message for what is currently staged.
///
/// The configured template wins; otherwise history learning, when enabled,
/// picks the style; otherwise [`DEFAULT_MESSAGE`].
pub fn suggest(git: &dyn GitRunner, config: &Config) -> GitcliResult<String> {
    if let Some(template) = config
        .commit_message_template
        .as_deref()
        .filter(|t| !t.trim().is_empty())
    {
        return Ok(template.to_string());
    }
    if !config.learn_from_history {
        return Ok(DEFAULT_MESSAGE.to_string());
    }
    let staged = git.query(&["-c", "core.quotePath=false", "diff", "--cached", "--name-only"])?;
    let files: Vec<String> = staged.lines().map(str::to_string).collect();
    let pattern = detect_pattern(&crate::git::recent_subjects(git, 5)?);
    Ok(suggest_for(&files, pattern))
}
