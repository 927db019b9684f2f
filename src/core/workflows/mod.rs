//! Smart workflows.
//!
//! Each smart command is an explicit state machine: a `Step` enum, a pure
//! `entry` function choosing the first step from the classified
//! [`Situation`](super::situation::Situation), and a driver loop that runs
//! one step at a time. Prompts happen inside steps; transitions are plain
//! data, which is what the tests assert on.
//!
//! The helpers here are the mutating operations the machines share.

pub mod done;
pub mod push;
pub mod save;
pub mod status;
pub mod sync;
pub mod undo;
pub mod work;

use std::io::Write;

use tracing::info;

use super::operations::{commit_message, hooks};
use super::probe::RepositoryState;
use super::session::Session;
use crate::error::{GitcliError, GitcliResult};
use crate::git::{self, GitRunner};

/// How a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Mutations were made and succeeded.
    Completed,
    /// The repository already was where the command would take it.
    NothingToDo,
    /// The user declined a step; nothing further was changed.
    Cancelled,
}

/// Conflict error naming the currently conflicted paths.
pub(crate) fn conflict_error(git: &dyn GitRunner) -> GitcliError {
    GitcliError::Conflict {
        files: git::conflicted_files(git).unwrap_or_default(),
    }
}

/// `git pull`, routing conflicts to [`GitcliError::Conflict`].
pub(crate) fn pull<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<()> {
    session.out.info("Pulling latest changes...");
    let args = ["pull"];
    let out = session.git.mutate(&args)?;
    if !out.success() && out.mentions_conflict() {
        return Err(conflict_error(session.git));
    }
    out.into_checked(&args)?;
    session.out.success("Pull complete");
    Ok(())
}

/// `git add .` from the work-tree root.
pub(crate) fn stage_all<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<()> {
    session.git.mutate_checked(&["add", "."])?;
    session.out.success("All changes staged");
    Ok(())
}

/// `git stash push`, with a message when one is given.
pub(crate) fn stash_push<W: Write>(
    session: &mut Session<'_, W>,
    message: Option<&str>,
) -> GitcliResult<()> {
    match message.filter(|m| !m.is_empty()) {
        Some(message) => session.git.mutate_checked(&["stash", "push", "-m", message])?,
        None => session.git.mutate_checked(&["stash", "push"])?,
    };
    session.out.success("Changes stashed");
    Ok(())
}

/// How the commit flow decides what to stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Staging {
    /// Follow `auto_stage`; ask when it is off and nothing is staged.
    Configured,
    /// Always stage everything.
    All,
}

/// Stage, validate and commit.
///
/// Returns [`Outcome::Cancelled`] when the user declines staging or leaves
/// the message empty with no suggestion to fall back on.
pub(crate) fn commit_flow<W: Write>(
    session: &mut Session<'_, W>,
    state: &RepositoryState,
    inline_message: Option<&str>,
    staging: Staging,
) -> GitcliResult<Outcome> {
    if session.config.auto_fix_formatting {
        hooks::auto_format(session)?;
    }

    let stage_everything = staging == Staging::All || session.config.auto_stage;
    if stage_everything {
        stage_all(session)?;
    } else if state.staged.is_empty() {
        if !session.prompt.confirm("Nothing is staged. Stage all changes?", true)? {
            session.out.warn("Nothing staged; commit cancelled");
            return Ok(Outcome::Cancelled);
        }
        stage_all(session)?;
    }

    if session.config.pre_save_validation {
        hooks::validate_pre_commit(session)?;
    }

    let message = match inline_message.map(str::trim).filter(|m| !m.is_empty()) {
        Some(message) => message.to_string(),
        None => {
            let suggestion = commit_message::suggest(session.git, session.config)?;
            session.prompt.input("Commit message", Some(&suggestion))?
        }
    };
    let message = message.trim();
    if message.is_empty() {
        session.out.warn("Commit message cannot be empty");
        return Ok(Outcome::Cancelled);
    }

    session.git.mutate_checked(&["commit", "-m", message])?;
    info!(subject = message, "committed");
    session.out.success(format!("Committed: {message}"));
    Ok(Outcome::Completed)
}

/// Which of `main` and `master` exist locally, `main` first.
pub(crate) fn main_branches(git: &dyn GitRunner) -> GitcliResult<Vec<String>> {
    let branches = git::local_branches(git)?;
    Ok(["main", "master"]
        .into_iter()
        .filter(|candidate| branches.iter().any(|b| b == candidate))
        .map(str::to_string)
        .collect())
}

/// `main` or `master`, whichever exists locally.
pub(crate) fn main_branch(git: &dyn GitRunner) -> GitcliResult<Option<String>> {
    Ok(main_branches(git)?.into_iter().next())
}
