//! `undo`: take back uncommitted changes or the last commit.

use std::io::Write;

use tracing::{debug, info};

use super::{Outcome, push};
use crate::core::probe::RepositoryState;
use crate::core::session::Session;
use crate::error::GitcliResult;
use crate::git;
use crate::prompt::typed_confirmation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    ChooseForChanges,
    DiscardAll,
    DiscardFiles,
    UndoCommit,
    ChooseForPushed,
    Revert,
    ResetAndForcePush,
    Finished(Outcome),
}

const CHANGE_CHOICES: [&str; 4] = [
    "Discard all changes",
    "Discard changes to specific files",
    "Undo the last commit (keep its changes)",
    "Cancel",
];

const PUSHED_CHOICES: [&str; 3] = [
    "Revert it with a new commit (safe)",
    "Remove it and force push (rewrites remote history)",
    "Cancel",
];

fn entry(state: &RepositoryState) -> Step {
    if state.dirty || !state.untracked.is_empty() {
        Step::ChooseForChanges
    } else {
        Step::UndoCommit
    }
}

/// Changed and untracked paths, sorted.
fn discardable(state: &RepositoryState) -> Vec<String> {
    let mut paths = state.changed_paths();
    paths.extend(state.untracked.iter().cloned());
    paths.into_iter().collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Run `undo` against a fresh snapshot.
pub fn run<W: Write>(session: &mut Session<'_, W>, state: &RepositoryState) -> GitcliResult<Outcome> {
    let mut step = entry(state);
    loop {
        debug!(?step, "undo");
        step = match step {
            Step::ChooseForChanges => {
                let count = discardable(state).len();
                session.out.info(format!("You have changes in {count} file(s)"));
                match session
                    .prompt
                    .select("What do you want to undo?", &strings(&CHANGE_CHOICES), 3)?
                {
                    0 => Step::DiscardAll,
                    1 => Step::DiscardFiles,
                    2 => Step::UndoCommit,
                    _ => Step::Finished(Outcome::Cancelled),
                }
            }
            Step::DiscardAll => {
                let confirmed = typed_confirmation(
                    &mut *session.prompt,
                    "This permanently deletes all uncommitted changes and untracked files.",
                )?;
                if confirmed {
                    session.git.mutate_checked(&["reset", "--hard", "HEAD"])?;
                    session.git.mutate_checked(&["clean", "-fd"])?;
                    info!("discarded all changes");
                    session.out.success("All changes discarded");
                    Step::Finished(Outcome::Completed)
                } else {
                    session.out.info("Nothing was discarded");
                    Step::Finished(Outcome::Cancelled)
                }
            }
            Step::DiscardFiles => {
                let paths = discardable(state);
                let picked = session
                    .prompt
                    .multi_select("Select files to discard", &paths)?;
                if picked.is_empty() {
                    session.out.info("No files selected");
                    Step::Finished(Outcome::Cancelled)
                } else {
                    let (untracked, tracked): (Vec<&str>, Vec<&str>) = picked
                        .iter()
                        .filter_map(|&i| paths.get(i))
                        .map(String::as_str)
                        .partition(|p| state.untracked.contains(*p));
                    let question = format!(
                        "Discard changes to {} file(s)? This cannot be undone",
                        picked.len()
                    );
                    if !session.prompt.confirm(&question, false)? {
                        Step::Finished(Outcome::Cancelled)
                    } else {
                        if !tracked.is_empty() {
                            let mut args = vec!["restore", "--staged", "--worktree", "--source=HEAD", "--"];
                            args.extend(&tracked);
                            session.git.mutate_checked(&args)?;
                        }
                        if !untracked.is_empty() {
                            let mut args = vec!["clean", "-f", "--"];
                            args.extend(&untracked);
                            session.git.mutate_checked(&args)?;
                        }
                        session
                            .out
                            .success(format!("Discarded changes to {} file(s)", picked.len()));
                        Step::Finished(Outcome::Completed)
                    }
                }
            }
            Step::UndoCommit => {
                if !state.has_commits {
                    session.out.info("There are no commits to undo");
                    Step::Finished(Outcome::NothingToDo)
                } else if git::head_on_remote(session.git)? {
                    Step::ChooseForPushed
                } else {
                    let last = session
                        .git
                        .query_checked(&["log", "-1", "--pretty=format:%h %s"])?;
                    session.out.info(format!("Last commit: {}", last.trimmed()));
                    if !session
                        .prompt
                        .confirm("Undo this commit and keep its changes staged?", true)?
                    {
                        Step::Finished(Outcome::Cancelled)
                    } else {
                        let is_root = !session
                            .git
                            .query(&["rev-parse", "--verify", "-q", "HEAD~1"])?
                            .success();
                        if is_root {
                            session.git.mutate_checked(&["update-ref", "-d", "HEAD"])?;
                        } else {
                            session.git.mutate_checked(&["reset", "--soft", "HEAD~1"])?;
                        }
                        info!(root = is_root, "undid last commit");
                        session
                            .out
                            .success("Last commit undone; its changes are staged");
                        Step::Finished(Outcome::Completed)
                    }
                }
            }
            Step::ChooseForPushed => {
                session.out.warn("The last commit has already been pushed");
                match session
                    .prompt
                    .select("How do you want to undo it?", &strings(&PUSHED_CHOICES), 0)?
                {
                    0 => Step::Revert,
                    1 => Step::ResetAndForcePush,
                    _ => Step::Finished(Outcome::Cancelled),
                }
            }
            Step::Revert => {
                session.git.mutate_checked(&["revert", "HEAD", "--no-edit"])?;
                session.out.success("Created a commit reverting the last one");
                session.out.hint("Run 'push' to publish the revert");
                Step::Finished(Outcome::Completed)
            }
            Step::ResetAndForcePush => {
                if !push::confirm_force(session)? {
                    session.out.info("Nothing was changed");
                    Step::Finished(Outcome::Cancelled)
                } else {
                    session.git.mutate_checked(&["reset", "--hard", "HEAD~1"])?;
                    session.git.mutate_checked(&["push", "--force-with-lease"])?;
                    info!("removed pushed commit with force push");
                    session.out.success("Last commit removed locally and on the remote");
                    Step::Finished(Outcome::Completed)
                }
            }
            Step::Finished(outcome) => return Ok(outcome),
        };
    }
}
