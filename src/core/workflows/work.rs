//! `work [branch]`: start or resume work on a branch.

use std::io::Write;

use tracing::{debug, info};

use super::{Outcome, Staging, commit_flow, main_branches, pull, stash_push};
use crate::core::operations::conflicts;
use crate::core::probe::RepositoryState;
use crate::core::session::Session;
use crate::error::{GitcliError, GitcliResult, RepositoryError};
use crate::git;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    OfferConflictHelper,
    AskName,
    Validate(String),
    AlreadyOn(String),
    ResolveDirty(String),
    Route(String),
    SwitchExisting(String),
    ChooseBase(String),
    CreateFrom { name: String, base: Option<String> },
    Finished(Outcome),
}

const DIRTY_CHOICES: [&str; 3] = ["Stash changes and switch", "Commit changes and switch", "Cancel"];

fn entry(state: &RepositoryState, name: Option<&str>) -> Step {
    if state.conflict {
        return Step::OfferConflictHelper;
    }
    match name.filter(|n| !n.trim().is_empty()) {
        Some(name) => Step::Validate(name.to_string()),
        None => Step::AskName,
    }
}

/// Run `work` against a fresh snapshot.
pub fn run<W: Write>(
    session: &mut Session<'_, W>,
    state: &RepositoryState,
    name: Option<&str>,
) -> GitcliResult<Outcome> {
    let mut dirty = state.dirty || !state.untracked.is_empty();
    let mut step = entry(state, name);
    loop {
        debug!(?step, "work");
        step = match step {
            Step::OfferConflictHelper => {
                session.out.error("Resolve the current conflicts before switching branches");
                Step::Finished(conflicts::offer_helper(session)?)
            }
            Step::AskName => {
                let raw = session.prompt.input("Branch name", None)?;
                Step::Validate(raw)
            }
            Step::Validate(raw) => {
                let name = git::sanitize_branch_name(&raw);
                if name.is_empty() {
                    session.out.warn("Branch name cannot be empty");
                    Step::Finished(Outcome::Cancelled)
                } else if !git::is_valid_branch_name(session.git, &name)? {
                    return Err(RepositoryError::InvalidBranchName { name }.into());
                } else if !state.detached && name == state.branch {
                    Step::AlreadyOn(name)
                } else if dirty {
                    Step::ResolveDirty(name)
                } else {
                    Step::Route(name)
                }
            }
            Step::AlreadyOn(name) => {
                session.out.info(format!("Already working on '{name}'"));
                Step::Finished(Outcome::NothingToDo)
            }
            Step::ResolveDirty(name) => {
                session.out.warn("You have uncommitted changes");
                let items: Vec<String> = DIRTY_CHOICES.iter().map(|s| s.to_string()).collect();
                match session.prompt.select("What should happen to them?", &items, 0)? {
                    0 => {
                        let label = format!(
                            "Auto-stash from {} before switching to {name}",
                            state.branch
                        );
                        stash_push(session, Some(&label))?;
                        dirty = false;
                        Step::Route(name)
                    }
                    1 => match commit_flow(session, state, None, Staging::All)? {
                        Outcome::Completed => {
                            dirty = false;
                            Step::Route(name)
                        }
                        other => Step::Finished(other),
                    },
                    _ => Step::Finished(Outcome::Cancelled),
                }
            }
            Step::Route(name) => {
                if git::local_branches(session.git)?.contains(&name) {
                    Step::SwitchExisting(name)
                } else {
                    Step::ChooseBase(name)
                }
            }
            Step::SwitchExisting(name) => {
                session.git.mutate_checked(&["checkout", &name])?;
                info!(branch = %name, "switched branch");
                session.out.success(format!("Switched to '{name}'"));
                if state.has_remote && git::upstream_of(session.git, &name)?.is_some() {
                    let question = format!("Pull latest changes for '{name}'?");
                    if session.prompt.confirm(&question, true)? {
                        pull(session)?;
                    }
                }
                Step::Finished(Outcome::Completed)
            }
            Step::ChooseBase(name) => {
                if !state.has_commits {
                    // Nothing to branch from; the new branch starts unborn
                    Step::CreateFrom { name, base: None }
                } else {
                    let mut bases = Vec::new();
                    if !state.detached {
                        bases.push(state.branch.clone());
                    }
                    for main in main_branches(session.git)? {
                        if !bases.contains(&main) {
                            bases.push(main);
                        }
                    }
                    if bases.is_empty() {
                        Step::CreateFrom { name, base: None }
                    } else {
                        let question = format!("Create '{name}' from which branch?");
                        let index = session.prompt.select(&question, &bases, 0)?;
                        let base = bases.get(index).cloned().ok_or(GitcliError::Cancelled)?;
                        Step::CreateFrom {
                            name,
                            base: Some(base),
                        }
                    }
                }
            }
            Step::CreateFrom { name, base } => {
                if let Some(base) = &base {
                    if state.detached || *base != state.branch {
                        session.git.mutate_checked(&["checkout", base])?;
                    }
                    if state.has_remote && git::upstream_of(session.git, base)?.is_some() {
                        pull(session)?;
                    }
                }
                session.git.mutate_checked(&["checkout", "-b", &name])?;
                info!(branch = %name, base = ?base, "created branch");
                match &base {
                    Some(base) => session
                        .out
                        .success(format!("Created '{name}' from '{base}'")),
                    None => session.out.success(format!("Created '{name}'")),
                }
                Step::Finished(Outcome::Completed)
            }
            Step::Finished(outcome) => return Ok(outcome),
        };
    }
}
