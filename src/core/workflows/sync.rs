//! `sync`: bring the branch level with its remote.

use std::io::Write;

use tracing::{debug, warn};

use super::{Outcome, conflict_error, pull, push, stash_push};
use crate::core::probe::{RepositoryState, probe};
use crate::core::session::Session;
use crate::error::{GitcliError, GitcliResult, RepositoryError};

const SYNC_STASH_MESSAGE: &str = "Auto-stash for sync";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    StashLocal,
    Pull { stashed: bool },
    RestoreStash,
    OfferPush,
    Finished(Outcome),
}

fn entry(state: &RepositoryState) -> GitcliResult<Step> {
    if !state.has_remote {
        return Err(RepositoryError::NoRemote.into());
    }
    if state.conflict {
        return Err(GitcliError::Conflict {
            files: state.conflicted.iter().cloned().collect(),
        });
    }
    if state.dirty {
        Ok(Step::StashLocal)
    } else {
        Ok(Step::Pull { stashed: false })
    }
}

/// Run `sync` against a fresh snapshot.
pub fn run<W: Write>(session: &mut Session<'_, W>, state: &RepositoryState) -> GitcliResult<Outcome> {
    let mut step = entry(state)?;
    loop {
        debug!(?step, "sync");
        step = match step {
            Step::StashLocal => {
                session.out.info("Stashing local changes...");
                stash_push(session, Some(SYNC_STASH_MESSAGE))?;
                Step::Pull { stashed: true }
            }
            Step::Pull { stashed } => {
                if state.upstream.is_none() {
                    session
                        .out
                        .warn(format!("'{}' has no upstream; nothing to pull", state.branch));
                } else if let Err(err) = pull(session) {
                    if stashed && matches!(err, GitcliError::Conflict { .. }) {
                        session.out.warn(format!(
                            "Your local changes are kept in the stash ('{SYNC_STASH_MESSAGE}'); run stash-pop after resolving"
                        ));
                    }
                    return Err(err);
                }
                if stashed {
                    Step::RestoreStash
                } else {
                    Step::OfferPush
                }
            }
            Step::RestoreStash => {
                let out = session.git.mutate(&["stash", "pop"])?;
                if out.success() {
                    session.out.success("Local changes restored");
                    Step::OfferPush
                } else if out.mentions_conflict() {
                    return Err(conflict_error(session.git));
                } else {
                    warn!(stderr = %out.stderr, "stash pop failed");
                    session
                        .out
                        .warn("Could not restore your changes; they remain stashed");
                    return Err(out.into_error(&["stash", "pop"]).into());
                }
            }
            Step::OfferPush => {
                let current = probe(session.git)?;
                if current.ahead > 0 {
                    let question = format!("Push {} local commit(s)?", current.ahead);
                    if session.prompt.confirm(&question, true)? {
                        push::run(session, &current)?;
                    }
                }
                session.out.success("Sync complete");
                Step::Finished(Outcome::Completed)
            }
            Step::Finished(outcome) => return Ok(outcome),
        };
    }
}
