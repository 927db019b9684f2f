//! `done`: finish the current piece of work.

use std::io::Write;

use tracing::debug;

use super::{Outcome, Staging, commit_flow, main_branch, pull, push};
use crate::core::operations::conflicts;
use crate::core::probe::{RepositoryState, probe};
use crate::core::session::Session;
use crate::core::situation::Situation;
use crate::error::GitcliResult;
use crate::git;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    OfferConflictHelper,
    Commit,
    OfferPush,
    OfferSwitchBack,
    Finished(Outcome),
}

fn entry(situation: Situation) -> Step {
    match situation {
        Situation::Conflicted => Step::OfferConflictHelper,
        Situation::UncommittedChanges => Step::Commit,
        Situation::UnpushedCommits => Step::OfferPush,
        Situation::BehindRemote | Situation::Diverged | Situation::UpToDate => {
            Step::OfferSwitchBack
        }
    }
}

/// Run `done` against a fresh snapshot.
pub fn run<W: Write>(session: &mut Session<'_, W>, state: &RepositoryState) -> GitcliResult<Outcome> {
    let mut outcome = Outcome::NothingToDo;
    let mut step = entry(Situation::classify(state));
    loop {
        debug!(?step, "done");
        step = match step {
            Step::OfferConflictHelper => {
                session.out.error("Resolve the current conflicts first");
                Step::Finished(conflicts::offer_helper(session)?)
            }
            Step::Commit => match commit_flow(session, state, None, Staging::All)? {
                Outcome::Completed => {
                    outcome = Outcome::Completed;
                    Step::OfferPush
                }
                other => Step::Finished(other),
            },
            Step::OfferPush => {
                let current = probe(session.git)?;
                if !current.has_remote {
                    session.out.hint("No remote configured; work stays local");
                } else if current.ahead > 0 || current.upstream.is_none() {
                    if session.prompt.confirm("Push to remote?", true)? {
                        push::run(session, &current)?;
                        outcome = Outcome::Completed;
                    } else {
                        session.out.info("Push skipped");
                    }
                }
                Step::OfferSwitchBack
            }
            Step::OfferSwitchBack => {
                if state.detached || state.on_main_branch() {
                    Step::Finished(outcome)
                } else {
                    match main_branch(session.git)? {
                        None => Step::Finished(outcome),
                        Some(main) => {
                            let question = format!("Switch back to '{main}'?");
                            if session.prompt.confirm(&question, false)? {
                                session.git.mutate_checked(&["checkout", &main])?;
                                session.out.success(format!("Switched to '{main}'"));
                                if git::upstream_of(session.git, &main)?.is_some() {
                                    pull(session)?;
                                }
                                outcome = Outcome::Completed;
                            }
                            Step::Finished(outcome)
                        }
                    }
                }
            }
            Step::Finished(result) => {
                if result != Outcome::Cancelled {
                    session.out.success("Done");
                }
                return Ok(result);
            }
        };
    }
}
