//! Push sub-machine shared by save, done, sync, push and quick-push.

use std::io::Write;

use tracing::{info, warn};

use super::{Outcome, pull};
use crate::core::probe::RepositoryState;
use crate::core::session::Session;
use crate::error::{GitcliResult, RepositoryError};
use crate::git::{self, GitOutput};
use crate::prompt::typed_confirmation;

/// Where the push goes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    /// The branch already tracks an upstream.
    Upstream,
    /// First push: set the upstream on `remote`.
    New { remote: String, branch: String },
}

impl Target {
    fn args(&self, force: bool) -> Vec<&str> {
        let mut args = vec!["push"];
        if force {
            args.push("--force-with-lease");
        }
        if let Target::New { remote, branch } = self {
            args.extend(["-u", remote.as_str(), branch.as_str()]);
        }
        args
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    PullFirst,
    Push { retried: bool },
    Rejected { retried: bool },
    ForcePush,
    Finished(Outcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RejectChoice {
    PullAndRetry,
    Force,
    Cancel,
}

impl RejectChoice {
    fn label(self) -> &'static str {
        match self {
            RejectChoice::PullAndRetry => "Pull remote changes, then push again",
            RejectChoice::Force => "Force push (overwrites the remote branch)",
            RejectChoice::Cancel => "Cancel",
        }
    }
}

fn entry(state: &RepositoryState, auto_pull_before_push: bool) -> Step {
    if auto_pull_before_push && state.behind > 0 {
        Step::PullFirst
    } else {
        Step::Push { retried: false }
    }
}

/// Whether git refused the push because the remote moved on.
fn is_rejected(out: &GitOutput) -> bool {
    let text = format!("{}{}", out.stderr, out.stdout);
    text.contains("rejected") && (text.contains("non-fast-forward") || text.contains("fetch first"))
}

/// Confirm a force push according to `confirm_force_push`.
pub(crate) fn confirm_force<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<bool> {
    if !session.config.confirm_force_push {
        return Ok(true);
    }
    typed_confirmation(
        &mut *session.prompt,
        "Force pushing rewrites the remote branch for everyone.",
    )
}

/// Push the current branch.
pub fn run<W: Write>(session: &mut Session<'_, W>, state: &RepositoryState) -> GitcliResult<Outcome> {
    if state.detached {
        return Err(RepositoryError::DetachedHead.into());
    }
    if !state.has_remote {
        return Err(RepositoryError::NoRemote.into());
    }
    let target = if state.upstream.is_some() {
        Target::Upstream
    } else {
        let remote = git::preferred_remote(session.git)?.ok_or(RepositoryError::NoRemote)?;
        Target::New {
            remote,
            branch: state.branch.clone(),
        }
    };

    let mut step = entry(state, session.config.auto_pull_before_push);
    loop {
        step = match step {
            Step::PullFirst => {
                session
                    .out
                    .info(format!("Remote has {} new commit(s); pulling first", state.behind));
                pull(session)?;
                Step::Push { retried: false }
            }
            Step::Push { retried } => {
                let args = target.args(false);
                session.out.info(format!("Pushing '{}'...", state.branch));
                let out = session.git.mutate(&args)?;
                if out.success() {
                    info!(branch = %state.branch, "pushed");
                    match &target {
                        Target::Upstream => {
                            session.out.success(format!("Pushed '{}'", state.branch))
                        }
                        Target::New { remote, branch } => session
                            .out
                            .success(format!("Pushed '{branch}' and set upstream to {remote}")),
                    }
                    Step::Finished(Outcome::Completed)
                } else if is_rejected(&out) {
                    warn!(branch = %state.branch, "push rejected");
                    Step::Rejected { retried }
                } else {
                    return Err(out.into_error(&args).into());
                }
            }
            Step::Rejected { retried } => {
                session
                    .out
                    .warn("Push rejected: the remote has commits you do not have");
                let mut choices = Vec::new();
                if !retried {
                    choices.push(RejectChoice::PullAndRetry);
                }
                choices.extend([RejectChoice::Force, RejectChoice::Cancel]);
                let labels: Vec<String> = choices.iter().map(|c| c.label().to_string()).collect();
                let picked = session.prompt.select("How do you want to continue?", &labels, 0)?;
                match choices.get(picked).copied().unwrap_or(RejectChoice::Cancel) {
                    RejectChoice::PullAndRetry => {
                        pull(session)?;
                        Step::Push { retried: true }
                    }
                    RejectChoice::Force => Step::ForcePush,
                    RejectChoice::Cancel => {
                        session.out.info("Push cancelled");
                        Step::Finished(Outcome::Cancelled)
                    }
                }
            }
            Step::ForcePush => {
                if !confirm_force(session)? {
                    session.out.info("Force push cancelled");
                    Step::Finished(Outcome::Cancelled)
                } else {
                    let args = target.args(true);
                    session.git.mutate_checked(&args)?;
                    warn!(branch = %state.branch, "force pushed");
                    session.out.success(format!("Force pushed '{}'", state.branch));
                    Step::Finished(Outcome::Completed)
                }
            }
            Step::Finished(outcome) => return Ok(outcome),
        };
    }
}
