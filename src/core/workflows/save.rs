//! `save [message...]`: put the current work somewhere safe.

use std::io::Write;

use tracing::debug;

use super::{Outcome, Staging, commit_flow, push, stash_push};
use crate::core::operations::conflicts;
use crate::core::probe::{RepositoryState, probe};
use crate::core::session::Session;
use crate::core::situation::Situation;
use crate::error::GitcliResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    OfferConflictHelper,
    ChooseAction,
    CommitAndPush,
    Stash,
    ShowChanges,
    OfferPush,
    PointAtSync,
    ReportUpToDate,
    Finished(Outcome),
}

const ACTIONS: [&str; 4] = [
    "Commit and push (save permanently)",
    "Stash (save temporarily)",
    "Show changes first",
    "Cancel",
];

fn entry(situation: Situation, has_inline_message: bool) -> Step {
    match situation {
        Situation::Conflicted => Step::OfferConflictHelper,
        Situation::UncommittedChanges if has_inline_message => Step::CommitAndPush,
        Situation::UncommittedChanges => Step::ChooseAction,
        Situation::UnpushedCommits => Step::OfferPush,
        Situation::BehindRemote | Situation::Diverged => Step::PointAtSync,
        Situation::UpToDate => Step::ReportUpToDate,
    }
}

/// Ask whether to push, then push. Declining never invokes git.
fn offer_push<W: Write>(session: &mut Session<'_, W>, state: &RepositoryState) -> GitcliResult<Outcome> {
    if !session.prompt.confirm("Push to remote?", true)? {
        session.out.info("Push skipped");
        return Ok(Outcome::Cancelled);
    }
    push::run(session, state)
}

/// Run `save` against a fresh snapshot.
pub fn run<W: Write>(
    session: &mut Session<'_, W>,
    state: &RepositoryState,
    message: Option<&str>,
) -> GitcliResult<Outcome> {
    let situation = Situation::classify(state);
    let mut step = entry(situation, message.is_some_and(|m| !m.trim().is_empty()));
    loop {
        debug!(?step, "save");
        step = match step {
            Step::OfferConflictHelper => {
                session.out.error("You have unresolved conflicts; resolve them before saving");
                Step::Finished(conflicts::offer_helper(session)?)
            }
            Step::ChooseAction => {
                session
                    .out
                    .info(format!("You have uncommitted changes on '{}'", state.branch));
                let items: Vec<String> = ACTIONS.iter().map(|s| s.to_string()).collect();
                match session.prompt.select("What would you like to do?", &items, 0)? {
                    0 => Step::CommitAndPush,
                    1 => Step::Stash,
                    2 => Step::ShowChanges,
                    _ => {
                        session.out.info("Save cancelled");
                        Step::Finished(Outcome::Cancelled)
                    }
                }
            }
            Step::ShowChanges => {
                let short = session.git.query_checked(&["status", "--short"])?;
                let stat = session.git.query(&["diff", "HEAD", "--stat"])?;
                session.out.heading("Your changes");
                session.out.block(&short.stdout);
                if stat.success() {
                    session.out.block(&stat.stdout);
                }
                Step::ChooseAction
            }
            Step::Stash => {
                let label = session.prompt.input("Stash message (optional)", None)?;
                stash_push(session, Some(label.trim()))?;
                Step::Finished(Outcome::Completed)
            }
            Step::CommitAndPush => {
                let committed = commit_flow(session, state, message, Staging::Configured)?;
                if committed != Outcome::Completed {
                    Step::Finished(committed)
                } else if !state.has_remote {
                    session.out.hint("No remote configured; changes committed locally");
                    Step::Finished(Outcome::Completed)
                } else if !session.config.auto_push {
                    session.out.hint("Auto-push is disabled; run 'push' when ready");
                    Step::Finished(Outcome::Completed)
                } else {
                    let after = probe(session.git)?;
                    Step::Finished(offer_push(session, &after)?)
                }
            }
            Step::OfferPush => {
                session.out.info(format!(
                    "You have {} unpushed commit(s) on '{}'",
                    state.ahead, state.branch
                ));
                Step::Finished(offer_push(session, state)?)
            }
            Step::PointAtSync => {
                let detail = if situation == Situation::Diverged {
                    format!(
                        "Your branch and the remote have diverged ({} ahead, {} behind)",
                        state.ahead, state.behind
                    )
                } else {
                    format!("The remote has {} commit(s) you do not have", state.behind)
                };
                session.out.warn(detail);
                session.out.hint("Run 'sync' to bring your branch up to date");
                Step::Finished(Outcome::NothingToDo)
            }
            Step::ReportUpToDate => {
                if state.has_remote {
                    session.out.success("Everything is saved and up to date");
                } else {
                    session.out.success("No changes to save");
                }
                Step::Finished(Outcome::NothingToDo)
            }
            Step::Finished(outcome) => return Ok(outcome),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::session::testing::Harness;
    use crate::error::GitcliError;
    use crate::git::GitOutput;
    use crate::git::testing::FakeGit;
    use crate::prompt::testing::Answer;

    fn dirty_repo() -> FakeGit {
        FakeGit::clean_repo("main").with_status(" M src/lib.rs\n?? notes.txt\n")
    }

    /// # Entry Steps
    ///
    /// Verifies the first step for every situation.
    ///
    /// ## Test Scenario
    /// - Each situation with and without an inline message
    ///
    /// ## Expected Outcome
    /// - Only dirty trees use the inline message to skip the menu
    #[test]
    fn test_entry() {
        assert_eq!(entry(Situation::Conflicted, true), Step::OfferConflictHelper);
        assert_eq!(entry(Situation::UncommittedChanges, false), Step::ChooseAction);
        assert_eq!(entry(Situation::UncommittedChanges, true), Step::CommitAndPush);
        assert_eq!(entry(Situation::UnpushedCommits, false), Step::OfferPush);
        assert_eq!(entry(Situation::BehindRemote, false), Step::PointAtSync);
        assert_eq!(entry(Situation::Diverged, true), Step::PointAtSync);
        assert_eq!(entry(Situation::UpToDate, false), Step::ReportUpToDate);
    }

    /// # Dirty Tree Never Pushes Before Commit And Push
    ///
    /// Verifies no push happens while the user browses and stashes.
    ///
    /// ## Test Scenario
    /// - Dirty 0/0; show changes, then stash with a label
    ///
    /// ## Expected Outcome
    /// - Only "stash push -m wip"; no push, no commit
    #[test]
    fn test_dirty_stash_never_pushes() {
        let mut h = Harness::new(
            dirty_repo(),
            vec![
                Answer::Select(2),
                Answer::Select(1),
                Answer::Input("wip".to_string()),
            ],
        );
        let state = probe(&h.git).unwrap();
        assert_eq!(Situation::classify(&state), Situation::UncommittedChanges);
        let outcome = run(&mut h.session(), &state, None).unwrap();
        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(h.git.mutations(), vec!["stash push -m wip".to_string()]);
        h.assert_script_consumed();
    }

    /// # Dirty Tree Commit And Push
    ///
    /// Verifies the full commit and push path.
    ///
    /// ## Test Scenario
    /// - Dirty 0/0; choose commit&push, type a message, confirm push
    ///
    /// ## Expected Outcome
    /// - add, commit, push in that order
    #[test]
    fn test_dirty_commit_and_push() {
        let mut h = Harness::new(
            dirty_repo(),
            vec![
                Answer::Select(0),
                Answer::Input("Fix parser".to_string()),
                Answer::Confirm(true),
            ],
        );
        let state = probe(&h.git).unwrap();
        run(&mut h.session(), &state, None).unwrap();
        assert_eq!(
            h.git.mutations(),
            vec![
                "add .".to_string(),
                "commit -m Fix parser".to_string(),
                "push".to_string()
            ]
        );
        h.assert_script_consumed();
    }

    /// # Inline Message Skips The Menu
    ///
    /// Verifies `save <message>` goes straight to committing.
    ///
    /// ## Test Scenario
    /// - Dirty tree, inline message, decline push
    ///
    /// ## Expected Outcome
    /// - add and commit with the inline message; push declined
    /// - Cancelled, as for a declined push of existing commits
    #[test]
    fn test_inline_message() {
        let mut h = Harness::new(dirty_repo(), vec![Answer::Confirm(false)]);
        let state = probe(&h.git).unwrap();
        let outcome = run(&mut h.session(), &state, Some("Quick fix")).unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
        assert!(h.prompt.was_asked("Push to remote?"));
        assert!(h.output().contains("Push skipped"));
        assert_eq!(
            h.git.mutations(),
            vec!["add .".to_string(), "commit -m Quick fix".to_string()]
        );
        assert!(!h.prompt.was_asked("What would you like to do?"));
    }

    /// # Unpushed Commits, Declined
    ///
    /// Verifies declining the push prompt never invokes push.
    ///
    /// ## Test Scenario
    /// - Clean, ahead 3; answer no
    ///
    /// ## Expected Outcome
    /// - Push prompt asked; no mutations; Cancelled
    #[test]
    fn test_unpushed_declined() {
        let mut h = Harness::new(
            FakeGit::clean_repo("main").with_ahead_behind(3, 0),
            vec![Answer::Confirm(false)],
        );
        let state = probe(&h.git).unwrap();
        assert_eq!(Situation::classify(&state), Situation::UnpushedCommits);
        let outcome = run(&mut h.session(), &state, None).unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
        assert!(h.prompt.was_asked("Push to remote?"));
        assert!(h.git.mutations().is_empty());
        assert!(h.output().contains("3 unpushed commit(s)"));
    }

    /// # Unpushed Commits, Accepted
    ///
    /// Verifies accepting the prompt pushes.
    ///
    /// ## Test Scenario
    /// - Clean, ahead 3; answer yes
    ///
    /// ## Expected Outcome
    /// - Exactly one push
    #[test]
    fn test_unpushed_accepted() {
        let mut h = Harness::new(
            FakeGit::clean_repo("main").with_ahead_behind(3, 0),
            vec![Answer::Confirm(true)],
        );
        let state = probe(&h.git).unwrap();
        assert_eq!(run(&mut h.session(), &state, None).unwrap(), Outcome::Completed);
        assert_eq!(h.git.mutations(), vec!["push".to_string()]);
    }

    /// # Behind And Diverged
    ///
    /// Verifies save only points at sync.
    ///
    /// ## Test Scenario
    /// - Clean, behind 2; then diverged 1/1
    ///
    /// ## Expected Outcome
    /// - No prompts, no mutations, hint mentions sync
    #[test]
    fn test_behind_points_at_sync() {
        for (ahead, behind) in [(0, 2), (1, 1)] {
            let mut h = Harness::new(
                FakeGit::clean_repo("main").with_ahead_behind(ahead, behind),
                vec![],
            );
            let state = probe(&h.git).unwrap();
            assert_eq!(
                run(&mut h.session(), &state, None).unwrap(),
                Outcome::NothingToDo
            );
            assert!(h.git.mutations().is_empty());
            assert!(h.output().contains("sync"));
        }
    }

    /// # Auto-Push Disabled
    ///
    /// Verifies no push prompt when auto_push is off.
    ///
    /// ## Test Scenario
    /// - Inline message, auto_push false
    ///
    /// ## Expected Outcome
    /// - Commit happens, no push and no push prompt
    #[test]
    fn test_auto_push_disabled() {
        let config = Config {
            auto_push: false,
            ..Config::default()
        };
        let mut h = Harness::new(dirty_repo(), vec![]).with_config(config);
        let state = probe(&h.git).unwrap();
        run(&mut h.session(), &state, Some("msg")).unwrap();
        assert!(h.git.mutated("commit -m msg"));
        assert!(!h.git.mutated("push"));
        assert!(h.prompt.asked().is_empty());
    }

    /// # Conflicted Save
    ///
    /// Verifies save offers the helper and does nothing else when declined.
    ///
    /// ## Test Scenario
    /// - Conflicted file, decline the helper
    ///
    /// ## Expected Outcome
    /// - Cancelled, no mutation
    #[test]
    fn test_conflicted_offers_helper() {
        let git = FakeGit::clean_repo("main").with_status("UU src/lib.rs\n");
        let mut h = Harness::new(git, vec![Answer::Confirm(false)]);
        let state = probe(&h.git).unwrap();
        let outcome = run(&mut h.session(), &state, Some("ignored")).unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
        assert!(h.git.mutations().is_empty());
    }

    /// # Escape Cancels
    ///
    /// Verifies escaping the menu propagates as Cancelled.
    ///
    /// ## Test Scenario
    /// - Dirty tree, escape at the action menu
    ///
    /// ## Expected Outcome
    /// - Cancelled error, no mutation
    #[test]
    fn test_escape_cancels() {
        let mut h = Harness::new(dirty_repo(), vec![Answer::Escape]);
        let state = probe(&h.git).unwrap();
        let err = run(&mut h.session(), &state, None).unwrap_err();
        assert!(matches!(err, GitcliError::Cancelled));
        assert!(h.git.mutations().is_empty());
    }

    /// # Up To Date
    ///
    /// Verifies a clean synced tree is reported without prompting.
    ///
    /// ## Test Scenario
    /// - Clean 0/0
    ///
    /// ## Expected Outcome
    /// - NothingToDo and a success message
    #[test]
    fn test_up_to_date() {
        let git = FakeGit::clean_repo("main").on("status --short", GitOutput::ok(""));
        let mut h = Harness::new(git, vec![]);
        let state = probe(&h.git).unwrap();
        assert_eq!(
            run(&mut h.session(), &state, None).unwrap(),
            Outcome::NothingToDo
        );
        assert!(h.output().contains("Everything is saved and up to date"));
    }
}
