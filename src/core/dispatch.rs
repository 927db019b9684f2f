//! Command routing and the per-command error policy.
//!
//! [`execute`] maps an [`Invocation`] to its workflow or operation. [`run`]
//! wraps it with the recovery policy: conflicts go to the conflict helper,
//! cancellations unwind quietly, and every other error is reported with the
//! captured git stderr.

use std::io::Write;

use tracing::{debug, info, warn};

use super::ExitCode;
use super::commands::{Command, Invocation, render_help};
use super::operations::{basic, branches, config_menu, conflicts, hooks, remotes, stash};
use super::probe::probe;
use super::session::Session;
use super::workflows::{self, Outcome};
use crate::console::Console;
use crate::error::{EnvironmentError, GitcliError, GitcliResult, RepositoryError};

fn joined(args: &[String]) -> Option<String> {
    let text = args.join(" ");
    (!text.trim().is_empty()).then_some(text)
}

/// Run one command to completion.
pub fn execute<W: Write>(session: &mut Session<'_, W>, invocation: &Invocation) -> GitcliResult<Outcome> {
    let args = &invocation.args;
    info!(command = %invocation.command, args = args.len(), "executing");
    match invocation.command {
        Command::Save => {
            let state = probe(session.git)?;
            workflows::save::run(session, &state, joined(args).as_deref())
        }
        Command::Work => {
            let state = probe(session.git)?;
            workflows::work::run(session, &state, joined(args).as_deref())
        }
        Command::Done => {
            let state = probe(session.git)?;
            workflows::done::run(session, &state)
        }
        Command::Sync => {
            let state = probe(session.git)?;
            workflows::sync::run(session, &state)
        }
        Command::Undo => {
            let state = probe(session.git)?;
            workflows::undo::run(session, &state)
        }
        Command::Status => workflows::status::run(session),
        Command::Commit => basic::commit(session),
        Command::Push => basic::push(session),
        Command::Pull => basic::pull(session),
        Command::Fetch => basic::fetch(session),
        Command::Stage => basic::stage(session),
        Command::Log => basic::log(session),
        Command::Diff => basic::diff(session),
        Command::DiffStaged => basic::diff_staged(session),
        Command::Amend => basic::amend(session),
        Command::Reset => basic::reset(session),
        Command::Clone => basic::clone(session, args),
        Command::Init => basic::init(session),
        Command::QuickPush => basic::quick_push(session, joined(args).as_deref()),
        Command::Remotes => remotes::manage(session),
        Command::SwitchBranch => branches::switch(session),
        Command::AddBranch => branches::add(session, args.first().map(String::as_str)),
        Command::DeleteBranch => branches::delete(session),
        Command::RenameBranch => branches::rename(session),
        Command::ListBranch => branches::list(session),
        Command::Stash => stash::stash(session),
        Command::StashPop => stash::pop(session),
        Command::StashApply => stash::apply(session),
        Command::StashList => stash::list(session),
        Command::StashDrop => stash::drop(session),
        Command::StashShow => stash::show(session),
        Command::ResolveConflicts => conflicts::resolve(session),
        Command::CheckConflicts => conflicts::check(session),
        Command::Hooks => hooks::manage(session),
        Command::ListHooks => hooks::list(session),
        Command::Config => config_menu::manage(session),
        Command::Help => {
            render_help(session.out);
            Ok(Outcome::NothingToDo)
        }
        Command::Quit => Ok(Outcome::NothingToDo),
    }
}

/// Print an error with its git stderr and a hint where one helps.
pub fn report_error<W: Write>(out: &mut Console<W>, error: &GitcliError) {
    out.error(error);
    if let Some(stderr) = error.stderr() {
        out.block(stderr);
    }
    match error {
        GitcliError::Repository(RepositoryError::NotAGitRepository { .. }) => {
            out.hint("Run 'init' to create a repository here, or 'clone' to fetch one")
        }
        GitcliError::Environment(EnvironmentError::GitUnavailable { .. }) => {
            out.hint("Install git and make sure it is on your PATH")
        }
        _ => {}
    }
}

/// Run one command and apply the error policy.
pub fn run<W: Write>(session: &mut Session<'_, W>, invocation: &Invocation) -> ExitCode {
    let result = match execute(session, invocation) {
        Err(GitcliError::Conflict { files }) => {
            warn!(command = %invocation.command, count = files.len(), "conflicts detected");
            match conflicts::handle(session, &files) {
                Ok(Outcome::Completed) => Ok(Outcome::Completed),
                Ok(_) => Err(GitcliError::Conflict { files }),
                Err(e) => Err(e),
            }
        }
        other => other,
    };

    let code = match result {
        Ok(outcome) => {
            debug!(command = %invocation.command, ?outcome, "finished");
            ExitCode::Success
        }
        Err(GitcliError::Cancelled) => {
            session.out.warn("Cancelled");
            ExitCode::Success
        }
        Err(GitcliError::Conflict { .. }) => ExitCode::GeneralError,
        Err(e) => {
            warn!(command = %invocation.command, error = %e, "command failed");
            report_error(session.out, &e);
            ExitCode::for_error(&e)
        }
    };
    session.out.flush();
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::commands::parse_line;
    use crate::core::session::testing::Harness;
    use crate::git::GitOutput;
    use crate::git::testing::FakeGit;
    use crate::prompt::testing::Answer;

    /// # Subprocess Failure Policy
    ///
    /// Verifies a failing git step reports stderr and exits 1.
    ///
    /// ## Test Scenario
    /// - `pull` where git pull fails with an auth error
    ///
    /// ## Expected Outcome
    /// - Exit 1, stderr shown
    #[test]
    fn test_subprocess_failure() {
        let git = FakeGit::clean_repo("main").on(
            "pull",
            GitOutput::failed("", "fatal: Authentication failed"),
        );
        let mut h = Harness::new(git, vec![]);
        let code = run(&mut h.session(), &parse_line("pull").unwrap());
        assert_eq!(code, ExitCode::GeneralError);
        assert!(h.output().contains("Authentication failed"));
    }

    /// # Cancellation Policy
    ///
    /// Verifies escaping a prompt exits 0 without side effects.
    ///
    /// ## Test Scenario
    /// - `save` on a dirty tree; escape the action menu
    ///
    /// ## Expected Outcome
    /// - Exit 0, "Cancelled" shown, no mutation
    #[test]
    fn test_cancel_policy() {
        let git = FakeGit::clean_repo("main").with_status(" M a.rs\n");
        let mut h = Harness::new(git, vec![Answer::Escape]);
        let code = run(&mut h.session(), &parse_line("save").unwrap());
        assert_eq!(code, ExitCode::Success);
        assert!(h.output().contains("Cancelled"));
        assert!(h.git.mutations().is_empty());
    }

    /// # Conflict Policy
    ///
    /// Verifies a conflict during a command lands in the helper offer.
    ///
    /// ## Test Scenario
    /// - `pull` reports CONFLICT; decline the helper
    ///
    /// ## Expected Outcome
    /// - The helper is offered; exit 1
    #[test]
    fn test_conflict_policy() {
        let git = FakeGit::clean_repo("main")
            .on("pull", GitOutput::failed("CONFLICT (content): Merge conflict in a.rs", ""))
            .on("diff --name-only --diff-filter=U", GitOutput::ok("a.rs\n"));
        let mut h = Harness::new(git, vec![Answer::Confirm(false)]);
        let code = run(&mut h.session(), &parse_line("pull").unwrap());
        assert_eq!(code, ExitCode::GeneralError);
        assert!(h.prompt.was_asked("conflict helper"));
        assert!(h.output().contains("a.rs"));
    }

    /// # No Remote Guidance
    ///
    /// Verifies repository errors tell the user what to do.
    ///
    /// ## Test Scenario
    /// - `sync` without a remote
    ///
    /// ## Expected Outcome
    /// - Exit 1 pointing at 'remotes'
    #[test]
    fn test_no_remote_hint() {
        let mut h = Harness::new(FakeGit::clean_repo("main").without_remote(), vec![]);
        let code = run(&mut h.session(), &parse_line("sync").unwrap());
        assert_eq!(code, ExitCode::GeneralError);
        assert!(h.output().contains("add one with 'remotes'"));
    }

    /// # Inline Arguments
    ///
    /// Verifies inline arguments reach their command.
    ///
    /// ## Test Scenario
    /// - "quickpush ship it" on a dirty tree, ahead 1 after the commit
    ///
    /// ## Expected Outcome
    /// - The commit uses the joined message
    #[test]
    fn test_inline_arguments() {
        let git = FakeGit::clean_repo("main")
            .with_status(" M a.rs\n")
            .on_seq(
                "rev-list --left-right --count @{u}...HEAD",
                vec![GitOutput::ok("0\t0\n"), GitOutput::ok("0\t1\n")],
            );
        let mut h = Harness::new(git, vec![]);
        let code = run(&mut h.session(), &parse_line("quickpush ship it").unwrap());
        assert_eq!(code, ExitCode::Success);
        assert!(h.git.mutated("commit -m ship it"));
        assert!(h.git.mutated("push"));
    }

    /// # Command Spellings
    ///
    /// Verifies hyphenated, concatenated and spaced names route the same.
    ///
    /// ## Test Scenario
    /// - "list-branch", "listbranch" and "list branch" on the same repo
    ///
    /// ## Expected Outcome
    /// - Each runs `branch -a -vv`
    #[test]
    fn test_command_spellings() {
        for line in ["list-branch", "listbranch", "list branch"] {
            let git = FakeGit::clean_repo("main")
                .on("branch -a -vv", GitOutput::ok("* main abc1234 init\n"));
            let mut h = Harness::new(git, vec![]);
            let invocation = parse_line(line).unwrap();
            assert!(invocation.args.is_empty(), "{line}");
            assert_eq!(run(&mut h.session(), &invocation), ExitCode::Success);
            assert!(h.git.calls().iter().any(|c| c.args == "branch -a -vv"), "{line}");
        }
    }
}
