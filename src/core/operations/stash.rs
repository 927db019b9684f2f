//! Stash commands.

use std::io::Write;

use tracing::{info, warn};

use super::basic::print_output;
use crate::core::probe::{StashEntry, parse_stash_list, probe};
use crate::core::session::Session;
use crate::core::workflows::{Outcome, conflict_error, stash_push};
use crate::error::GitcliResult;
use crate::prompt::typed_confirmation;

fn entries(git: &dyn crate::git::GitRunner) -> GitcliResult<Vec<StashEntry>> {
    let out = git.query(&["stash", "list"])?;
    Ok(if out.success() {
        parse_stash_list(&out.stdout)
    } else {
        Vec::new()
    })
}

fn labels(stashes: &[StashEntry]) -> Vec<String> {
    stashes
        .iter()
        .map(|s| format!("{}: {}", s.reference(), s.label))
        .collect()
}

/// Most recent entry, or a chosen one when there are several.
fn choose<W: Write>(session: &mut Session<'_, W>, prompt: &str) -> GitcliResult<Option<StashEntry>> {
    let stashes = entries(session.git)?;
    match stashes.len() {
        0 => {
            session.out.warn("No stashes found");
            Ok(None)
        }
        1 => Ok(stashes.into_iter().next()),
        _ => {
            let index = session.prompt.select(prompt, &labels(&stashes), 0)?;
            Ok(stashes.into_iter().nth(index))
        }
    }
}

/// `stash`.
pub fn stash<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let state = probe(session.git)?;
    if !state.dirty {
        session.out.warn("No changes to stash");
        return Ok(Outcome::NothingToDo);
    }
    let message = session.prompt.input("Stash message (optional)", None)?;
    let message = message.trim();
    if state.untracked.is_empty()
        || !session
            .prompt
            .confirm("Include untracked files?", true)?
    {
        stash_push(session, Some(message))?;
    } else {
        let mut args = vec!["stash", "push", "--include-untracked"];
        if !message.is_empty() {
            args.extend(["-m", message]);
        }
        session.git.mutate_checked(&args)?;
        session.out.success("Changes stashed, including untracked files");
    }
    info!("stashed changes");
    Ok(Outcome::Completed)
}

/// Shared body of `stash-pop` and `stash-apply`.
fn restore<W: Write>(session: &mut Session<'_, W>, verb: &str) -> GitcliResult<Outcome> {
    let Some(entry) = choose(session, &format!("Which stash do you want to {verb}?"))? else {
        return Ok(Outcome::NothingToDo);
    };
    let reference = entry.reference();
    let args = ["stash", verb, reference.as_str()];
    let out = session.git.mutate(&args)?;
    if out.success() {
        info!(stash = %reference, verb, "restored stash");
        session.out.success(format!("Applied {reference}: {}", entry.label));
        if verb == "pop" {
            session.out.info("The stash entry was removed");
        }
        return Ok(Outcome::Completed);
    }
    if out.mentions_conflict() {
        warn!(stash = %reference, "stash produced conflicts");
        if verb == "pop" {
            session
                .out
                .warn(format!("{reference} was kept because applying it conflicted"));
        }
        return Err(conflict_error(session.git));
    }
    Err(out.into_error(&args).into())
}

/// `stash-pop`.
pub fn pop<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    restore(session, "pop")
}

/// `stash-apply`.
pub fn apply<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    restore(session, "apply")
}

/// `stash-list`.
pub fn list<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let stashes = entries(session.git)?;
    if stashes.is_empty() {
        session.out.info("No stashes");
        return Ok(Outcome::NothingToDo);
    }
    session.out.heading(format!("Stashes ({})", stashes.len()));
    for label in labels(&stashes) {
        session.out.line(format!("  {label}"));
    }
    Ok(Outcome::NothingToDo)
}

const DROP_CHOICES: [&str; 4] = [
    "Drop the most recent stash",
    "Choose a stash to drop",
    "Drop ALL stashes",
    "Cancel",
];

/// `stash-drop`.
pub fn drop<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let stashes = entries(session.git)?;
    if stashes.is_empty() {
        session.out.warn("No stashes found");
        return Ok(Outcome::NothingToDo);
    }
    let choices: Vec<String> = DROP_CHOICES.iter().map(|s| s.to_string()).collect();
    let entry = match session.prompt.select("Drop", &choices, 0)? {
        0 => stashes[0].clone(),
        1 => {
            let index = session
                .prompt
                .select("Which stash?", &labels(&stashes), 0)?;
            stashes[index].clone()
        }
        2 => {
            let warning = format!("This deletes all {} stash(es) permanently.", stashes.len());
            if !typed_confirmation(&mut *session.prompt, &warning)? {
                return Ok(Outcome::Cancelled);
            }
            session.git.mutate_checked(&["stash", "clear"])?;
            info!(count = stashes.len(), "cleared stashes");
            session.out.success("All stashes cleared");
            return Ok(Outcome::Completed);
        }
        _ => return Ok(Outcome::Cancelled),
    };

    let reference = entry.reference();
    if !session
        .prompt
        .confirm(&format!("Drop {reference} ({})?", entry.label), false)?
    {
        return Ok(Outcome::Cancelled);
    }
    session.git.mutate_checked(&["stash", "drop", &reference])?;
    session.out.success(format!("Dropped {reference}"));
    Ok(Outcome::Completed)
}

/// `stash-show`.
pub fn show<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let Some(entry) = choose(session, "Which stash do you want to see?")? else {
        return Ok(Outcome::NothingToDo);
    };
    let reference = entry.reference();
    let out = session.git.query_checked(&["stash", "show", "-p", &reference])?;
    session.out.heading(format!("{reference}: {}", entry.label));
    print_output(session.out, &out.stdout);
    Ok(Outcome::NothingToDo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::testing::Harness;
    use crate::error::GitcliError;
    use crate::git::GitOutput;
    use crate::git::testing::FakeGit;
    use crate::prompt::testing::Answer;

    const TWO_STASHES: &str =
        "stash@{0}: On main: second\nstash@{1}: WIP on main: abc1234 first\n";

    /// # Stash With Untracked Files
    ///
    /// Verifies untracked files are included on request.
    ///
    /// ## Test Scenario
    /// - Modified and untracked files; message "wip"; include untracked
    ///
    /// ## Expected Outcome
    /// - stash push --include-untracked -m wip
    #[test]
    fn test_stash_untracked() {
        let git = FakeGit::clean_repo("main").with_status(" M a.rs\n?? new.rs\n");
        let mut h = Harness::new(
            git,
            vec![Answer::Input("wip".to_string()), Answer::Confirm(true)],
        );
        assert_eq!(stash(&mut h.session()).unwrap(), Outcome::Completed);
        assert_eq!(
            h.git.mutations(),
            vec!["stash push --include-untracked -m wip".to_string()]
        );
    }

    /// # Pop A Chosen Stash
    ///
    /// Verifies the chosen entry is popped by reference.
    ///
    /// ## Test Scenario
    /// - Two stashes; choose the older one
    ///
    /// ## Expected Outcome
    /// - stash pop stash@{1}
    #[test]
    fn test_pop_chosen() {
        let git = FakeGit::clean_repo("main").on("stash list", GitOutput::ok(TWO_STASHES));
        let mut h = Harness::new(git, vec![Answer::Select(1)]);
        assert_eq!(pop(&mut h.session()).unwrap(), Outcome::Completed);
        assert_eq!(h.git.mutations(), vec!["stash pop stash@{1}".to_string()]);
    }

    /// # Apply Conflict
    ///
    /// Verifies a conflicting apply routes to the conflict helper.
    ///
    /// ## Test Scenario
    /// - One stash; apply reports CONFLICT
    ///
    /// ## Expected Outcome
    /// - Conflict error naming the file
    #[test]
    fn test_apply_conflict() {
        let git = FakeGit::clean_repo("main")
            .on("stash list", GitOutput::ok("stash@{0}: On main: x\n"))
            .on(
                "stash apply stash@{0}",
                GitOutput::failed("CONFLICT (content): Merge conflict in a.rs", ""),
            )
            .on("diff --name-only --diff-filter=U", GitOutput::ok("a.rs\n"));
        let mut h = Harness::new(git, vec![]);
        match apply(&mut h.session()).unwrap_err() {
            GitcliError::Conflict { files } => assert_eq!(files, vec!["a.rs".to_string()]),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    /// # Clear All Stashes
    ///
    /// Verifies clearing needs the typed confirmation.
    ///
    /// ## Test Scenario
    /// - Two stashes; drop all; type "yes"
    ///
    /// ## Expected Outcome
    /// - stash clear
    #[test]
    fn test_drop_all() {
        let git = FakeGit::clean_repo("main").on("stash list", GitOutput::ok(TWO_STASHES));
        let mut h = Harness::new(
            git,
            vec![Answer::Select(2), Answer::Input("yes".to_string())],
        );
        assert_eq!(drop(&mut h.session()).unwrap(), Outcome::Completed);
        assert_eq!(h.git.mutations(), vec!["stash clear".to_string()]);
    }

    /// # No Stashes
    ///
    /// Verifies every stash command is a no-op without entries.
    ///
    /// ## Test Scenario
    /// - Empty stash list
    ///
    /// ## Expected Outcome
    /// - NothingToDo, no prompts, no mutations
    #[test]
    fn test_no_stashes() {
        let mut h = Harness::new(FakeGit::clean_repo("main"), vec![]);
        assert_eq!(pop(&mut h.session()).unwrap(), Outcome::NothingToDo);
        assert_eq!(drop(&mut h.session()).unwrap(), Outcome::NothingToDo);
        assert_eq!(show(&mut h.session()).unwrap(), Outcome::NothingToDo);
        assert_eq!(list(&mut h.session()).unwrap(), Outcome::NothingToDo);
        assert!(h.git.mutations().is_empty());
    }
}
