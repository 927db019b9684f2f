//! Traditional commands: thin, prompt-driven wrappers over single git
//! operations.

use std::io::Write;

use tracing::info;

use crate::console::Console;
use crate::core::probe::probe;
use crate::core::session::Session;
use crate::core::workflows::{self, Outcome, Staging, push};
use crate::error::{GitcliResult, RepositoryError};
use crate::git;
use crate::prompt::typed_confirmation;

/// Print git output as-is, line by line.
pub(crate) fn print_output<W: Write>(out: &mut Console<W>, text: &str) {
    for line in text.lines() {
        out.line(line);
    }
}

/// `commit`.
pub fn commit<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let state = probe(session.git)?;
    if !state.dirty {
        session.out.warn("No changes to commit");
        return Ok(Outcome::NothingToDo);
    }
    workflows::commit_flow(session, &state, None, Staging::Configured)
}

/// `push`.
pub fn push<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let state = probe(session.git)?;
    if !state.has_remote {
        return Err(RepositoryError::NoRemote.into());
    }
    if state.dirty {
        session.out.warn("You have uncommitted changes");
        session.out.hint("Commit them first, or use 'quick-push'");
        return Ok(Outcome::Cancelled);
    }
    if state.upstream.is_some() && state.ahead == 0 {
        session.out.success("Nothing to push");
        return Ok(Outcome::NothingToDo);
    }
    push::run(session, &state)
}

/// `pull`.
pub fn pull<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    if git::remotes(session.git)?.is_empty() {
        return Err(RepositoryError::NoRemote.into());
    }
    workflows::pull(session)?;
    Ok(Outcome::Completed)
}

/// `fetch`: update remote-tracking branches and report how far behind we are.
pub fn fetch<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    if git::remotes(session.git)?.is_empty() {
        return Err(RepositoryError::NoRemote.into());
    }
    session.out.info("Fetching updates...");
    session.git.mutate_checked(&["fetch", "--all", "--prune"])?;
    session.out.success("Fetch complete");

    let state = probe(session.git)?;
    if state.behind > 0 {
        session
            .out
            .warn(format!("'{}' is {} commit(s) behind its upstream", state.branch, state.behind));
        session.out.hint("Use 'pull' or 'sync' to bring them in");
    }
    Ok(Outcome::Completed)
}

const STAGE_CHOICES: [&str; 3] = ["Stage all changes", "Choose files", "Cancel"];

/// `stage`.
pub fn stage<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let state = probe(session.git)?;
    let candidates: Vec<String> = state.unstaged.iter().cloned().collect();
    if candidates.is_empty() {
        session.out.warn("No unstaged changes");
        return Ok(Outcome::NothingToDo);
    }
    let choices: Vec<String> = STAGE_CHOICES.iter().map(|s| s.to_string()).collect();
    match session.prompt.select("Stage what?", &choices, 0)? {
        0 => {
            workflows::stage_all(session)?;
            Ok(Outcome::Completed)
        }
        1 => {
            let picked = session.prompt.multi_select("Files to stage", &candidates)?;
            if picked.is_empty() {
                session.out.warn("No files selected");
                return Ok(Outcome::Cancelled);
            }
            let mut args = vec!["add", "--"];
            args.extend(picked.iter().filter_map(|&i| candidates.get(i)).map(String::as_str));
            session.git.mutate_checked(&args)?;
            session.out.success(format!("Staged {} file(s)", picked.len()));
            Ok(Outcome::Completed)
        }
        _ => Ok(Outcome::Cancelled),
    }
}

/// `log`.
pub fn log<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    if !git::has_commits(session.git)? {
        session.out.info("No commits yet");
        return Ok(Outcome::NothingToDo);
    }
    let out = session
        .git
        .query_checked(&["log", "--oneline", "--graph", "--decorate", "-10"])?;
    session.out.heading("Recent commits");
    print_output(session.out, &out.stdout);
    Ok(Outcome::NothingToDo)
}

/// `diff`: unstaged changes to tracked files.
pub fn diff<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let out = session.git.query_checked(&["diff"])?;
    if out.trimmed().is_empty() {
        session.out.warn("No unstaged changes");
        return Ok(Outcome::NothingToDo);
    }
    session.out.heading("Unstaged changes");
    print_output(session.out, &out.stdout);
    Ok(Outcome::NothingToDo)
}

/// `diff-staged`.
pub fn diff_staged<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let out = session.git.query_checked(&["diff", "--cached"])?;
    if out.trimmed().is_empty() {
        session.out.warn("No staged changes");
        return Ok(Outcome::NothingToDo);
    }
    session.out.heading("Staged changes");
    print_output(session.out, &out.stdout);
    Ok(Outcome::NothingToDo)
}

const AMEND_CHOICES: [&str; 4] = [
    "Change the message only",
    "Add current changes, keep the message",
    "Add current changes and change the message",
    "Cancel",
];

/// `amend`.
pub fn amend<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let state = probe(session.git)?;
    if !state.has_commits {
        return Err(RepositoryError::NoCommits.into());
    }
    if state.has_remote && git::head_on_remote(session.git)? {
        session
            .out
            .warn("The last commit is already on a remote; amending rewrites published history");
        if !session.prompt.confirm("Amend anyway?", false)? {
            return Ok(Outcome::Cancelled);
        }
    }

    let choices: Vec<String> = AMEND_CHOICES.iter().map(|s| s.to_string()).collect();
    let choice = session.prompt.select("How do you want to amend?", &choices, 0)?;
    if choice == 3 {
        return Ok(Outcome::Cancelled);
    }
    let add_changes = choice >= 1;
    let new_message = choice != 1;

    if add_changes {
        if !state.dirty {
            session.out.warn("No changes to add");
            return Ok(Outcome::NothingToDo);
        }
        workflows::stage_all(session)?;
    }

    if new_message {
        let current = session
            .git
            .query_checked(&["log", "-1", "--pretty=format:%s"])?
            .trimmed()
            .to_string();
        let message = session.prompt.input("New commit message", Some(&current))?;
        let message = message.trim();
        if message.is_empty() {
            session.out.warn("Commit message cannot be empty");
            return Ok(Outcome::Cancelled);
        }
        if add_changes {
            session.git.mutate_checked(&["commit", "--amend", "-m", message])?;
        } else {
            session
                .git
                .mutate_checked(&["commit", "--amend", "--only", "-m", message])?;
        }
    } else {
        session.git.mutate_checked(&["commit", "--amend", "--no-edit"])?;
    }
    info!("amended last commit");
    session.out.success("Last commit amended");
    Ok(Outcome::Completed)
}

const RESET_CHOICES: [&str; 3] = [
    "Discard all uncommitted changes (reset to HEAD)",
    "Reset to an earlier commit",
    "Cancel",
];

const RESET_MODES: [(&str, &str); 3] = [
    ("--soft", "Soft: keep the changes staged"),
    ("--mixed", "Mixed: keep the changes unstaged"),
    ("--hard", "Hard: discard the changes"),
];

/// `reset`.
pub fn reset<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    if !git::has_commits(session.git)? {
        return Err(RepositoryError::NoCommits.into());
    }
    let choices: Vec<String> = RESET_CHOICES.iter().map(|s| s.to_string()).collect();
    let (target, mode) = match session.prompt.select("Reset", &choices, 0)? {
        0 => ("HEAD".to_string(), "--hard"),
        1 => {
            let log = session
                .git
                .query_checked(&["log", "--pretty=format:%h %s", "-15"])?;
            let commits: Vec<String> = log.lines().map(str::to_string).collect();
            let picked = session.prompt.select("Reset to which commit?", &commits, 0)?;
            let hash = commits[picked]
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();
            let modes: Vec<String> = RESET_MODES.iter().map(|(_, label)| label.to_string()).collect();
            let mode = RESET_MODES[session.prompt.select("Reset mode", &modes, 1)?].0;
            (hash, mode)
        }
        _ => return Ok(Outcome::Cancelled),
    };

    let warning = if mode == "--hard" {
        format!("This permanently discards uncommitted work and resets to {target}.")
    } else {
        format!("This moves the branch to {target}.")
    };
    if !typed_confirmation(&mut *session.prompt, &warning)? {
        session.out.warn("Reset cancelled");
        return Ok(Outcome::Cancelled);
    }
    session.git.mutate_checked(&["reset", mode, target.as_str()])?;
    info!(target = %target, mode, "reset");
    session.out.success(format!("Reset to {target}"));
    Ok(Outcome::Completed)
}

/// Directory name `git clone` creates for `url`.
pub fn clone_dir_name(url: &str) -> String {
    let last = url
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(url);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}

/// `clone [url] [dir]`.
pub fn clone<W: Write>(session: &mut Session<'_, W>, args: &[String]) -> GitcliResult<Outcome> {
    let url = match args.first() {
        Some(url) => url.clone(),
        None => session.prompt.input("Repository URL", None)?,
    };
    let url = url.trim();
    if url.is_empty() {
        session.out.warn("A repository URL is required");
        return Ok(Outcome::Cancelled);
    }
    let dir = match args.get(1) {
        Some(dir) => dir.clone(),
        None => session
            .prompt
            .input("Directory (empty for the default)", None)?,
    };
    let dir = dir.trim();

    session.out.info(format!("Cloning {url}..."));
    if dir.is_empty() {
        session.git.mutate_checked(&["clone", url])?;
    } else {
        session.git.mutate_checked(&["clone", url, dir])?;
    }
    let folder = if dir.is_empty() {
        clone_dir_name(url)
    } else {
        dir.to_string()
    };
    session.out.success("Repository cloned");
    session.out.hint(format!("cd {folder}"));
    Ok(Outcome::Completed)
}

/// `init`.
pub fn init<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    session.git.mutate_checked(&["init"])?;
    session.out.success(format!(
        "Initialized a git repository in {}",
        session.git.workdir().display()
    ));
    Ok(Outcome::Completed)
}

/// `quick-push [message]`: stage everything, commit, push.
pub fn quick_push<W: Write>(
    session: &mut Session<'_, W>,
    message: Option<&str>,
) -> GitcliResult<Outcome> {
    let state = probe(session.git)?;
    if !state.has_remote {
        return Err(RepositoryError::NoRemote.into());
    }
    if !state.dirty {
        session.out.warn("No changes to commit and push");
        return Ok(Outcome::NothingToDo);
    }
    if workflows::commit_flow(session, &state, message, Staging::All)? != Outcome::Completed {
        return Ok(Outcome::Cancelled);
    }
    let state = probe(session.git)?;
    push::run(session, &state)
}
