//! Conflict helper: `resolve-conflicts`, `check-conflicts`, and the entry
//! point the workflows route [`GitcliError::Conflict`] into.

use std::fs;
use std::io::Write;
use std::process::Command as Process;

use tracing::{debug, info, warn};

use crate::console::Console;
use crate::core::session::Session;
use crate::core::workflows::Outcome;
use crate::error::{GitcliError, GitcliResult};
use crate::git::{self, GitRunner};
use crate::prompt::typed_confirmation;

/// Operation that left the conflicts behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InProgress {
    Merge,
    Rebase,
    CherryPick,
}

impl InProgress {
    fn name(self) -> &'static str {
        match self {
            InProgress::Merge => "merge",
            InProgress::Rebase => "rebase",
            InProgress::CherryPick => "cherry-pick",
        }
    }

    fn abort_args(self) -> [&'static str; 2] {
        [self.name(), "--abort"]
    }
}

/// Detect the in-progress operation from marker files in the git directory.
pub fn in_progress(git: &dyn GitRunner) -> GitcliResult<Option<InProgress>> {
    let markers = [
        ("MERGE_HEAD", InProgress::Merge),
        ("rebase-merge", InProgress::Rebase),
        ("rebase-apply", InProgress::Rebase),
        ("CHERRY_PICK_HEAD", InProgress::CherryPick),
    ];
    for (marker, operation) in markers {
        if git::git_path(git, marker)?.exists() {
            return Ok(Some(operation));
        }
    }
    Ok(None)
}

/// Kind of a conflict marker line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Ours,
    Base,
    Separator,
    Theirs,
    /// A line inside a conflict block.
    Body,
}

/// Lines of conflict blocks with their 1-based line numbers.
pub fn conflict_lines(text: &str) -> Vec<(usize, Marker, &str)> {
    let mut lines = Vec::new();
    let mut inside = false;
    for (index, line) in text.lines().enumerate() {
        let marker = if line.starts_with("<<<<<<<") {
            inside = true;
            Marker::Ours
        } else if line.starts_with(">>>>>>>") {
            inside = false;
            Marker::Theirs
        } else if inside && line.starts_with("|||||||") {
            Marker::Base
        } else if inside && line.starts_with("=======") {
            Marker::Separator
        } else if inside {
            Marker::Body
        } else {
            continue;
        };
        lines.push((index + 1, marker, line));
    }
    lines
}

fn render_markers<W: Write>(out: &mut Console<W>, path: &str, text: &str) {
    let lines = conflict_lines(text);
    let blocks = lines.iter().filter(|(_, m, _)| *m == Marker::Ours).count();
    out.heading(format!("Conflicts in {path}"));
    for (number, marker, line) in &lines {
        let row = format!("{number:4} | {line}");
        match marker {
            Marker::Ours => out.error(row),
            Marker::Theirs => out.success(row),
            Marker::Base | Marker::Separator => out.warn(row),
            Marker::Body => out.line(format!("  {row}")),
        }
    }
    out.info(format!("{blocks} conflict(s)"));
    out.hint("<<<<<<< is your side, >>>>>>> is the incoming side");
}

fn open_in_editor(path: &std::path::Path) -> std::io::Result<bool> {
    let editor = std::env::var("VISUAL")
        .or_else(|_| std::env::var("EDITOR"))
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| if cfg!(windows) { "notepad" } else { "vi" }.to_string());
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or("vi");
    debug!(editor = %editor, path = %path.display(), "opening editor");
    let status = Process::new(program).args(parts).arg(path).status()?;
    Ok(status.success())
}

/// Which side of a conflict to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Ours,
    Theirs,
}

impl Side {
    fn flag(self) -> &'static str {
        match self {
            Side::Ours => "--ours",
            Side::Theirs => "--theirs",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Side::Ours => "your version",
            Side::Theirs => "the incoming version",
        }
    }
}

fn accept<W: Write>(session: &mut Session<'_, W>, side: Side, files: &[String]) -> GitcliResult<()> {
    let mut checkout = vec!["checkout", side.flag(), "--"];
    checkout.extend(files.iter().map(String::as_str));
    session.git.mutate_checked(&checkout)?;
    mark_resolved(session, files)?;
    info!(side = side.flag(), count = files.len(), "accepted side");
    Ok(())
}

fn mark_resolved<W: Write>(session: &mut Session<'_, W>, files: &[String]) -> GitcliResult<()> {
    let mut add = vec!["add", "--"];
    add.extend(files.iter().map(String::as_str));
    session.git.mutate_checked(&add)?;
    for file in files {
        session.out.success(format!("{file} marked as resolved"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Overview,
    File(String),
    AcceptAll(Side),
    Abort,
    Complete,
    Finished(Outcome),
}

const OVERVIEW_ACTIONS: [&str; 5] = [
    "Work on a file",
    "Accept my version for all files",
    "Accept the incoming version for all files",
    "Abort the operation",
    "Exit (resolve later)",
];

const FILE_ACTIONS: [&str; 6] = [
    "Show conflicts",
    "Open in editor",
    "Accept my version",
    "Accept the incoming version",
    "Mark as resolved",
    "Back",
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Offer the helper after a workflow found conflicts.
pub fn offer_helper<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    if !session.prompt.confirm("Open the conflict helper now?", true)? {
        session.out.hint("Run 'resolve-conflicts' when you are ready");
        return Ok(Outcome::Cancelled);
    }
    resolve(session)
}

/// `resolve-conflicts`.
pub fn resolve<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let mut touched = false;
    let mut step = if git::conflicted_files(session.git)?.is_empty() {
        session.out.success("No conflicts detected");
        if in_progress(session.git)? == Some(InProgress::Merge) {
            Step::Complete
        } else {
            Step::Finished(Outcome::NothingToDo)
        }
    } else {
        Step::Overview
    };

    loop {
        debug!(?step, "resolve-conflicts");
        step = match step {
            Step::Overview => {
                let files = git::conflicted_files(session.git)?;
                if files.is_empty() {
                    session.out.success("All conflicts resolved");
                    Step::Complete
                } else {
                    session.out.error(format!("Conflicted files ({}):", files.len()));
                    for file in &files {
                        session.out.line(format!("    {file}"));
                    }
                    match session
                        .prompt
                        .select("What do you want to do?", &strings(&OVERVIEW_ACTIONS), 0)?
                    {
                        0 => {
                            let index = session.prompt.select("Which file?", &files, 0)?;
                            Step::File(files[index].clone())
                        }
                        1 => Step::AcceptAll(Side::Ours),
                        2 => Step::AcceptAll(Side::Theirs),
                        3 => Step::Abort,
                        _ => {
                            session.out.hint("Run 'resolve-conflicts' to continue later");
                            Step::Finished(if touched {
                                Outcome::Completed
                            } else {
                                Outcome::Cancelled
                            })
                        }
                    }
                }
            }
            Step::File(path) => {
                match session
                    .prompt
                    .select(&format!("{path}:"), &strings(&FILE_ACTIONS), 0)?
                {
                    0 => {
                        match fs::read_to_string(session.git.workdir().join(&path)) {
                            Ok(text) => render_markers(session.out, &path, &text),
                            Err(e) => session.out.error(format!("Could not read {path}: {e}")),
                        }
                        Step::File(path)
                    }
                    1 => {
                        session.out.hint("Remove the conflict markers, save, and close the editor");
                        match open_in_editor(&session.git.workdir().join(&path)) {
                            Ok(true) => {
                                if session.prompt.confirm(&format!("Mark {path} as resolved?"), false)? {
                                    mark_resolved(session, std::slice::from_ref(&path))?;
                                    touched = true;
                                    Step::Overview
                                } else {
                                    Step::File(path)
                                }
                            }
                            Ok(false) => {
                                session.out.warn("The editor exited with an error");
                                Step::File(path)
                            }
                            Err(e) => {
                                warn!(error = %e, "could not start editor");
                                session.out.error(format!("Could not open an editor: {e}"));
                                session.out.hint("Set $EDITOR to your preferred editor");
                                Step::File(path)
                            }
                        }
                    }
                    choice @ (2 | 3) => {
                        let side = if choice == 2 { Side::Ours } else { Side::Theirs };
                        let question = format!("Keep {} of {path}?", side.describe());
                        if session.prompt.confirm(&question, false)? {
                            accept(session, side, std::slice::from_ref(&path))?;
                            touched = true;
                            Step::Overview
                        } else {
                            Step::File(path)
                        }
                    }
                    4 => {
                        let text = fs::read_to_string(session.git.workdir().join(&path)).unwrap_or_default();
                        if conflict_lines(&text).iter().any(|(_, m, _)| *m == Marker::Ours)
                            && !session
                                .prompt
                                .confirm(&format!("{path} still contains conflict markers. Mark it anyway?"), false)?
                        {
                            Step::File(path)
                        } else {
                            mark_resolved(session, std::slice::from_ref(&path))?;
                            touched = true;
                            Step::Overview
                        }
                    }
                    _ => Step::Overview,
                }
            }
            Step::AcceptAll(side) => {
                let question = format!("Keep {} for ALL conflicted files?", side.describe());
                if session.prompt.confirm(&question, false)? {
                    let files = git::conflicted_files(session.git)?;
                    accept(session, side, &files)?;
                    touched = true;
                }
                Step::Overview
            }
            Step::Abort => {
                let operation = in_progress(session.git)?;
                let name = operation.map_or("merge", InProgress::name);
                let warning = format!("This discards the {name} and its conflict resolutions.");
                if typed_confirmation(&mut *session.prompt, &warning)? {
                    match operation {
                        Some(op) => session.git.mutate_checked(&op.abort_args())?,
                        None => session.git.mutate_checked(&["reset", "--merge"])?,
                    };
                    info!(operation = name, "aborted");
                    session.out.success(format!("The {name} was aborted"));
                    Step::Finished(Outcome::Completed)
                } else {
                    Step::Overview
                }
            }
            Step::Complete => Step::Finished(complete(session)?),
            Step::Finished(outcome) => return Ok(outcome),
        };
    }
}

/// Commit the merge once nothing is conflicted.
fn complete<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    match in_progress(session.git)? {
        Some(InProgress::Merge) => {
            let message = session
                .prompt
                .input("Merge commit message (empty for the default)", None)?;
            let message = message.trim();
            if message.is_empty() {
                session.git.mutate_checked(&["commit", "--no-edit"])?;
            } else {
                session.git.mutate_checked(&["commit", "-m", message])?;
            }
            session.out.success("Merge completed");
        }
        Some(InProgress::Rebase) => session.out.hint("Run 'git rebase --continue' to finish the rebase"),
        Some(InProgress::CherryPick) => {
            session.out.hint("Run 'git cherry-pick --continue' to finish the cherry-pick")
        }
        None => session.out.hint("Changes are staged; run 'commit' to record them"),
    }
    Ok(Outcome::Completed)
}

/// `check-conflicts`.
pub fn check<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let files = git::conflicted_files(session.git)?;
    if files.is_empty() {
        session.out.success("No conflicts detected");
        return Ok(Outcome::NothingToDo);
    }
    session
        .out
        .error(format!("{} file(s) with conflicts:", files.len()));
    for file in &files {
        session.out.line(format!("    {file}"));
    }
    session.out.hint("Run 'resolve-conflicts' to resolve them");
    Ok(Outcome::Completed)
}

/// Route a [`GitcliError::Conflict`] raised by a command into the helper.
pub fn handle<W: Write>(session: &mut Session<'_, W>, files: &[String]) -> GitcliResult<Outcome> {
    session
        .out
        .error(format!("Conflicts detected in {} file(s)", files.len()));
    for file in files {
        session.out.line(format!("    {file}"));
    }
    offer_helper(session)
}
