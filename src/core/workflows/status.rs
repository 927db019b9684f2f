//! `status`: read-only report of the repository and what to do next.

use std::collections::BTreeSet;
use std::io::Write;

use super::Outcome;
use crate::console::Console;
use crate::core::probe::{RepositoryState, probe};
use crate::core::session::Session;
use crate::core::situation::Situation;
use crate::error::GitcliResult;

const RECENT_LOG: [&str; 5] = ["log", "--oneline", "--graph", "--decorate", "-5"];

fn render_paths<W: Write>(out: &mut Console<W>, title: &str, paths: &BTreeSet<String>) {
    if paths.is_empty() {
        return;
    }
    out.line(format!("{title} ({}):", paths.len()));
    for path in paths {
        out.line(format!("    {path}"));
    }
}

/// Format a snapshot, its situation and the recent history.
pub fn render_status<W: Write>(out: &mut Console<W>, state: &RepositoryState, recent_log: &str) {
    let situation = Situation::classify(state);

    out.heading("Repository status");
    if state.detached {
        out.line("Branch:   (detached HEAD)");
    } else {
        out.line(format!("Branch:   {}", state.branch));
    }
    match &state.upstream {
        Some(upstream) => out.line(format!(
            "Upstream: {upstream} ({} ahead, {} behind)",
            state.ahead, state.behind
        )),
        None if state.has_remote => out.line(format!(
            "Upstream: none ({} commit(s) not on any remote)",
            state.ahead
        )),
        None => out.line("Upstream: none (no remote configured)"),
    }
    if !state.has_commits {
        out.line("History:  no commits yet");
    }
    out.blank();

    match situation {
        Situation::Conflicted | Situation::Diverged => out.error(situation.summary()),
        Situation::UpToDate => out.success(situation.summary()),
        _ => out.warn(situation.summary()),
    }

    render_paths(out, "Conflicted", &state.conflicted);
    render_paths(out, "Staged", &state.staged);
    render_paths(out, "Modified", &state.unstaged);
    render_paths(out, "Untracked", &state.untracked);

    if !state.stashes.is_empty() {
        out.line(format!("Stashes ({}):", state.stashes.len()));
        for stash in &state.stashes {
            out.line(format!("    {}: {}", stash.reference(), stash.label));
        }
    }

    if !recent_log.trim().is_empty() {
        out.blank();
        out.heading("Recent commits");
        out.block(recent_log);
    }

    if let Some(command) = situation.suggestion() {
        out.blank();
        out.hint(format!("Next: run '{command}'"));
    }
}

/// Probe and print. Issues no mutations and asks nothing.
pub fn run<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let state = probe(session.git)?;
    let log = if state.has_commits {
        let out = session.git.query(&RECENT_LOG)?;
        if out.success() { out.stdout } else { String::new() }
    } else {
        String::new()
    };
    render_status(session.out, &state, &log);
    Ok(Outcome::NothingToDo)
}
