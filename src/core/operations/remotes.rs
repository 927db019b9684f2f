//! `remotes`: list, add, remove and inspect remotes.

use std::io::Write;

use tracing::info;

use super::basic::print_output;
use crate::core::session::Session;
use crate::core::workflows::Outcome;
use crate::error::GitcliResult;
use crate::git;

const MENU: [&str; 5] = [
    "List remotes",
    "Add a remote",
    "Remove a remote",
    "Show remote details",
    "Back",
];

/// `remotes`.
pub fn manage<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let items: Vec<String> = MENU.iter().map(|s| s.to_string()).collect();
    match session.prompt.select("Remotes", &items, 0)? {
        0 => list(session),
        1 => add(session),
        2 => remove(session),
        3 => show(session),
        _ => Ok(Outcome::Cancelled),
    }
}

fn list<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let out = session.git.query_checked(&["remote", "-v"])?;
    session.out.heading("Remotes");
    if out.trimmed().is_empty() {
        session.out.info("No remotes configured");
    } else {
        print_output(session.out, &out.stdout);
    }
    Ok(Outcome::NothingToDo)
}

fn add<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let existing = git::remotes(session.git)?;
    let default_name = if existing.is_empty() { Some("origin") } else { None };
    let name = session.prompt.input("Remote name", default_name)?;
    let name = name.trim();
    if name.is_empty() {
        session.out.warn("A remote name is required");
        return Ok(Outcome::Cancelled);
    }
    if existing.iter().any(|r| r == name) {
        session.out.warn(format!("Remote '{name}' already exists"));
        return Ok(Outcome::NothingToDo);
    }
    let url = session.prompt.input("Remote URL", None)?;
    let url = url.trim();
    if url.is_empty() {
        session.out.warn("A remote URL is required");
        return Ok(Outcome::Cancelled);
    }
    session.git.mutate_checked(&["remote", "add", name, url])?;
    info!(remote = name, "added remote");
    session.out.success(format!("Added remote '{name}' ({url})"));
    Ok(Outcome::Completed)
}

fn pick<W: Write>(session: &mut Session<'_, W>, prompt: &str) -> GitcliResult<Option<String>> {
    let remotes = git::remotes(session.git)?;
    if remotes.is_empty() {
        session.out.info("No remotes configured");
        return Ok(None);
    }
    let index = session.prompt.select(prompt, &remotes, 0)?;
    Ok(remotes.into_iter().nth(index))
}

fn remove<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let Some(name) = pick(session, "Remove which remote?")? else {
        return Ok(Outcome::NothingToDo);
    };
    if !session
        .prompt
        .confirm(&format!("Remove remote '{name}'?"), false)?
    {
        return Ok(Outcome::Cancelled);
    }
    session.git.mutate_checked(&["remote", "remove", &name])?;
    info!(remote = %name, "removed remote");
    session.out.success(format!("Removed remote '{name}'"));
    Ok(Outcome::Completed)
}

fn show<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let Some(name) = pick(session, "Show which remote?")? else {
        return Ok(Outcome::NothingToDo);
    };
    let out = session.git.query_checked(&["remote", "show", &name])?;
    print_output(session.out, &out.stdout);
    Ok(Outcome::NothingToDo)
}
