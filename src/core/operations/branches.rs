//! Branch commands.

use std::io::Write;

use tracing::info;

use super::basic::print_output;
use crate::core::session::Session;
use crate::core::workflows::Outcome;
use crate::error::{GitcliResult, RepositoryError};
use crate::git;

/// Local branches other than the checked-out one.
fn other_branches(git: &dyn git::GitRunner) -> GitcliResult<Vec<String>> {
    let current = git::current_branch(git)?;
    Ok(git::local_branches(git)?
        .into_iter()
        .filter(|b| Some(b) != current.as_ref())
        .collect())
}

/// Read, sanitize and validate a branch name.
fn branch_name<W: Write>(
    session: &mut Session<'_, W>,
    given: Option<&str>,
    prompt: &str,
) -> GitcliResult<Option<String>> {
    let raw = match given {
        Some(name) => name.to_string(),
        None => session.prompt.input(prompt, None)?,
    };
    let name = git::sanitize_branch_name(&raw);
    if name.is_empty() {
        session.out.warn("A branch name is required");
        return Ok(None);
    }
    if !git::is_valid_branch_name(session.git, &name)? {
        return Err(RepositoryError::InvalidBranchName { name }.into());
    }
    Ok(Some(name))
}

/// `switch-branch`.
pub fn switch<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let branches = other_branches(session.git)?;
    if branches.is_empty() {
        session.out.info("There are no other local branches");
        return Ok(Outcome::NothingToDo);
    }
    let index = session.prompt.select("Switch to", &branches, 0)?;
    let name = &branches[index];
    session.git.mutate_checked(&["checkout", name])?;
    info!(branch = %name, "switched branch");
    session.out.success(format!("Switched to '{name}'"));
    Ok(Outcome::Completed)
}

/// `add-branch [name]`.
pub fn add<W: Write>(session: &mut Session<'_, W>, given: Option<&str>) -> GitcliResult<Outcome> {
    let Some(name) = branch_name(session, given, "New branch name")? else {
        return Ok(Outcome::Cancelled);
    };
    if git::branch_exists(session.git, &name)? {
        session.out.warn(format!("Branch '{name}' already exists"));
        return Ok(Outcome::NothingToDo);
    }
    if session
        .prompt
        .confirm(&format!("Switch to '{name}' now?"), true)?
    {
        session.git.mutate_checked(&["checkout", "-b", &name])?;
        session.out.success(format!("Created and switched to '{name}'"));
    } else {
        session.git.mutate_checked(&["branch", &name])?;
        session.out.success(format!("Created '{name}'"));
    }
    info!(branch = %name, "created branch");
    Ok(Outcome::Completed)
}

/// `delete-branch`.
pub fn delete<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let branches = other_branches(session.git)?;
    if branches.is_empty() {
        session.out.info("There are no other local branches to delete");
        return Ok(Outcome::NothingToDo);
    }
    let name = branches[session.prompt.select("Delete which branch?", &branches, 0)?].clone();
    if !session
        .prompt
        .confirm(&format!("Delete local branch '{name}'?"), false)?
    {
        return Ok(Outcome::Cancelled);
    }
    let upstream = git::upstream_of(session.git, &name)?;

    let out = session.git.mutate(&["branch", "-d", &name])?;
    if !out.success() {
        if !out.stderr.contains("not fully merged") {
            return Err(out.into_error(&["branch", "-d", &name]).into());
        }
        session
            .out
            .warn(format!("'{name}' has commits that are not merged anywhere"));
        if !session
            .prompt
            .confirm("Delete it anyway (the commits will be lost)?", false)?
        {
            return Ok(Outcome::Cancelled);
        }
        session.git.mutate_checked(&["branch", "-D", &name])?;
    }
    info!(branch = %name, "deleted branch");
    session.out.success(format!("Deleted '{name}'"));

    if let Some(upstream) = upstream
        && let Some((remote, remote_branch)) = upstream.split_once('/')
        && session
            .prompt
            .confirm(&format!("Also delete '{remote_branch}' on {remote}?"), false)?
    {
        session
            .git
            .mutate_checked(&["push", remote, "--delete", remote_branch])?;
        session.out.success(format!("Deleted {upstream}"));
    }
    Ok(Outcome::Completed)
}

/// `rename-branch`.
pub fn rename<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let Some(current) = git::current_branch(session.git)? else {
        return Err(RepositoryError::DetachedHead.into());
    };
    let prompt = format!("New name for '{current}'");
    let Some(name) = branch_name(session, None, &prompt)? else {
        return Ok(Outcome::Cancelled);
    };
    if name == current {
        return Ok(Outcome::NothingToDo);
    }
    if git::branch_exists(session.git, &name)? {
        session.out.warn(format!("Branch '{name}' already exists"));
        return Ok(Outcome::NothingToDo);
    }
    session.git.mutate_checked(&["branch", "-m", &name])?;
    info!(from = %current, to = %name, "renamed branch");
    session.out.success(format!("Renamed '{current}' to '{name}'"));
    if let Some(upstream) = git::upstream_of(session.git, &name)? {
        session.out.hint(format!(
            "The remote branch is still {upstream}; push '{name}' to publish the new name"
        ));
    }
    Ok(Outcome::Completed)
}

/// `list-branch`.
pub fn list<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let out = session.git.query_checked(&["branch", "-a", "-vv"])?;
    session.out.heading("Branches");
    if out.trimmed().is_empty() {
        session.out.info("No branches yet");
    } else {
        print_output(session.out, &out.stdout);
    }
    Ok(Outcome::NothingToDo)
}
