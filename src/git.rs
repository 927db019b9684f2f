//! Git subprocess layer.
//!
//! Everything that talks to the `git` executable goes through [`GitRunner`].
//! Read-only invocations use [`GitRunner::query`]; anything that can change
//! the repository, the index, refs or remotes uses [`GitRunner::mutate`]. The
//! split lets tests assert that a code path never mutated anything.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, trace};

use crate::error::{EnvironmentError, GitError, GitcliResult};

/// Captured result of one git invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    /// A successful invocation with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed invocation (exit 1) with the given stdout and stderr.
    pub fn failed(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(1),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout without surrounding whitespace.
    pub fn trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Non-empty stdout lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines().map(str::trim_end).filter(|l| !l.is_empty())
    }

    /// Whether git reported a merge conflict on either stream.
    pub fn mentions_conflict(&self) -> bool {
        self.stdout.contains("CONFLICT") || self.stderr.contains("CONFLICT")
    }

    /// Convert a non-zero exit into a [`GitError::CommandFailed`].
    pub fn into_checked(self, args: &[&str]) -> Result<Self, GitError> {
        if self.success() {
            Ok(self)
        } else {
            Err(self.into_error(args))
        }
    }

    /// Describe this invocation as a failure of `git <args>`.
    pub fn into_error(self, args: &[&str]) -> GitError {
        // Some commands (pull, merge) print their diagnostics on stdout
        let stderr = if self.stderr.trim().is_empty() {
            self.stdout
        } else {
            self.stderr
        };
        GitError::CommandFailed {
            command: args.join(" "),
            code: self.code,
            stderr,
        }
    }
}

/// Narrow capability interface over the git executable.
pub trait GitRunner {
    /// Directory every invocation runs in.
    fn workdir(&self) -> &Path;

    /// Run a read-only git command. Non-zero exits are returned, not raised.
    fn query(&self, args: &[&str]) -> GitcliResult<GitOutput>;

    /// Run a git command that may change repository state. Non-zero exits are
    /// returned, not raised.
    fn mutate(&self, args: &[&str]) -> GitcliResult<GitOutput>;

    /// Like [`GitRunner::query`], failing on a non-zero exit.
    fn query_checked(&self, args: &[&str]) -> GitcliResult<GitOutput> {
        Ok(self.query(args)?.into_checked(args)?)
    }

    /// Like [`GitRunner::mutate`], failing on a non-zero exit.
    fn mutate_checked(&self, args: &[&str]) -> GitcliResult<GitOutput> {
        Ok(self.mutate(args)?.into_checked(args)?)
    }
}

/// [`GitRunner`] backed by the `git` executable on `PATH`.
#[derive(Debug, Clone)]
pub struct SystemGit {
    workdir: PathBuf,
}

impl SystemGit {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    fn run(&self, kind: &'static str, args: &[&str]) -> GitcliResult<GitOutput> {
        debug!(kind, command = %args.join(" "), "running git");
        let output = Command::new("git")
            .current_dir(&self.workdir)
            // Conflict and rejection detection matches git's English messages
            .env("LC_ALL", "C")
            .args(args)
            .output()
            .map_err(|e| EnvironmentError::GitUnavailable {
                message: e.to_string(),
            })?;

        let result = GitOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(kind, command = %args.join(" "), code = ?result.code, "git finished");
        trace!(stdout = %result.stdout, stderr = %result.stderr);
        Ok(result)
    }
}

impl GitRunner for SystemGit {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn query(&self, args: &[&str]) -> GitcliResult<GitOutput> {
        self.run("query", args)
    }

    fn mutate(&self, args: &[&str]) -> GitcliResult<GitOutput> {
        self.run("mutation", args)
    }
}

/// Version string reported by `git --version`.
pub fn version(git: &dyn GitRunner) -> GitcliResult<String> {
    Ok(git.query_checked(&["--version"])?.trimmed().to_string())
}

/// Whether the working directory is inside a git work tree.
pub fn is_work_tree(git: &dyn GitRunner) -> GitcliResult<bool> {
    let out = git.query(&["rev-parse", "--is-inside-work-tree"])?;
    Ok(out.success() && out.trimmed() == "true")
}

/// Absolute path of the work-tree root.
pub fn toplevel(git: &dyn GitRunner) -> GitcliResult<PathBuf> {
    let out = git.query_checked(&["rev-parse", "--show-toplevel"])?;
    Ok(PathBuf::from(out.trimmed()))
}

/// Name of the checked-out branch, or `None` when HEAD is detached.
pub fn current_branch(git: &dyn GitRunner) -> GitcliResult<Option<String>> {
    let out = git.query(&["symbolic-ref", "--short", "-q", "HEAD"])?;
    Ok(out.success().then(|| out.trimmed().to_string()))
}

/// Whether HEAD points at a commit (false on an unborn branch).
pub fn has_commits(git: &dyn GitRunner) -> GitcliResult<bool> {
    Ok(git.query(&["rev-parse", "--verify", "-q", "HEAD"])?.success())
}

/// Configured remote names.
pub fn remotes(git: &dyn GitRunner) -> GitcliResult<Vec<String>> {
    let out = git.query(&["remote"])?;
    Ok(out.lines().map(str::to_string).collect())
}

/// The remote to push new branches to: `origin` when present, else the first one.
pub fn preferred_remote(git: &dyn GitRunner) -> GitcliResult<Option<String>> {
    let all = remotes(git)?;
    Ok(all
        .iter()
        .find(|r| r.as_str() == "origin")
        .or(all.first())
        .cloned())
}

/// Local branch names.
pub fn local_branches(git: &dyn GitRunner) -> GitcliResult<Vec<String>> {
    let out = git.query(&["for-each-ref", "--format=%(refname:short)", "refs/heads"])?;
    Ok(out.lines().map(str::to_string).collect())
}

/// Whether a local branch exists.
pub fn branch_exists(git: &dyn GitRunner, name: &str) -> GitcliResult<bool> {
    Ok(local_branches(git)?.iter().any(|b| b == name))
}

/// Upstream of `branch` (e.g. `origin/main`), if one is configured.
pub fn upstream_of(git: &dyn GitRunner, branch: &str) -> GitcliResult<Option<String>> {
    let spec = format!("{branch}@{{u}}");
    let out = git.query(&["rev-parse", "--abbrev-ref", "--symbolic-full-name", &spec])?;
    Ok(out
        .success()
        .then(|| out.trimmed().to_string())
        .filter(|s| !s.is_empty()))
}

/// Whether HEAD is contained in any remote-tracking branch.
pub fn head_on_remote(git: &dyn GitRunner) -> GitcliResult<bool> {
    let out = git.query(&["branch", "-r", "--contains", "HEAD"])?;
    Ok(out.success() && out.lines().next().is_some())
}

/// Paths with unresolved merge conflicts.
pub fn conflicted_files(git: &dyn GitRunner) -> GitcliResult<Vec<String>> {
    let out = git.query(&["diff", "--name-only", "--diff-filter=U"])?;
    let mut files: Vec<String> = out.lines().map(str::to_string).collect();
    files.dedup();
    Ok(files)
}

/// Subjects of the most recent `count` commits, newest first.
pub fn recent_subjects(git: &dyn GitRunner, count: usize) -> GitcliResult<Vec<String>> {
    let limit = format!("-{count}");
    let out = git.query(&["log", &limit, "--pretty=format:%s"])?;
    if !out.success() {
        return Ok(Vec::new());
    }
    Ok(out.lines().map(str::to_string).collect())
}

/// Resolve a path inside the git directory (honours worktrees and `core.hooksPath`
/// for `hooks`), relative to the work directory.
pub fn git_path(git: &dyn GitRunner, name: &str) -> GitcliResult<PathBuf> {
    let out = git.query_checked(&["rev-parse", "--git-path", name])?;
    let path = PathBuf::from(out.trimmed());
    Ok(if path.is_absolute() {
        path
    } else {
        git.workdir().join(path)
    })
}

/// Whether git accepts `name` as a branch name.
pub fn is_valid_branch_name(git: &dyn GitRunner, name: &str) -> GitcliResult<bool> {
    if name.is_empty() {
        return Ok(false);
    }
    Ok(git
        .query(&["check-ref-format", "--branch", name])?
        .success())
}

/// Normalize user input into a branch name: trim, and join words with `-`.
pub fn sanitize_branch_name(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join("-")
}
