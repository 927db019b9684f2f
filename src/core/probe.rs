//! Repository state prober.
//!
//! [`probe`] observes the repository through read-only git queries and
//! returns a [`RepositoryState`] snapshot. Snapshots are never cached: every
//! smart command probes again because other processes may have changed the
//! repository in between.

use std::collections::BTreeSet;

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::{GitcliResult, RepositoryError};
use crate::git::{self, GitRunner};

/// One entry of `git stash list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashEntry {
    /// Position in the stash stack (`stash@{index}`).
    pub index: usize,
    /// Description git stored with the entry.
    pub label: String,
}

impl StashEntry {
    /// The `stash@{N}` reference for this entry.
    pub fn reference(&self) -> String {
        format!("stash@{{{}}}", self.index)
    }
}

/// Snapshot of everything the smart commands decide on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryState {
    /// Checked-out branch; `HEAD` when detached.
    pub branch: String,
    pub detached: bool,
    /// Whether the branch has at least one commit.
    pub has_commits: bool,
    /// Any staged, unstaged, untracked or conflicted path.
    pub dirty: bool,
    pub staged: BTreeSet<String>,
    /// Modified in the work tree, including untracked paths.
    pub unstaged: BTreeSet<String>,
    pub untracked: BTreeSet<String>,
    pub conflicted: BTreeSet<String>,
    /// Conflict markers are present.
    pub conflict: bool,
    pub ahead: u32,
    pub behind: u32,
    /// Tracking branch, e.g. `origin/main`.
    pub upstream: Option<String>,
    pub has_remote: bool,
    pub stashes: Vec<StashEntry>,
}

impl RepositoryState {
    /// Staged and unstaged paths together, sorted and deduplicated.
    pub fn changed_paths(&self) -> BTreeSet<String> {
        self.staged
            .iter()
            .chain(self.unstaged.iter())
            .chain(self.conflicted.iter())
            .cloned()
            .collect()
    }

    /// Whether the current branch is `main` or `master`.
    pub fn on_main_branch(&self) -> bool {
        matches!(self.branch.as_str(), "main" | "master")
    }
}

/// Parsed `git status --porcelain` output.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct WorkingTreeStatus {
    pub staged: BTreeSet<String>,
    pub unstaged: BTreeSet<String>,
    pub untracked: BTreeSet<String>,
    pub conflicted: BTreeSet<String>,
}

const CONFLICT_CODES: [&str; 7] = ["DD", "AU", "UD", "UA", "DU", "AA", "UU"];

/// Parse porcelain v1 status lines.
pub fn parse_porcelain(output: &str) -> WorkingTreeStatus {
    let mut status = WorkingTreeStatus::default();
    for line in output.lines() {
        if line.len() < 4 {
            continue;
        }
        let (code, rest) = line.split_at(2);
        let path = rest[1..]
            .rsplit(" -> ")
            .next()
            .unwrap_or_default()
            .trim_matches('"')
            .to_string();
        if path.is_empty() {
            continue;
        }

        if CONFLICT_CODES.contains(&code) {
            status.conflicted.insert(path);
            continue;
        }
        if code == "??" {
            status.untracked.insert(path.clone());
            status.unstaged.insert(path);
            continue;
        }
        if code == "!!" {
            continue;
        }

        let mut flags = code.chars();
        let index = flags.next().unwrap_or(' ');
        let worktree = flags.next().unwrap_or(' ');
        if index != ' ' {
            status.staged.insert(path.clone());
        }
        if worktree != ' ' {
            status.unstaged.insert(path);
        }
    }
    status
}

static STASH_LINE_REGEX: OnceLock<Regex> = OnceLock::new();

fn stash_line_regex() -> &'static Regex {
    STASH_LINE_REGEX.get_or_init(|| {
        Regex::new(r"^stash@\{(\d+)\}:\s*(.*)$").expect("Failed to compile stash list regex")
    })
}

/// Parse `git stash list` output.
pub fn parse_stash_list(output: &str) -> Vec<StashEntry> {
    output
        .lines()
        .filter_map(|line| {
            let caps = stash_line_regex().captures(line.trim())?;
            Some(StashEntry {
                index: caps[1].parse().ok()?,
                label: caps[2].to_string(),
            })
        })
        .collect()
}

/// Parse `git rev-list --left-right --count @{u}...HEAD` into (ahead, behind).
pub fn parse_left_right(output: &str) -> Option<(u32, u32)> {
    let mut counts = output.split_whitespace().map(str::parse::<u32>);
    let behind = counts.next()?.ok()?;
    let ahead = counts.next()?.ok()?;
    Some((ahead, behind))
}

/// Observe the repository.
///
/// Only read-only queries are issued.
pub fn probe(git: &dyn GitRunner) -> GitcliResult<RepositoryState> {
    if !git::is_work_tree(git)? {
        return Err(RepositoryError::NotAGitRepository {
            path: git.workdir().to_path_buf(),
        }
        .into());
    }

    let branch = git::current_branch(git)?;
    let has_commits = git::has_commits(git)?;

    let status_out = git.query_checked(&["-c", "core.quotePath=false", "status", "--porcelain"])?;
    let tree = parse_porcelain(&status_out.stdout);

    let has_remote = !git::remotes(git)?.is_empty();
    let upstream = match &branch {
        Some(_) => {
            let out = git.query(&["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"])?;
            out.success()
                .then(|| out.trimmed().to_string())
                .filter(|s| !s.is_empty())
        }
        None => None,
    };

    let (ahead, behind) = if upstream.is_some() {
        let out = git.query_checked(&["rev-list", "--left-right", "--count", "@{u}...HEAD"])?;
        parse_left_right(&out.stdout).unwrap_or_default()
    } else if has_remote && has_commits {
        // No tracking branch: count what no remote has seen yet
        let out = git.query(&["rev-list", "--count", "HEAD", "--not", "--remotes"])?;
        (out.trimmed().parse().unwrap_or(0), 0)
    } else {
        (0, 0)
    };

    let stash_out = git.query(&["stash", "list"])?;
    let stashes = if stash_out.success() {
        parse_stash_list(&stash_out.stdout)
    } else {
        Vec::new()
    };

    let conflict = !tree.conflicted.is_empty();
    let dirty = conflict || !tree.staged.is_empty() || !tree.unstaged.is_empty();
    let state = RepositoryState {
        branch: branch.clone().unwrap_or_else(|| "HEAD".to_string()),
        detached: branch.is_none(),
        has_commits,
        dirty,
        staged: tree.staged,
        unstaged: tree.unstaged,
        untracked: tree.untracked,
        conflicted: tree.conflicted,
        conflict,
        ahead,
        behind,
        upstream,
        has_remote,
        stashes,
    };
    debug!(
        branch = %state.branch,
        dirty = state.dirty,
        conflict = state.conflict,
        ahead = state.ahead,
        behind = state.behind,
        "probed repository"
    );
    Ok(state)
}
