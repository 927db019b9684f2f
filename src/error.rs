//! Unified error handling for gitcli.
//!
//! This module provides the error hierarchy used by the prober, the workflow
//! dispatcher and the terminal front-end. Each category maps to a distinct
//! recovery policy in the dispatcher.
//!
//! ## Error Categories
//!
//! - [`EnvironmentError`]: the git executable cannot be run (fatal)
//! - [`RepositoryError`]: the working directory is not usable for the command
//! - [`GitError`]: a git subprocess exited non-zero (aborts the current step)
//! - [`ConfigError`]: configuration files could not be read or written
//! - [`GitcliError::Cancelled`]: the user declined a prompt (unwinds to the menu)
//! - [`GitcliError::Conflict`]: conflict markers were detected (routes to the helper)
//! - [`GitcliError::HookFailed`]: a validation hook or formatter failed (aborts the save)
//!
//! ## Example
//!
//! ```rust
//! use gitcli::error::{GitcliError, RepositoryError};
//!
//! let err: GitcliError = RepositoryError::NoRemote.into();
//! assert!(!err.is_fatal());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for gitcli.
#[derive(Error, Debug)]
pub enum GitcliError {
    /// The environment cannot run git at all.
    #[error("{0}")]
    Environment(#[from] EnvironmentError),

    /// The repository is in a state the command cannot work with.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// A git subprocess failed.
    #[error("{0}")]
    Git(#[from] GitError),

    /// Configuration could not be loaded or saved.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The terminal prompt failed.
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// An I/O error outside of git.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The user declined or escaped a prompt.
    #[error("Operation cancelled")]
    Cancelled,

    /// A hook or formatter command exited non-zero.
    #[error("{hook} failed: {command}")]
    HookFailed {
        /// Hook name, e.g. `pre-commit`.
        hook: String,
        /// The command or script that failed.
        command: String,
        /// Combined output of the failed command.
        output: String,
    },

    /// Conflict markers were detected after a git operation.
    #[error("Conflicts detected in {} file(s)", .files.len())]
    Conflict {
        /// Paths with unresolved conflicts.
        files: Vec<String>,
    },

    /// A generic error for cases not covered by specific error types.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl GitcliError {
    /// Whether the error should end the whole session rather than the current command.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GitcliError::Environment(_)
                | GitcliError::Repository(RepositoryError::NotAGitRepository { .. })
        )
    }

    /// Captured stderr of the failed subprocess, when there is one.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            GitcliError::Git(GitError::CommandFailed { stderr, .. }) if !stderr.is_empty() => {
                Some(stderr)
            }
            GitcliError::HookFailed { output, .. } if !output.trim().is_empty() => Some(output),
            _ => None,
        }
    }
}

/// Errors about the process environment.
#[derive(Error, Debug)]
pub enum EnvironmentError {
    /// The git executable could not be located or started.
    #[error("Git is not available: {message}")]
    GitUnavailable {
        /// Error reported by the operating system.
        message: String,
    },
}

/// Errors about the repository the command runs in.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The working directory is not inside a git work tree.
    #[error("Not a git repository: {path}")]
    NotAGitRepository {
        /// Directory that was probed.
        path: PathBuf,
    },

    /// HEAD does not point at a branch.
    #[error("HEAD is detached; check out a branch first")]
    DetachedHead,

    /// No remote is configured.
    #[error("No remote configured; add one with 'remotes'")]
    NoRemote,

    /// The branch has no commits yet.
    #[error("The current branch has no commits yet")]
    NoCommits,

    /// The branch name is rejected by git.
    #[error("Invalid branch name '{name}'")]
    InvalidBranchName {
        /// The rejected name.
        name: String,
    },
}

/// Errors that can occur during git operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GitError {
    /// A git command exited with a non-zero status.
    #[error("git {command} failed{}: {}", .code.map(|c| format!(" (exit {c})")).unwrap_or_default(), .stderr.trim())]
    CommandFailed {
        /// The git arguments, joined by spaces.
        command: String,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// Output from git could not be interpreted.
    #[error("Unexpected output from git {command}: {output}")]
    UnexpectedOutput {
        /// The git arguments, joined by spaces.
        command: String,
        /// The output that failed to parse.
        output: String,
    },
}

/// Errors that can occur during configuration loading and saving.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("Failed to read config file at {path}: {message}")]
    FileReadError {
        /// Path to the config file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to parse a configuration file.
    #[error("Failed to parse config file at {path}: {message}")]
    ParseError {
        /// Path to the config file.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// Failed to write a configuration file.
    #[error("Failed to write config file at {path}: {message}")]
    FileWriteError {
        /// Path to the config file.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}

/// Type alias for Results using GitcliError.
pub type GitcliResult<T> = std::result::Result<T, GitcliError>;

#[cfg(test)]
mod tests {
    use super::*;

    /// # Git Error Display
    ///
    /// Tests that subprocess failures render the command, code and stderr.
    ///
    /// ## Test Scenario
    /// - Creates a CommandFailed error with and without an exit code
    ///
    /// ## Expected Outcome
    /// - The message names the command and includes trimmed stderr
    #[test]
    fn test_git_error_display() {
        let err = GitError::CommandFailed {
            command: "push".to_string(),
            code: Some(1),
            stderr: "error: failed to push some refs\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "git push failed (exit 1): error: failed to push some refs"
        );

        let killed = GitError::CommandFailed {
            command: "pull".to_string(),
            code: None,
            stderr: "terminated".to_string(),
        };
        assert_eq!(killed.to_string(), "git pull failed: terminated");
    }

    /// # Fatal Classification
    ///
    /// Verifies which error categories end the session.
    ///
    /// ## Test Scenario
    /// - Classifies environment, repository, subprocess and cancellation errors
    ///
    /// ## Expected Outcome
    /// - Only missing git and a missing repository are fatal
    #[test]
    fn test_is_fatal() {
        let unavailable: GitcliError = EnvironmentError::GitUnavailable {
            message: "not found".to_string(),
        }
        .into();
        assert!(unavailable.is_fatal());

        let not_repo: GitcliError = RepositoryError::NotAGitRepository {
            path: PathBuf::from("/tmp"),
        }
        .into();
        assert!(not_repo.is_fatal());

        assert!(!GitcliError::from(RepositoryError::NoRemote).is_fatal());
        assert!(!GitcliError::Cancelled.is_fatal());
        assert!(
            !GitcliError::Conflict {
                files: vec!["a.txt".to_string()]
            }
            .is_fatal()
        );
    }

    /// # Stderr Extraction
    ///
    /// Verifies that captured stderr is exposed for display.
    ///
    /// ## Test Scenario
    /// - Subprocess error with stderr, subprocess error without, other errors
    ///
    /// ## Expected Outcome
    /// - Only non-empty subprocess stderr is returned
    #[test]
    fn test_stderr_extraction() {
        let err: GitcliError = GitError::CommandFailed {
            command: "commit -m x".to_string(),
            code: Some(1),
            stderr: "nothing to commit".to_string(),
        }
        .into();
        assert_eq!(err.stderr(), Some("nothing to commit"));

        let empty: GitcliError = GitError::CommandFailed {
            command: "status".to_string(),
            code: Some(128),
            stderr: String::new(),
        }
        .into();
        assert_eq!(empty.stderr(), None);

        assert_eq!(GitcliError::Cancelled.stderr(), None);
    }

    /// # Conflict Display
    ///
    /// Tests that the conflict error reports the number of files.
    ///
    /// ## Test Scenario
    /// - Creates a Conflict error with two files
    ///
    /// ## Expected Outcome
    /// - The message mentions 2 file(s)
    #[test]
    fn test_conflict_display() {
        let err = GitcliError::Conflict {
            files: vec!["a.rs".to_string(), "b.rs".to_string()],
        };
        assert!(err.to_string().contains("2 file(s)"));
    }
}
