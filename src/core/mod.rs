//! Core of the git front-end.
//!
//! The pipeline is probe, classify, dispatch, execute:
//!
//! - [`probe`] observes the repository through read-only git queries
//! - [`situation`] classifies the observed state
//! - [`workflows`] holds one state machine per smart command
//! - [`operations`] implements the traditional, branch, stash, conflict and hook commands
//! - [`commands`] parses command names and [`dispatch`] routes them

pub mod commands;
pub mod dispatch;
pub mod operations;
pub mod probe;
pub mod session;
pub mod situation;
pub mod workflows;

use crate::error::{EnvironmentError, GitcliError, RepositoryError};

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Completed, or the user declined a prompt.
    Success = 0,

    /// A workflow step failed.
    GeneralError = 1,

    /// The working directory is not inside a git repository.
    NotARepository = 2,

    /// The git executable could not be run.
    GitUnavailable = 3,

    /// The command name was not recognized.
    InvalidCommand = 4,
}

impl ExitCode {
    /// Returns the numeric exit code value.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns a human-readable description of the exit code.
    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Completed successfully",
            ExitCode::GeneralError => "A git operation failed",
            ExitCode::NotARepository => "Not inside a git repository",
            ExitCode::GitUnavailable => "Git is not installed or not on PATH",
            ExitCode::InvalidCommand => "Unknown command",
        }
    }

    /// Exit code for a command that ended with `error`.
    pub fn for_error(error: &GitcliError) -> Self {
        match error {
            GitcliError::Cancelled => ExitCode::Success,
            GitcliError::Environment(EnvironmentError::GitUnavailable { .. }) => {
                ExitCode::GitUnavailable
            }
            GitcliError::Repository(RepositoryError::NotAGitRepository { .. }) => {
                ExitCode::NotARepository
            }
            _ => ExitCode::GeneralError,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code())
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
