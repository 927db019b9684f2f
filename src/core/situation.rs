//! Situation classifier.

use std::fmt;

use super::probe::RepositoryState;

/// What the repository needs next, derived from a [`RepositoryState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Situation {
    /// Unresolved conflict markers block every other operation.
    Conflicted,
    UncommittedChanges,
    /// Local commits the upstream does not have, nothing to pull.
    UnpushedCommits,
    /// Upstream commits to pull, nothing local to push.
    BehindRemote,
    /// Both sides have commits the other lacks.
    Diverged,
    UpToDate,
}

impl Situation {
    /// Classify a snapshot. Total and deterministic; first match wins:
    /// conflict, dirty, ahead only, behind only, both, otherwise up to date.
    pub fn classify(state: &RepositoryState) -> Self {
        if state.conflict {
            Situation::Conflicted
        } else if state.dirty {
            Situation::UncommittedChanges
        } else {
            match (state.ahead > 0, state.behind > 0) {
                (true, false) => Situation::UnpushedCommits,
                (false, true) => Situation::BehindRemote,
                (true, true) => Situation::Diverged,
                (false, false) => Situation::UpToDate,
            }
        }
    }

    /// One-line summary for status output.
    pub fn summary(self) -> &'static str {
        match self {
            Situation::Conflicted => "Merge conflicts need resolving",
            Situation::UncommittedChanges => "Uncommitted changes",
            Situation::UnpushedCommits => "Commits waiting to be pushed",
            Situation::BehindRemote => "Remote has new commits to pull",
            Situation::Diverged => "Local and remote have diverged",
            Situation::UpToDate => "Everything is saved and up to date",
        }
    }

    /// Suggested next command, if any.
    pub fn suggestion(self) -> Option<&'static str> {
        match self {
            Situation::Conflicted => Some("resolve-conflicts"),
            Situation::UncommittedChanges => Some("save"),
            Situation::UnpushedCommits => Some("push"),
            Situation::BehindRemote | Situation::Diverged => Some("sync"),
            Situation::UpToDate => None,
        }
    }
}

impl fmt::Display for Situation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.summary())
    }
}

/// Shorthand for [`Situation::classify`].
pub fn classify(state: &RepositoryState) -> Situation {
    Situation::classify(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(dirty: bool, ahead: u32, behind: u32, conflict: bool) -> RepositoryState {
        RepositoryState {
            branch: "main".to_string(),
            dirty,
            ahead,
            behind,
            conflict,
            ..RepositoryState::default()
        }
    }

    /// # Classification Table
    ///
    /// Exhaustively checks the priority order over the boolean space.
    ///
    /// ## Test Scenario
    /// - Every combination of dirty, conflict, ahead in {0,2}, behind in {0,3}
    ///
    /// ## Expected Outcome
    /// - Exactly the expected situation per the priority order
    #[test]
    fn test_classification_table() {
        for conflict in [false, true] {
            for dirty in [false, true] {
                for ahead in [0, 2] {
                    for behind in [0, 3] {
                        let expected = if conflict {
                            Situation::Conflicted
                        } else if dirty {
                            Situation::UncommittedChanges
                        } else if ahead > 0 && behind == 0 {
                            Situation::UnpushedCommits
                        } else if ahead == 0 && behind > 0 {
                            Situation::BehindRemote
                        } else if ahead > 0 && behind > 0 {
                            Situation::Diverged
                        } else {
                            Situation::UpToDate
                        };
                        let s = state(dirty, ahead, behind, conflict);
                        assert_eq!(classify(&s), expected, "{s:?}");
                        assert_eq!(classify(&s), classify(&s));
                    }
                }
            }
        }
    }

    /// # Scenario Fixtures
    ///
    /// The documented fixtures classify as described.
    ///
    /// ## Test Scenario
    /// - dirty 0/0; clean ahead 3; conflicted with ahead 5 behind 5
    ///
    /// ## Expected Outcome
    /// - UncommittedChanges, UnpushedCommits, Conflicted
    #[test]
    fn test_scenario_fixtures() {
        assert_eq!(
            classify(&state(true, 0, 0, false)),
            Situation::UncommittedChanges
        );
        assert_eq!(
            classify(&state(false, 3, 0, false)),
            Situation::UnpushedCommits
        );
        assert_eq!(classify(&state(false, 5, 5, true)), Situation::Conflicted);
        assert_eq!(classify(&state(true, 5, 5, true)), Situation::Conflicted);
    }

    /// # Suggestions
    ///
    /// Verifies the next-step hint per situation.
    ///
    /// ## Test Scenario
    /// - Query suggestion for behind, diverged and up-to-date
    ///
    /// ## Expected Outcome
    /// - sync, sync, None
    #[test]
    fn test_suggestions() {
        assert_eq!(Situation::BehindRemote.suggestion(), Some("sync"));
        assert_eq!(Situation::Diverged.suggestion(), Some("sync"));
        assert_eq!(Situation::UpToDate.suggestion(), None);
        assert_eq!(
            Situation::UpToDate.to_string(),
            "Everything is saved and up to date"
        );
    }
}
