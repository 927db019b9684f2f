//! Per-command execution context.

use std::io::{self, Write};
use std::path::PathBuf;

use crate::config::Config;
use crate::console::Console;
use crate::git::GitRunner;
use crate::prompt::Prompter;

/// Everything a command needs: git, the user, the terminal and settings.
///
/// The configuration is read-only; only the `config` command rewrites the
/// file at `config_path`, and the caller reloads it before the next command.
pub struct Session<'a, W: Write = io::Stdout> {
    pub git: &'a dyn GitRunner,
    pub prompt: &'a mut dyn Prompter,
    pub out: &'a mut Console<W>,
    pub config: &'a Config,
    /// Repository configuration file edited by the `config` command.
    pub config_path: PathBuf,
    /// Global configuration file underneath the repository one, if any.
    pub global_config_path: Option<PathBuf>,
}

#[cfg(test)]
pub mod testing {
    //! Owned fixture that lends out a [`Session`] over fakes.

    use super::*;
    use crate::git::testing::FakeGit;
    use crate::prompt::testing::{Answer, ScriptedPrompter};

    pub struct Harness {
        pub git: FakeGit,
        pub prompt: ScriptedPrompter,
        pub out: Console<Vec<u8>>,
        pub config: Config,
        pub config_path: PathBuf,
        pub global_config_path: Option<PathBuf>,
    }

    impl Harness {
        pub fn new(git: FakeGit, answers: Vec<Answer>) -> Self {
            let config_path = git.workdir().join(crate::config::CONFIG_FILE_NAME);
            Self {
                git,
                prompt: ScriptedPrompter::new(answers),
                out: Console::buffer(),
                config: Config::default(),
                config_path,
                global_config_path: None,
            }
        }

        pub fn with_config(mut self, config: Config) -> Self {
            self.config = config;
            self
        }

        pub fn with_global_config(mut self, path: PathBuf) -> Self {
            self.global_config_path = Some(path);
            self
        }

        pub fn session(&mut self) -> Session<'_, Vec<u8>> {
            Session {
                git: &self.git,
                prompt: &mut self.prompt,
                out: &mut self.out,
                config: &self.config,
                config_path: self.config_path.clone(),
                global_config_path: self.global_config_path.clone(),
            }
        }

        /// Console output so far.
        pub fn output(&self) -> String {
            self.out.contents()
        }

        /// Fails if any scripted answer was left unused.
        pub fn assert_script_consumed(&self) {
            assert_eq!(
                self.prompt.remaining(),
                0,
                "unused answers; prompts asked: {:?}",
                self.prompt.asked()
            );
        }
    }
}
