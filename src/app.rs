//! Terminal front-end: one-shot invocations and the interactive loop.
//!
//! Configuration is reloaded before every command so edits made by `config`
//! (or by hand) apply to the next one without restarting.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::VERSION;
use crate::config::{CONFIG_FILE_NAME, Config};
use crate::console::Console;
use crate::core::ExitCode;
use crate::core::commands::{Command, Invocation, parse_line, parse_tokens};
use crate::core::dispatch::{self, report_error};
use crate::core::session::Session;
use crate::error::{GitcliError, GitcliResult, RepositoryError};
use crate::git::{self, GitRunner, SystemGit};
use crate::prompt::Prompter;

/// Repository configuration file for a work tree, unless overridden.
pub fn config_path(workdir: &Path, config_file: Option<&Path>) -> PathBuf {
    config_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| workdir.join(CONFIG_FILE_NAME))
}

/// Effective configuration: global file, repository file, then environment.
pub fn load_config(repo_file: &Path) -> Config {
    Config::load(Config::global_config_path().as_deref(), repo_file)
}

/// Locate the work tree containing `cwd`.
///
/// Fails with `GitUnavailable` when git cannot run and `NotAGitRepository`
/// when `cwd` is outside any work tree.
pub fn open_repository(cwd: &Path) -> GitcliResult<SystemGit> {
    let probe = SystemGit::new(cwd);
    let version = git::version(&probe)?;
    debug!(%version, cwd = %cwd.display(), "git available");
    if !git::is_work_tree(&probe)? {
        return Err(RepositoryError::NotAGitRepository {
            path: cwd.to_path_buf(),
        }
        .into());
    }
    Ok(SystemGit::new(git::toplevel(&probe)?))
}

/// Run one parsed command with a freshly loaded configuration.
pub fn run_invocation<W: Write>(
    git: &dyn GitRunner,
    prompt: &mut dyn Prompter,
    out: &mut Console<W>,
    config_file: Option<&Path>,
    invocation: &Invocation,
) -> ExitCode {
    let config_path = config_path(git.workdir(), config_file);
    let config = load_config(&config_path);
    let mut session = Session {
        git,
        prompt,
        out,
        config: &config,
        config_path,
        global_config_path: Config::global_config_path(),
    };
    dispatch::run(&mut session, invocation)
}

fn unknown_command<W: Write>(out: &mut Console<W>, name: &str) {
    out.error(format!("Unknown command '{name}'"));
    out.hint("Type 'help' to see the available commands");
}

fn fail<W: Write>(out: &mut Console<W>, error: &GitcliError) -> ExitCode {
    report_error(out, error);
    out.flush();
    ExitCode::for_error(error)
}

/// `gitcli <command> [args...]`.
pub fn run_once<W: Write>(
    cwd: &Path,
    tokens: &[String],
    prompt: &mut dyn Prompter,
    out: &mut Console<W>,
    config_file: Option<&Path>,
) -> ExitCode {
    let invocation = match parse_tokens(tokens) {
        Ok(invocation) => invocation,
        Err(name) => {
            unknown_command(out, &name);
            out.flush();
            return ExitCode::InvalidCommand;
        }
    };
    info!(command = %invocation.command, "one-shot invocation");

    let git = if invocation.command.requires_repository() {
        match open_repository(cwd) {
            Ok(git) => git,
            Err(e) => return fail(out, &e),
        }
    } else {
        SystemGit::new(cwd)
    };
    run_invocation(&git, prompt, out, config_file, &invocation)
}

/// `gitcli` with no command: the interactive loop.
pub fn run_interactive<W: Write>(
    cwd: &Path,
    prompt: &mut dyn Prompter,
    out: &mut Console<W>,
    config_file: Option<&Path>,
) -> ExitCode {
    let git = match open_repository(cwd) {
        Ok(git) => git,
        Err(GitcliError::Repository(RepositoryError::NotAGitRepository { .. })) => {
            match outside_repository(cwd, prompt, out, config_file) {
                Ok(Some(git)) => git,
                Ok(None) | Err(GitcliError::Cancelled) => {
                    out.flush();
                    return ExitCode::Success;
                }
                Err(e) => return fail(out, &e),
            }
        }
        Err(e) => return fail(out, &e),
    };
    banner(&git, out);
    repl(&git, prompt, out, config_file)
}

const OUTSIDE_CHOICES: [&str; 3] = [
    "Initialize a new repository here",
    "Clone a repository",
    "Exit",
];

/// Offer init or clone when started outside a work tree.
///
/// Returns the new repository after a successful init.
fn outside_repository<W: Write>(
    cwd: &Path,
    prompt: &mut dyn Prompter,
    out: &mut Console<W>,
    config_file: Option<&Path>,
) -> GitcliResult<Option<SystemGit>> {
    out.warn(format!("{} is not inside a git repository", cwd.display()));
    let git = SystemGit::new(cwd);
    let items: Vec<String> = OUTSIDE_CHOICES.iter().map(|s| s.to_string()).collect();
    let command = match prompt.select("What would you like to do?", &items, 0)? {
        0 => {
            if !prompt.confirm(&format!("Run 'git init' in {}?", cwd.display()), true)? {
                return Ok(None);
            }
            Command::Init
        }
        1 => Command::Clone,
        _ => return Ok(None),
    };
    let invocation = Invocation {
        command,
        args: Vec::new(),
    };
    if run_invocation(&git, prompt, out, config_file, &invocation) != ExitCode::Success
        || command == Command::Clone
    {
        return Ok(None);
    }
    open_repository(cwd).map(Some)
}

fn branch_label(git: &dyn GitRunner) -> String {
    match git::current_branch(git) {
        Ok(Some(branch)) => branch,
        _ => "HEAD".to_string(),
    }
}

/// Welcome lines naming the repository and branch.
pub fn banner<W: Write>(git: &dyn GitRunner, out: &mut Console<W>) {
    let workdir = git.workdir();
    let name = workdir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| workdir.display().to_string());
    out.heading(format!("GitCLI {VERSION}"));
    out.info(format!("Repository: {name}"));
    out.info(format!("Branch: {}", branch_label(git)));
    out.hint("Type 'help' for commands, 'quit' to leave");
    out.blank();
}

/// Read and run commands until `quit` or end of input.
///
/// Per-command failures are reported and the loop continues; fatal ones end it.
pub fn repl<W: Write>(
    git: &dyn GitRunner,
    prompt: &mut dyn Prompter,
    out: &mut Console<W>,
    config_file: Option<&Path>,
) -> ExitCode {
    loop {
        out.flush();
        let line = match prompt.read_command(&format!("[{}] > ", branch_label(git))) {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(GitcliError::Cancelled) => continue,
            Err(e) => return fail(out, &e),
        };
        if line.trim().is_empty() {
            continue;
        }
        let invocation = match parse_line(&line) {
            Ok(invocation) => invocation,
            Err(name) => {
                unknown_command(out, &name);
                continue;
            }
        };
        if invocation.command == Command::Quit {
            break;
        }
        let code = run_invocation(git, prompt, out, config_file, &invocation);
        if matches!(code, ExitCode::NotARepository | ExitCode::GitUnavailable) {
            return code;
        }
    }
    out.info("Goodbye");
    out.flush();
    ExitCode::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::GitOutput;
    use crate::git::testing::FakeGit;
    use crate::prompt::testing::{Answer, ScriptedPrompter};
    use tempfile::TempDir;

    /// # REPL Session
    ///
    /// Verifies commands run in turn and unknown names do not end the loop.
    ///
    /// ## Test Scenario
    /// - Lines "list branch", "frobnicate", "quit" against a fake repo
    ///
    /// ## Expected Outcome
    /// - Branch listing shown, unknown command reported, exit 0
    #[test]
    fn test_repl_session() {
        let dir = TempDir::new().unwrap();
        let git = FakeGit::clean_repo("main")
            .with_workdir(dir.path())
            .on("branch -a -vv", GitOutput::ok("* main abc1234 init\n"));
        let mut prompt = ScriptedPrompter::new(vec![
            Answer::Line("list branch".to_string()),
            Answer::Line("frobnicate".to_string()),
            Answer::Line("quit".to_string()),
            Answer::Line("status".to_string()),
        ]);
        let mut out = Console::buffer();
        assert_eq!(repl(&git, &mut prompt, &mut out, None), ExitCode::Success);

        let text = out.contents();
        assert!(text.contains("abc1234 init"));
        assert!(text.contains("Unknown command 'frobnicate'"));
        assert_eq!(prompt.remaining(), 1, "quit ends the loop");
        assert_eq!(prompt.asked()[0], "[main] > ");
    }

    /// # REPL End Of Input
    ///
    /// Verifies the loop ends cleanly when input runs out.
    ///
    /// ## Test Scenario
    /// - Empty line, then end of input
    ///
    /// ## Expected Outcome
    /// - Exit 0 with a goodbye
    #[test]
    fn test_repl_end_of_input() {
        let git = FakeGit::clean_repo("main");
        let mut prompt = ScriptedPrompter::new(vec![Answer::Line("   ".to_string())]);
        let mut out = Console::buffer();
        assert_eq!(repl(&git, &mut prompt, &mut out, None), ExitCode::Success);
        assert!(out.contents().contains("Goodbye"));
        assert!(git.mutations().is_empty());
    }

    /// # Config Reloaded Per Command
    ///
    /// Verifies a `config` edit applies to the next command in the same loop.
    ///
    /// ## Test Scenario
    /// - Turn off auto-stage through `config`, then run `commit` on a tree
    ///   with nothing staged
    ///
    /// ## Expected Outcome
    /// - The second command asks what to stage instead of running `add .`
    #[test]
    fn test_config_reloaded_per_command() {
        let dir = TempDir::new().unwrap();
        let git = FakeGit::clean_repo("main")
            .with_workdir(dir.path())
            .with_status(" M a.rs\n");
        let config_file = dir.path().join("settings.json");
        let mut prompt = ScriptedPrompter::new(vec![
            Answer::Line("config".to_string()),
            Answer::Select(0),
            Answer::Select(9),
            Answer::Line("commit".to_string()),
            Answer::Escape,
        ]);
        let mut out = Console::buffer();
        let code = repl(&git, &mut prompt, &mut out, Some(&config_file));
        assert_eq!(code, ExitCode::Success);

        assert!(!Config::load_from_file(&config_file).unwrap().auto_stage);
        assert!(!git.mutated("add ."));
        assert!(prompt.was_asked("stage"));
    }

    /// # Unknown One-Shot Command
    ///
    /// Verifies an unrecognized command exits 4 before touching git.
    ///
    /// ## Test Scenario
    /// - `gitcli frobnicate`
    ///
    /// ## Expected Outcome
    /// - Exit 4, error names the command
    #[test]
    fn test_run_once_unknown() {
        let dir = TempDir::new().unwrap();
        let mut prompt = ScriptedPrompter::new(vec![]);
        let mut out = Console::buffer();
        let code = run_once(
            dir.path(),
            &["frobnicate".to_string()],
            &mut prompt,
            &mut out,
            None,
        );
        assert_eq!(code, ExitCode::InvalidCommand);
        assert!(out.contents().contains("Unknown command 'frobnicate'"));
    }

    /// # Banner
    ///
    /// Verifies the welcome lines name the repository and branch.
    ///
    /// ## Test Scenario
    /// - Fake repo at /work/shop on branch feature/cart
    ///
    /// ## Expected Outcome
    /// - "Repository: shop" and "Branch: feature/cart"
    #[test]
    fn test_banner() {
        let git = FakeGit::clean_repo("feature/cart").with_workdir("/work/shop");
        let mut out = Console::buffer();
        banner(&git, &mut out);
        let text = out.contents();
        assert!(text.contains("Repository: shop"));
        assert!(text.contains("Branch: feature/cart"));
    }

    /// # Config Path Override
    ///
    /// Verifies `--config` replaces the repository file location.
    ///
    /// ## Test Scenario
    /// - With and without an override
    ///
    /// ## Expected Outcome
    /// - The override, else `<workdir>/.gitcli-config.json`
    #[test]
    fn test_config_path() {
        let workdir = Path::new("/repo");
        assert_eq!(config_path(workdir, None), workdir.join(CONFIG_FILE_NAME));
        let custom = Path::new("/etc/gitcli.json");
        assert_eq!(config_path(workdir, Some(custom)), custom.to_path_buf());
    }
}
