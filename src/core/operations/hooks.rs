//! Git hook management and the save-time hook runs.
//!
//! Hooks are installed from the templates in
//! [`hook_templates`](super::hook_templates) into the repository's hooks
//! directory (`git rev-parse --git-path hooks`, so `core.hooksPath` is
//! honoured). What was installed, and with which settings, is recorded in
//! `.gitcli-hooks.json` at the work-tree root:
//!
//! ```json
//! {
//!   "enabled_hooks": {
//!     "pre-commit": {
//!       "template": "formatting",
//!       "config": { "languages": { "rust": { "formatters": ["rustfmt"] } } }
//!     }
//!   }
//! }
//! ```
//!
//! # Environment Variables
//!
//! Commands run by [`HookExecutor`] receive:
//!
//! - `GITCLI_REPO_PATH` - Path to the work-tree root
//! - `GITCLI_BRANCH` - The checked-out branch, when known

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::hook_templates::{
    self, HookSettings, HookType, LanguageSelection, Setup, ToolKind, generate_script,
};
use crate::core::session::Session;
use crate::core::workflows::Outcome;
use crate::error::{ConfigError, GitcliError, GitcliResult};
use crate::git;

/// File recording installed hooks, at the work-tree root.
pub const HOOKS_FILE_NAME: &str = ".gitcli-hooks.json";

/// One recorded hook installation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledHook {
    pub template: String,
    #[serde(default)]
    pub config: HookSettings,
}

/// Contents of [`HOOKS_FILE_NAME`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HooksFile {
    #[serde(default)]
    pub enabled_hooks: BTreeMap<String, EnabledHook>,
}

impl HooksFile {
    /// Read the file; a missing file is an empty record.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::FileReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(|e| ConfigError::FileWriteError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, content + "\n").map_err(|e| ConfigError::FileWriteError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Formatter commands recorded for an installed pre-commit `formatting` hook.
    pub fn formatter_commands(&self) -> Vec<String> {
        match self.enabled_hooks.get(HookType::PreCommit.file_name()) {
            Some(hook) if hook.template == "formatting" => hook
                .config
                .commands(ToolKind::Formatters)
                .into_iter()
                .map(|(_, _, command)| command.to_string())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Context passed to hook commands as environment variables.
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    pub repo_path: Option<String>,
    pub branch: Option<String>,
}

impl HookContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repo_path(mut self, path: impl Into<String>) -> Self {
        self.repo_path = Some(path.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn to_env_vars(&self) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        if let Some(ref path) = self.repo_path {
            vars.insert("GITCLI_REPO_PATH".to_string(), path.clone());
        }
        if let Some(ref branch) = self.branch {
            vars.insert("GITCLI_BRANCH".to_string(), branch.clone());
        }
        vars
    }
}

/// Result of a single hook command execution.
#[derive(Debug, Clone)]
pub struct HookCommandResult {
    pub command: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl HookCommandResult {
    /// Stdout and stderr together, for display.
    pub fn output(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Result of running a list of commands.
#[derive(Debug, Clone)]
pub struct HookResult {
    pub command_results: Vec<HookCommandResult>,
    pub all_succeeded: bool,
}

impl HookResult {
    pub fn first_failure(&self) -> Option<&HookCommandResult> {
        self.command_results.iter().find(|r| !r.success)
    }
}

/// Progress update while commands run.
#[derive(Debug, Clone)]
pub enum HookProgress {
    CommandStarting { command: String, index: usize, total: usize },
    CommandCompleted { command: String, success: bool },
}

/// Runs shell commands in order, stopping at the first failure.
pub struct HookExecutor {
    commands: Vec<String>,
}

impl HookExecutor {
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn run<F>(&self, working_dir: &Path, context: &HookContext, mut progress: Option<F>) -> HookResult
    where
        F: FnMut(HookProgress),
    {
        let env_vars = context.to_env_vars();
        let total = self.commands.len();
        let mut command_results = Vec::with_capacity(total);
        let mut all_succeeded = true;

        for (index, command) in self.commands.iter().enumerate() {
            if let Some(ref mut callback) = progress {
                callback(HookProgress::CommandStarting {
                    command: command.clone(),
                    index,
                    total,
                });
            }

            let result = run_shell_command(command, working_dir, &env_vars);
            let success = result.success;
            debug!(command = %command, success, "hook command finished");

            if let Some(ref mut callback) = progress {
                callback(HookProgress::CommandCompleted {
                    command: command.clone(),
                    success,
                });
            }

            command_results.push(result);
            if !success {
                all_succeeded = false;
                break;
            }
        }

        HookResult {
            command_results,
            all_succeeded,
        }
    }

    pub fn run_simple(&self, working_dir: &Path, context: &HookContext) -> HookResult {
        self.run::<fn(HookProgress)>(working_dir, context, None)
    }
}

fn capture(label: &str, command: &mut Command) -> HookCommandResult {
    match command.stdout(Stdio::piped()).stderr(Stdio::piped()).output() {
        Ok(output) => HookCommandResult {
            command: label.to_string(),
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        },
        Err(e) => HookCommandResult {
            command: label.to_string(),
            success: false,
            exit_code: None,
            stdout: String::new(),
            stderr: format!("Failed to execute command: {}", e),
        },
    }
}

fn run_shell_command(
    command: &str,
    working_dir: &Path,
    env_vars: &HashMap<String, String>,
) -> HookCommandResult {
    #[cfg(unix)]
    let (shell, shell_arg) = ("sh", "-c");

    #[cfg(windows)]
    let (shell, shell_arg) = ("cmd", "/C");

    capture(
        command,
        Command::new(shell)
            .arg(shell_arg)
            .arg(command)
            .current_dir(working_dir)
            .envs(env_vars),
    )
}

/// Run an installed hook script directly.
pub fn run_hook_script(script: &Path, working_dir: &Path, context: &HookContext) -> HookCommandResult {
    capture(
        &script.display().to_string(),
        Command::new(script)
            .current_dir(working_dir)
            .envs(context.to_env_vars()),
    )
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).is_ok_and(|m| m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// An installed hook file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledHook {
    pub name: String,
    pub executable: bool,
    pub recorded: Option<EnabledHook>,
}

/// Hook files in `hooks_dir`, skipping `.sample` and `.backup` files.
pub fn installed_hooks(hooks_dir: &Path, record: &HooksFile) -> GitcliResult<Vec<InstalledHook>> {
    if !hooks_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut hooks = Vec::new();
    for entry in fs::read_dir(hooks_dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !path.is_file() || name.ends_with(".sample") || name.ends_with(".backup") {
            continue;
        }
        hooks.push(InstalledHook {
            executable: is_executable(&path),
            recorded: record.enabled_hooks.get(&name).cloned(),
            name,
        });
    }
    hooks.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(hooks)
}

/// Write a hook from a template and record it.
///
/// An existing hook is renamed to `<hook>.backup` first. Returns the backup
/// path when one was made.
pub fn install(
    hooks_dir: &Path,
    record_path: &Path,
    hook: HookType,
    template_key: &str,
    settings: HookSettings,
) -> GitcliResult<Option<PathBuf>> {
    let script = generate_script(hook, template_key, &settings).ok_or_else(|| {
        anyhow::anyhow!("Unknown template '{template_key}' for {}", hook.file_name())
    })?;

    fs::create_dir_all(hooks_dir)?;
    let hook_path = hooks_dir.join(hook.file_name());
    let backup = if hook_path.exists() {
        let backup_path = hooks_dir.join(format!("{}.backup", hook.file_name()));
        fs::rename(&hook_path, &backup_path)?;
        Some(backup_path)
    } else {
        None
    };

    fs::write(&hook_path, script)?;
    make_executable(&hook_path)?;

    let mut record = HooksFile::load(record_path)?;
    record.enabled_hooks.insert(
        hook.file_name().to_string(),
        EnabledHook {
            template: template_key.to_string(),
            config: settings,
        },
    );
    record.save(record_path)?;
    info!(hook = hook.file_name(), template = template_key, "installed hook");
    Ok(backup)
}

/// What [`uninstall`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uninstalled {
    NotInstalled,
    Removed,
    RestoredBackup,
}

/// Remove a hook, restoring `<hook>.backup` when present, and drop its record.
pub fn uninstall(hooks_dir: &Path, record_path: &Path, name: &str) -> GitcliResult<Uninstalled> {
    let hook_path = hooks_dir.join(name);
    if !hook_path.exists() {
        return Ok(Uninstalled::NotInstalled);
    }
    fs::remove_file(&hook_path)?;
    let backup_path = hooks_dir.join(format!("{name}.backup"));
    let result = if backup_path.exists() {
        fs::rename(&backup_path, &hook_path)?;
        Uninstalled::RestoredBackup
    } else {
        Uninstalled::Removed
    };

    let mut record = HooksFile::load(record_path)?;
    if record.enabled_hooks.remove(name).is_some() {
        record.save(record_path)?;
    }
    info!(hook = name, ?result, "uninstalled hook");
    Ok(result)
}

fn hooks_dir<W: Write>(session: &Session<'_, W>) -> GitcliResult<PathBuf> {
    git::git_path(session.git, "hooks")
}

fn record_path<W: Write>(session: &Session<'_, W>) -> PathBuf {
    session.git.workdir().join(HOOKS_FILE_NAME)
}

fn context<W: Write>(session: &Session<'_, W>) -> GitcliResult<HookContext> {
    let mut context = HookContext::new().with_repo_path(session.git.workdir().display().to_string());
    if let Some(branch) = git::current_branch(session.git)? {
        context = context.with_branch(branch);
    }
    Ok(context)
}

/// Run the formatters recorded for the pre-commit `formatting` hook.
pub fn auto_format<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<()> {
    let record = match HooksFile::load(&record_path(session)) {
        Ok(record) => record,
        Err(e) => {
            warn!(error = %e, "ignoring unreadable hooks file");
            session.out.warn(e.to_string());
            return Ok(());
        }
    };
    let executor = HookExecutor::new(record.formatter_commands());
    if executor.is_empty() {
        debug!("no formatters configured");
        return Ok(());
    }

    session.out.info("Formatting code...");
    let context = context(session)?;
    let out = &mut *session.out;
    let result = executor.run(
        session.git.workdir(),
        &context,
        Some(|progress| {
            if let HookProgress::CommandStarting { command, .. } = progress {
                out.hint(command);
            }
        }),
    );
    match result.first_failure() {
        Some(failure) => Err(GitcliError::HookFailed {
            hook: "formatter".to_string(),
            command: failure.command.clone(),
            output: failure.output(),
        }),
        None => {
            session.out.success("Formatting complete");
            Ok(())
        }
    }
}

/// Run the installed `pre-commit` hook, if any.
pub fn validate_pre_commit<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<()> {
    let script = hooks_dir(session)?.join(HookType::PreCommit.file_name());
    if !is_executable(&script) {
        debug!(path = %script.display(), "no executable pre-commit hook");
        return Ok(());
    }
    session.out.info("Running pre-commit checks...");
    let result = run_hook_script(&script, session.git.workdir(), &context(session)?);
    if result.success {
        session.out.success("Pre-commit checks passed");
        Ok(())
    } else {
        Err(GitcliError::HookFailed {
            hook: "pre-commit".to_string(),
            command: result.command.clone(),
            output: result.output(),
        })
    }
}

/// `list-hooks`.
pub fn list<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let record = HooksFile::load(&record_path(session))?;
    let hooks = installed_hooks(&hooks_dir(session)?, &record)?;

    session.out.heading("Installed git hooks");
    if hooks.is_empty() {
        session.out.info("No hooks installed");
        return Ok(Outcome::NothingToDo);
    }
    for hook in &hooks {
        let status = if hook.executable { "active" } else { "not executable" };
        session.out.line(format!("  {:<20} {status}", hook.name));
        let Some(recorded) = &hook.recorded else { continue };
        session.out.line(format!("    Template: {}", recorded.template));
        for (lang, selection) in &recorded.config.languages {
            let groups = [
                ("linters", &selection.linters),
                ("formatters", &selection.formatters),
                ("test runners", &selection.test_runners),
                ("build", &selection.build_commands),
            ];
            for (label, tools) in groups {
                if !tools.is_empty() {
                    session
                        .out
                        .line(format!("    {lang} {label}: {}", tools.join(", ")));
                }
            }
        }
        if !recorded.config.custom_commands.is_empty() {
            session.out.line("    Custom commands:");
            for command in &recorded.config.custom_commands {
                session.out.line(format!("      - {command}"));
            }
        }
    }
    Ok(Outcome::Completed)
}

const MENU: [&str; 5] = [
    "Install a hook",
    "Uninstall a hook",
    "List installed hooks",
    "View hook templates",
    "Back",
];

/// `hooks`: the management menu.
pub fn manage<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let items: Vec<String> = MENU.iter().map(|s| s.to_string()).collect();
    match session.prompt.select("Git hooks", &items, 0)? {
        0 => install_menu(session),
        1 => uninstall_menu(session),
        2 => list(session),
        3 => {
            view_templates(session);
            Ok(Outcome::NothingToDo)
        }
        _ => Ok(Outcome::Cancelled),
    }
}

fn view_templates<W: Write>(session: &mut Session<'_, W>) {
    for hook in HookType::ALL {
        session
            .out
            .heading(format!("{} ({})", hook.title(), hook.file_name()));
        session.out.line(format!("  {}", hook.description()));
        for template in hook.templates() {
            session
                .out
                .line(format!("    {:<14} {}", template.key, template.description));
        }
    }
}

fn install_menu<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let types: Vec<String> = HookType::ALL
        .iter()
        .map(|h| format!("{} - {}", h.title(), h.description()))
        .collect();
    let hook = HookType::ALL[session.prompt.select("Hook type", &types, 0)?];

    let templates = hook.templates();
    let names: Vec<String> = templates
        .iter()
        .map(|t| format!("{} - {}", t.name, t.description))
        .collect();
    let template = &templates[session.prompt.select("Template", &names, 0)?];

    let settings = match template.setup {
        Setup::None => HookSettings::default(),
        Setup::Custom => configure_custom_commands(session)?,
        Setup::Tools(kind) => configure_languages(session, Some(kind))?,
        Setup::Build => configure_languages(session, None)?,
    };
    if template.setup != Setup::None && settings.is_empty() {
        session
            .out
            .warn("This template needs configuration; installation cancelled");
        return Ok(Outcome::Cancelled);
    }

    let backup = install(
        &hooks_dir(session)?,
        &record_path(session),
        hook,
        template.key,
        settings,
    )?;
    if let Some(backup) = backup {
        session
            .out
            .warn(format!("Existing hook backed up to {}", backup.display()));
    }
    session
        .out
        .success(format!("Installed '{}' as {}", template.name, hook.file_name()));
    Ok(Outcome::Completed)
}

/// Pick languages, then tools of `kind` per language, or a build command
/// per language when `kind` is `None`.
fn configure_languages<W: Write>(
    session: &mut Session<'_, W>,
    kind: Option<ToolKind>,
) -> GitcliResult<HookSettings> {
    let detected = hook_templates::detect_languages(session.git.workdir());
    let candidates: Vec<&hook_templates::LanguageTools> = if detected.is_empty() {
        session.out.warn("No supported languages detected in this repository");
        hook_templates::LANGUAGES.iter().collect()
    } else {
        let names: Vec<&str> = detected.iter().map(|l| l.name).collect();
        session
            .out
            .info(format!("Detected languages: {}", names.join(", ")));
        if session.prompt.confirm("Use the detected languages?", true)? {
            detected
        } else {
            hook_templates::LANGUAGES.iter().collect()
        }
    };

    let labels: Vec<String> = candidates.iter().map(|l| l.name.to_string()).collect();
    let picked = session.prompt.multi_select("Languages to configure", &labels)?;

    let mut settings = HookSettings::default();
    for lang in picked.into_iter().filter_map(|i| candidates.get(i)) {
        let mut selection = LanguageSelection::default();
        match kind {
            Some(kind) => {
                let tools: Vec<String> = kind
                    .catalog(lang)
                    .iter()
                    .map(|(name, command)| format!("{name} ({command})"))
                    .collect();
                let question = format!("{} {}", lang.name, kind.label());
                let chosen = if kind == ToolKind::TestRunners {
                    vec![session.prompt.select(&question, &tools, 0)?]
                } else {
                    session.prompt.multi_select(&question, &tools)?
                };
                *selection.tools_mut(kind) = chosen
                    .into_iter()
                    .filter_map(|i| kind.catalog(lang).get(i))
                    .map(|(name, _)| name.to_string())
                    .collect();
            }
            None => {
                let question = format!("{} build command", lang.name);
                let command = session.prompt.input(&question, Some(lang.build))?;
                if !command.trim().is_empty() {
                    selection.build_commands.push(command.trim().to_string());
                }
            }
        }
        if !selection.is_empty() {
            settings.languages.insert(lang.key.to_string(), selection);
        }
    }
    Ok(settings)
}

fn configure_custom_commands<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<HookSettings> {
    session
        .out
        .info("Enter commands to run, one per prompt; leave empty to finish");
    let mut settings = HookSettings::default();
    loop {
        let command = session.prompt.input("Command", None)?;
        let command = command.trim();
        if command.is_empty() {
            break;
        }
        settings.custom_commands.push(command.to_string());
    }
    Ok(settings)
}

fn uninstall_menu<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let dir = hooks_dir(session)?;
    let record = HooksFile::load(&record_path(session))?;
    let hooks = installed_hooks(&dir, &record)?;
    if hooks.is_empty() {
        session.out.info("No hooks installed");
        return Ok(Outcome::NothingToDo);
    }
    let names: Vec<String> = hooks.iter().map(|h| h.name.clone()).collect();
    let name = &names[session.prompt.select("Hook to uninstall", &names, 0)?];
    if !session
        .prompt
        .confirm(&format!("Uninstall the {name} hook?"), false)?
    {
        return Ok(Outcome::Cancelled);
    }
    match uninstall(&dir, &record_path(session), name)? {
        Uninstalled::RestoredBackup => session
            .out
            .success(format!("Removed {name} and restored the previous hook")),
        Uninstalled::Removed => session.out.success(format!("Removed {name}")),
        Uninstalled::NotInstalled => session.out.warn(format!("{name} is not installed")),
    }
    Ok(Outcome::Completed)
}
