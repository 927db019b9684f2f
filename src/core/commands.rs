//! Command table and name parsing.
//!
//! Every command has one canonical hyphenated name. Users may also type the
//! concatenated form (`listbranch`), a spaced form (`list branch`), any case,
//! or an alias (`qp`).

use std::fmt;
use std::io::Write;

use crate::console::Console;

/// Every command the front-end understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Save,
    Work,
    Done,
    Sync,
    Undo,
    Status,
    Commit,
    Push,
    Pull,
    Fetch,
    Stage,
    Log,
    Diff,
    DiffStaged,
    Amend,
    Reset,
    Remotes,
    Clone,
    Init,
    QuickPush,
    SwitchBranch,
    AddBranch,
    DeleteBranch,
    RenameBranch,
    ListBranch,
    Stash,
    StashPop,
    StashApply,
    StashList,
    StashDrop,
    StashShow,
    ResolveConflicts,
    CheckConflicts,
    Hooks,
    ListHooks,
    Config,
    Help,
    Quit,
}

/// Help section a command is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Smart,
    Traditional,
    Branch,
    Stash,
    ConflictsAndHooks,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Smart,
        Category::Traditional,
        Category::Branch,
        Category::Stash,
        Category::ConflictsAndHooks,
        Category::Other,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Category::Smart => "Smart Workflows",
            Category::Traditional => "Git Commands",
            Category::Branch => "Branch Management",
            Category::Stash => "Stash Management",
            Category::ConflictsAndHooks => "Conflicts & Hooks",
            Category::Other => "Other",
        }
    }
}

/// Static description of one command.
#[derive(Debug, Clone, Copy)]
pub struct CommandInfo {
    pub command: Command,
    /// Canonical hyphenated name.
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// Argument synopsis shown in help.
    pub usage: &'static str,
    pub description: &'static str,
    pub category: Category,
}

const fn info(
    command: Command,
    name: &'static str,
    usage: &'static str,
    description: &'static str,
    category: Category,
) -> CommandInfo {
    CommandInfo {
        command,
        name,
        aliases: &[],
        usage,
        description,
        category,
    }
}

/// The command table, in help order.
pub const COMMANDS: &[CommandInfo] = &[
    info(Command::Save, "save", "[message]", "Commit and push, stash, or push what is pending", Category::Smart),
    info(Command::Work, "work", "[branch]", "Start or resume work on a branch", Category::Smart),
    info(Command::Done, "done", "", "Commit, push and optionally return to main", Category::Smart),
    info(Command::Sync, "sync", "", "Stash, pull, restore and push", Category::Smart),
    info(Command::Undo, "undo", "", "Discard changes or undo the last commit", Category::Smart),
    info(Command::Status, "status", "", "Show branch, changes, remote state and stashes", Category::Smart),
    info(Command::Commit, "commit", "", "Commit staged changes", Category::Traditional),
    info(Command::Push, "push", "", "Push commits to the remote", Category::Traditional),
    info(Command::Pull, "pull", "", "Pull the latest changes", Category::Traditional),
    info(Command::Fetch, "fetch", "", "Fetch updates without merging", Category::Traditional),
    info(Command::Stage, "stage", "", "Stage changes for commit", Category::Traditional),
    info(Command::Log, "log", "", "View commit history", Category::Traditional),
    info(Command::Diff, "diff", "", "Show unstaged changes", Category::Traditional),
    info(Command::DiffStaged, "diff-staged", "", "Show staged changes", Category::Traditional),
    info(Command::Amend, "amend", "", "Amend the last commit", Category::Traditional),
    info(Command::Reset, "reset", "", "Reset to a previous commit", Category::Traditional),
    CommandInfo {
        aliases: &["qp"],
        ..info(Command::QuickPush, "quick-push", "[message]", "Stage, commit and push in one go", Category::Traditional)
    },
    info(Command::SwitchBranch, "switch-branch", "", "Switch to another branch", Category::Branch),
    info(Command::AddBranch, "add-branch", "[name]", "Create a new branch", Category::Branch),
    info(Command::DeleteBranch, "delete-branch", "", "Delete a branch", Category::Branch),
    info(Command::RenameBranch, "rename-branch", "", "Rename the current branch", Category::Branch),
    info(Command::ListBranch, "list-branch", "", "List all branches", Category::Branch),
    info(Command::Stash, "stash", "", "Stash uncommitted changes", Category::Stash),
    info(Command::StashPop, "stash-pop", "", "Apply and remove a stash", Category::Stash),
    info(Command::StashApply, "stash-apply", "", "Apply a stash and keep it", Category::Stash),
    info(Command::StashList, "stash-list", "", "List all stashes", Category::Stash),
    info(Command::StashDrop, "stash-drop", "", "Remove one or all stashes", Category::Stash),
    info(Command::StashShow, "stash-show", "", "Show the contents of a stash", Category::Stash),
    info(Command::ResolveConflicts, "resolve-conflicts", "", "Resolve merge conflicts", Category::ConflictsAndHooks),
    info(Command::CheckConflicts, "check-conflicts", "", "Check for conflicts", Category::ConflictsAndHooks),
    info(Command::Hooks, "hooks", "", "Install or remove git hooks", Category::ConflictsAndHooks),
    info(Command::ListHooks, "list-hooks", "", "List installed hooks", Category::ConflictsAndHooks),
    info(Command::Remotes, "remotes", "", "Manage remote repositories", Category::Other),
    info(Command::Clone, "clone", "[url] [dir]", "Clone a repository", Category::Other),
    info(Command::Init, "init", "", "Initialize a repository here", Category::Other),
    info(Command::Config, "config", "", "Manage settings", Category::Other),
    info(Command::Help, "help", "", "Show this help message", Category::Other),
    CommandInfo {
        aliases: &["exit", "q"],
        ..info(Command::Quit, "quit", "", "Exit the interactive session", Category::Other)
    },
];

impl Command {
    pub fn info(self) -> &'static CommandInfo {
        COMMANDS
            .iter()
            .find(|c| c.command == self)
            .unwrap_or(&COMMANDS[0])
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Whether the command needs to run inside a work tree.
    pub fn requires_repository(self) -> bool {
        !matches!(
            self,
            Command::Clone | Command::Init | Command::Help | Command::Quit
        )
    }

    /// Look a single (already normalized or raw) token up by name or alias.
    pub fn from_name(raw: &str) -> Option<Self> {
        let wanted = normalize(raw);
        COMMANDS
            .iter()
            .find(|c| c.name == wanted || c.aliases.contains(&wanted.as_str()))
            .map(|c| c.command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonicalize a typed command name.
///
/// Lowercases, turns spaces and underscores into `-`, and maps the
/// concatenated form of any known name back to its hyphenated form. Unknown
/// names are returned in their cleaned-up form.
pub fn normalize(raw: &str) -> String {
    let cleaned = raw
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let squashed = cleaned.replace('-', "");
    COMMANDS
        .iter()
        .find(|c| c.name.replace('-', "") == squashed)
        .map(|c| c.name.to_string())
        .unwrap_or(cleaned)
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub args: Vec<String>,
}

/// Parse tokens into a command and its arguments.
///
/// The first two tokens are tried together first so `list branch` and
/// `stash pop` resolve to their two-word commands. Returns `Err` with the
/// normalized unknown name.
pub fn parse_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Invocation, String> {
    let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
    let Some(first) = tokens.first() else {
        return Err(String::new());
    };

    if let [_, second, rest @ ..] = tokens.as_slice()
        && let Some(command) = Command::from_name(&format!("{first}-{second}"))
    {
        return Ok(Invocation {
            command,
            args: rest.iter().map(|s| s.to_string()).collect(),
        });
    }

    match Command::from_name(first) {
        Some(command) => Ok(Invocation {
            command,
            args: tokens[1..].iter().map(|s| s.to_string()).collect(),
        }),
        None => Err(normalize(first)),
    }
}

/// Parse one REPL line.
pub fn parse_line(line: &str) -> Result<Invocation, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    parse_tokens(&tokens)
}

/// Names offered for tab completion.
pub fn completion_names() -> Vec<String> {
    COMMANDS
        .iter()
        .flat_map(|c| std::iter::once(c.name).chain(c.aliases.iter().copied()))
        .map(str::to_string)
        .collect()
}

/// Print the grouped command reference.
pub fn render_help<W: Write>(out: &mut Console<W>) {
    out.heading("GitCLI Commands");
    for category in Category::ALL {
        out.blank();
        out.heading(category.title());
        for command in COMMANDS.iter().filter(|c| c.category == category) {
            let mut label = command.name.to_string();
            if !command.usage.is_empty() {
                label = format!("{label} {}", command.usage);
            }
            for alias in command.aliases {
                label = format!("{label} / {alias}");
            }
            out.line(format!("  {label:<24}{}", command.description));
        }
    }
    out.blank();
    out.hint("Commands also accept 'listbranch' and 'list branch' forms");
}
