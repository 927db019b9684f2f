//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// `--version` output: package version plus the build's commit.
pub const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

#[derive(Parser, Debug, Clone)]
#[command(
    name = "gitcli",
    author,
    version = LONG_VERSION,
    about = "An interactive, situation-aware front-end for everyday git workflows",
    long_about = "An interactive, situation-aware front-end for everyday git workflows.\n\n\
        Smart commands (save, work, done, sync, undo, status) look at the repository\n\
        first and only ask about what matters right now. Traditional commands wrap\n\
        single git operations with confirmations where they can lose work.\n\n\
        Settings come from ~/.config/gitcli/config.json, <repo>/.gitcli-config.json\n\
        and GITCLI_* environment variables, later ones winning.",
    after_help = "EXAMPLES:\n    \
        # Start the interactive shell\n    \
        gitcli\n\n    \
        # Save work with a commit message\n    \
        gitcli save fix login redirect\n\n    \
        # Any spelling of a command works\n    \
        gitcli list-branch\n    \
        gitcli list branch\n\n    \
        # Debug logging to a file\n    \
        gitcli --log-level debug --log-file /tmp/gitcli.log sync"
)]
pub struct Args {
    /// Repository configuration file [default: <repo>/.gitcli-config.json]
    #[arg(long, value_name = "PATH", help_heading = "Configuration")]
    pub config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error [env: GITCLI_LOG_LEVEL]
    #[arg(long, value_name = "LEVEL", help_heading = "Logging")]
    pub log_level: Option<String>,

    /// Append logs to this file instead of stderr [env: GITCLI_LOG_FILE]
    #[arg(long, value_name = "FILE", help_heading = "Logging")]
    pub log_file: Option<PathBuf>,

    /// Log format: text or json [env: GITCLI_LOG_FORMAT]
    #[arg(long, value_name = "FORMAT", help_heading = "Logging")]
    pub log_format: Option<String>,

    /// Command and its arguments; omit for the interactive shell
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}
