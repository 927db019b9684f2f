use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use gitcli::{
    app,
    cli::Args,
    console::Console,
    core::commands::completion_names,
    logging::{init_logging, resolve_log_config},
    prompt::TerminalPrompter,
};

fn main() -> ExitCode {
    let args = Args::parse();

    // Held until exit so buffered log lines are flushed
    let _log_guard = init_logging(resolve_log_config(
        args.log_level.as_deref(),
        args.log_file.as_deref(),
        args.log_format.as_deref(),
    ));
    info!(version = gitcli::VERSION, command = ?args.command, "starting");

    let mut out = Console::stdout();
    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            error!(error = %e, "cannot read the working directory");
            out.error(format!("Cannot read the working directory: {e}"));
            out.flush();
            return gitcli::ExitCode::GeneralError.into();
        }
    };

    let mut prompt = TerminalPrompter::new(completion_names());
    let code = if args.command.is_empty() {
        app::run_interactive(&cwd, &mut prompt, &mut out, args.config.as_deref())
    } else {
        app::run_once(
            &cwd,
            &args.command,
            &mut prompt,
            &mut out,
            args.config.as_deref(),
        )
    };
    info!(code = code.code(), "exiting");
    code.into()
}
