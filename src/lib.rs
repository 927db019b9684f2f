//! # gitcli
//!
//! An interactive, situation-aware front-end for everyday git workflows.
//!
//! Smart commands (`save`, `work`, `done`, `sync`, `undo`, `status`) probe the
//! repository, classify what state it is in and then walk a small state
//! machine that only asks about what matters right now. Traditional commands
//! wrap single git operations with confirmations where they can lose work.
//!
//! - [`git`] runs git behind the [`git::GitRunner`] trait
//! - [`core`] holds the prober, the classifier, the workflows and the dispatcher
//! - [`prompt`] and [`console`] are the terminal seams
//! - [`config`] resolves layered settings
//! - [`app`] is the REPL and one-shot front-end used by the binary
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gitcli::{app, console::Console, core::commands::completion_names, prompt::TerminalPrompter};
//!
//! let cwd = std::env::current_dir()?;
//! let mut prompt = TerminalPrompter::new(completion_names());
//! let mut out = Console::stdout();
//! let code = app::run_once(&cwd, &["status".to_string()], &mut prompt, &mut out, None);
//! println!("{code}");
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod console;
pub mod core;
pub mod error;
pub mod git;
pub mod logging;
pub mod prompt;

pub use config::Config;
pub use core::ExitCode;
pub use error::{GitcliError, GitcliResult};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
