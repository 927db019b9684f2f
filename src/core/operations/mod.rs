//! Commands outside the smart workflows.
//!
//! # Modules
//!
//! - [`basic`] - Traditional single-step git commands
//! - [`branches`] - Branch switching, creation, deletion and renaming
//! - [`remotes`] - Remote management
//! - [`stash`] - Stash management
//! - [`conflicts`] - The conflict-resolution helper
//! - [`hooks`] - Hook installation and the save-time hook runs
//! - [`hook_templates`] - Hook templates and the language tool catalog
//! - [`commit_message`] - Commit message suggestions learned from history
//! - [`config_menu`] - The settings editor

pub mod basic;
pub mod branches;
pub mod commit_message;
pub mod config_menu;
pub mod conflicts;
pub mod hook_templates;
pub mod hooks;
pub mod remotes;
pub mod stash;

pub use conflicts::InProgress;
pub use hook_templates::{HookSettings, HookType, LanguageSelection, ToolKind};
pub use hooks::{
    EnabledHook, HookCommandResult, HookContext, HookExecutor, HookProgress, HookResult,
    HooksFile, InstalledHook, Uninstalled,
};
