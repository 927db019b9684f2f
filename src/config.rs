//! Configuration management for gitcli.
//!
//! Settings are flat JSON objects. They are resolved from several layers, each
//! later layer overriding the keys it sets:
//!
//! 1. built-in defaults
//! 2. the global file (`$XDG_CONFIG_HOME/gitcli/config.json`)
//! 3. the repository file (`.gitcli-config.json` at the work-tree root)
//! 4. `GITCLI_<KEY>` environment variables
//!
//! ## Example
//!
//! ```rust
//! use gitcli::Config;
//! use std::path::Path;
//!
//! let config = Config::load(None, Path::new("/nonexistent/.gitcli-config.json"));
//! assert!(config.auto_stage);
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the per-repository configuration file.
pub const CONFIG_FILE_NAME: &str = ".gitcli-config.json";

/// Resolved settings, passed read-only into every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stage every change before a save commit.
    pub auto_stage: bool,
    /// Offer to push after a save commit.
    pub auto_push: bool,
    /// Suggest commit messages in the style of recent history.
    pub learn_from_history: bool,
    /// Run the installed pre-commit hook before a save commit.
    pub pre_save_validation: bool,
    /// Pull first when the branch is behind its upstream before pushing.
    pub auto_pull_before_push: bool,
    /// Run the configured formatters before staging a save commit.
    pub auto_fix_formatting: bool,
    /// Require typing "yes" before any force push.
    pub confirm_force_push: bool,
    /// Fixed commit message suggestion; takes priority over learned suggestions.
    ///
    /// Saved as `""` when unset so a cleared template masks one from a lower layer.
    #[serde(serialize_with = "template_or_empty")]
    pub commit_message_template: Option<String>,
}

fn template_or_empty<S: serde::Serializer>(
    template: &Option<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(template.as_deref().unwrap_or_default())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_stage: true,
            auto_push: true,
            learn_from_history: true,
            pre_save_validation: false,
            auto_pull_before_push: false,
            auto_fix_formatting: false,
            confirm_force_push: true,
            commit_message_template: None,
        }
    }
}

/// One partially specified configuration source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigLayer {
    pub auto_stage: Option<bool>,
    pub auto_push: Option<bool>,
    pub learn_from_history: Option<bool>,
    pub pre_save_validation: Option<bool>,
    pub auto_pull_before_push: Option<bool>,
    pub auto_fix_formatting: Option<bool>,
    pub confirm_force_push: Option<bool>,
    pub commit_message_template: Option<String>,
}

impl ConfigLayer {
    /// Merge this layer with another, preferring values from `other` when they exist.
    pub fn merge(self, other: Self) -> Self {
        Self {
            auto_stage: other.auto_stage.or(self.auto_stage),
            auto_push: other.auto_push.or(self.auto_push),
            learn_from_history: other.learn_from_history.or(self.learn_from_history),
            pre_save_validation: other.pre_save_validation.or(self.pre_save_validation),
            auto_pull_before_push: other.auto_pull_before_push.or(self.auto_pull_before_push),
            auto_fix_formatting: other.auto_fix_formatting.or(self.auto_fix_formatting),
            confirm_force_push: other.confirm_force_push.or(self.confirm_force_push),
            commit_message_template: other
                .commit_message_template
                .or(self.commit_message_template),
        }
    }

    /// Read `GITCLI_<KEY>` variables. Values that do not parse as booleans are ignored.
    pub fn from_env() -> Self {
        let flag = |option: ConfigOption| {
            std::env::var(option.env_var())
                .ok()
                .and_then(|raw| parse_bool(&raw))
        };
        Self {
            auto_stage: flag(ConfigOption::AutoStage),
            auto_push: flag(ConfigOption::AutoPush),
            learn_from_history: flag(ConfigOption::LearnFromHistory),
            pre_save_validation: flag(ConfigOption::PreSaveValidation),
            auto_pull_before_push: flag(ConfigOption::AutoPullBeforePush),
            auto_fix_formatting: flag(ConfigOption::AutoFixFormatting),
            confirm_force_push: flag(ConfigOption::ConfirmForcePush),
            commit_message_template: std::env::var("GITCLI_COMMIT_MESSAGE_TEMPLATE")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }

    /// Read a layer from a JSON file. A missing file yields `Ok(None)`.
    pub fn read(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::FileReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let layer = serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Some(layer))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Resolve the effective configuration for a command.
    ///
    /// Unreadable or malformed files are logged and skipped so a broken file
    /// never blocks the tool.
    pub fn load(global_file: Option<&Path>, repo_file: &Path) -> Self {
        Self::load_files(global_file, repo_file).apply(ConfigLayer::from_env())
    }

    /// Resolve the file layers only, without environment overrides.
    ///
    /// This is the view the `config` command edits and writes back to the
    /// repository file.
    pub fn load_files(global_file: Option<&Path>, repo_file: &Path) -> Self {
        let mut merged = ConfigLayer::default();
        for path in global_file.into_iter().chain(std::iter::once(repo_file)) {
            match ConfigLayer::read(path) {
                Ok(Some(layer)) => {
                    debug!(path = %path.display(), "loaded config layer");
                    merged = merged.merge(layer);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "ignoring config file"),
            }
        }
        Self::default().apply(merged)
    }

    /// Load a single file on top of the defaults, without environment overrides.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let layer = ConfigLayer::read(path)?.unwrap_or_default();
        Ok(Self::default().apply(layer))
    }

    /// Write the whole configuration to `path`, replacing any previous content.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |message: String| ConfigError::FileWriteError {
            path: path.to_path_buf(),
            message,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| write_error(e.to_string()))?;
        fs::write(path, format!("{json}\n")).map_err(|e| write_error(e.to_string()))?;
        debug!(path = %path.display(), "saved config");
        Ok(())
    }

    /// Location of the global configuration file, if a home directory is known.
    pub fn global_config_path() -> Option<PathBuf> {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))?;
        Some(config_dir.join("gitcli").join("config.json"))
    }

    fn apply(self, layer: ConfigLayer) -> Self {
        Self {
            auto_stage: layer.auto_stage.unwrap_or(self.auto_stage),
            auto_push: layer.auto_push.unwrap_or(self.auto_push),
            learn_from_history: layer.learn_from_history.unwrap_or(self.learn_from_history),
            pre_save_validation: layer
                .pre_save_validation
                .unwrap_or(self.pre_save_validation),
            auto_pull_before_push: layer
                .auto_pull_before_push
                .unwrap_or(self.auto_pull_before_push),
            auto_fix_formatting: layer
                .auto_fix_formatting
                .unwrap_or(self.auto_fix_formatting),
            confirm_force_push: layer.confirm_force_push.unwrap_or(self.confirm_force_push),
            commit_message_template: match layer.commit_message_template {
                Some(template) if template.trim().is_empty() => None,
                Some(template) => Some(template),
                None => self.commit_message_template,
            },
        }
    }

    /// Apply `GITCLI_*` environment overrides on top of resolved settings.
    pub fn with_env_overrides(self) -> Self {
        self.apply(ConfigLayer::from_env())
    }

    /// Current value of a boolean option.
    pub fn get(&self, option: ConfigOption) -> bool {
        match option {
            ConfigOption::AutoStage => self.auto_stage,
            ConfigOption::AutoPush => self.auto_push,
            ConfigOption::LearnFromHistory => self.learn_from_history,
            ConfigOption::PreSaveValidation => self.pre_save_validation,
            ConfigOption::AutoPullBeforePush => self.auto_pull_before_push,
            ConfigOption::AutoFixFormatting => self.auto_fix_formatting,
            ConfigOption::ConfirmForcePush => self.confirm_force_push,
        }
    }

    /// Flip a boolean option and return its new value.
    pub fn toggle(&mut self, option: ConfigOption) -> bool {
        let slot = match option {
            ConfigOption::AutoStage => &mut self.auto_stage,
            ConfigOption::AutoPush => &mut self.auto_push,
            ConfigOption::LearnFromHistory => &mut self.learn_from_history,
            ConfigOption::PreSaveValidation => &mut self.pre_save_validation,
            ConfigOption::AutoPullBeforePush => &mut self.auto_pull_before_push,
            ConfigOption::AutoFixFormatting => &mut self.auto_fix_formatting,
            ConfigOption::ConfirmForcePush => &mut self.confirm_force_push,
        };
        *slot = !*slot;
        *slot
    }
}

/// The boolean settings, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOption {
    AutoStage,
    AutoPush,
    LearnFromHistory,
    PreSaveValidation,
    AutoPullBeforePush,
    AutoFixFormatting,
    ConfirmForcePush,
}

impl ConfigOption {
    pub const ALL: [ConfigOption; 7] = [
        ConfigOption::AutoStage,
        ConfigOption::AutoPush,
        ConfigOption::LearnFromHistory,
        ConfigOption::PreSaveValidation,
        ConfigOption::AutoPullBeforePush,
        ConfigOption::AutoFixFormatting,
        ConfigOption::ConfirmForcePush,
    ];

    /// JSON key of the option.
    pub fn key(self) -> &'static str {
        match self {
            ConfigOption::AutoStage => "auto_stage",
            ConfigOption::AutoPush => "auto_push",
            ConfigOption::LearnFromHistory => "learn_from_history",
            ConfigOption::PreSaveValidation => "pre_save_validation",
            ConfigOption::AutoPullBeforePush => "auto_pull_before_push",
            ConfigOption::AutoFixFormatting => "auto_fix_formatting",
            ConfigOption::ConfirmForcePush => "confirm_force_push",
        }
    }

    /// Human-readable label for menus.
    pub fn label(self) -> &'static str {
        match self {
            ConfigOption::AutoStage => "Auto-stage changes",
            ConfigOption::AutoPush => "Auto-push prompt",
            ConfigOption::LearnFromHistory => "Learn from commit history",
            ConfigOption::PreSaveValidation => "Validate before save",
            ConfigOption::AutoPullBeforePush => "Pull before push when behind",
            ConfigOption::AutoFixFormatting => "Auto-fix formatting before save",
            ConfigOption::ConfirmForcePush => "Confirm force pushes",
        }
    }

    /// Environment variable overriding the option.
    pub fn env_var(self) -> String {
        format!("GITCLI_{}", self.key().to_ascii_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::file_serial;
    use std::env;
    use tempfile::TempDir;

    fn clear_env() {
        unsafe {
            for option in ConfigOption::ALL {
                env::remove_var(option.env_var());
            }
            env::remove_var("GITCLI_COMMIT_MESSAGE_TEMPLATE");
        }
    }

    /// # Config Defaults
    ///
    /// Verifies the built-in defaults.
    ///
    /// ## Test Scenario
    /// - Creates a default Config
    ///
    /// ## Expected Outcome
    /// - Staging, push prompt, history learning and force-push confirmation are on
    /// - The optional automation is off and no template is set
    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.auto_stage);
        assert!(config.auto_push);
        assert!(config.learn_from_history);
        assert!(config.confirm_force_push);
        assert!(!config.pre_save_validation);
        assert!(!config.auto_pull_before_push);
        assert!(!config.auto_fix_formatting);
        assert_eq!(config.commit_message_template, None);
    }

    /// # Config Round Trip
    ///
    /// Writing an option then reloading the file yields the same value.
    ///
    /// ## Test Scenario
    /// - Toggle auto_push and set a template, save, reload
    ///
    /// ## Expected Outcome
    /// - The reloaded config equals the saved one
    #[test]
    fn test_config_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut config = Config::default();
        assert!(!config.toggle(ConfigOption::AutoPush));
        config.commit_message_template = Some("chore: sync".to_string());
        config.save_to_file(&path).unwrap();

        let reloaded = Config::load_from_file(&path).unwrap();
        assert_eq!(reloaded, config);
        assert!(!reloaded.auto_push);
    }

    /// # Partial Files Keep Defaults
    ///
    /// Verifies that keys missing from the file fall back to defaults.
    ///
    /// ## Test Scenario
    /// - Write a file that only sets auto_stage=false
    ///
    /// ## Expected Outcome
    /// - auto_stage is false, everything else is default
    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{"auto_stage": false}"#).unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(
            config,
            Config {
                auto_stage: false,
                ..Config::default()
            }
        );
    }

    /// # Malformed File
    ///
    /// Verifies error reporting for unparsable JSON.
    ///
    /// ## Test Scenario
    /// - Write invalid JSON and load it directly and through layered loading
    ///
    /// ## Expected Outcome
    /// - load_from_file returns a ParseError
    /// - load skips the layer and returns defaults
    #[test]
    #[file_serial(env_tests)]
    fn test_malformed_file() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ auto_stage: ").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));

        assert_eq!(Config::load(None, &path), Config::default());
    }

    /// # Layer Precedence
    ///
    /// Verifies that repository settings override global ones and the
    /// environment overrides both.
    ///
    /// ## Test Scenario
    /// - Global file disables auto_push and learn_from_history
    /// - Repository file re-enables auto_push
    /// - GITCLI_AUTO_STAGE=false in the environment
    ///
    /// ## Expected Outcome
    /// - auto_push true (repo), learn_from_history false (global), auto_stage false (env)
    #[test]
    #[file_serial(env_tests)]
    fn test_layer_precedence() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.json");
        let repo = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&global, r#"{"auto_push": false, "learn_from_history": false}"#).unwrap();
        fs::write(&repo, r#"{"auto_push": true}"#).unwrap();
        unsafe {
            env::set_var("GITCLI_AUTO_STAGE", "false");
        }

        let config = Config::load(Some(&global), &repo);
        clear_env();

        assert!(config.auto_push);
        assert!(!config.learn_from_history);
        assert!(!config.auto_stage);
    }

    /// # Invalid Environment Values
    ///
    /// Verifies that unparsable environment values are ignored.
    ///
    /// ## Test Scenario
    /// - GITCLI_AUTO_PUSH=maybe, GITCLI_CONFIRM_FORCE_PUSH=off
    ///
    /// ## Expected Outcome
    /// - auto_push keeps its default, confirm_force_push becomes false
    #[test]
    #[file_serial(env_tests)]
    fn test_env_values() {
        clear_env();
        unsafe {
            env::set_var("GITCLI_AUTO_PUSH", "maybe");
            env::set_var("GITCLI_CONFIRM_FORCE_PUSH", "off");
        }
        let layer = ConfigLayer::from_env();
        clear_env();

        assert_eq!(layer.auto_push, None);
        assert_eq!(layer.confirm_force_push, Some(false));
    }

    /// # Global Config Path
    ///
    /// Verifies XDG_CONFIG_HOME is honoured.
    ///
    /// ## Test Scenario
    /// - Point XDG_CONFIG_HOME at a temporary directory
    ///
    /// ## Expected Outcome
    /// - The path is <xdg>/gitcli/config.json
    #[test]
    #[file_serial(env_tests)]
    fn test_global_config_path_uses_xdg() {
        let dir = TempDir::new().unwrap();
        let original = env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", dir.path());
        }

        let path = Config::global_config_path();

        match original {
            Some(val) => unsafe { env::set_var("XDG_CONFIG_HOME", val) },
            None => unsafe { env::remove_var("XDG_CONFIG_HOME") },
        }
        assert_eq!(path, Some(dir.path().join("gitcli").join("config.json")));
    }

    /// # Cleared Template Masks The Global One
    ///
    /// Verifies a repository file saved without a template hides the global template.
    ///
    /// ## Test Scenario
    /// - Global file sets a template
    /// - Repository file is saved from a config whose template is None
    ///
    /// ## Expected Outcome
    /// - The file stores an empty template
    /// - The effective template is None
    #[test]
    #[file_serial(env_tests)]
    fn test_cleared_template_masks_global() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.json");
        let repo = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&global, r#"{"commit_message_template": "wip: "}"#).unwrap();
        assert_eq!(
            Config::load(Some(&global), &repo).commit_message_template.as_deref(),
            Some("wip: ")
        );

        Config::default().save_to_file(&repo).unwrap();

        let saved = fs::read_to_string(&repo).unwrap();
        assert!(saved.contains(r#""commit_message_template": """#), "{saved}");
        assert_eq!(Config::load(Some(&global), &repo).commit_message_template, None);
        assert_eq!(Config::load_from_file(&repo).unwrap(), Config::default());
    }

    /// # Option Metadata
    ///
    /// Verifies keys, env var names and toggling for every option.
    ///
    /// ## Test Scenario
    /// - Iterate all options, toggle each twice
    ///
    /// ## Expected Outcome
    /// - Env vars are GITCLI_<KEY>; toggling twice restores the value
    #[test]
    fn test_option_metadata() {
        let mut config = Config::default();
        for option in ConfigOption::ALL {
            assert_eq!(
                option.env_var(),
                format!("GITCLI_{}", option.key().to_uppercase())
            );
            let before = config.get(option);
            assert_eq!(config.toggle(option), !before);
            config.toggle(option);
            assert_eq!(config.get(option), before);
        }
        assert_eq!(ConfigOption::AutoPush.env_var(), "GITCLI_AUTO_PUSH");
    }
}
