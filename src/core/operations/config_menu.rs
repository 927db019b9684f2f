//! `config`: view and edit the repository configuration file.
//!
//! Edits start from the global and repository files merged, without
//! environment overrides, and the whole result is written to
//! [`Session::config_path`] so it masks the global file. Values that an
//! environment variable overrides are shown alongside. The caller reloads the
//! effective configuration before the next command.

use std::io::Write;

use tracing::info;

use crate::config::{Config, ConfigLayer, ConfigOption};
use crate::console::Console;
use crate::core::session::Session;
use crate::core::workflows::Outcome;
use crate::error::{GitcliError, GitcliResult};

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn template_text(config: &Config) -> &str {
    config.commit_message_template.as_deref().unwrap_or("(none)")
}

fn row(label: &str, saved: &str, effective: &str) -> String {
    if saved == effective {
        format!("  {label:<34}{saved}")
    } else {
        format!("  {label:<34}{saved}  (effective: {effective})")
    }
}

/// Print every setting with its saved value, and the effective value where
/// the environment overrides it.
pub fn render_settings<W: Write>(out: &mut Console<W>, config: &Config, effective: &Config) {
    out.heading("Settings");
    for option in ConfigOption::ALL {
        out.line(row(
            option.label(),
            on_off(config.get(option)),
            on_off(effective.get(option)),
        ));
    }
    out.line(row(
        "Commit message template",
        template_text(config),
        template_text(effective),
    ));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Toggle(ConfigOption),
    SetTemplate,
    ClearTemplate,
    Reset,
    Back,
}

fn actions(config: &Config) -> Vec<(Action, String)> {
    let mut items: Vec<(Action, String)> = ConfigOption::ALL
        .iter()
        .map(|&option| {
            let label = format!("Toggle {} (now {})", option.label(), on_off(config.get(option)));
            (Action::Toggle(option), label)
        })
        .collect();
    items.push((Action::SetTemplate, "Set commit message template".to_string()));
    if config.commit_message_template.is_some() {
        items.push((Action::ClearTemplate, "Clear commit message template".to_string()));
    }
    items.push((Action::Reset, "Reset to defaults".to_string()));
    items.push((Action::Back, "Back".to_string()));
    items
}

/// `config`.
pub fn manage<W: Write>(session: &mut Session<'_, W>) -> GitcliResult<Outcome> {
    let path = session.config_path.clone();
    // A malformed repository file is reported rather than overwritten
    ConfigLayer::read(&path)?;
    let mut config = Config::load_files(session.global_config_path.as_deref(), &path);
    let mut changed = false;

    loop {
        render_settings(session.out, &config, &config.clone().with_env_overrides());
        let items = actions(&config);
        let labels: Vec<String> = items.iter().map(|(_, label)| label.clone()).collect();
        let index = session.prompt.select("Change a setting", &labels, 0)?;
        let action = items
            .get(index)
            .map(|(action, _)| *action)
            .ok_or(GitcliError::Cancelled)?;

        match action {
            Action::Toggle(option) => {
                let value = config.toggle(option);
                session
                    .out
                    .success(format!("{} turned {}", option.label(), on_off(value)));
            }
            Action::SetTemplate => {
                let current = config.commit_message_template.clone();
                let template = session
                    .prompt
                    .input("Commit message template", current.as_deref())?;
                let template = template.trim();
                if template.is_empty() {
                    continue;
                }
                config.commit_message_template = Some(template.to_string());
                session.out.success("Commit message template set");
            }
            Action::ClearTemplate => {
                config.commit_message_template = None;
                session.out.success("Commit message template cleared");
            }
            Action::Reset => {
                if !session.prompt.confirm("Reset every setting to its default?", false)? {
                    continue;
                }
                config = Config::default();
                session.out.success("Settings reset to defaults");
            }
            Action::Back => break,
        }
        config.save_to_file(&path)?;
        info!(path = %path.display(), "saved configuration");
        changed = true;
    }

    Ok(if changed {
        Outcome::Completed
    } else {
        Outcome::NothingToDo
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::testing::Harness;
    use crate::git::testing::FakeGit;
    use crate::prompt::Prompter;
    use crate::prompt::testing::Answer;
    use std::fs;
    use tempfile::TempDir;

    /// # Settings Listing
    ///
    /// Verifies the settings table layout.
    ///
    /// ## Test Scenario
    /// - Default configuration with a template
    ///
    /// ## Expected Outcome
    /// - One aligned row per option plus the template row
    #[test]
    fn test_render_settings() {
        let config = Config {
            commit_message_template: Some("feat:".to_string()),
            ..Config::default()
        };
        let mut out = Console::buffer();
        render_settings(&mut out, &config, &config);
        insta::assert_snapshot!(out.contents(), @r"
        Settings
          Auto-stage changes                on
          Auto-push prompt                  on
          Learn from commit history         on
          Validate before save              off
          Pull before push when behind      off
          Auto-fix formatting before save   off
          Confirm force pushes              on
          Commit message template           feat:
        ");
    }

    /// # Toggle And Reload
    ///
    /// Verifies a toggled option is written and reads back the same.
    ///
    /// ## Test Scenario
    /// - Toggle auto_push, set a template, then go back
    ///
    /// ## Expected Outcome
    /// - The file holds auto_push false and the template
    #[test]
    fn test_toggle_and_reload() {
        let dir = TempDir::new().unwrap();
        let git = FakeGit::new().with_workdir(dir.path());
        let mut h = Harness::new(
            git,
            vec![
                Answer::Select(1),
                Answer::Select(7),
                Answer::Input("chore: ".to_string()),
                Answer::Select(10),
            ],
        );
        assert_eq!(manage(&mut h.session()).unwrap(), Outcome::Completed);

        let saved = Config::load_from_file(&h.config_path).unwrap();
        assert!(!saved.auto_push);
        assert!(saved.auto_stage);
        assert_eq!(saved.commit_message_template.as_deref(), Some("chore:"));
        h.assert_script_consumed();
    }

    /// # Back Without Changes
    ///
    /// Verifies leaving straight away writes nothing.
    ///
    /// ## Test Scenario
    /// - Choose Back immediately
    ///
    /// ## Expected Outcome
    /// - NothingToDo and no file
    #[test]
    fn test_back_without_changes() {
        let dir = TempDir::new().unwrap();
        let mut h = Harness::new(FakeGit::new().with_workdir(dir.path()), vec![Answer::Select(9)]);
        assert_eq!(manage(&mut h.session()).unwrap(), Outcome::NothingToDo);
        assert!(!h.config_path.exists());
    }

    /// # Environment Overrides Shown
    ///
    /// Verifies rows whose effective value differs from the saved one show both.
    ///
    /// ## Test Scenario
    /// - Saved auto_push on, effective auto_push off and a template from the environment
    ///
    /// ## Expected Outcome
    /// - Only those two rows carry an "(effective: ...)" note
    #[test]
    fn test_render_effective_values() {
        let config = Config::default();
        let effective = Config {
            auto_push: false,
            commit_message_template: Some("wip".to_string()),
            ..Config::default()
        };
        let mut out = Console::buffer();
        render_settings(&mut out, &config, &effective);
        let text = out.contents();
        assert!(text.contains("Auto-push prompt                  on  (effective: off)"), "{text}");
        assert!(text.contains("(none)  (effective: wip)"), "{text}");
        assert_eq!(text.matches("(effective:").count(), 2, "{text}");
    }

    /// # Clearing A Global Template
    ///
    /// Verifies clearing a template inherited from the global file sticks.
    ///
    /// ## Test Scenario
    /// - Global file sets a template, no repository file
    /// - Clear the template, then go back
    ///
    /// ## Expected Outcome
    /// - Reloading both files yields no template
    #[test]
    fn test_clear_global_template() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.json");
        fs::write(&global, r#"{"commit_message_template": "wip: "}"#).unwrap();
        let git = FakeGit::new().with_workdir(dir.path());
        let mut h = Harness::new(git, vec![Answer::Select(8), Answer::Select(9)])
            .with_global_config(global.clone());

        assert_eq!(manage(&mut h.session()).unwrap(), Outcome::Completed);

        let reloaded = Config::load(Some(&global), &h.config_path);
        assert_eq!(reloaded.commit_message_template, None);
        h.assert_script_consumed();
    }

    /// # Reset Over Global Settings
    ///
    /// Verifies a reset restores defaults even where the global file disagrees.
    ///
    /// ## Test Scenario
    /// - Global file turns auto_push off
    /// - Reset and confirm, then go back
    ///
    /// ## Expected Outcome
    /// - Reloading both files yields the defaults
    #[test]
    fn test_reset_over_global() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.json");
        fs::write(&global, r#"{"auto_push": false}"#).unwrap();
        let git = FakeGit::new().with_workdir(dir.path());
        let mut h = Harness::new(
            git,
            vec![Answer::Select(8), Answer::Confirm(true), Answer::Select(9)],
        )
        .with_global_config(global.clone());

        assert_eq!(manage(&mut h.session()).unwrap(), Outcome::Completed);

        assert_eq!(Config::load_files(Some(&global), &h.config_path), Config::default());
        h.assert_script_consumed();
    }

    /// # Malformed Repository File
    ///
    /// Verifies a broken file is reported and left untouched.
    ///
    /// ## Test Scenario
    /// - Repository file holds invalid JSON
    ///
    /// ## Expected Outcome
    /// - Config error, no prompt, file content unchanged
    #[test]
    fn test_malformed_file_untouched() {
        let dir = TempDir::new().unwrap();
        let mut h = Harness::new(FakeGit::new().with_workdir(dir.path()), vec![]);
        fs::write(&h.config_path, "{ auto_stage: ").unwrap();

        assert!(matches!(manage(&mut h.session()), Err(GitcliError::Config(_))));
        assert_eq!(fs::read_to_string(&h.config_path).unwrap(), "{ auto_stage: ");
        assert!(h.prompt.asked().is_empty());
    }

    /// Answers every menu with an index past the end.
    struct OutOfRange;

    impl Prompter for OutOfRange {
        fn confirm(&mut self, _prompt: &str, default: bool) -> GitcliResult<bool> {
            Ok(default)
        }

        fn select(&mut self, _prompt: &str, items: &[String], _default: usize) -> GitcliResult<usize> {
            Ok(items.len())
        }

        fn multi_select(&mut self, _prompt: &str, _items: &[String]) -> GitcliResult<Vec<usize>> {
            Ok(vec![])
        }

        fn input(&mut self, _prompt: &str, default: Option<&str>) -> GitcliResult<String> {
            Ok(default.unwrap_or_default().to_string())
        }

        fn read_command(&mut self, _prompt: &str) -> GitcliResult<Option<String>> {
            Ok(None)
        }
    }

    /// # Out Of Range Selection
    ///
    /// Verifies an index past the menu is treated as a cancel, not a panic.
    ///
    /// ## Test Scenario
    /// - A prompter that answers with items.len()
    ///
    /// ## Expected Outcome
    /// - Cancelled error and no file written
    #[test]
    fn test_out_of_range_selection() {
        let dir = TempDir::new().unwrap();
        let git = FakeGit::new().with_workdir(dir.path());
        let config = Config::default();
        let mut prompt = OutOfRange;
        let mut out = Console::buffer();
        let mut session = Session {
            git: &git,
            prompt: &mut prompt,
            out: &mut out,
            config: &config,
            config_path: dir.path().join(crate::config::CONFIG_FILE_NAME),
            global_config_path: None,
        };
        assert!(matches!(manage(&mut session), Err(GitcliError::Cancelled)));
        assert!(!dir.path().join(crate::config::CONFIG_FILE_NAME).exists());
    }
}
