//! Git hook templates and the per-language tool catalog they draw on.
//!
//! Templates either carry a fixed script or are generated from
//! [`HookSettings`]: the languages and tools the user picked when installing.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Tools known for one language.
#[derive(Debug)]
pub struct LanguageTools {
    /// Key stored in the hooks file (`python`, `rust`, ...).
    pub key: &'static str,
    pub name: &'static str,
    pub linters: &'static [(&'static str, &'static str)],
    pub formatters: &'static [(&'static str, &'static str)],
    pub test_runners: &'static [(&'static str, &'static str)],
    /// Suggested build command for the `build` template.
    pub build: &'static str,
    /// File names or `*.ext` patterns that mark the language at the repository root.
    pub detection: &'static [&'static str],
}

pub const LANGUAGES: &[LanguageTools] = &[
    LanguageTools {
        key: "python",
        name: "Python",
        linters: &[
            ("ruff", "ruff check ."),
            ("flake8", "flake8 ."),
            ("pylint", "pylint **/*.py"),
            ("mypy", "mypy ."),
        ],
        formatters: &[
            ("ruff", "ruff format ."),
            ("black", "black ."),
            ("autopep8", "autopep8 --in-place --recursive ."),
        ],
        test_runners: &[
            ("pytest", "pytest"),
            ("unittest", "python -m unittest discover"),
        ],
        build: "python -m compileall -q .",
        detection: &["*.py", "setup.py", "pyproject.toml", "requirements.txt"],
    },
    LanguageTools {
        key: "javascript",
        name: "JavaScript/TypeScript",
        linters: &[
            ("eslint", "eslint ."),
            ("tslint", "tslint -c tslint.json '**/*.ts'"),
        ],
        formatters: &[
            ("prettier", "prettier --write ."),
            ("eslint-fix", "eslint --fix ."),
        ],
        test_runners: &[
            ("jest", "jest"),
            ("npm-test", "npm test"),
            ("vitest", "vitest run"),
        ],
        build: "npm run build",
        detection: &["*.js", "*.ts", "package.json", "tsconfig.json"],
    },
    LanguageTools {
        key: "go",
        name: "Go",
        linters: &[
            ("golint", "golint ./..."),
            ("go-vet", "go vet ./..."),
            ("staticcheck", "staticcheck ./..."),
        ],
        formatters: &[("gofmt", "gofmt -w ."), ("goimports", "goimports -w .")],
        test_runners: &[("go-test", "go test ./...")],
        build: "go build ./...",
        detection: &["*.go", "go.mod"],
    },
    LanguageTools {
        key: "rust",
        name: "Rust",
        linters: &[("clippy", "cargo clippy -- -D warnings")],
        formatters: &[("rustfmt", "cargo fmt")],
        test_runners: &[("cargo-test", "cargo test")],
        build: "cargo build",
        detection: &["*.rs", "Cargo.toml"],
    },
    LanguageTools {
        key: "ruby",
        name: "Ruby",
        linters: &[("rubocop", "rubocop")],
        formatters: &[("rubocop-fix", "rubocop -a")],
        test_runners: &[
            ("rspec", "rspec"),
            ("minitest", "ruby -Itest test/**/*_test.rb"),
        ],
        build: "bundle exec rake build",
        detection: &["*.rb", "Gemfile"],
    },
];

/// Catalog entry for a language key.
pub fn language(key: &str) -> Option<&'static LanguageTools> {
    LANGUAGES.iter().find(|l| l.key == key)
}

/// Languages whose detection patterns match a file at the top of `root`.
pub fn detect_languages(root: &Path) -> Vec<&'static LanguageTools> {
    let names: Vec<String> = match fs::read_dir(root) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .collect(),
        Err(_) => return Vec::new(),
    };
    LANGUAGES
        .iter()
        .filter(|lang| {
            lang.detection.iter().any(|pattern| {
                glob::Pattern::new(pattern)
                    .map(|p| names.iter().any(|n| p.matches(n)))
                    .unwrap_or(false)
            })
        })
        .collect()
}

/// The four hook types with templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookType {
    PreCommit,
    PrePush,
    CommitMsg,
    PostCommit,
}

impl HookType {
    pub const ALL: [HookType; 4] = [
        HookType::PreCommit,
        HookType::PrePush,
        HookType::CommitMsg,
        HookType::PostCommit,
    ];

    /// File name under the hooks directory.
    pub fn file_name(self) -> &'static str {
        match self {
            HookType::PreCommit => "pre-commit",
            HookType::PrePush => "pre-push",
            HookType::CommitMsg => "commit-msg",
            HookType::PostCommit => "post-commit",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            HookType::PreCommit => "Pre-commit Hook",
            HookType::PrePush => "Pre-push Hook",
            HookType::CommitMsg => "Commit Message Hook",
            HookType::PostCommit => "Post-commit Hook",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            HookType::PreCommit => "Runs before each commit",
            HookType::PrePush => "Runs before pushing to remote",
            HookType::CommitMsg => "Validates commit message format",
            HookType::PostCommit => "Runs after each commit",
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.file_name() == name)
    }

    pub fn templates(self) -> &'static [Template] {
        match self {
            HookType::PreCommit => PRE_COMMIT,
            HookType::PrePush => PRE_PUSH,
            HookType::CommitMsg => COMMIT_MSG,
            HookType::PostCommit => POST_COMMIT,
        }
    }

    pub fn template(self, key: &str) -> Option<&'static Template> {
        self.templates().iter().find(|t| t.key == key)
    }
}

/// What a configurable template needs from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setup {
    /// Fixed script; nothing to configure.
    None,
    /// Pick tools of this kind per language.
    Tools(ToolKind),
    /// A build command per language.
    Build,
    /// Free-form commands.
    Custom,
}

/// Tool category in the language catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Linters,
    Formatters,
    TestRunners,
}

impl ToolKind {
    pub fn label(self) -> &'static str {
        match self {
            ToolKind::Linters => "linters",
            ToolKind::Formatters => "formatters",
            ToolKind::TestRunners => "test runners",
        }
    }

    pub fn catalog(self, lang: &LanguageTools) -> &'static [(&'static str, &'static str)] {
        match self {
            ToolKind::Linters => lang.linters,
            ToolKind::Formatters => lang.formatters,
            ToolKind::TestRunners => lang.test_runners,
        }
    }
}

/// One installable hook template.
#[derive(Debug)]
pub struct Template {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub setup: Setup,
    /// Script body for templates with [`Setup::None`].
    pub script: Option<&'static str>,
}

const PRE_COMMIT: &[Template] = &[
    Template {
        key: "linting",
        name: "Code Linting",
        description: "Run linters before commit",
        setup: Setup::Tools(ToolKind::Linters),
        script: None,
    },
    Template {
        key: "formatting",
        name: "Auto-format Code",
        description: "Auto-format code before commit",
        setup: Setup::Tools(ToolKind::Formatters),
        script: None,
    },
    Template {
        key: "tests",
        name: "Run Tests",
        description: "Run test suite before commit",
        setup: Setup::Tools(ToolKind::TestRunners),
        script: None,
    },
    Template {
        key: "no-debug",
        name: "Block Debug Code",
        description: "Prevent commits with debug statements",
        setup: Setup::None,
        script: Some(NO_DEBUG),
    },
    Template {
        key: "custom",
        name: "Custom Commands",
        description: "Run your own custom commands",
        setup: Setup::Custom,
        script: None,
    },
];

const PRE_PUSH: &[Template] = &[
    Template {
        key: "tests",
        name: "Run Full Test Suite",
        description: "Run all tests before push",
        setup: Setup::Tools(ToolKind::TestRunners),
        script: None,
    },
    Template {
        key: "protect-main",
        name: "Protect Main Branch",
        description: "Prevent direct pushes to main/master",
        setup: Setup::None,
        script: Some(PROTECT_MAIN),
    },
    Template {
        key: "build",
        name: "Build Before Push",
        description: "Ensure project builds successfully",
        setup: Setup::Build,
        script: None,
    },
    Template {
        key: "custom",
        name: "Custom Commands",
        description: "Run your own custom commands",
        setup: Setup::Custom,
        script: None,
    },
];

const COMMIT_MSG: &[Template] = &[
    Template {
        key: "conventional",
        name: "Conventional Commits",
        description: "Enforce conventional commit format",
        setup: Setup::None,
        script: Some(CONVENTIONAL),
    },
    Template {
        key: "min-length",
        name: "Minimum Message Length",
        description: "Require minimum commit message length",
        setup: Setup::None,
        script: Some(MIN_LENGTH),
    },
    Template {
        key: "no-wip",
        name: "Block WIP Commits",
        description: "Prevent commits with WIP in message",
        setup: Setup::None,
        script: Some(NO_WIP),
    },
];

const POST_COMMIT: &[Template] = &[
    Template {
        key: "notify",
        name: "Commit Notification",
        description: "Send notification after commit",
        setup: Setup::None,
        script: Some(NOTIFY),
    },
    Template {
        key: "backup",
        name: "Auto Backup",
        description: "Create backup after commit",
        setup: Setup::None,
        script: Some(BACKUP),
    },
];

const NO_DEBUG: &str = r#"#!/bin/sh
# gitcli: Block Debug Code pre-commit hook

echo "Checking for debug statements..."

if git diff --cached | grep -E "(console\.log|debugger|pdb\.set_trace|import pdb|binding\.pry)" >/dev/null 2>&1; then
    echo "Debug statements found in staged files!"
    echo "Please remove debug code before committing."
    exit 1
fi

echo "No debug statements found."
"#;

const PROTECT_MAIN: &str = r#"#!/bin/sh
# gitcli: Protect Main Branch pre-push hook

current_branch=$(git symbolic-ref --short HEAD)

if [ "$current_branch" = "main" ] || [ "$current_branch" = "master" ]; then
    echo "Direct push to $current_branch is not allowed!"
    echo "Please create a feature branch and submit a pull request."
    exit 1
fi

echo "Branch check passed."
"#;

const CONVENTIONAL: &str = r#"#!/bin/sh
# gitcli: Conventional Commits commit-msg hook

commit_msg=$(cat "$1")

if ! echo "$commit_msg" | grep -qE "^(feat|fix|docs|style|refactor|test|chore|perf|ci|build|revert)(\(.+\))?: .{1,}"; then
    echo "Invalid commit message format!"
    echo ""
    echo "Commit messages must follow the Conventional Commits format:"
    echo "  type(scope): description"
    echo ""
    echo "Types: feat, fix, docs, style, refactor, test, chore, perf, ci, build, revert"
    exit 1
fi
"#;

const MIN_LENGTH: &str = r#"#!/bin/sh
# gitcli: Minimum Message Length commit-msg hook

commit_msg=$(cat "$1")
min_length=10

if [ ${#commit_msg} -lt $min_length ]; then
    echo "Commit message too short!"
    echo "Minimum length: $min_length characters"
    echo "Current length: ${#commit_msg} characters"
    exit 1
fi
"#;

const NO_WIP: &str = r#"#!/bin/sh
# gitcli: Block WIP Commits commit-msg hook

if grep -qiE "^(wip|work in progress)" "$1"; then
    echo "WIP commits are not allowed!"
    echo "Please complete your work before committing."
    exit 1
fi
"#;

const NOTIFY: &str = r#"#!/bin/sh
# gitcli: Commit Notification post-commit hook

commit_msg=$(git log -1 --pretty=%B)
commit_hash=$(git log -1 --pretty=%h)

echo "Commit $commit_hash created."

if command -v osascript >/dev/null 2>&1; then
    osascript -e "display notification \"$commit_msg\" with title \"Commit Successful\""
fi

if command -v notify-send >/dev/null 2>&1; then
    notify-send "Commit Successful" "$commit_msg"
fi
"#;

const BACKUP: &str = r#"#!/bin/sh
# gitcli: Auto Backup post-commit hook

backup_dir="../.git-backups"
timestamp=$(date +%Y%m%d_%H%M%S)
repo_name=$(basename "$(git rev-parse --show-toplevel)")

mkdir -p "$backup_dir"
git bundle create "$backup_dir/${repo_name}_${timestamp}.bundle" --all

echo "Backup created: ${repo_name}_${timestamp}.bundle"
"#;

/// Tools picked for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSelection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linters: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub formatters: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_runners: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_commands: Vec<String>,
}

impl LanguageSelection {
    pub fn tools(&self, kind: ToolKind) -> &[String] {
        match kind {
            ToolKind::Linters => &self.linters,
            ToolKind::Formatters => &self.formatters,
            ToolKind::TestRunners => &self.test_runners,
        }
    }

    pub fn tools_mut(&mut self, kind: ToolKind) -> &mut Vec<String> {
        match kind {
            ToolKind::Linters => &mut self.linters,
            ToolKind::Formatters => &mut self.formatters,
            ToolKind::TestRunners => &mut self.test_runners,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.linters.is_empty()
            && self.formatters.is_empty()
            && self.test_runners.is_empty()
            && self.build_commands.is_empty()
    }
}

/// Configuration recorded for a generated hook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookSettings {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub languages: BTreeMap<String, LanguageSelection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_commands: Vec<String>,
}

impl HookSettings {
    pub fn is_empty(&self) -> bool {
        self.languages.values().all(LanguageSelection::is_empty) && self.custom_commands.is_empty()
    }

    /// Catalog commands for every selected tool of `kind`, in language order.
    pub fn commands(&self, kind: ToolKind) -> Vec<(&'static str, String, &'static str)> {
        let mut out = Vec::new();
        for (key, selection) in &self.languages {
            let Some(lang) = language(key) else { continue };
            for tool in selection.tools(kind) {
                if let Some((_, command)) = kind.catalog(lang).iter().find(|(name, _)| name == tool) {
                    out.push((lang.name, tool.clone(), *command));
                }
            }
        }
        out
    }
}

/// First word of a command, used to check the tool is installed.
fn binary_of(command: &str) -> &str {
    command.split_whitespace().next().unwrap_or(command)
}

/// Script text for `template` on `hook`.
///
/// Fixed templates return their script; the rest are generated from
/// `settings`. Returns `None` for an unknown template key.
pub fn generate_script(hook: HookType, template_key: &str, settings: &HookSettings) -> Option<String> {
    let template = hook.template(template_key)?;
    if let Some(script) = template.script {
        return Some(script.to_string());
    }

    let mut script = String::new();
    let _ = writeln!(script, "#!/bin/sh");
    let _ = writeln!(script, "# gitcli: {} {} hook", template.name, hook.file_name());
    let _ = writeln!(script);

    match template.setup {
        Setup::Tools(kind) => {
            let (banner, done, fatal) = match kind {
                ToolKind::Linters => ("Running linters...", "Linting passed.", true),
                ToolKind::Formatters => ("Formatting code...", "Formatting complete.", false),
                ToolKind::TestRunners => ("Running tests...", "Tests passed.", true),
            };
            let _ = writeln!(script, "echo \"{banner}\"");
            let mut current = "";
            for (lang, tool, command) in settings.commands(kind) {
                if lang != current {
                    let _ = writeln!(script, "\n# {lang}");
                    current = lang;
                }
                let _ = writeln!(
                    script,
                    "if command -v {} >/dev/null 2>&1; then",
                    binary_of(command)
                );
                let _ = writeln!(script, "    echo \"  -> {tool}\"");
                if fatal {
                    let _ = writeln!(script, "    {command} || exit 1");
                } else {
                    let _ = writeln!(script, "    {command}");
                    let _ = writeln!(script, "    git add -u");
                }
                let _ = writeln!(script, "fi");
            }
            let _ = writeln!(script, "\necho \"{done}\"");
        }
        Setup::Build => {
            let _ = writeln!(script, "echo \"Building project...\"");
            for (key, selection) in &settings.languages {
                if selection.build_commands.is_empty() {
                    continue;
                }
                let name = language(key).map_or(key.as_str(), |l| l.name);
                let _ = writeln!(script, "\n# {name}");
                for command in &selection.build_commands {
                    let _ = writeln!(script, "echo \"  -> {command}\"");
                    let _ = writeln!(script, "{command} || exit 1");
                }
            }
            let _ = writeln!(script, "\necho \"Build successful.\"");
        }
        Setup::Custom => {
            let _ = writeln!(script, "echo \"Running custom commands...\"");
            for command in &settings.custom_commands {
                let _ = writeln!(script, "echo \"  -> {command}\"");
                let _ = writeln!(script, "{command} || exit 1");
            }
            let _ = writeln!(script, "\necho \"Custom commands completed.\"");
        }
        Setup::None => {}
    }
    Some(script)
}
