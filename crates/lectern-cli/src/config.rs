//! Configuration file support

use lectern_api::StudyClient;
use lectern_session::{Difficulty, QuizPrompt, SessionConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for lectern
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the study server
    pub server_url: Option<String>,
    /// Where conversations are saved, one JSON file per document
    pub conversations_dir: Option<PathBuf>,
    /// Pause before a generated quiz is offered, in milliseconds
    pub quiz_delay_ms: Option<u64>,
    /// Questions requested by `/quiz` without a count
    pub quiz_questions: Option<usize>,
    /// Difficulty requested by `/quiz` without one
    pub quiz_difficulty: Option<Difficulty>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lectern")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("LECTERN_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Default location for saved conversations
    pub fn default_conversations_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lectern")
            .join("conversations")
    }

    /// Load config from the default path
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, falling back to defaults on any problem
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            server_url: Some(StudyClient::DEFAULT_BASE_URL.to_string()),
            conversations_dir: None,
            quiz_delay_ms: Some(1500),
            quiz_questions: Some(lectern_session::prompt::DEFAULT_QUESTIONS),
            quiz_difficulty: Some(Difficulty::Medium),
        };

        default_config.save_to(&path)?;
        Ok(path)
    }

    pub fn server_url(&self) -> String {
        self.server_url
            .clone()
            .unwrap_or_else(|| StudyClient::DEFAULT_BASE_URL.to_string())
    }

    pub fn conversations_dir(&self) -> PathBuf {
        self.conversations_dir
            .clone()
            .unwrap_or_else(Self::default_conversations_dir)
    }

    pub fn session_config(&self) -> SessionConfig {
        match self.quiz_delay_ms {
            Some(ms) => SessionConfig {
                quiz_delay: Duration::from_millis(ms),
            },
            None => SessionConfig::default(),
        }
    }

    /// The prompt `/quiz` starts from before its arguments are applied
    pub fn quiz_defaults(&self) -> QuizPrompt {
        let defaults = QuizPrompt::default();
        QuizPrompt::new(
            self.quiz_questions.unwrap_or(defaults.questions),
            self.quiz_difficulty.unwrap_or(defaults.difficulty),
        )
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# lectern configuration file
# Place at ~/.config/lectern/config.toml (Linux) or set LECTERN_CONFIG_PATH

# Study server to talk to
server_url = "http://localhost:8000"

# Where conversations are saved (one JSON file per document)
# conversations_dir = "/home/me/.local/share/lectern/conversations"

# Pause after a quiz response before the quiz is offered
quiz_delay_ms = 1500

# Defaults for /quiz
quiz_questions = 5
quiz_difficulty = "medium"   # easy, medium or hard
"#
}
