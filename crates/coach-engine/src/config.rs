//! Configuration for the coaching engine.
//!
//! Settings live in an optional `coach.json`. Every field has a default, so
//! a missing file or an empty object yields a usable configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoachError, Result};

/// The default config file name.
pub const CONFIG_FILE_NAME: &str = "coach.json";

/// Default directory problem identifiers are resolved against.
fn default_scripts_dir() -> String {
    "scripts".to_string()
}

/// Default set of languages a guidance script may target.
fn default_supported_languages() -> Vec<String> {
    [
        "python",
        "javascript",
        "typescript",
        "java",
        "c",
        "cpp",
        "go",
        "rust",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Default maximum script size in bytes (256KB).
const fn default_max_script_size() -> u64 {
    256 * 1024
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory containing `<problemId>.json` guidance scripts.
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: String,

    /// Languages accepted in a script's `language` field, case-insensitive.
    #[serde(default = "default_supported_languages")]
    pub supported_languages: Vec<String>,

    /// Largest script file the loader will read, in bytes.
    #[serde(default = "default_max_script_size")]
    pub max_script_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scripts_dir: default_scripts_dir(),
            supported_languages: default_supported_languages(),
            max_script_size: default_max_script_size(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `coach.json` exists but is invalid.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            CoachError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads `coach.json` from a specific directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `CoachError::ConfigParseError` if the file cannot be read or
    /// is not valid JSON, and `CoachError::ConfigValidationError` if a value
    /// is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(CoachError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| CoachError::config_parse(path, e.to_string()))?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `CoachError::ConfigValidationError` on the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.scripts_dir.trim().is_empty() {
            return Err(CoachError::config_validation(
                "scriptsDir must not be empty",
                "Provide a scripts directory in your coach.json (use '.' for current directory)",
            ));
        }

        if self.supported_languages.is_empty() {
            return Err(CoachError::config_validation(
                "supportedLanguages must not be empty",
                "List at least one language in supportedLanguages in your coach.json",
            ));
        }

        if self
            .supported_languages
            .iter()
            .any(|lang| lang.trim().is_empty())
        {
            return Err(CoachError::config_validation(
                "supportedLanguages must not contain empty entries",
                "Remove blank entries from supportedLanguages in your coach.json",
            ));
        }

        if self.max_script_size == 0 {
            return Err(CoachError::config_validation(
                "maxScriptSize must be greater than 0",
                "Set maxScriptSize to a positive number of bytes in your coach.json",
            ));
        }

        Ok(())
    }

    /// Returns `true` if `language` is in the supported set, ignoring case.
    #[must_use]
    pub fn supports_language(&self, language: &str) -> bool {
        self.supported_languages
            .iter()
            .any(|lang| lang.eq_ignore_ascii_case(language))
    }

    /// Resolves a problem identifier to its script path.
    #[must_use]
    pub fn script_path(&self, problem_id: &str) -> PathBuf {
        Path::new(&self.scripts_dir).join(format!("{problem_id}.json"))
    }
}
