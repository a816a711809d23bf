//! Guidance script model and loader.
//!
//! A guidance script is a JSON document describing one problem and an
//! ordered list of coaching steps. [`ScriptLoader`] reads scripts from disk,
//! runs them through the [`Validator`], and hands back a typed
//! [`GuidanceScript`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::{CoachError, Result};
use crate::validator::Validator;

// ============================================================================
// Script model
// ============================================================================

/// Problem difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Easy.
    Easy,
    /// Medium.
    Medium,
    /// Hard.
    Hard,
}

impl Difficulty {
    /// Every difficulty, in ascending order.
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    /// Returns the lowercase name used in scripts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Parses a difficulty name. Names are case-sensitive.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == name)
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of a guidance step, which decides when it is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    /// Shown when the learner opens the problem.
    Intro,
    /// Shown before the learner starts writing code.
    PrePrompt,
    /// Considered after every execution; may carry a trigger.
    OnRun,
    /// Shown once the learner has passed.
    AfterSuccess,
    /// Matched against free-text questions by keyword.
    OnRequest,
    /// Returned on a hint request when its trigger holds.
    Hint,
}

impl StepType {
    /// Every step type, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Intro,
        Self::PrePrompt,
        Self::OnRun,
        Self::AfterSuccess,
        Self::OnRequest,
        Self::Hint,
    ];

    /// Returns the snake_case name used in scripts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::PrePrompt => "pre_prompt",
            Self::OnRun => "on_run",
            Self::AfterSuccess => "after_success",
            Self::OnRequest => "on_request",
            Self::Hint => "hint",
        }
    }

    /// Parses a step type name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Step types that must never carry a trigger.
    #[must_use]
    pub const fn forbids_trigger(self) -> bool {
        matches!(self, Self::Intro | Self::PrePrompt | Self::AfterSuccess)
    }
}

impl std::fmt::Display for StepType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of coaching content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidanceStep {
    /// When this step applies.
    #[serde(rename = "type")]
    pub step_type: StepType,

    /// Content template; may contain `{{title}}`, `{{difficulty}}`, and
    /// `{{attempts}}` placeholders.
    pub content: String,

    /// Trigger expression gating `hint` and `on_run` steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,

    /// Keywords matched against questions for `on_request` steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

impl GuidanceStep {
    /// Creates a step without trigger or keywords.
    #[must_use]
    pub fn new(step_type: StepType, content: impl Into<String>) -> Self {
        Self {
            step_type,
            content: content.into(),
            trigger: None,
            keywords: None,
        }
    }

    /// Sets the trigger expression.
    #[must_use]
    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    /// Sets the request keywords.
    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = Some(keywords.into_iter().map(Into::into).collect());
        self
    }
}

/// A complete guidance script for one problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidanceScript {
    /// Problem identifier.
    pub id: String,

    /// Human-readable problem title.
    pub title: String,

    /// Problem difficulty.
    pub difficulty: Difficulty,

    /// Free-form topic tags.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Target programming language.
    pub language: String,

    /// Steps in declaration order.
    pub steps: Vec<GuidanceStep>,
}

impl GuidanceScript {
    /// Summary of this script's metadata.
    #[must_use]
    pub fn info(&self) -> ScriptInfo {
        ScriptInfo {
            id: self.id.clone(),
            title: self.title.clone(),
            difficulty: self.difficulty,
            tags: self.tags.clone(),
            language: self.language.clone(),
            step_count: self.steps.len(),
        }
    }

    /// Steps of the given type with their indices, in declaration order.
    pub fn steps_of(&self, step_type: StepType) -> impl Iterator<Item = (usize, &GuidanceStep)> {
        self.steps
            .iter()
            .enumerate()
            .filter(move |(_, step)| step.step_type == step_type)
    }
}

/// Script metadata exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptInfo {
    /// Problem identifier.
    pub id: String,
    /// Problem title.
    pub title: String,
    /// Problem difficulty.
    pub difficulty: Difficulty,
    /// Topic tags.
    pub tags: Vec<String>,
    /// Target language.
    pub language: String,
    /// Number of steps.
    pub step_count: usize,
}

// ============================================================================
// ScriptLoader
// ============================================================================

/// Reads guidance scripts from disk and validates them.
#[derive(Debug, Clone, Default)]
pub struct ScriptLoader {
    config: Config,
    validator: Validator,
}

impl ScriptLoader {
    /// Creates a loader using the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let validator = Validator::new(config.clone());
        Self { config, validator }
    }

    /// The loader's configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The validator scripts are checked with.
    #[must_use]
    pub const fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Resolves a script reference to a path.
    ///
    /// A reference that names an existing file, ends in `.json`, or contains a
    /// path separator is used as a path. Anything else is treated as a problem
    /// identifier under `scriptsDir`.
    #[must_use]
    pub fn resolve(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        let looks_like_path = path.extension().is_some_and(|ext| ext == "json")
            || path.components().count() > 1
            || path.is_file();
        if looks_like_path {
            path.to_path_buf()
        } else {
            self.config.script_path(reference)
        }
    }

    /// Reads and validates a script.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CoachError::ScriptTooLarge`, `CoachError::ScriptLoadError`, or
    /// `CoachError::ScriptValidationError`.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Option<GuidanceScript>> {
        let path = path.as_ref();
        let Some(bytes) = self.read(path)? else {
            return Ok(None);
        };
        let value = decode(path, &bytes)?;
        self.finish(path, &value).map(Some)
    }

    /// Async variant of [`ScriptLoader::load`] using the tokio filesystem.
    ///
    /// # Errors
    ///
    /// Same as [`ScriptLoader::load`].
    pub async fn load_async(&self, path: impl AsRef<Path>) -> Result<Option<GuidanceScript>> {
        let path = path.as_ref();
        let Some(value) = self.read_value_async(path).await? else {
            return Ok(None);
        };
        self.finish(path, &value).map(Some)
    }

    /// Reads a script as raw JSON without validating its structure.
    ///
    /// Applies the same size limit and UTF-8 and JSON checks as
    /// [`ScriptLoader::load`]. Returns `Ok(None)` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CoachError::ScriptTooLarge` or `CoachError::ScriptLoadError`.
    pub async fn read_value_async(&self, path: impl AsRef<Path>) -> Result<Option<Value>> {
        let path = path.as_ref();
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CoachError::script_load(path, e.to_string())),
        };
        self.check_size(path, metadata.len())?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CoachError::script_load(path, e.to_string()))?;
        decode(path, &bytes).map(Some)
    }

    /// Validates a JSON value and converts it into a typed script.
    ///
    /// # Errors
    ///
    /// Returns `CoachError::ScriptValidationError` with every violation.
    pub fn parse_value(&self, value: &Value) -> Result<GuidanceScript> {
        let result = self.validator.validate(value);
        if !result.valid {
            return Err(CoachError::script_validation(result.errors));
        }
        for warning in &result.warnings {
            tracing::warn!(%warning, "Guidance script warning");
        }
        Ok(serde_json::from_value(value.clone())?)
    }

    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Guidance script not found");
                return Ok(None);
            }
            Err(e) => return Err(CoachError::script_load(path, e.to_string())),
        };
        self.check_size(path, metadata.len())?;

        std::fs::read(path)
            .map(Some)
            .map_err(|e| CoachError::script_load(path, e.to_string()))
    }

    fn check_size(&self, path: &Path, size: u64) -> Result<()> {
        if size > self.config.max_script_size {
            return Err(CoachError::script_too_large(
                path,
                size,
                self.config.max_script_size,
            ));
        }
        Ok(())
    }

    fn finish(&self, path: &Path, value: &Value) -> Result<GuidanceScript> {
        let script = self.parse_value(value)?;
        tracing::debug!(path = %path.display(), id = %script.id, "Loaded guidance script");
        Ok(script)
    }
}

fn decode(path: &Path, bytes: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CoachError::script_load(path, format!("invalid UTF-8: {e}")))?;
    serde_json::from_str(text)
        .map_err(|e| CoachError::script_load(path, format!("invalid JSON: {e}")))
}
