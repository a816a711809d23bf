//! Error types for the coaching engine.
//!
//! Trigger evaluation failures never appear here: they are recovered inside
//! `coach_trigger` and surface only as a step that does not match. This
//! module covers configuration, script loading, and script validation.

use std::path::PathBuf;

/// A specialized `Result` type for coaching engine operations.
pub type Result<T> = std::result::Result<T, CoachError>;

/// Errors that can occur while configuring the engine or loading scripts.
#[derive(Debug, thiserror::Error)]
pub enum CoachError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your coach.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Script Errors
    // ========================================================================
    /// The script file could not be read or is not well-formed JSON.
    #[error("Failed to load guidance script '{path}': {message}\n\nSuggestion: Check that the file is readable, UTF-8 encoded, and valid JSON")]
    ScriptLoadError {
        /// Path to the script file.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// The script file exceeds the configured size limit.
    #[error("Guidance script exceeds size limit ({limit_kb}KB): '{path}' is {size_kb}KB\n\nSuggestion: Split the script or raise maxScriptSize in coach.json")]
    ScriptTooLarge {
        /// Path to the oversized script.
        path: PathBuf,
        /// Actual size in kilobytes.
        size_kb: u64,
        /// Configured limit in kilobytes.
        limit_kb: u64,
    },

    /// The script is structurally invalid.
    ///
    /// Carries every violation found, not just the first.
    #[error("Guidance script is invalid ({} error(s)):\n  {}\n\nSuggestion: Fix every listed problem and load the script again", .errors.len(), .errors.join("\n  "))]
    ScriptValidationError {
        /// Path-qualified violation messages.
        errors: Vec<String>,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoachError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `ScriptLoadError`.
    #[must_use]
    pub fn script_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ScriptLoadError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ScriptTooLarge` error from byte sizes.
    #[must_use]
    pub fn script_too_large(path: impl Into<PathBuf>, size_bytes: u64, limit_bytes: u64) -> Self {
        Self::ScriptTooLarge {
            path: path.into(),
            size_kb: size_bytes.div_ceil(1024),
            limit_kb: limit_bytes / 1024,
        }
    }

    /// Creates a new `ScriptValidationError` from aggregated diagnostics.
    #[must_use]
    pub const fn script_validation(errors: Vec<String>) -> Self {
        Self::ScriptValidationError { errors }
    }

    /// Returns `true` if this error concerns a guidance script rather than
    /// configuration or general I/O.
    #[must_use]
    pub const fn is_script_error(&self) -> bool {
        matches!(
            self,
            Self::ScriptLoadError { .. }
                | Self::ScriptTooLarge { .. }
                | Self::ScriptValidationError { .. }
        )
    }

    /// Returns the aggregated validation diagnostics, or an empty slice for
    /// every other error.
    #[must_use]
    pub fn diagnostics(&self) -> &[String] {
        match self {
            Self::ScriptValidationError { errors } => errors,
            _ => &[],
        }
    }
}
