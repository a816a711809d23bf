//! Structural validation of guidance scripts.
//!
//! Validation runs over untyped JSON so that every problem in a script can
//! be reported in one pass, with a path pointing at the offending field.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::script::{Difficulty, StepType};

/// Outcome of validating a candidate script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// `true` when `errors` is empty.
    pub valid: bool,

    /// Path-qualified structural violations.
    pub errors: Vec<String>,

    /// Path-qualified problems that do not invalidate the script, such as
    /// triggers that can never fire.
    pub warnings: Vec<String>,
}

/// Checks guidance scripts against the structural rules.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: Config,
}

/// Validates a candidate with the default language set.
#[must_use]
pub fn validate(candidate: &Value) -> ValidationResult {
    Validator::default().validate(candidate)
}

impl Validator {
    /// Creates a validator accepting the languages listed in `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Validates a candidate script, collecting every violation.
    #[must_use]
    pub fn validate(&self, candidate: &Value) -> ValidationResult {
        let mut report = Report::default();

        match candidate.as_object() {
            Some(root) => self.check_root(root, &mut report),
            None => report.error("script", "must be a JSON object"),
        }

        ValidationResult {
            valid: report.errors.is_empty(),
            errors: report.errors,
            warnings: report.warnings,
        }
    }

    fn check_root(&self, root: &Map<String, Value>, report: &mut Report) {
        check_non_empty_string(root.get("id"), "id", report);
        check_non_empty_string(root.get("title"), "title", report);

        let difficulty = root.get("difficulty").and_then(Value::as_str);
        if difficulty.and_then(Difficulty::from_name).is_none() {
            report.error("difficulty", "must be one of easy, medium, hard");
        }

        match root.get("tags") {
            Some(Value::Array(tags)) => {
                for (i, tag) in tags.iter().enumerate() {
                    check_non_empty_string(Some(tag), &format!("tags[{i}]"), report);
                }
            }
            _ => report.error("tags", "must be an array of strings"),
        }

        match root.get("language").and_then(Value::as_str) {
            Some(language) if self.config.supports_language(language) => {}
            Some(language) => report.error(
                "language",
                format!(
                    "unsupported language '{language}' (expected one of {})",
                    self.config.supported_languages.join(", ")
                ),
            ),
            None => report.error("language", "must be a non-empty string"),
        }

        match root.get("steps") {
            Some(Value::Array(steps)) if !steps.is_empty() => {
                for (i, step) in steps.iter().enumerate() {
                    check_step(step, &format!("steps[{i}]"), report);
                }
            }
            _ => report.error("steps", "must be a non-empty array"),
        }
    }
}

#[derive(Default)]
struct Report {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Report {
    fn error(&mut self, path: &str, message: impl std::fmt::Display) {
        self.errors.push(format!("{path}: {message}"));
    }

    fn warning(&mut self, path: &str, message: impl std::fmt::Display) {
        self.warnings.push(format!("{path}: {message}"));
    }
}

/// `null` counts as absent for optional fields.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn check_non_empty_string(value: Option<&Value>, path: &str, report: &mut Report) {
    match value.and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => {}
        _ => report.error(path, "must be a non-empty string"),
    }
}

fn check_step(step: &Value, path: &str, report: &mut Report) {
    let Some(step) = step.as_object() else {
        report.error(path, "must be an object");
        return;
    };

    let step_type = match step.get("type").and_then(Value::as_str) {
        Some(name) => {
            let parsed = StepType::from_name(name);
            if parsed.is_none() {
                report.error(&format!("{path}.type"), format!("unknown step type '{name}'"));
            }
            parsed
        }
        None => {
            report.error(&format!("{path}.type"), "must be a string");
            None
        }
    };

    check_non_empty_string(step.get("content"), &format!("{path}.content"), report);
    check_trigger(step_type, present(step.get("trigger")), path, report);
    check_keywords(step_type, present(step.get("keywords")), path, report);
}

fn check_trigger(
    step_type: Option<StepType>,
    trigger: Option<&Value>,
    path: &str,
    report: &mut Report,
) {
    let field = format!("{path}.trigger");

    let Some(trigger) = trigger else {
        if step_type == Some(StepType::Hint) {
            report.error(&field, "hint steps must have a trigger");
        }
        return;
    };

    if let Some(step_type) = step_type.filter(|t| t.forbids_trigger()) {
        report.error(&field, format!("{step_type} steps must not have a trigger"));
        return;
    }

    match trigger.as_str() {
        None => report.error(&field, "must be a string"),
        Some(source) if source.trim().is_empty() => report.error(&field, "must not be empty"),
        Some(source) => {
            if let Err(e) = coach_trigger::check(source) {
                report.warning(&field, format!("never fires ({e})"));
            }
        }
    }
}

fn check_keywords(
    step_type: Option<StepType>,
    keywords: Option<&Value>,
    path: &str,
    report: &mut Report,
) {
    let field = format!("{path}.keywords");
    let is_request = step_type == Some(StepType::OnRequest);

    match keywords {
        None if is_request => report.error(&field, "on_request steps must have keywords"),
        None => {}
        Some(_) if !is_request && step_type.is_some() => {
            report.error(&field, "only on_request steps may have keywords");
        }
        Some(Value::Array(list)) if list.is_empty() && is_request => {
            report.error(&field, "on_request steps must have keywords");
        }
        Some(Value::Array(list)) => {
            for (i, keyword) in list.iter().enumerate() {
                check_non_empty_string(Some(keyword), &format!("{field}[{i}]"), report);
            }
        }
        Some(_) => report.error(&field, "must be an array of strings"),
    }
}
