//! The fixed evaluation context a trigger is checked against.

use serde::{Deserialize, Serialize};

/// Snapshot of learner state that triggers can read.
///
/// Triggers can only name the five fields of this struct. Nothing else is
/// reachable from an expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerContext {
    /// The learner's current code.
    pub code: String,

    /// Standard output of the last execution.
    pub stdout: String,

    /// Standard error of the last execution.
    pub stderr: String,

    /// Whether the learner has passed the problem.
    pub passed: bool,

    /// Number of attempts recorded so far.
    pub attempts: u32,
}

/// One of the five names a trigger may refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    /// `code`
    Code,
    /// `stdout`
    Stdout,
    /// `stderr`
    Stderr,
    /// `passed`
    Passed,
    /// `attempts`
    Attempts,
}

impl Variable {
    /// Resolves an identifier against the closed set of variable names.
    ///
    /// Returns `None` for anything else, including names such as
    /// `constructor` or `__proto__`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "code" => Some(Self::Code),
            "stdout" => Some(Self::Stdout),
            "stderr" => Some(Self::Stderr),
            "passed" => Some(Self::Passed),
            "attempts" => Some(Self::Attempts),
            _ => None,
        }
    }

    /// Returns the identifier for this variable.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
            Self::Passed => "passed",
            Self::Attempts => "attempts",
        }
    }

    /// Returns `true` if this variable holds a string.
    #[must_use]
    pub const fn is_string(self) -> bool {
        matches!(self, Self::Code | Self::Stdout | Self::Stderr)
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TriggerContext {
    /// Creates a context for the given code with empty output, not passed,
    /// and zero attempts.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    /// Sets the captured standard output.
    #[must_use]
    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    /// Sets the captured standard error.
    #[must_use]
    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    /// Sets the passed flag.
    #[must_use]
    pub const fn with_passed(mut self, passed: bool) -> Self {
        self.passed = passed;
        self
    }

    /// Sets the attempt count.
    #[must_use]
    pub const fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Returns the string value of a string-typed variable.
    ///
    /// Returns `None` for `passed` and `attempts`.
    #[must_use]
    pub fn text(&self, variable: Variable) -> Option<&str> {
        match variable {
            Variable::Code => Some(&self.code),
            Variable::Stdout => Some(&self.stdout),
            Variable::Stderr => Some(&self.stderr),
            Variable::Passed | Variable::Attempts => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_from_name() {
        assert_eq!(Variable::from_name("code"), Some(Variable::Code));
        assert_eq!(Variable::from_name("stdout"), Some(Variable::Stdout));
        assert_eq!(Variable::from_name("stderr"), Some(Variable::Stderr));
        assert_eq!(Variable::from_name("passed"), Some(Variable::Passed));
        assert_eq!(Variable::from_name("attempts"), Some(Variable::Attempts));

        assert_eq!(Variable::from_name("Code"), None);
        assert_eq!(Variable::from_name("constructor"), None);
        assert_eq!(Variable::from_name("__proto__"), None);
        assert_eq!(Variable::from_name("process"), None);
    }

    #[test]
    fn test_variable_is_string() {
        assert!(Variable::Code.is_string());
        assert!(Variable::Stdout.is_string());
        assert!(Variable::Stderr.is_string());
        assert!(!Variable::Passed.is_string());
        assert!(!Variable::Attempts.is_string());
    }

    #[test]
    fn test_context_builder() {
        let ctx = TriggerContext::new("print(1)")
            .with_stdout("1\n")
            .with_stderr("warning")
            .with_passed(true)
            .with_attempts(4);

        assert_eq!(ctx.code, "print(1)");
        assert_eq!(ctx.text(Variable::Stdout), Some("1\n"));
        assert_eq!(ctx.text(Variable::Stderr), Some("warning"));
        assert_eq!(ctx.text(Variable::Passed), None);
        assert!(ctx.passed);
        assert_eq!(ctx.attempts, 4);
    }
}
