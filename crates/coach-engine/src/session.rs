//! Session state tracking.
//!
//! A [`SessionTracker`] owns the mutable record of one learner working on one
//! problem. It is the only way session state changes, and it builds the
//! [`TriggerContext`] snapshots that guidance triggers are evaluated against.

use chrono::{DateTime, Utc};
use coach_trigger::TriggerContext;
use serde::{Deserialize, Serialize};

// ============================================================================
// Execution results
// ============================================================================

/// Outcome of a single test case run by the execution harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// Test case name.
    pub name: String,

    /// Whether the test case passed.
    pub passed: bool,

    /// Expected output, if the harness reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,

    /// Actual output, if the harness reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,

    /// Error raised by the test case, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of running learner code, as supplied by the execution harness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Captured standard output.
    #[serde(default)]
    pub stdout: String,

    /// Captured standard error.
    #[serde(default)]
    pub stderr: String,

    /// Whether the run counts as solving the problem.
    #[serde(default)]
    pub passed: bool,

    /// Process exit code.
    #[serde(default)]
    pub exit_code: i32,

    /// Per-test outcomes, when the harness runs a test suite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_results: Option<Vec<TestResult>>,
}

impl ExecutionResult {
    /// Creates a result with the given output streams, not passed, exit code 0.
    #[must_use]
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            ..Self::default()
        }
    }

    /// Sets the passed flag.
    #[must_use]
    pub const fn with_passed(mut self, passed: bool) -> Self {
        self.passed = passed;
        self
    }

    /// Sets the exit code.
    #[must_use]
    pub const fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    /// Attaches per-test outcomes.
    #[must_use]
    pub fn with_test_results(mut self, test_results: Vec<TestResult>) -> Self {
        self.test_results = Some(test_results);
        self
    }
}

// ============================================================================
// SessionState
// ============================================================================

/// Snapshot of a learner's progress on one problem.
///
/// `code_history.len() == attempts` holds for every state produced by a
/// [`SessionTracker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Problem the session is for.
    pub problem_id: String,

    /// Number of recorded attempts.
    pub attempts: u32,

    /// Whether the learner has passed.
    pub passed: bool,

    /// Standard output of the last execution.
    pub last_output: String,

    /// Standard error of the last execution.
    pub last_error: String,

    /// Code submitted on each attempt, oldest first.
    pub code_history: Vec<String>,

    /// Number of hints shown.
    pub hints_viewed: u32,

    /// When the session began.
    pub started_at: DateTime<Utc>,
}

impl SessionState {
    fn new(problem_id: String) -> Self {
        Self {
            problem_id,
            attempts: 0,
            passed: false,
            last_output: String::new(),
            last_error: String::new(),
            code_history: Vec::new(),
            hints_viewed: 0,
            started_at: Utc::now(),
        }
    }
}

// ============================================================================
// SessionTracker
// ============================================================================

/// Owns and mutates the state of a single coaching session.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    state: SessionState,
}

impl SessionTracker {
    /// Starts a new session for `problem_id`.
    #[must_use]
    pub fn new(problem_id: impl Into<String>) -> Self {
        Self {
            state: SessionState::new(problem_id.into()),
        }
    }

    /// Records a submission: increments `attempts` and appends to the history.
    pub fn record_attempt(&mut self, code: impl Into<String>) {
        self.state.attempts = self.state.attempts.saturating_add(1);
        self.state.code_history.push(code.into());
        tracing::trace!(attempts = self.state.attempts, "Recorded attempt");
    }

    /// Stores the output of an execution and marks the session passed if the
    /// execution passed.
    pub fn record_execution(&mut self, result: &ExecutionResult) {
        self.state.last_output.clone_from(&result.stdout);
        self.state.last_error.clone_from(&result.stderr);
        if result.passed {
            self.mark_passed();
        }
    }

    /// Marks the session passed. Idempotent.
    pub fn mark_passed(&mut self) {
        if !self.state.passed {
            tracing::debug!(problem_id = %self.state.problem_id, "Session passed");
        }
        self.state.passed = true;
    }

    /// Increments the hints-viewed counter.
    pub fn increment_hints_viewed(&mut self) {
        self.state.hints_viewed = self.state.hints_viewed.saturating_add(1);
    }

    /// Reinitializes every field, including a fresh start time.
    pub fn reset(&mut self, problem_id: impl Into<String>) {
        self.state = SessionState::new(problem_id.into());
        tracing::info!(problem_id = %self.state.problem_id, "Session reset");
    }

    /// Returns an owned copy of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.clone()
    }

    /// Number of recorded attempts.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.state.attempts
    }

    /// Number of hints shown.
    #[must_use]
    pub const fn hints_viewed(&self) -> u32 {
        self.state.hints_viewed
    }

    /// Whether the learner has passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.state.passed
    }

    /// Builds a trigger context from `code` and the current session state.
    #[must_use]
    pub fn trigger_context(&self, code: impl Into<String>) -> TriggerContext {
        TriggerContext::new(code)
            .with_stdout(self.state.last_output.clone())
            .with_stderr(self.state.last_error.clone())
            .with_passed(self.state.passed)
            .with_attempts(self.state.attempts)
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new(String::new())
    }
}
