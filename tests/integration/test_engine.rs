//! End-to-end tests for the coaching engine
//!
//! These tests load guidance scripts from the fixtures directory and drive a
//! full learner session through the public engine API.

use std::path::PathBuf;

use coach_engine::{
    CoachError, CoachingEngine, Config, ExecutionResult, ScriptLoader, SessionTracker,
};

/// Path to the fixtures directory.
fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Loader resolving problem ids against the fixture scripts.
fn fixture_loader() -> ScriptLoader {
    let mut config = Config::load_from_file(&fixture_path().join("coach.json"))
        .expect("Failed to load fixture config");
    config.scripts_dir = fixture_path().join("scripts").display().to_string();
    ScriptLoader::new(config)
}

fn engine() -> CoachingEngine {
    CoachingEngine::new(SessionTracker::new("two-sum")).with_loader(fixture_loader())
}

/// Tests that the fixture config loads with its overrides.
#[test]
fn test_fixture_config_loads() {
    let config = Config::load_from_file(&fixture_path().join("coach.json"))
        .expect("Failed to load config");
    assert_eq!(config.scripts_dir, "fixtures/scripts");
    assert_eq!(config.supported_languages, vec!["python", "javascript", "rust"]);
    assert_eq!(config.max_script_size, 65536);
}

/// Tests a complete learner session against the Two Sum script.
#[test]
fn test_two_sum_session() {
    let loader = fixture_loader();
    let path = loader.resolve("two-sum");
    let mut engine = engine();

    assert!(engine.load_script(&path).expect("Failed to load script"));

    let info = engine.script_info().expect("Script info missing");
    assert_eq!(info.title, "Two Sum");
    assert_eq!(info.step_count, 11);

    assert_eq!(
        engine.introduction().as_deref(),
        Some("Welcome to Two Sum (easy). Find two numbers that add up to the target.")
    );
    assert!(engine.pre_prompt().is_some());

    // No hint before any attempts with unrelated code.
    assert!(engine.hint("x").is_none());
    assert_eq!(engine.session().hints_viewed(), 0);

    // Attempt 1 crashes.
    let crash = ExecutionResult::new("", "IndexError: list index out of range").with_exit_code(1);
    let guidance = engine.process_execution("v1", &crash);
    assert!(guidance
        .expect("Expected on_run guidance")
        .starts_with("An IndexError"));

    // Attempt 2 fails quietly: nothing matches.
    let wrong = ExecutionResult::new("[1, 1]", "");
    assert!(engine.process_execution("v2", &wrong).is_none());

    // Attempt 3 fails again.
    assert_eq!(
        engine.process_execution("v3", &wrong).as_deref(),
        Some("Attempt 3 and still failing. Try tracing the first test case by hand.")
    );

    // The nested-loop hint is declared first, so it wins for nested loops.
    let nested = "for i in range(len(nums)):\n    for j in range(i):\n        pass";
    assert!(engine
        .hint(nested)
        .expect("Expected nested-loop hint")
        .contains("O(n^2)"));
    assert_eq!(engine.hint("x").as_deref(), Some("try again"));
    assert_eq!(engine.session().hints_viewed(), 2);

    assert!(engine
        .handle_request("What's the Big O here?")
        .expect("Expected complexity answer")
        .contains("O(n) time"));
    assert!(engine
        .handle_request("Should I use a HashMap?")
        .expect("Expected dict answer")
        .starts_with("Store each number"));
    assert!(engine.handle_request("hello").is_none());

    // Attempt 4 passes.
    let pass = ExecutionResult::new("[0, 1]", "").with_passed(true);
    assert_eq!(
        engine.process_execution("v4", &pass).as_deref(),
        Some("All tests pass.")
    );
    assert_eq!(
        engine.success_message().as_deref(),
        Some("You solved Two Sum in 4 attempt(s)!")
    );

    let state = engine.session().state();
    assert_eq!(state.attempts, 4);
    assert_eq!(state.code_history, vec!["v1", "v2", "v3", "v4"]);
    assert!(state.passed);
    assert_eq!(state.last_output, "[0, 1]");
}

/// Tests that an invalid script reports every violation and leaves the
/// previously loaded script in place.
#[test]
fn test_invalid_script_reports_all_errors() {
    let loader = fixture_loader();
    let mut engine = engine();
    assert!(engine
        .load_script(loader.resolve("two-sum"))
        .expect("Failed to load script"));

    let err = engine
        .load_script(loader.resolve("broken"))
        .expect_err("Broken script should not load");
    assert!(matches!(err, CoachError::ScriptValidationError { .. }));

    let diagnostics = err.diagnostics();
    assert_eq!(diagnostics.len(), 5, "{diagnostics:#?}");
    assert!(diagnostics.contains(&"title: must be a non-empty string".to_string()));
    assert!(diagnostics.contains(&"difficulty: must be one of easy, medium, hard".to_string()));
    assert!(diagnostics.contains(&"steps[0].trigger: intro steps must not have a trigger".to_string()));
    assert!(diagnostics.contains(&"steps[1].trigger: hint steps must have a trigger".to_string()));
    assert!(diagnostics.contains(&"steps[2].keywords: on_request steps must have keywords".to_string()));

    assert_eq!(
        engine.script_info().expect("Two Sum should stay loaded").id,
        "two-sum"
    );
}

/// Tests that malformed JSON is a load error, not a validation error.
#[test]
fn test_truncated_script_is_load_error() {
    let loader = fixture_loader();
    let mut engine = engine();
    let err = engine
        .load_script(loader.resolve("truncated"))
        .expect_err("Truncated script should not load");
    assert!(matches!(err, CoachError::ScriptLoadError { .. }));
    assert!(err.is_script_error());
    assert!(!engine.is_loaded());
}

/// Tests that a missing script is absent, not an error.
#[test]
fn test_missing_script_is_absent() {
    let loader = fixture_loader();
    let mut engine = engine();
    let loaded = engine
        .load_script(loader.resolve("no-such-problem"))
        .expect("Missing script should not be an error");
    assert!(!loaded);
    assert!(engine.introduction().is_none());
}

/// Tests that the validator flags the never-firing trigger as a warning.
#[test]
fn test_fixture_warnings() {
    let text = std::fs::read_to_string(fixture_path().join("scripts/two-sum.json"))
        .expect("Failed to read fixture");
    let value: serde_json::Value = serde_json::from_str(&text).expect("Fixture is not JSON");

    let result = fixture_loader().validator().validate(&value);
    assert!(result.valid, "{:?}", result.errors);
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].starts_with("steps[7].trigger: never fires"));
}

/// Tests loading through the async loader.
#[tokio::test]
async fn test_load_script_async() {
    let loader = fixture_loader();
    let path = loader.resolve("two-sum");
    let mut engine = engine();

    assert!(engine
        .load_script_async(&path)
        .await
        .expect("Failed to load script"));
    assert_eq!(
        engine.script().map(|s| s.language.as_str()),
        Some("python")
    );

    let missing = engine
        .load_script_async(loader.resolve("no-such-problem"))
        .await
        .expect("Missing script should not be an error");
    assert!(!missing);
    assert!(engine.is_loaded());
}

/// Tests that the size limit from config is enforced.
#[test]
fn test_size_limit() {
    let mut config = Config::default();
    config.max_script_size = 128;
    let loader = ScriptLoader::new(config);
    let err = loader
        .load(fixture_path().join("scripts/two-sum.json"))
        .expect_err("Script should exceed the limit");
    assert!(matches!(err, CoachError::ScriptTooLarge { .. }));
}

/// Tests that resetting the session starts the next problem from scratch.
#[test]
fn test_reset_between_problems() {
    let loader = fixture_loader();
    let mut engine = engine();
    engine
        .load_script(loader.resolve("two-sum"))
        .expect("Failed to load script");

    engine.process_execution("v1", &ExecutionResult::new("", ""));
    engine.process_execution("v2", &ExecutionResult::new("", ""));
    engine.process_execution("v3", &ExecutionResult::new("", ""));
    assert_eq!(engine.hint("x").as_deref(), Some("try again"));

    engine.session_mut().reset("three-sum");
    let state = engine.session().state();
    assert_eq!(state.problem_id, "three-sum");
    assert_eq!(state.attempts, 0);
    assert_eq!(state.hints_viewed, 0);
    assert!(engine.hint("x").is_none());
}
