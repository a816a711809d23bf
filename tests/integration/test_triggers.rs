//! Trigger evaluation against live session state
//!
//! Exercises `coach_trigger` through contexts built by the session tracker,
//! including hostile trigger text that must never evaluate to true.

use coach_engine::{ExecutionResult, SessionTracker};
use coach_trigger::{evaluate, ErrorKind, Trigger, TriggerError};

fn session_after(attempts: u32, stderr: &str, passed: bool) -> SessionTracker {
    let mut session = SessionTracker::new("two-sum");
    for i in 0..attempts {
        session.record_attempt(format!("attempt {i}"));
    }
    session.record_execution(&ExecutionResult::new("out", stderr).with_passed(passed));
    session
}

#[test]
fn test_attempt_thresholds_track_session() {
    for attempts in 0..6 {
        let ctx = session_after(attempts, "", false).trigger_context("");
        for n in 0..6 {
            assert_eq!(
                evaluate(&format!("attempts > {n}"), &ctx),
                attempts > n,
                "attempts={attempts} n={n}"
            );
        }
    }
}

#[test]
fn test_context_reflects_last_execution() {
    let session = session_after(2, "ZeroDivisionError: division by zero", false);
    let ctx = session.trigger_context("x = 1 / 0");

    assert!(evaluate(r#"stderr.startsWith("ZeroDivisionError")"#, &ctx));
    assert!(evaluate(r#"code.includes("/ 0") && !passed"#, &ctx));
    assert!(evaluate(r#"stdout === "out""#, &ctx));
    assert!(!evaluate("passed", &ctx));

    let passed = session_after(1, "", true).trigger_context("");
    assert!(evaluate("passed && stderr.length === 0", &passed));
}

#[test]
fn test_injection_attempts_are_false() {
    let ctx = session_after(3, "", true).trigger_context("print('hi')");
    for source in [
        "eval('1')",
        "eval(\"process.exit(1)\")",
        "constructor.constructor('return process')()",
        "code.constructor.constructor('return 1')()",
        "__proto__",
        "code.__proto__",
        "process.env.HOME",
        "Function('return true')()",
        "globalThis",
        "require('child_process')",
        "code.length.toString()",
        "code.includes('a').valueOf()",
        "unknownVar === true",
        "this.passed",
        "passed = false",
        "(() => true)()",
        "`${code}`",
    ] {
        assert!(!evaluate(source, &ctx), "{source:?} must evaluate to false");
    }
}

#[test]
fn test_error_classification() {
    let err = Trigger::compile("attempts >").expect_err("should not compile");
    assert_eq!(err.kind(), ErrorKind::Syntax);

    let err = Trigger::compile("window.location").expect_err("should not compile");
    assert_eq!(err.kind(), ErrorKind::Semantic);
    assert!(matches!(err, TriggerError::UnknownIdentifier { .. }));

    let trigger = Trigger::compile("attempts === \"3\"").expect("should compile");
    let ctx = session_after(3, "", false).trigger_context("");
    let err = trigger.evaluate(&ctx).expect_err("should not evaluate");
    assert!(matches!(err, TriggerError::TypeMismatch { .. }));
    assert!(!trigger.matches(&ctx));
}

#[test]
fn test_compiled_trigger_is_reusable_across_sessions() {
    let trigger = Trigger::compile("!passed && attempts >= 2").expect("should compile");

    let mut session = SessionTracker::new("p");
    assert!(!trigger.matches(&session.trigger_context("")));
    session.record_attempt("a");
    session.record_attempt("b");
    assert!(trigger.matches(&session.trigger_context("")));
    session.mark_passed();
    assert!(!trigger.matches(&session.trigger_context("")));
}

#[test]
fn test_evaluation_does_not_touch_session() {
    let session = session_after(2, "err", false);
    let before = session.state();
    let ctx = session.trigger_context("code");
    for _ in 0..3 {
        assert!(evaluate("attempts === 2 && stderr === \"err\"", &ctx));
    }
    assert_eq!(session.state(), before);
}
