//! Evaluation of compiled expressions against a [`TriggerContext`].
//!
//! Values are borrowed from the expression tree and the context, so
//! evaluating a trigger never copies the learner's code or output.

use crate::ast::{Argument, CompareOp, Expr, Literal, Method};
use crate::context::{TriggerContext, Variable};
use crate::error::{Result, TriggerError};
use crate::parser::compile_regex;

/// A runtime value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string.
    Str(&'a str),
}

impl Value<'_> {
    /// Type name used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
        }
    }

    /// Truthiness used by `!`, `&&`, `||`, and the final trigger result.
    ///
    /// Numbers are truthy unless zero or NaN; strings unless empty.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match *self {
            Self::Bool(b) => b,
            Self::Number(n) => n != 0.0 && !n.is_nan(),
            Self::Str(s) => !s.is_empty(),
        }
    }
}

/// Evaluates an expression tree.
///
/// # Errors
///
/// Returns [`TriggerError::TypeMismatch`] for comparisons across types or
/// orderings on booleans, [`TriggerError::ArgumentType`] for non-string
/// method arguments, and [`TriggerError::InvalidRegex`] for `match`
/// patterns that are only known at evaluation time.
pub fn eval<'a>(expr: &'a Expr, ctx: &'a TriggerContext) -> Result<Value<'a>> {
    match expr {
        Expr::Literal(literal) => Ok(match literal {
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::Str(s) => Value::Str(s),
        }),
        Expr::Variable(variable) => Ok(resolve(*variable, ctx)),
        Expr::Length(variable) => {
            let text = string_field(*variable, ctx, "length")?;
            #[allow(clippy::cast_precision_loss)]
            let length = text.chars().count() as f64;
            Ok(Value::Number(length))
        }
        Expr::Call {
            target,
            method,
            argument,
        } => call(*target, *method, argument, ctx).map(Value::Bool),
        Expr::Not(inner) => Ok(Value::Bool(!eval(inner, ctx)?.is_truthy())),
        Expr::And(terms) => chain(terms, ctx, false),
        Expr::Or(terms) => chain(terms, ctx, true),
        Expr::Compare { op, left, right } => {
            compare(*op, eval(left, ctx)?, eval(right, ctx)?).map(Value::Bool)
        }
    }
}

/// Evaluates terms left to right and returns the first whose truthiness is
/// `stop_on`, or the last term. Later terms are never evaluated.
fn chain<'a>(terms: &'a [Expr], ctx: &'a TriggerContext, stop_on: bool) -> Result<Value<'a>> {
    let mut last = Value::Bool(!stop_on);
    for term in terms {
        last = eval(term, ctx)?;
        if last.is_truthy() == stop_on {
            break;
        }
    }
    Ok(last)
}

fn resolve(variable: Variable, ctx: &TriggerContext) -> Value<'_> {
    match variable {
        Variable::Code => Value::Str(&ctx.code),
        Variable::Stdout => Value::Str(&ctx.stdout),
        Variable::Stderr => Value::Str(&ctx.stderr),
        Variable::Passed => Value::Bool(ctx.passed),
        Variable::Attempts => Value::Number(f64::from(ctx.attempts)),
    }
}

fn string_field<'a>(
    variable: Variable,
    ctx: &'a TriggerContext,
    member: &str,
) -> Result<&'a str> {
    ctx.text(variable)
        .ok_or_else(|| TriggerError::unknown_member(variable.name(), member))
}

fn call(
    target: Variable,
    method: Method,
    argument: &Argument,
    ctx: &TriggerContext,
) -> Result<bool> {
    let text = string_field(target, ctx, method.name())?;

    let needle = match argument {
        Argument::Pattern(regex) => {
            return if method == Method::Match {
                Ok(regex.is_match(text))
            } else {
                Err(TriggerError::ArgumentType {
                    method: method.name().to_string(),
                    expected: "string",
                    found: "regex",
                })
            };
        }
        Argument::Expr(expr) => match eval(expr, ctx)? {
            Value::Str(s) => s,
            other => {
                return Err(TriggerError::ArgumentType {
                    method: method.name().to_string(),
                    expected: "string",
                    found: other.type_name(),
                })
            }
        },
    };

    Ok(match method {
        Method::Includes => text.contains(needle),
        Method::StartsWith => text.starts_with(needle),
        Method::EndsWith => text.ends_with(needle),
        Method::Match => compile_regex(needle, "")?.is_match(text),
    })
}

fn compare(op: CompareOp, left: Value<'_>, right: Value<'_>) -> Result<bool> {
    let mismatch = || TriggerError::TypeMismatch {
        left: left.type_name(),
        op: op.symbol(),
        right: right.type_name(),
    };

    match (left, right) {
        (Value::Bool(l), Value::Bool(r)) => match op {
            CompareOp::Eq => Ok(l == r),
            CompareOp::Ne => Ok(l != r),
            CompareOp::Gt | CompareOp::Lt | CompareOp::Ge | CompareOp::Le => Err(mismatch()),
        },
        (Value::Number(l), Value::Number(r)) => Ok(match op {
            CompareOp::Eq => l == r,
            CompareOp::Ne => l != r,
            CompareOp::Gt => l > r,
            CompareOp::Lt => l < r,
            CompareOp::Ge => l >= r,
            CompareOp::Le => l <= r,
        }),
        (Value::Str(l), Value::Str(r)) => Ok(match op {
            CompareOp::Eq => l == r,
            CompareOp::Ne => l != r,
            CompareOp::Gt => l > r,
            CompareOp::Lt => l < r,
            CompareOp::Ge => l >= r,
            CompareOp::Le => l <= r,
        }),
        _ => Err(mismatch()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn run(source: &str, ctx: &TriggerContext) -> Result<bool> {
        let expr = parse(tokenize(source)?)?;
        eval(&expr, ctx).map(|v| v.is_truthy())
    }

    fn ctx() -> TriggerContext {
        TriggerContext::new("def two_sum(nums, target):\n    for i in range(len(nums)):")
            .with_stdout("[0, 1]\n")
            .with_stderr("")
            .with_attempts(3)
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Number(2.0).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(Value::Str("x").is_truthy());
        assert!(!Value::Str("").is_truthy());
    }

    #[test]
    fn test_variables() {
        let ctx = ctx();
        assert!(run("code", &ctx).unwrap());
        assert!(run("stdout", &ctx).unwrap());
        assert!(!run("stderr", &ctx).unwrap());
        assert!(!run("passed", &ctx).unwrap());
        assert!(run("attempts", &ctx).unwrap());
    }

    #[test]
    fn test_numeric_comparisons() {
        let ctx = ctx();
        assert!(run("attempts > 2", &ctx).unwrap());
        assert!(!run("attempts > 3", &ctx).unwrap());
        assert!(run("attempts >= 3", &ctx).unwrap());
        assert!(run("attempts === 3", &ctx).unwrap());
        assert!(run("attempts !== 4", &ctx).unwrap());
        assert!(run("attempts < 3.5", &ctx).unwrap());
        assert!(run("attempts <= 3", &ctx).unwrap());
        assert!(run("attempts > -1", &ctx).unwrap());
    }

    #[test]
    fn test_string_methods() {
        let ctx = ctx();
        assert!(run(r#"code.includes("for i in")"#, &ctx).unwrap());
        assert!(!run(r#"code.includes("while")"#, &ctx).unwrap());
        assert!(run("code.startsWith('def')", &ctx).unwrap());
        assert!(run(r#"stdout.includes("1]")"#, &ctx).unwrap());
        assert!(run(r"code.match(/range\(len\(\w+\)\)/)", &ctx).unwrap());
        assert!(run(r"code.match(/DEF/i)", &ctx).unwrap());
        assert!(!run(r"code.match(/DEF/)", &ctx).unwrap());
        assert!(run(r#"stdout.match("^\[0, 1\]")"#, &ctx).unwrap());
    }

    #[test]
    fn test_method_with_variable_argument() {
        let ctx = TriggerContext::new("print(42)").with_stdout("42");
        assert!(run("code.includes(stdout)", &ctx).unwrap());
        assert!(run("code.match(stdout)", &ctx).unwrap());
    }

    #[test]
    fn test_length() {
        let ctx = TriggerContext::new("héllo");
        assert!(run("code.length === 5", &ctx).unwrap());
        assert!(run("stderr.length === 0", &ctx).unwrap());
    }

    #[test]
    fn test_logical_operators() {
        let ctx = ctx();
        assert!(run("attempts > 2 && !passed", &ctx).unwrap());
        assert!(!run("attempts > 2 && passed", &ctx).unwrap());
        assert!(run("passed || attempts === 3", &ctx).unwrap());
        assert!(run("!(passed || attempts > 5)", &ctx).unwrap());
        assert!(run(r#"(code.includes("for") || code.includes("while")) && !passed"#, &ctx).unwrap());
    }

    #[test]
    fn test_operators_inside_strings_are_literal() {
        let ctx = TriggerContext::new("if a && b || c: pass");
        assert!(run(r#"code.includes("a && b || c")"#, &ctx).unwrap());
        assert!(run(r#"code.includes(") || (")  || code.includes("&&")"#, &ctx).unwrap());
        assert!(run(r"code.match(/a && b \|\| c/)", &ctx).unwrap());
    }

    #[test]
    fn test_null_and_undefined_are_false() {
        let ctx = ctx();
        assert!(!run("null", &ctx).unwrap());
        assert!(!run("undefined", &ctx).unwrap());
        assert!(run("passed === null", &ctx).unwrap());
        assert!(run("passed === undefined", &ctx).unwrap());
    }

    #[test]
    fn test_cross_type_comparisons_fail() {
        let ctx = ctx();
        assert_eq!(
            run(r#"attempts === "3""#, &ctx).unwrap_err(),
            TriggerError::TypeMismatch {
                left: "number",
                op: "===",
                right: "string",
            }
        );
        assert!(matches!(
            run("code > 1", &ctx),
            Err(TriggerError::TypeMismatch { .. })
        ));
        assert!(matches!(
            run("passed !== 0", &ctx),
            Err(TriggerError::TypeMismatch { .. })
        ));
        assert!(matches!(
            run("passed > false", &ctx),
            Err(TriggerError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_string_ordering() {
        let ctx = TriggerContext::new("b");
        assert!(run(r#"code > "a""#, &ctx).unwrap());
        assert!(run(r#"code === "b""#, &ctx).unwrap());
    }

    #[test]
    fn test_argument_type_errors() {
        let ctx = ctx();
        assert_eq!(
            run("code.includes(attempts)", &ctx).unwrap_err(),
            TriggerError::ArgumentType {
                method: "includes".to_string(),
                expected: "string",
                found: "number",
            }
        );
        assert!(matches!(
            run("code.endsWith(passed)", &ctx),
            Err(TriggerError::ArgumentType {
                found: "boolean",
                ..
            })
        ));
    }

    #[test]
    fn test_runtime_invalid_regex() {
        let ctx = TriggerContext::new("x").with_stdout("(");
        assert!(matches!(
            run("code.match(stdout)", &ctx),
            Err(TriggerError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn test_short_circuit_skips_right_side_errors() {
        let ctx = ctx();
        assert!(!run("passed && code > 1", &ctx).unwrap());
        assert!(run("attempts > 0 || code > 1", &ctx).unwrap());
        assert!(run("passed || code > 1", &ctx).is_err());
        assert!(!run("attempts > 0 && stderr && code > 1", &ctx).unwrap());
        assert!(run("passed || stderr || attempts || code > 1", &ctx).unwrap());
    }

    #[test]
    fn test_chain_returns_deciding_operand() {
        let ctx = ctx();
        let expr = parse(tokenize("stderr || stdout || code").unwrap()).unwrap();
        assert_eq!(eval(&expr, &ctx).unwrap(), Value::Str("[0, 1]\n"));
        let expr = parse(tokenize("attempts && stderr && code").unwrap()).unwrap();
        assert_eq!(eval(&expr, &ctx).unwrap(), Value::Str(""));
    }

    #[test]
    fn test_long_chains_evaluate() {
        let ctx = ctx();
        let or_chain = format!("{}1", "0||".repeat(100_000));
        assert!(run(&or_chain, &ctx).unwrap());

        let and_chain = format!("{}passed", "attempts > 0 && ".repeat(100_000));
        assert!(!run(&and_chain, &ctx).unwrap());
    }
}
