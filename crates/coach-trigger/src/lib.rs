//! Coach Trigger Language
//!
//! A small, closed expression language used by guidance scripts to decide
//! when a coaching step applies. Expressions can read five values from a
//! [`TriggerContext`] (`code`, `stdout`, `stderr`, `passed`, `attempts`),
//! call four string methods, compare, and combine with `!`, `&&`, `||`.
//! Nothing else is reachable.
//!
//! Trigger source is tokenized, parsed into an [`Expr`] tree once, and then
//! evaluated as often as needed:
//!
//! ```
//! use coach_trigger::{Trigger, TriggerContext};
//!
//! let trigger = Trigger::compile("attempts > 2 && !passed").unwrap();
//! let ctx = TriggerContext::new("print(1)").with_attempts(3);
//! assert!(trigger.evaluate(&ctx).unwrap());
//! ```
//!
//! [`evaluate`] is the fail-closed entry point: any syntax or evaluation
//! error yields `false`.

pub mod ast;
pub mod context;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

use std::fmt;
use std::str::FromStr;

pub use ast::{Argument, CompareOp, Expr, Literal, Method};
pub use context::{TriggerContext, Variable};
pub use error::{ErrorKind, Result, TriggerError};
pub use eval::Value;
pub use parser::{MAX_NESTING_DEPTH, REGEX_SIZE_LIMIT};

/// A compiled trigger expression.
#[derive(Debug, Clone)]
pub struct Trigger {
    source: String,
    expr: Expr,
}

impl Trigger {
    /// Compiles trigger source into an expression tree.
    ///
    /// # Errors
    ///
    /// Returns a [`TriggerError`] if the source is empty, malformed, names
    /// anything outside the whitelist, or contains an invalid regex.
    pub fn compile(source: &str) -> Result<Self> {
        let tokens = lexer::tokenize(source)?;
        let expr = parser::parse(tokens)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// Evaluates the trigger and applies truthiness to the result.
    ///
    /// # Errors
    ///
    /// Returns a [`TriggerError`] for type mismatches and other failures
    /// that can only be detected against concrete values.
    pub fn evaluate(&self, ctx: &TriggerContext) -> Result<bool> {
        eval::eval(&self.expr, ctx).map(|value| value.is_truthy())
    }

    /// Evaluates the trigger, treating any error as `false`.
    #[must_use]
    pub fn matches(&self, ctx: &TriggerContext) -> bool {
        match self.evaluate(ctx) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(trigger = %self.source, error = %e, "Trigger evaluation failed");
                false
            }
        }
    }

    /// The source text this trigger was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl FromStr for Trigger {
    type Err = TriggerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::compile(s)
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Compiles and evaluates a trigger in one step.
///
/// Never panics and never returns an error: invalid syntax, unknown names,
/// type mismatches, and bad regexes all evaluate to `false`. The reason is
/// logged at debug level.
#[must_use]
pub fn evaluate(source: &str, ctx: &TriggerContext) -> bool {
    match Trigger::compile(source) {
        Ok(trigger) => trigger.matches(ctx),
        Err(e) => {
            tracing::debug!(trigger = %source, error = %e, kind = %e.kind(), "Trigger rejected");
            false
        }
    }
}

/// Checks whether trigger source compiles, without evaluating it.
///
/// # Errors
///
/// Returns the compile error for invalid source.
pub fn check(source: &str) -> Result<()> {
    Trigger::compile(source).map(|_| ())
}
