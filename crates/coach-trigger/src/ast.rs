//! Expression tree produced by the parser.

use regex::Regex;

use crate::context::Variable;

/// A compiled trigger expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A literal value. `null` and `undefined` compile to `false`.
    Literal(Literal),
    /// One of the five context variables.
    Variable(Variable),
    /// `<string variable>.length`
    Length(Variable),
    /// `<string variable>.<method>(<argument>)`
    Call {
        /// The string variable the method is called on.
        target: Variable,
        /// The whitelisted method.
        method: Method,
        /// The single argument.
        argument: Box<Argument>,
    },
    /// `!expr`
    Not(Box<Expr>),
    /// `a && b && ...`, flattened so long chains stay shallow.
    And(Vec<Expr>),
    /// `a || b || ...`, flattened so long chains stay shallow.
    Or(Vec<Expr>),
    /// `left <op> right`
    Compare {
        /// The comparison operator.
        op: CompareOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `true`, `false`, `null`, `undefined`
    Bool(bool),
    /// A numeric literal.
    Number(f64),
    /// A quoted string.
    Str(String),
}

/// Argument of a method call.
#[derive(Debug, Clone)]
pub enum Argument {
    /// Any sub-expression; must evaluate to a string.
    Expr(Expr),
    /// A regex compiled at parse time, from a `/pattern/flags` literal or a
    /// string literal passed to `match`.
    Pattern(Regex),
}

/// The string methods a trigger may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `includes(str)`
    Includes,
    /// `startsWith(str)`
    StartsWith,
    /// `endsWith(str)`
    EndsWith,
    /// `match(stringOrRegex)`
    Match,
}

impl Method {
    /// Resolves a method name against the whitelist.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "includes" => Some(Self::Includes),
            "startsWith" => Some(Self::StartsWith),
            "endsWith" => Some(Self::EndsWith),
            "match" => Some(Self::Match),
            _ => None,
        }
    }

    /// Returns the method name as written in triggers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Includes => "includes",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::Match => "match",
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `===`
    Eq,
    /// `!==`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
}

impl CompareOp {
    /// Returns the operator as written in triggers.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "===",
            Self::Ne => "!==",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }

    /// Returns `true` for the ordering operators.
    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(self, Self::Gt | Self::Lt | Self::Ge | Self::Le)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_name() {
        assert_eq!(Method::from_name("includes"), Some(Method::Includes));
        assert_eq!(Method::from_name("startsWith"), Some(Method::StartsWith));
        assert_eq!(Method::from_name("endsWith"), Some(Method::EndsWith));
        assert_eq!(Method::from_name("match"), Some(Method::Match));
        assert_eq!(Method::from_name("constructor"), None);
        assert_eq!(Method::from_name("toString"), None);
        assert_eq!(Method::from_name("startswith"), None);
    }

    #[test]
    fn test_compare_op_symbols() {
        assert_eq!(CompareOp::Eq.symbol(), "===");
        assert_eq!(CompareOp::Ne.symbol(), "!==");
        assert_eq!(CompareOp::Ge.symbol(), ">=");
        assert!(CompareOp::Lt.is_ordering());
        assert!(!CompareOp::Ne.is_ordering());
    }
}
