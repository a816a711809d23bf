//! Error types for trigger compilation and evaluation.
//!
//! Every failure a trigger can produce is one of the variants below. None of
//! them ever escape [`crate::evaluate`], which turns them into `false`; they
//! are public so tooling (the `coach eval --explain` command, the script
//! validator) can report why a trigger will not fire.

/// A specialized `Result` type for trigger operations.
pub type Result<T> = std::result::Result<T, TriggerError>;

/// Broad category of a [`TriggerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The trigger text is not well-formed.
    Syntax,
    /// The trigger is well-formed but refers to something the language does
    /// not allow, or its operands have the wrong types.
    Semantic,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Semantic => write!(f, "semantic"),
        }
    }
}

/// Errors that can occur while compiling or evaluating a trigger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriggerError {
    // ========================================================================
    // Syntax Errors
    // ========================================================================
    /// The trigger is empty or contains only whitespace.
    #[error("trigger is empty")]
    Empty,

    /// A character that cannot start any token.
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar {
        /// The offending character.
        ch: char,
        /// Byte offset into the trigger text.
        offset: usize,
    },

    /// A string literal without its closing quote.
    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        offset: usize,
    },

    /// A regex literal without its closing slash.
    #[error("unterminated regex literal starting at offset {offset}")]
    UnterminatedRegex {
        /// Byte offset of the opening slash.
        offset: usize,
    },

    /// A token that is not valid at this point of the grammar.
    #[error("unexpected {found} at offset {offset}")]
    UnexpectedToken {
        /// Description of the token that was found.
        found: String,
        /// Byte offset of the token.
        offset: usize,
    },

    /// The trigger ended in the middle of an expression.
    #[error("unexpected end of trigger, expected {expected}")]
    UnexpectedEnd {
        /// What the parser was looking for.
        expected: String,
    },

    /// Parentheses or negations nested deeper than the parser allows.
    #[error("expression nested deeper than {limit} levels")]
    NestingTooDeep {
        /// The configured nesting limit.
        limit: usize,
    },

    // ========================================================================
    // Semantic Errors
    // ========================================================================
    /// An identifier that is not one of the context variables.
    #[error("unknown identifier '{name}' (expected one of code, stdout, stderr, passed, attempts)")]
    UnknownIdentifier {
        /// The identifier as written.
        name: String,
    },

    /// A property or method that is not supported on the target.
    #[error("unknown member '{member}' on '{target}'")]
    UnknownMember {
        /// The expression the member was accessed on.
        target: String,
        /// The member name as written.
        member: String,
    },

    /// A method called with the wrong number of arguments.
    #[error("{method}() expects {expected} argument(s), got {found}")]
    ArgumentCount {
        /// The method name.
        method: String,
        /// The number of arguments the method takes.
        expected: usize,
        /// The number of arguments supplied.
        found: usize,
    },

    /// A method argument that evaluated to the wrong type.
    #[error("{method}() expects a {expected} argument, got {found}")]
    ArgumentType {
        /// The method name.
        method: String,
        /// The expected argument type.
        expected: &'static str,
        /// The type that was supplied.
        found: &'static str,
    },

    /// A regex pattern or flag set the regex engine rejects.
    #[error("invalid regex /{pattern}/: {message}")]
    InvalidRegex {
        /// The pattern source.
        pattern: String,
        /// Why the pattern was rejected.
        message: String,
    },

    /// A comparison between values of different types, or an ordering on
    /// values that have none.
    #[error("cannot compare {left} {op} {right}")]
    TypeMismatch {
        /// Type of the left operand.
        left: &'static str,
        /// The comparison operator.
        op: &'static str,
        /// Type of the right operand.
        right: &'static str,
    },
}

impl TriggerError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Empty
            | Self::UnexpectedChar { .. }
            | Self::UnterminatedString { .. }
            | Self::UnterminatedRegex { .. }
            | Self::UnexpectedToken { .. }
            | Self::UnexpectedEnd { .. }
            | Self::NestingTooDeep { .. } => ErrorKind::Syntax,
            Self::UnknownIdentifier { .. }
            | Self::UnknownMember { .. }
            | Self::ArgumentCount { .. }
            | Self::ArgumentType { .. }
            | Self::InvalidRegex { .. }
            | Self::TypeMismatch { .. } => ErrorKind::Semantic,
        }
    }

    /// Creates a new `UnexpectedEnd` error.
    #[must_use]
    pub fn unexpected_end(expected: impl Into<String>) -> Self {
        Self::UnexpectedEnd {
            expected: expected.into(),
        }
    }

    /// Creates a new `UnknownIdentifier` error.
    #[must_use]
    pub fn unknown_identifier(name: impl Into<String>) -> Self {
        Self::UnknownIdentifier { name: name.into() }
    }

    /// Creates a new `UnknownMember` error.
    #[must_use]
    pub fn unknown_member(target: impl Into<String>, member: impl Into<String>) -> Self {
        Self::UnknownMember {
            target: target.into(),
            member: member.into(),
        }
    }

    /// Creates a new `InvalidRegex` error.
    #[must_use]
    pub fn invalid_regex(pattern: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::InvalidRegex {
            pattern: pattern.into(),
            message: message.to_string(),
        }
    }
}
