//! Recursive-descent parser for trigger expressions.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or         := and ( "||" and )*
//! and        := not ( "&&" not )*
//! not        := "!" not | comparison
//! comparison := operand ( ( "===" | "!==" | ">" | "<" | ">=" | "<=" ) operand )?
//! operand    := literal | "(" or ")" | variable member?
//! member     := "." "length" | "." method "(" arguments ")"
//! ```
//!
//! Identifiers, members, and method arity are resolved while parsing, so a
//! trigger that names anything outside the whitelist never compiles.

use regex::{Regex, RegexBuilder};

use crate::ast::{Argument, CompareOp, Expr, Literal, Method};
use crate::context::Variable;
use crate::error::{Result, TriggerError};
use crate::lexer::{Spanned, Token};

/// Maximum nesting of parentheses and negations.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Upper bound on the compiled size of a single regex, in bytes.
pub const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Parses a token stream into an expression tree.
///
/// # Errors
///
/// Returns a [`TriggerError`] for empty input, grammar violations, and names
/// outside the whitelist.
pub fn parse(tokens: Vec<Spanned>) -> Result<Expr> {
    if tokens.is_empty() {
        return Err(TriggerError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_or()?;

    match parser.tokens.get(parser.pos) {
        None => Ok(expr),
        Some(extra) => Err(unexpected(extra)),
    }
}

/// Compiles a `match` pattern with JavaScript-style flags.
///
/// `i`, `m`, and `s` map to the regex engine; `g`, `u`, and `y` do not
/// change whether a string matches and are ignored.
pub(crate) fn compile_regex(pattern: &str, flags: &str) -> Result<Regex> {
    let mut builder = RegexBuilder::new(pattern);
    builder.size_limit(REGEX_SIZE_LIMIT);

    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'g' | 'u' | 'y' => {}
            other => {
                return Err(TriggerError::invalid_regex(
                    pattern,
                    format!("unsupported flag '{other}'"),
                ))
            }
        }
    }

    builder
        .build()
        .map_err(|e| TriggerError::invalid_regex(pattern, e))
}

fn unexpected(spanned: &Spanned) -> TriggerError {
    TriggerError::UnexpectedToken {
        found: spanned.token.describe(),
        offset: spanned.offset,
    }
}

/// A method argument before it is checked against its method.
enum RawArgument {
    Regex {
        pattern: String,
        flags: String,
        offset: usize,
    },
    Expr(Expr),
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn next(&mut self) -> Option<Spanned> {
        let spanned = self.tokens.get(self.pos).cloned();
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        match self.next() {
            Some(spanned) if spanned.token == *token => Ok(()),
            Some(spanned) => Err(unexpected(&spanned)),
            None => Err(TriggerError::unexpected_end(token.describe())),
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(TriggerError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let first = self.parse_and()?;
        if self.peek() != Some(&Token::Or) {
            return Ok(first);
        }
        let mut terms = vec![first];
        while self.eat(&Token::Or) {
            terms.push(self.parse_and()?);
        }
        Ok(Expr::Or(terms))
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let first = self.parse_not()?;
        if self.peek() != Some(&Token::And) {
            return Ok(first);
        }
        let mut terms = vec![first];
        while self.eat(&Token::And) {
            terms.push(self.parse_not()?);
        }
        Ok(Expr::And(terms))
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if !self.eat(&Token::Not) {
            return self.parse_comparison();
        }
        self.enter()?;
        let inner = self.parse_not()?;
        self.leave();
        Ok(Expr::Not(Box::new(inner)))
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_operand()?;

        let op = match self.peek() {
            Some(Token::StrictEq) => CompareOp::Eq,
            Some(Token::StrictNe) => CompareOp::Ne,
            Some(Token::Gt) => CompareOp::Gt,
            Some(Token::Lt) => CompareOp::Lt,
            Some(Token::Ge) => CompareOp::Ge,
            Some(Token::Le) => CompareOp::Le,
            _ => return Ok(left),
        };
        self.pos += 1;

        let right = self.parse_operand()?;
        Ok(Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_operand(&mut self) -> Result<Expr> {
        let Some(spanned) = self.next() else {
            return Err(TriggerError::unexpected_end("an operand"));
        };

        match spanned.token {
            Token::Bool(b) => Ok(Expr::Literal(Literal::Bool(b))),
            Token::Null => Ok(Expr::Literal(Literal::Bool(false))),
            Token::Number(n) => Ok(Expr::Literal(Literal::Number(n))),
            Token::Str(s) => Ok(Expr::Literal(Literal::Str(s))),
            Token::LParen => {
                self.enter()?;
                let inner = self.parse_or()?;
                self.expect(&Token::RParen)?;
                self.leave();
                Ok(inner)
            }
            Token::Ident(ref name) => {
                let variable = Variable::from_name(name)
                    .ok_or_else(|| TriggerError::unknown_identifier(name.as_str()))?;
                if self.eat(&Token::Dot) {
                    self.parse_member(variable)
                } else {
                    Ok(Expr::Variable(variable))
                }
            }
            _ => Err(unexpected(&spanned)),
        }
    }

    fn parse_member(&mut self, target: Variable) -> Result<Expr> {
        let member = match self.next() {
            Some(Spanned {
                token: Token::Ident(name),
                ..
            }) => name,
            Some(other) => return Err(unexpected(&other)),
            None => return Err(TriggerError::unexpected_end("a member name")),
        };

        if !target.is_string() {
            return Err(TriggerError::unknown_member(target.name(), member));
        }

        let expr = if member == "length" {
            if self.peek() == Some(&Token::LParen) {
                return Err(TriggerError::unknown_member(target.name(), "length()"));
            }
            Expr::Length(target)
        } else {
            let method = Method::from_name(&member)
                .ok_or_else(|| TriggerError::unknown_member(target.name(), member.as_str()))?;
            let argument = self.parse_arguments(method)?;
            Expr::Call {
                target,
                method,
                argument: Box::new(argument),
            }
        };

        // Members never chain: `code.includes("a").length` is rejected.
        if self.eat(&Token::Dot) {
            let chained = match self.peek() {
                Some(Token::Ident(name)) => name.clone(),
                _ => String::from("."),
            };
            return Err(TriggerError::unknown_member(
                format!("{target}.{member}"),
                chained,
            ));
        }

        Ok(expr)
    }

    fn parse_arguments(&mut self, method: Method) -> Result<Argument> {
        self.expect(&Token::LParen)?;
        self.enter()?;

        let mut arguments = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                arguments.push(self.parse_argument()?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RParen)?;
                break;
            }
        }
        self.leave();

        if arguments.len() != 1 {
            return Err(TriggerError::ArgumentCount {
                method: method.name().to_string(),
                expected: 1,
                found: arguments.len(),
            });
        }

        match (method, arguments.remove(0)) {
            (Method::Match, RawArgument::Regex { pattern, flags, .. }) => {
                Ok(Argument::Pattern(compile_regex(&pattern, &flags)?))
            }
            (Method::Match, RawArgument::Expr(Expr::Literal(Literal::Str(pattern)))) => {
                Ok(Argument::Pattern(compile_regex(&pattern, "")?))
            }
            (_, RawArgument::Expr(expr)) => Ok(Argument::Expr(expr)),
            (_, RawArgument::Regex {
                pattern,
                flags,
                offset,
            }) => Err(TriggerError::UnexpectedToken {
                found: Token::Regex { pattern, flags }.describe(),
                offset,
            }),
        }
    }

    fn parse_argument(&mut self) -> Result<RawArgument> {
        if let Some(Spanned {
            token: Token::Regex { pattern, flags },
            offset,
        }) = self.tokens.get(self.pos).cloned()
        {
            self.pos += 1;
            return Ok(RawArgument::Regex {
                pattern,
                flags,
                offset,
            });
        }
        self.parse_or().map(RawArgument::Expr)
    }
}
