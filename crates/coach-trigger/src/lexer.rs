//! Tokenizer for trigger expressions.
//!
//! Turns trigger text into a flat list of [`Spanned`] tokens. String and
//! regex literals are lexed as single tokens, so operator characters inside
//! them are never seen by the parser.

use crate::error::{Result, TriggerError};

/// A lexical token of the trigger language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// An identifier such as `code` or `includes`.
    Ident(String),
    /// A numeric literal.
    Number(f64),
    /// A single- or double-quoted string literal, without its quotes.
    Str(String),
    /// A `/pattern/flags` regex literal.
    Regex {
        /// The pattern between the slashes.
        pattern: String,
        /// Flag letters following the closing slash.
        flags: String,
    },
    /// `true` or `false`.
    Bool(bool),
    /// `null` or `undefined`.
    Null,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `!`
    Not,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNe,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
}

impl Token {
    /// Human-readable description used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("identifier '{name}'"),
            Self::Number(n) => format!("number {n}"),
            Self::Str(s) => format!("string \"{s}\""),
            Self::Regex { pattern, flags } => format!("regex /{pattern}/{flags}"),
            Self::Bool(b) => format!("'{b}'"),
            Self::Null => "'null'".to_string(),
            Self::LParen => "'('".to_string(),
            Self::RParen => "')'".to_string(),
            Self::Dot => "'.'".to_string(),
            Self::Comma => "','".to_string(),
            Self::Not => "'!'".to_string(),
            Self::And => "'&&'".to_string(),
            Self::Or => "'||'".to_string(),
            Self::StrictEq => "'==='".to_string(),
            Self::StrictNe => "'!=='".to_string(),
            Self::Gt => "'>'".to_string(),
            Self::Lt => "'<'".to_string(),
            Self::Ge => "'>='".to_string(),
            Self::Le => "'<='".to_string(),
        }
    }
}

/// A token with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    /// The token.
    pub token: Token,
    /// Byte offset into the source text.
    pub offset: usize,
}

/// Splits trigger text into tokens.
///
/// # Errors
///
/// Returns a syntax error for characters that cannot start a token,
/// unterminated string or regex literals, and the non-strict `==`/`!=`
/// operators.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    tokens: Vec<Spanned>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Spanned>> {
        while let Some(&(offset, ch)) = self.chars.peek() {
            if ch.is_whitespace() {
                self.chars.next();
                continue;
            }

            let token = match ch {
                '(' => self.single(Token::LParen),
                ')' => self.single(Token::RParen),
                '.' => self.single(Token::Dot),
                ',' => self.single(Token::Comma),
                '"' | '\'' => self.string(offset, ch)?,
                '/' => self.regex(offset)?,
                '!' => self.bang(offset)?,
                '=' => self.equals(offset)?,
                '>' => self.angle(Token::Gt, Token::Ge),
                '<' => self.angle(Token::Lt, Token::Le),
                '&' => self.doubled('&', Token::And, offset)?,
                '|' => self.doubled('|', Token::Or, offset)?,
                '-' if self.next_is_digit(offset) => self.number(offset),
                c if c.is_ascii_digit() => self.number(offset),
                c if is_ident_start(c) => self.ident(offset),
                other => return Err(TriggerError::UnexpectedChar { ch: other, offset }),
            };

            self.tokens.push(Spanned { token, offset });
        }

        Ok(self.tokens)
    }

    fn single(&mut self, token: Token) -> Token {
        self.chars.next();
        token
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.chars.peek().is_some_and(|&(_, c)| c == expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn next_is_digit(&self, offset: usize) -> bool {
        self.source[offset + 1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    }

    fn string(&mut self, offset: usize, quote: char) -> Result<Token> {
        self.chars.next();
        let start = offset + quote.len_utf8();
        for (idx, c) in self.chars.by_ref() {
            if c == quote {
                return Ok(Token::Str(self.source[start..idx].to_string()));
            }
        }
        Err(TriggerError::UnterminatedString { offset })
    }

    fn regex(&mut self, offset: usize) -> Result<Token> {
        self.chars.next();
        let start = offset + 1;
        let mut in_class = false;
        let mut end = None;

        while let Some((idx, c)) = self.chars.next() {
            match c {
                '\\' => {
                    self.chars.next();
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => {
                    end = Some(idx);
                    break;
                }
                _ => {}
            }
        }

        let end = end.ok_or(TriggerError::UnterminatedRegex { offset })?;
        let pattern = self.source[start..end].to_string();

        let mut flags = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if !c.is_ascii_alphabetic() {
                break;
            }
            flags.push(c);
            self.chars.next();
        }

        Ok(Token::Regex { pattern, flags })
    }

    fn bang(&mut self, offset: usize) -> Result<Token> {
        self.chars.next();
        if !self.eat('=') {
            return Ok(Token::Not);
        }
        if self.eat('=') {
            return Ok(Token::StrictNe);
        }
        Err(TriggerError::UnexpectedToken {
            found: "'!=' (use '!==')".to_string(),
            offset,
        })
    }

    fn equals(&mut self, offset: usize) -> Result<Token> {
        self.chars.next();
        if self.eat('=') {
            if self.eat('=') {
                return Ok(Token::StrictEq);
            }
            return Err(TriggerError::UnexpectedToken {
                found: "'==' (use '===')".to_string(),
                offset,
            });
        }
        Err(TriggerError::UnexpectedChar { ch: '=', offset })
    }

    fn angle(&mut self, bare: Token, with_eq: Token) -> Token {
        self.chars.next();
        if self.eat('=') {
            with_eq
        } else {
            bare
        }
    }

    fn doubled(&mut self, ch: char, token: Token, offset: usize) -> Result<Token> {
        self.chars.next();
        if self.eat(ch) {
            Ok(token)
        } else {
            Err(TriggerError::UnexpectedChar { ch, offset })
        }
    }

    fn number(&mut self, offset: usize) -> Token {
        let mut end = offset;
        if self.eat('-') {
            end += 1;
        }
        end = self.digits(end);

        // A fraction needs at least one digit after the dot.
        let rest = &self.source[end..];
        if rest.starts_with('.') && rest[1..].starts_with(|c: char| c.is_ascii_digit()) {
            self.chars.next();
            end = self.digits(end + 1);
        }

        // Only ASCII digits, an optional sign and one dot reach this point,
        // which `f64::from_str` always accepts.
        Token::Number(self.source[offset..end].parse().unwrap_or(f64::NAN))
    }

    fn digits(&mut self, mut end: usize) -> usize {
        while let Some(&(idx, c)) = self.chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            end = idx + 1;
            self.chars.next();
        }
        end
    }

    fn ident(&mut self, offset: usize) -> Token {
        let mut end = offset;
        while let Some(&(idx, c)) = self.chars.peek() {
            if !is_ident_continue(c) {
                break;
            }
            end = idx + c.len_utf8();
            self.chars.next();
        }

        match &self.source[offset..end] {
            "true" => Token::Bool(true),
            "false" => Token::Bool(false),
            "null" | "undefined" => Token::Null,
            name => Token::Ident(name.to_string()),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}
