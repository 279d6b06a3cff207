use std::fmt;

use lazy_static::lazy_static;
use log::trace;
use regex::Regex;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Eof,
    Def,
    Extern,
    Ident(String),
    Number(f64),
    Char(char),
}

impl Token {
    /// Returns a human-readable description of the token
    pub fn describe(&self) -> String {
        match self {
            Token::Eof => "end of input".to_string(),
            Token::Def => "'def'".to_string(),
            Token::Extern => "'extern'".to_string(),
            Token::Ident(name) => format!("identifier '{}'", name),
            Token::Number(value) => format!("number {}", value),
            Token::Char(c) => format!("'{}'", c),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// 1-based position of a token in the source.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Default for Span {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum LexError {
    #[error("malformed number literal '{text}'")]
    MalformedNumber { text: String, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::MalformedNumber { span, .. } => *span,
        }
    }
}

lazy_static! {
    static ref WHITESPACE_RE: Regex = Regex::new(r"^[ \t\n\r\x0B\x0C]+").unwrap();
    static ref COMMENT_RE: Regex = Regex::new(r"^#[^\n\r]*").unwrap();
    static ref IDENT_RE: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9]*").unwrap();
    static ref NUMBER_RE: Regex = Regex::new(r"^[0-9.]+").unwrap();
}

/// Pulls tokens one at a time out of an in-memory source buffer.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    position: Span,
    token_start: Span,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            position: Span::default(),
            token_start: Span::default(),
        }
    }

    /// Position of the first character of the most recently produced token.
    pub fn token_start(&self) -> Span {
        self.token_start
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn bump(&mut self, len: usize) -> &'a str {
        let text = &self.source[self.offset..self.offset + len];
        for c in text.chars() {
            if c == '\n' {
                self.position.line += 1;
                self.position.column = 1;
            } else {
                self.position.column += 1;
            }
        }
        self.offset += len;
        text
    }

    fn eat(&mut self, re: &Regex) -> Option<&'a str> {
        let len = re.find(self.rest())?.end();
        Some(self.bump(len))
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            self.eat(&WHITESPACE_RE);
            self.token_start = self.position;

            if let Some(text) = self.eat(&IDENT_RE) {
                return Ok(match text {
                    "def" => Token::Def,
                    "extern" => Token::Extern,
                    _ => Token::Ident(text.to_string()),
                });
            }

            if let Some(text) = self.eat(&NUMBER_RE) {
                return text
                    .parse()
                    .map(Token::Number)
                    .map_err(|_| LexError::MalformedNumber {
                        text: text.to_string(),
                        span: self.token_start,
                    });
            }

            if self.eat(&COMMENT_RE).is_some() {
                trace!("skipped comment at {}", self.token_start);
                continue;
            }

            return Ok(match self.rest().chars().next() {
                Some(c) => {
                    self.bump(c.len_utf8());
                    Token::Char(c)
                }
                None => Token::Eof,
            });
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(Token::Eof) => None,
            res => Some(res),
        }
    }
}

/// lex the whole input, without the trailing end-of-input token
pub fn lex(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input).collect()
}
