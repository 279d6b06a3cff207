use std::mem;

use log::{debug, trace};

use crate::ast::{ASTNode, Expression, Function, Prototype};
use crate::lexer::{LexError, Lexer, Span, Token};
use crate::precedence::PrecedenceTable;

/// Deepest chain of nested sub-expressions (parentheses, call arguments,
/// tighter-binding operator runs) the parser will recurse into.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Tallest expression tree the parser will build.
pub const MAX_EXPRESSION_HEIGHT: usize = 512;

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum ParserError {
    #[error("expected expression, found {found}")]
    ExpectedExpression { found: Token, span: Span },
    #[error("expected ')' or ',' in argument list, found {found}")]
    ExpectedArgumentDelimiter { found: Token, span: Span },
    #[error("expected ')', found {found}")]
    ExpectedCloseParen { found: Token, span: Span },
    #[error("expected function name in prototype, found {found}")]
    ExpectedFunctionName { found: Token, span: Span },
    #[error("expected '(' in prototype, found {found}")]
    ExpectedPrototypeOpen { found: Token, span: Span },
    #[error("expected ')' in prototype, found {found}")]
    ExpectedPrototypeClose { found: Token, span: Span },
    #[error("duplicate parameter '{name}' in prototype of '{function}'")]
    DuplicateParameter {
        name: String,
        function: String,
        span: Span,
    },
    #[error("expression nested too deeply")]
    NestingTooDeep { span: Span },
    #[error(transparent)]
    Lex(#[from] LexError),
}

impl ParserError {
    pub fn span(&self) -> Span {
        match self {
            ParserError::ExpectedExpression { span, .. }
            | ParserError::ExpectedArgumentDelimiter { span, .. }
            | ParserError::ExpectedCloseParen { span, .. }
            | ParserError::ExpectedFunctionName { span, .. }
            | ParserError::ExpectedPrototypeOpen { span, .. }
            | ParserError::ExpectedPrototypeClose { span, .. }
            | ParserError::DuplicateParameter { span, .. }
            | ParserError::NestingTooDeep { span } => *span,
            ParserError::Lex(err) => err.span(),
        }
    }
}

pub type PartialParseResult = Result<Expression, ParserError>;

/// An expression together with the height of its tree.
type Subtree = (Expression, usize);
type SubtreeResult = Result<Subtree, ParserError>;

fn within_height(height: usize, span: Span) -> Result<usize, ParserError> {
    if height > MAX_EXPRESSION_HEIGHT {
        return Err(ParserError::NestingTooDeep { span });
    }
    Ok(height)
}

/// Recursive descent parser holding exactly one token of lookahead.
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    precedence: &'a PrecedenceTable,
    current: Token,
    span: Span,
    depth: usize,
    done: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, precedence: &'a PrecedenceTable) -> Result<Self, ParserError> {
        let mut parser = Self {
            lexer: Lexer::new(source),
            precedence,
            current: Token::Eof,
            span: Span::default(),
            depth: 0,
            done: false,
        };
        parser.advance()?;
        Ok(parser)
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    /// Position of the current token.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Pulls the next token into the lookahead slot and returns the consumed one.
    fn advance(&mut self) -> Result<Token, ParserError> {
        let next = self.lexer.next_token()?;
        self.span = self.lexer.token_start();
        trace!("{}: {}", self.span, next);
        Ok(mem::replace(&mut self.current, next))
    }

    /// Discards the current token. Drivers use this to move past a failed item.
    pub fn skip_token(&mut self) -> Result<(), ParserError> {
        self.done = false;
        self.advance().map(|_| ())
    }

    fn unexpected<F>(&self, make: F) -> ParserError
    where
        F: FnOnce(Token, Span) -> ParserError,
    {
        make(self.current.clone(), self.span)
    }

    fn expect_char<F>(&mut self, expected: char, make: F) -> Result<(), ParserError>
    where
        F: FnOnce(Token, Span) -> ParserError,
    {
        if self.current != Token::Char(expected) {
            return Err(self.unexpected(make));
        }
        self.advance()?;
        Ok(())
    }

    /// Runs `parse` one nesting level deeper, failing once the limit is hit.
    fn descend<T, F>(&mut self, parse: F) -> Result<T, ParserError>
    where
        F: FnOnce(&mut Self) -> Result<T, ParserError>,
    {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParserError::NestingTooDeep { span: self.span });
        }
        self.depth += 1;
        let res = parse(self);
        self.depth -= 1;
        res
    }

    fn binary_operator(&self) -> Option<(char, u32)> {
        match self.current {
            Token::Char(op) => self.precedence.precedence(op).map(|pr| (op, pr)),
            _ => None,
        }
    }

    fn parse_identifier(&mut self, name: String) -> SubtreeResult {
        let span = self.span;
        self.advance()?;
        if self.current != Token::Char('(') {
            return Ok((Expression::Variable(name), 1));
        }
        self.advance()?;

        let mut args = Vec::new();
        let mut height = 0;
        if self.current != Token::Char(')') {
            loop {
                let (arg, arg_height) = self.parse_subtree()?;
                args.push(arg);
                height = height.max(arg_height);
                match self.current {
                    Token::Char(')') => break,
                    Token::Char(',') => {
                        self.advance()?;
                    }
                    _ => {
                        return Err(self.unexpected(|found, span| {
                            ParserError::ExpectedArgumentDelimiter { found, span }
                        }))
                    }
                }
            }
        }
        self.advance()?;

        let height = within_height(height + 1, span)?;
        Ok((Expression::Call(name, args), height))
    }

    fn parse_nested(&mut self) -> SubtreeResult {
        self.advance()?;
        let res = self.parse_subtree()?;
        self.expect_char(')', |found, span| ParserError::ExpectedCloseParen {
            found,
            span,
        })?;
        Ok(res)
    }

    fn parse_primary(&mut self) -> SubtreeResult {
        match &self.current {
            Token::Number(value) => {
                let value = *value;
                self.advance()?;
                Ok((Expression::Literal(value), 1))
            }
            Token::Ident(name) => {
                let name = name.clone();
                self.parse_identifier(name)
            }
            Token::Char('(') => self.parse_nested(),
            _ => Err(self.unexpected(|found, span| ParserError::ExpectedExpression {
                found,
                span,
            })),
        }
    }

    /// Folds `(op primary)*` into `lhs` while the operators bind at least as
    /// tightly as `expr_precedence`.
    fn parse_rhs(&mut self, expr_precedence: u32, lhs: Subtree) -> SubtreeResult {
        let (mut lhs, mut lhs_height) = lhs;
        loop {
            let (operator, precedence) = match self.binary_operator() {
                Some((op, pr)) if pr >= expr_precedence => (op, pr),
                _ => return Ok((lhs, lhs_height)),
            };
            let span = self.span;
            self.advance()?;

            let mut rhs = self.parse_primary()?;

            if let Some((_, next_precedence)) = self.binary_operator() {
                if precedence < next_precedence {
                    rhs = self.descend(move |parser| parser.parse_rhs(precedence + 1, rhs))?;
                }
            }

            let (rhs, rhs_height) = rhs;
            lhs_height = within_height(lhs_height.max(rhs_height) + 1, span)?;
            lhs = Expression::Binary(operator, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_subtree(&mut self) -> SubtreeResult {
        self.descend(|parser| {
            let lhs = parser.parse_primary()?;
            parser.parse_rhs(0, lhs)
        })
    }

    pub fn parse_expr(&mut self) -> PartialParseResult {
        self.parse_subtree().map(|(expr, _)| expr)
    }

    pub fn parse_prototype(&mut self) -> Result<Prototype, ParserError> {
        let name = match &self.current {
            Token::Ident(name) => name.clone(),
            _ => {
                return Err(self.unexpected(|found, span| ParserError::ExpectedFunctionName {
                    found,
                    span,
                }))
            }
        };
        self.advance()?;
        self.expect_char('(', |found, span| ParserError::ExpectedPrototypeOpen {
            found,
            span,
        })?;

        let mut args: Vec<String> = Vec::new();
        loop {
            let arg = match &self.current {
                Token::Ident(arg) => arg.clone(),
                _ => break,
            };
            if args.contains(&arg) {
                return Err(ParserError::DuplicateParameter {
                    name: arg,
                    function: name,
                    span: self.span,
                });
            }
            args.push(arg);
            self.advance()?;
        }

        self.expect_char(')', |found, span| ParserError::ExpectedPrototypeClose {
            found,
            span,
        })?;

        Ok(Prototype { name, args })
    }

    pub fn parse_definition(&mut self) -> Result<Function, ParserError> {
        self.advance()?;
        let prototype = self.parse_prototype()?;
        let body = self.parse_expr()?;
        Ok(Function { prototype, body })
    }

    pub fn parse_extern(&mut self) -> Result<Prototype, ParserError> {
        self.advance()?;
        self.parse_prototype()
    }

    pub fn parse_top_level_expr(&mut self) -> Result<Function, ParserError> {
        let body = self.parse_expr()?;
        Ok(Function::anonymous(body))
    }

    /// Parses the next top-level item, or returns `None` once the input is
    /// exhausted. Stray `;` delimiters between items are ignored.
    pub fn parse_item(&mut self) -> Result<Option<ASTNode>, ParserError> {
        while self.current == Token::Char(';') {
            self.advance()?;
        }

        let start = self.span;
        let node = match self.current {
            Token::Eof => return Ok(None),
            Token::Def => ASTNode::Function(self.parse_definition()?),
            Token::Extern => ASTNode::Extern(self.parse_extern()?),
            _ => ASTNode::Function(self.parse_top_level_expr()?),
        };
        debug!("{}: parsed {}", start, node);

        Ok(Some(node))
    }
}

impl<'a> Iterator for Parser<'a> {
    type Item = Result<ASTNode, ParserError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.parse_item() {
            Ok(Some(node)) => Some(Ok(node)),
            Ok(None) => None,
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Parses every top-level item in `source`, stopping at the first error.
pub fn parse_str(source: &str, precedence: &PrecedenceTable) -> Result<Vec<ASTNode>, ParserError> {
    Parser::new(source, precedence)?.collect()
}
