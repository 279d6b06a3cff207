//! Front end for plang: a pull-based lexer and a precedence-climbing parser
//! producing an owned AST of numbers, variables, binary operations, calls,
//! prototypes and function definitions.

pub mod ast;
pub mod diagnostic;
pub mod lexer;
pub mod parser;
pub mod precedence;

pub use ast::{ASTNode, Expression, Function, Prototype};
pub use lexer::{lex, LexError, Lexer, Span, Token};
pub use parser::{parse_str, Parser, ParserError};
pub use precedence::{PrecedenceError, PrecedenceTable};
