//! Parser for Routix source code.
//!
//! Converts a token stream from [`crate::lexer`] into a [`Program`].
//!
//! # Architecture
//!
//! The parser uses a two-phase approach:
//!
//! 1. **Lexical analysis** - Source → Tokens (via [`crate::lexer`])
//! 2. **Parsing** - Tokens → AST (via chumsky combinators)
//!
//! # Usage
//!
//! ```rust
//! use routix_parser::parser::parse;
//!
//! let source = r#"
//! function double(x) = x * 2
//!
//! workflow triage {
//!     score {
//!         when case.priority == "high" then score += double(5)
//!     }
//! }
//! "#;
//!
//! let program = parse(source).unwrap();
//! assert_eq!(program.items.len(), 2);
//! ```
//!
//! # Error Handling
//!
//! Parsing is atomic: the first error (by source position) is reported as a
//! [`ParseError`] carrying its line, column, the expected token kinds, and
//! the token actually found.

mod declarations;
mod expressions;
mod primitives;


pub use primitives::Span;

use crate::ast::{Expr, Program};
use crate::error::{line_col, ParseError, Result};
use crate::lexer::{self, Token};
use chumsky::error::RichReason;
use chumsky::input::Input as _;
use chumsky::prelude::*;

/// Parse a complete Routix document.
pub fn parse(source: &str) -> Result<Program> {
    let tokens = lexer::lex(source)?;

    let eoi_span = Span::new((), source.len()..source.len());
    let token_stream = tokens.as_slice().split_token_span(eoi_span);

    let result = declarations::program()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| parse_error(source, &errs).into());
    result
}

/// Parse a single standalone expression, e.g. `case.score > 5 and !urgent`.
pub fn parse_expression(source: &str) -> Result<Expr> {
    let tokens = lexer::lex(source)?;

    let eoi_span = Span::new((), source.len()..source.len());
    let token_stream = tokens.as_slice().split_token_span(eoi_span);

    let result = expressions::expr()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| parse_error(source, &errs).into());
    result
}

/// Reduce chumsky's errors to the earliest one.
fn parse_error(source: &str, errs: &[Rich<'_, Token<'_>, Span>]) -> ParseError {
    let Some(error) = errs.iter().min_by_key(|e| e.span().start) else {
        let (line, column) = line_col(source, source.len());
        return ParseError {
            line,
            column,
            expected: vec![],
            found: "end of input".to_string(),
            message: "unexpected end of input".to_string(),
            span: source.len()..source.len(),
        };
    };

    let span = error.span();
    let (line, column) = line_col(source, span.start);

    let found = match error.found() {
        Some(tok) => format!("'{}'", tok),
        None => "end of input".to_string(),
    };

    let mut expected: Vec<String> = error.expected().map(|e| format!("{}", e)).collect();
    expected.sort();
    expected.dedup();

    let message = match error.reason() {
        RichReason::Custom(msg) => msg.clone(),
        _ if expected.is_empty() => format!("unexpected {}", found),
        _ => format!("unexpected {}, expected {}", found, expected.join(" or ")),
    };

    ParseError {
        line,
        column,
        expected,
        found,
        message,
        span: span.start..span.end,
    }
}
