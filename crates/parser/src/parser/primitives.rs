//! Primitive parsers for basic tokens.
//!
//! This module contains parsers for identifiers, names, and literals shared
//! by the expression and declaration parsers.

use crate::ast::Spanned;
use crate::lexer::{SpannedToken, Token};
use chumsky::input::MappedInput;
use chumsky::prelude::*;

/// Token span type (from lexer).
pub type Span = SimpleSpan<usize>;

/// Parser input type - a slice of spanned tokens mapped into chumsky format.
/// Created by calling `tokens.split_token_span(eoi_span)` on a token slice.
pub type ParserInput<'tokens, 'src> =
    MappedInput<'tokens, Token<'src>, Span, &'tokens [SpannedToken<'src>]>;

/// Convert a chumsky SimpleSpan to our AST Span (Range<usize>).
pub fn to_ast_span(span: Span) -> std::ops::Range<usize> {
    span.start..span.end
}

/// Convert an AST span back into a chumsky span for custom errors.
pub fn from_ast_span(span: &std::ops::Range<usize>) -> Span {
    Span::new((), span.clone())
}

/// Parse an identifier token, dot-paths included.
pub fn ident<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    &'src str,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    select! {
        Token::Ident(s) => s,
    }
    .labelled("identifier")
}

/// Parse a single-segment name (function, parameter) as a spanned string.
pub fn spanned_name<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<String>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    select! {
        Token::Ident(s) if !s.contains('.') => s,
    }
    .labelled("name")
    .map_with(|s, e| Spanned::new(s.to_string(), to_ast_span(e.span())))
}

/// Parse the target of `assign to`: a bare identifier or a string literal.
pub fn agent_id<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    String,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    select! {
        Token::Ident(s) => s.to_string(),
        Token::StringLit(s) => s.to_string(),
    }
    .labelled("agent id")
}
