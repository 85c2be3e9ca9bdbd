//! Lexer for Routix source code.
//!
//! This module turns raw text into a flat token stream:
//!
//! - Keywords (`workflow`, `score`, `match`, `when`, `then`, ...), matched
//!   case-insensitively
//! - Identifiers, including dot-paths such as `case.score` (case-sensitive)
//! - Literals (numbers, double-quoted strings, booleans)
//! - Operators and punctuation (`==`, `>=`, `+=`, `{`, `[`, ...)
//!
//! Whitespace and `#` comments never reach the parser.
//!
//! # Example
//!
//! ```rust
//! use routix_parser::lexer::{tokenize, TokenKind};
//!
//! let lexemes = tokenize("WHEN case.score > 3").unwrap();
//! assert_eq!(lexemes[0].kind, TokenKind::Keyword);
//! assert_eq!(lexemes[0].text, "WHEN");
//! assert_eq!(lexemes[1].kind, TokenKind::Identifier);
//! assert_eq!(lexemes[1].text, "case.score");
//! assert_eq!(lexemes.last().unwrap().kind, TokenKind::EndOfInput);
//! ```
//!
//! # Token Types
//!
//! | Category | Examples |
//! |----------|----------|
//! | Keywords | `workflow`, `function`, `score`, `log`, `assign` |
//! | Keyword operators | `and`, `or`, `in` |
//! | Operators | `==`, `!=`, `<=`, `+`, `!`, `=`, `+=` |
//! | Literals | `"text"`, `42`, `3.5`, `true` |
//! | Punctuation | `{ } ( ) [ ] ,` |

use chumsky::prelude::*;
use serde::Serialize;

use crate::error::{line_col, LexError};

/// A token in Routix.
///
/// Produced by [`lexer()`]; borrowed slices point back into the source.
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'src> {
    // Keywords
    Workflow,
    Function,
    Score,
    Match,
    When,
    Then,
    Assign,
    To,
    Log,

    // Keyword operators
    And,
    Or,
    In,

    // Literals
    Bool(bool),
    NumberLit(f64),
    StringLit(&'src str),

    // Identifier, possibly a dot-path (`agent.skills`)
    Ident(&'src str),

    // Operators
    Eq,         // ==
    Ne,         // !=
    Lt,         // <
    Gt,         // >
    Le,         // <=
    Ge,         // >=
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Bang,       // !
    Equals,     // =
    PlusEquals, // +=

    // Punctuation
    LBrace,   // {
    RBrace,   // }
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    Comma,    // ,

    // Comment (text without #), dropped by `lex`
    Comment(&'src str),
}

impl Token<'_> {
    /// The coarse category this token belongs to.
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Workflow
            | Token::Function
            | Token::Score
            | Token::Match
            | Token::When
            | Token::Then
            | Token::Assign
            | Token::To
            | Token::Log => TokenKind::Keyword,
            Token::And | Token::Or | Token::In => TokenKind::KeywordOperator,
            Token::Bool(_) => TokenKind::Boolean,
            Token::NumberLit(_) => TokenKind::Number,
            Token::StringLit(_) => TokenKind::String,
            Token::Ident(_) => TokenKind::Identifier,
            Token::Comment(_) => TokenKind::Comment,
            _ => TokenKind::Punctuation,
        }
    }
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Workflow => write!(f, "workflow"),
            Token::Function => write!(f, "function"),
            Token::Score => write!(f, "score"),
            Token::Match => write!(f, "match"),
            Token::When => write!(f, "when"),
            Token::Then => write!(f, "then"),
            Token::Assign => write!(f, "assign"),
            Token::To => write!(f, "to"),
            Token::Log => write!(f, "log"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::In => write!(f, "in"),
            Token::Bool(b) => write!(f, "{}", b),
            Token::NumberLit(n) => write!(f, "{}", n),
            Token::StringLit(s) => write!(f, "\"{}\"", s),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Eq => write!(f, "=="),
            Token::Ne => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Le => write!(f, "<="),
            Token::Ge => write!(f, ">="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Bang => write!(f, "!"),
            Token::Equals => write!(f, "="),
            Token::PlusEquals => write!(f, "+="),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Comment(s) => write!(f, "# {}", s),
        }
    }
}

/// Token categories exposed through [`tokenize()`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Keyword,
    Identifier,
    Number,
    String,
    Boolean,
    Punctuation,
    KeywordOperator,
    Comment,
    EndOfInput,
}

/// A positioned token with its original text. Lines and columns are 1-indexed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Lexeme {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

/// Span type for tokens.
pub type Span = SimpleSpan<usize>;

/// A token with its span.
pub type SpannedToken<'src> = (Token<'src>, Span);

/// Look up a word in the keyword table. Matching ignores ASCII case; `method`
/// is accepted as a synonym for `function`.
fn keyword<'src>(word: &str) -> Option<Token<'src>> {
    let token = match word.to_ascii_lowercase().as_str() {
        "workflow" => Token::Workflow,
        "function" | "method" => Token::Function,
        "score" => Token::Score,
        "match" => Token::Match,
        "when" => Token::When,
        "then" => Token::Then,
        "assign" => Token::Assign,
        "to" => Token::To,
        "log" => Token::Log,
        "and" => Token::And,
        "or" => Token::Or,
        "in" => Token::In,
        "true" => Token::Bool(true),
        "false" => Token::Bool(false),
        _ => return None,
    };
    Some(token)
}

/// Whether `word` is reserved (any casing).
pub fn is_keyword(word: &str) -> bool {
    keyword(word).is_some()
}

/// Whether `text` lexes as a single [`Token::Ident`]: dot-separated ASCII
/// identifier segments, and not a bare keyword.
pub fn is_identifier(text: &str) -> bool {
    let segment_ok = |seg: &str| {
        let mut chars = seg.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    text.split('.').all(segment_ok) && (text.contains('.') || !is_keyword(text))
}

/// Create the lexer parser.
pub fn lexer<'src>(
) -> impl Parser<'src, &'src str, Vec<SpannedToken<'src>>, extra::Err<Rich<'src, char, Span>>> {
    let comment = just('#')
        .ignore_then(none_of('\n').repeated().to_slice())
        .map(Token::Comment);

    // No escape sequences: a backslash is kept as-is
    let string_lit = just('"')
        .ignore_then(none_of('"').repeated().to_slice())
        .then_ignore(just('"'))
        .map(Token::StringLit);

    // Decimal with optional fraction; a leading '-' is its own token and
    // leading zeros are kept (`007` is one number)
    let number = text::digits(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .try_map(|s: &str, span| {
            s.parse::<f64>()
                .map(Token::NumberLit)
                .map_err(|e| Rich::custom(span, e))
        });

    // Multi-character operators (must come before single char versions)
    let multi_char_ops = choice((
        just("==").to(Token::Eq),
        just("!=").to(Token::Ne),
        just("<=").to(Token::Le),
        just(">=").to(Token::Ge),
        just("+=").to(Token::PlusEquals),
    ));

    let single_char_ops = choice((
        just('<').to(Token::Lt),
        just('>').to(Token::Gt),
        just('=').to(Token::Equals),
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Star),
        just('/').to(Token::Slash),
        just('!').to(Token::Bang),
        just('{').to(Token::LBrace),
        just('}').to(Token::RBrace),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
        just(',').to(Token::Comma),
    ));

    // Words: keyword lookup on single segments, otherwise an identifier path
    let word = text::ascii::ident()
        .then(just('.').then(text::ascii::ident()).repeated())
        .to_slice()
        .map(|s: &'src str| {
            if s.contains('.') {
                Token::Ident(s)
            } else {
                keyword(s).unwrap_or(Token::Ident(s))
            }
        });

    let token = choice((
        comment,
        string_lit,
        number,
        multi_char_ops,
        single_char_ops,
        word,
    ));

    let whitespace = one_of(" \t\r\n").repeated();

    whitespace
        .clone()
        .ignore_then(
            token
                .map_with(|tok, e| (tok, e.span()))
                .then_ignore(whitespace)
                .repeated()
                .collect::<Vec<_>>(),
        )
        .then_ignore(end())
}

/// Lex source into parser tokens, dropping comments.
///
/// Fails atomically on the first unrecognized character or unterminated
/// string literal.
pub fn lex(source: &str) -> Result<Vec<SpannedToken<'_>>, LexError> {
    let tokens = lexer()
        .parse(source)
        .into_result()
        .map_err(|errs| lex_error(source, &errs))?;

    Ok(tokens
        .into_iter()
        .filter(|(tok, _)| !matches!(tok, Token::Comment(_)))
        .collect())
}

/// Tokenize source into positioned [`Lexeme`]s, terminated by an
/// [`TokenKind::EndOfInput`] lexeme.
pub fn tokenize(source: &str) -> Result<Vec<Lexeme>, LexError> {
    let mut lexemes: Vec<Lexeme> = lex(source)?
        .into_iter()
        .map(|(tok, span)| {
            let (line, column) = line_col(source, span.start);
            Lexeme {
                kind: tok.kind(),
                text: source[span.start..span.end].to_string(),
                line,
                column,
            }
        })
        .collect();

    let (line, column) = line_col(source, source.len());
    lexemes.push(Lexeme {
        kind: TokenKind::EndOfInput,
        text: String::new(),
        line,
        column,
    });
    Ok(lexemes)
}

fn lex_error(source: &str, errs: &[Rich<'_, char, Span>]) -> LexError {
    let earliest = errs.iter().min_by_key(|e| e.span().start);

    // An open quote swallows the rest of the file, so report where it began,
    // unless something before it already failed
    let first_failure = earliest.map_or(source.len(), |e| e.span().start);
    if let Some(start) = unterminated_string_start(source).filter(|&s| s <= first_failure) {
        let (line, column) = line_col(source, start);
        return LexError {
            line,
            column,
            message: "unterminated string literal".to_string(),
            span: start..source.len(),
        };
    }

    let Some(err) = earliest else {
        let (line, column) = line_col(source, 0);
        return LexError {
            line,
            column,
            message: "invalid input".to_string(),
            span: 0..0,
        };
    };

    let span = err.span();
    let (line, column) = line_col(source, span.start);
    let message = match err.found() {
        Some(c) => format!("unexpected character '{}'", c),
        None => "unexpected end of input".to_string(),
    };
    LexError {
        line,
        column,
        message,
        span: span.start..span.end,
    }
}

/// Byte offset of a string literal that is never closed, if any.
fn unterminated_string_start(source: &str) -> Option<usize> {
    let mut open: Option<usize> = None;
    let mut in_comment = false;
    for (i, ch) in source.char_indices() {
        match (open, ch) {
            (None, '\n') if in_comment => in_comment = false,
            (None, _) if in_comment => {}
            (None, '#') => in_comment = true,
            (None, '"') => open = Some(i),
            (Some(_), '"') => open = None,
            _ => {}
        }
    }
    open
}
