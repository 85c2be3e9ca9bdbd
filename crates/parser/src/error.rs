//! Error types and error reporting for Routix.
//!
//! Every transform in this crate fails atomically: no partial token stream,
//! AST, or model is ever returned alongside an error.
//!
//! # Error Types
//!
//! - [`LexError`] - unrecognized character or unterminated string
//! - [`ParseError`] - unexpected token, with what was expected instead
//! - [`ModelError`] - structural violation when importing a model
//! - [`RoutixError`] - umbrella for the text pipeline
//!
//! # Pretty Printing
//!
//! Use [`ErrorReporter`] for user-friendly error output:
//!
//! ```rust
//! use routix_parser::{parse, ErrorReporter, RoutixError};
//!
//! let source = "workflow w { score { when then } }";
//! let reporter = ErrorReporter::new("triage.rtx", source);
//!
//! if let Err(RoutixError::Parse(err)) = parse(source) {
//!     assert_eq!(err.line, 1);
//!     // reporter.report_parse_error(&err).unwrap(); // Prints colorful error
//! }
//! ```

use ariadne::{Color, Label, Report, ReportKind, Source};
use std::ops::Range;
use thiserror::Error;

use crate::validation::{SemanticError, Severity};

/// Failure while turning text into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lex error at line {line}, column {column}: {message}")]
pub struct LexError {
    pub line: usize,
    pub column: usize,
    pub message: String,
    /// Byte range in the source.
    pub span: Range<usize>,
}

/// Failure while turning tokens into an AST. Parsing stops at the first error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    /// Human-readable descriptions of acceptable tokens.
    pub expected: Vec<String>,
    /// The offending token, or `end of input`.
    pub found: String,
    pub message: String,
    /// Byte range in the source.
    pub span: Range<usize>,
}

/// Failure while importing a structured model.
///
/// `path` locates the offending node, e.g.
/// `workflows[0].phases[1].rules[2].condition.left`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("model error at {path}: {message}")]
pub struct ModelError {
    pub path: String,
    pub message: String,
}

impl ModelError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// The main error type for Routix front-end operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutixError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result type for Routix front-end operations.
pub type Result<T> = std::result::Result<T, RoutixError>;

/// Convert a byte offset to (line, column), both 1-indexed.
pub(crate) fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Error reporter that uses ariadne for pretty error output.
pub struct ErrorReporter<'src> {
    source_name: String,
    source: &'src str,
}

impl<'src> ErrorReporter<'src> {
    /// Create a new error reporter.
    pub fn new(source_name: impl Into<String>, source: &'src str) -> Self {
        Self {
            source_name: source_name.into(),
            source,
        }
    }

    /// Report any front-end error to stderr.
    pub fn report(&self, error: &RoutixError) -> std::io::Result<()> {
        match error {
            RoutixError::Lex(e) => self.report_lex_error(e),
            RoutixError::Parse(e) => self.report_parse_error(e),
            RoutixError::Model(e) => {
                eprintln!("{}: {}", self.source_name, e);
                Ok(())
            }
        }
    }

    /// Report a lex error to stderr.
    pub fn report_lex_error(&self, error: &LexError) -> std::io::Result<()> {
        Report::build(ReportKind::Error, &self.source_name, error.span.start)
            .with_message("invalid token")
            .with_label(
                Label::new((&self.source_name, error.span.clone()))
                    .with_color(Color::Red)
                    .with_message(&error.message),
            )
            .finish()
            .eprint((&self.source_name, Source::from(self.source)))
    }

    /// Report a parse error to stderr.
    pub fn report_parse_error(&self, error: &ParseError) -> std::io::Result<()> {
        let mut report = Report::build(ReportKind::Error, &self.source_name, error.span.start)
            .with_message(&error.message)
            .with_label(
                Label::new((&self.source_name, error.span.clone()))
                    .with_color(Color::Red)
                    .with_message(format!("found {}", error.found)),
            );

        if !error.expected.is_empty() {
            report = report.with_note(format!("expected one of: {}", error.expected.join(", ")));
        }

        report
            .finish()
            .eprint((&self.source_name, Source::from(self.source)))
    }

    /// Report a semantic diagnostic to stderr.
    pub fn report_semantic_error(&self, error: &SemanticError) -> std::io::Result<()> {
        let span = error.span.clone().unwrap_or(0..0);
        let (kind, color) = match error.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        };

        let mut report = Report::build(kind, &self.source_name, span.start)
            .with_message(&error.message)
            .with_label(
                Label::new((&self.source_name, span))
                    .with_color(color)
                    .with_message("here"),
            );

        if let Some(ref hint) = error.hint {
            report = report.with_help(hint);
        }

        report
            .finish()
            .eprint((&self.source_name, Source::from(self.source)))
    }
}
