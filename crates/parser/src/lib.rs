#![recursion_limit = "512"]

//! # routix-parser
//!
//! The language toolchain for Routix, a small DSL for case-routing
//! workflows: rules that score cases and assign them to agents.
//!
//! This crate provides:
//!
//! - **Lexing** with case-insensitive keywords and dot-path identifiers
//! - **Parsing** into a typed AST with span tracking
//! - **Serialization** back to canonical source text
//! - **Model mapping** to and from the editor's JSON structure
//! - **Semantic validation** with ariadne-rendered diagnostics
//! - **WASM bindings** for the browser editor
//!
//! Evaluating workflows lives in the `routix-engine` crate.
//!
//! ## Quick Start
//!
//! ```rust
//! use routix_parser::{parse, serialize, to_model};
//!
//! let source = r#"
//! ## Older tickets gain priority over time
//! method decay(age) = age * 2
//!
//! WORKFLOW triage {
//!     SCORE {
//!         when case.age > 3 then score += decay(case.age)
//!         when case.priority == "high" then log "escalated"
//!     }
//!     MATCH {
//!         when "billing" in agent.skills then assign to agent_42
//!     }
//! }
//! "#;
//!
//! let program = parse(source).unwrap();
//! assert_eq!(program.workflows().count(), 1);
//!
//! // Canonical text drops comments and lowercases keywords
//! let text = serialize(&program);
//! assert!(text.starts_with("function decay(age) = age * 2\n"));
//!
//! let model = to_model(&program);
//! assert_eq!(model["functions"][0]["name"], "decay");
//! ```
//!
//! ## Language Overview
//!
//! | Construct | Form |
//! |-----------|------|
//! | Function | `function name(a, b) = expr` (`method` is a synonym) |
//! | Workflow | `workflow name { phase* }` |
//! | Score phase | `score { when expr then score += expr }` or `... then log expr` |
//! | Match phase | `match { when expr then assign to agent_id }` |
//!
//! Expressions support `or`, `and`, `==`, `!=`, `<`, `>`, `<=`, `>=`, `in`,
//! `+`, `-`, `*`, `/`, `!`, calls, list literals, and parentheses.
//!
//! ## Module Overview
//!
//! - [`ast`] - Abstract Syntax Tree types
//! - [`lexer`] - Tokenization
//! - [`parser`] - Recursive descent parser using chumsky combinators
//! - [`serializer`] - AST to canonical text
//! - [`model`] - AST to and from the structured JSON model
//! - [`validation`] - Semantic checks
//! - [`error`] - Error types with pretty printing via ariadne
//!
//! ## Feature Flags
//!
//! - `wasm` - Enable WebAssembly bindings for browser use
//!
//! ## Error Handling
//!
//! Every transform fails atomically with a positioned error:
//!
//! ```rust
//! use routix_parser::{parse, RoutixError};
//!
//! match parse("workflow w { score { when } }") {
//!     Err(RoutixError::Parse(err)) => {
//!         assert_eq!((err.line, err.column), (1, 27));
//!         assert_eq!(err.found, "'}'");
//!     }
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod serializer;
pub mod validation;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use ast::{
    BinOp, Expr, FunctionDef, Item, Literal, MatchRule, Phase, Program, ScoreRule,
    ScoreRuleAction, Spanned, UnaryOp, Workflow,
};
pub use error::{ErrorReporter, LexError, ModelError, ParseError, Result, RoutixError};
pub use lexer::{tokenize, Lexeme, TokenKind};
pub use model::{from_model, to_model, Model};
pub use parser::{parse, parse_expression};
pub use serializer::{serialize, serialize_expr};
pub use validation::{validate_program, SemanticError, Severity, BUILTIN_FUNCTIONS};
