//! # routix
//!
//! Routix is a small DSL for case-routing workflows: rules that score cases
//! and assign them to agents.
//!
//! ## Features
//!
//! | Feature | Crate | Description |
//! |---------|-------|-------------|
//! | (always) | [`routix-parser`] | Lexer, AST, serializer, model mapper, validator |
//! | `engine` | [`routix-engine`] | Evaluator and rule engine |
//!
//! `default = ["engine"]`.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! routix = "0.1"
//! ```
//!
//! ```rust
//! use routix::engine::{EngineConfig, Record, RuleEngine};
//!
//! let program = routix::parse(
//!     "workflow w { score { when case.age > 3 then score += 1 } }",
//! )
//! .unwrap();
//! let engine = RuleEngine::from_program(&program, EngineConfig::default());
//!
//! let case = Record::new().with("age", 5.0);
//! let result = engine.run_by_name("w", &case, &[]).unwrap();
//! assert_eq!(result.final_score, 1.0);
//! ```

pub use routix_parser as parser;

pub use routix_parser::{
    from_model, parse, parse_expression, serialize, to_model, validate_program, Model, Program,
    RoutixError, Spanned,
};

#[cfg(feature = "engine")]
pub use routix_engine as engine;
