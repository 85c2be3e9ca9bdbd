//! # routix-engine
//!
//! Executes Routix workflows against case and agent records.
//!
//! - [`value`] - Runtime values and flat records, read straight from JSON
//! - [`context`] - What an expression can see, and the function table
//! - [`evaluator`] - Expression evaluation with a call-depth guard
//! - [`builtins`] - `len`, `max`, `min`, `contains`
//! - [`engine`] - The rule engine and its [`ExecutionResult`]
//! - [`config`] - [`EngineConfig`], loadable from JSON
//!
//! ## Quick Start
//!
//! ```rust
//! use routix_engine::{EngineConfig, Record, RuleEngine};
//!
//! let engine = RuleEngine::from_source(
//!     r#"
//!     function decay(age) = age * 2
//!
//!     workflow triage {
//!         score {
//!             when case.age > 3 then score += decay(case.age)
//!             when case.priority == "high" then log "escalated"
//!         }
//!         match {
//!             when "billing" in agent.skills then assign to agent_42
//!         }
//!     }
//!     "#,
//!     EngineConfig::default(),
//! )
//! .unwrap();
//!
//! let case = Record::new().with("age", 5.0).with("priority", "high");
//! let agents = vec![Record::new().with("skills", vec!["billing", "refunds"])];
//!
//! let result = engine.run_by_name("triage", &case, &agents).unwrap();
//! assert_eq!(result.final_score, 10.0);
//! assert_eq!(result.logs, vec!["escalated"]);
//! assert_eq!(result.assignment.as_deref(), Some("agent_42"));
//! ```

pub mod builtins;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod value;

pub use config::{AssignmentMode, EngineConfig, DEFAULT_MAX_CALL_DEPTH};
pub use context::{Context, FunctionTable};
pub use engine::{ExecutionResult, RuleEngine};
pub use error::{EngineError, EvalError};
pub use evaluator::{evaluate, Evaluator};
pub use value::{Record, Value};
