//! Abstract Syntax Tree types for Routix.
//!
//! This module defines all types representing a parsed Routix program.
//! Declarations, rules, and names are wrapped in [`Spanned`] to track their
//! source location for diagnostics. Expressions are plain trees.
//!
//! # AST Structure
//!
//! The root type is [`Program`], an ordered list of declarations:
//!
//! ```text
//! Program
//! └── items: Vec<Item>
//!     ├── Item::Function(FunctionDef { name, params, body: Expr })
//!     └── Item::Workflow(Workflow)
//!         └── phases: Vec<Phase>
//!             ├── Phase::Score { rules: Vec<ScoreRule> }   (when <expr> then score += <expr> | log <expr>)
//!             └── Phase::Match { rules: Vec<MatchRule> }   (when <expr> then assign to <id>)
//! ```
//!
//! # Equality
//!
//! Spans never take part in equality, so a tree parsed from serialized text
//! compares equal to the tree it was serialized from.
//!
//! ```rust
//! use routix_parser::Spanned;
//!
//! let a = Spanned::new("triage".to_string(), 9..15);
//! let b = Spanned::new("triage".to_string(), 0..0);
//! assert_eq!(a, b);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A span in the source code represented as byte offsets.
pub type Span = Range<usize>;

/// A value with an associated source span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spanned<T> {
    /// The wrapped value.
    pub node: T,
    /// Source location as byte offsets.
    pub span: Span,
}

impl<T> Spanned<T> {
    /// Create a new spanned value.
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    /// Wrap a node that has no source location (built from a model or by hand).
    pub fn detached(node: T) -> Self {
        Self { node, span: 0..0 }
    }

    /// Transform the inner value while preserving the span.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            node: f(self.node),
            span: self.span,
        }
    }
}

impl<T: PartialEq> PartialEq for Spanned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

// ============================================================================
// Top-Level Program Structure
// ============================================================================

/// A complete parsed Routix document.
///
/// Functions and workflows keep their document order, in any interleaving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Program {
    pub items: Vec<Spanned<Item>>,
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum Item {
    Function(FunctionDef),
    Workflow(Workflow),
}

impl Program {
    /// All function definitions, in document order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.items.iter().filter_map(|item| match &item.node {
            Item::Function(f) => Some(f),
            Item::Workflow(_) => None,
        })
    }

    /// All workflows, in document order.
    pub fn workflows(&self) -> impl Iterator<Item = &Workflow> {
        self.items.iter().filter_map(|item| match &item.node {
            Item::Workflow(w) => Some(w),
            Item::Function(_) => None,
        })
    }

    /// Find a workflow by name.
    pub fn workflow(&self, name: &str) -> Option<&Workflow> {
        self.workflows().find(|w| w.name.node == name)
    }

    /// Find a function by name.
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions().find(|f| f.name.node == name)
    }
}

/// `function name(p1, p2) = body`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: Spanned<String>,
    /// Parameter names, unique within the definition.
    pub params: Vec<Spanned<String>>,
    pub body: Expr,
}

impl FunctionDef {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// `workflow name { phase* }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: Spanned<String>,
    /// Evaluated in document order.
    pub phases: Vec<Spanned<Phase>>,
}

/// A block of rules inside a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phase {
    /// Accumulates score and emits log lines; every rule runs.
    Score { rules: Vec<Spanned<ScoreRule>> },
    /// Picks an assignment; the first matching rule wins.
    Match { rules: Vec<Spanned<MatchRule>> },
}

impl Phase {
    pub fn keyword(&self) -> &'static str {
        match self {
            Phase::Score { .. } => "score",
            Phase::Match { .. } => "match",
        }
    }
}

/// `when <condition> then <action>` inside a score phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRule {
    pub condition: Expr,
    pub action: ScoreRuleAction,
}

/// The action of a [`ScoreRule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreRuleAction {
    /// `score += <delta>`
    Score { delta: Expr },
    /// `log <message>`
    Log { message: Expr },
}

/// `when <condition> then assign to <agent_id>` inside a match phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRule {
    pub condition: Expr,
    pub target_agent_id: String,
}

// ============================================================================
// Expressions
// ============================================================================

/// An expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Literal { value: Literal },
    /// Dot-path such as `case.score`; never empty.
    Identifier { path: Vec<String> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Function call; argument count is checked at evaluation time.
    Call { name: String, args: Vec<Expr> },
}

impl Expr {
    pub fn number(n: f64) -> Self {
        Expr::Literal {
            value: Literal::Number(n),
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::Literal {
            value: Literal::String(s.into()),
        }
    }

    pub fn bool(b: bool) -> Self {
        Expr::Literal {
            value: Literal::Bool(b),
        }
    }

    pub fn list(items: Vec<Expr>) -> Self {
        Expr::Literal {
            value: Literal::List(items),
        }
    }

    /// Build an identifier from a dotted path, e.g. `"agent.skills"`.
    pub fn ident(path: &str) -> Self {
        Expr::Identifier {
            path: path.split('.').map(str::to_string).collect(),
        }
    }

    pub fn not(operand: Expr) -> Self {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }
}

/// Literal forms. Lists may be heterogeneous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Number(f64),
    String(String),
    Bool(bool),
    List(Vec<Expr>),
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `!`
    #[serde(rename = "!")]
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "!" => Some(UnaryOp::Not),
            _ => None,
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    #[serde(rename = "or")]
    Or,
    #[serde(rename = "and")]
    And,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
}

impl BinOp {
    pub const ALL: [BinOp; 13] = [
        BinOp::Or,
        BinOp::And,
        BinOp::Eq,
        BinOp::Ne,
        BinOp::Gt,
        BinOp::Lt,
        BinOp::Ge,
        BinOp::Le,
        BinOp::In,
        BinOp::Add,
        BinOp::Sub,
        BinOp::Mul,
        BinOp::Div,
    ];

    /// Source form of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Or => "or",
            BinOp::And => "and",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Gt => ">",
            BinOp::Lt => "<",
            BinOp::Ge => ">=",
            BinOp::Le => "<=",
            BinOp::In => "in",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// Binding strength; all binary levels are left-associative.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Eq | BinOp::Ne => 3,
            BinOp::Gt | BinOp::Lt | BinOp::Ge | BinOp::Le | BinOp::In => 4,
            BinOp::Add | BinOp::Sub => 5,
            BinOp::Mul | BinOp::Div => 6,
        }
    }
}
