//! AST Serializer - Convert a Routix AST back to source text.
//!
//! The output is canonical: re-parsing it yields a structurally equal AST and
//! re-serializing that AST yields the same text.
//!
//! # Example
//!
//! ```rust
//! use routix_parser::{parse, serialize};
//!
//! let ast = parse("WORKFLOW w { SCORE { WHEN case.age>3 THEN score+=1 } }").unwrap();
//! assert_eq!(
//!     serialize(&ast),
//!     "workflow w {\n    score {\n        when case.age > 3 then score += 1\n    }\n}\n"
//! );
//! ```
//!
//! # Formatting
//!
//! - 4-space indentation per block level
//! - Lowercase keywords, one rule per line
//! - Single spaces around binary operators
//! - Parentheses only where precedence requires them
//! - A blank line between top-level declarations

use crate::ast::*;
use crate::lexer::is_identifier;

/// Serialize a [`Program`] to Routix source code.
pub fn serialize(program: &Program) -> String {
    let mut w = Writer::new();
    w.write_program(program);
    w.finish()
}

/// Serialize a single expression.
///
/// ```rust
/// use routix_parser::{ast::{BinOp, Expr}, serializer::serialize_expr};
///
/// let e = Expr::binary(
///     BinOp::Mul,
///     Expr::binary(BinOp::Add, Expr::number(1.0), Expr::number(2.0)),
///     Expr::number(3.0),
/// );
/// assert_eq!(serialize_expr(&e), "(1 + 2) * 3");
/// ```
pub fn serialize_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

/// Internal writer for building output.
struct Writer {
    output: String,
    indent: usize,
}

impl Writer {
    fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    fn finish(self) -> String {
        self.output
    }

    /// Write indentation at current level (4 spaces per level).
    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
    }

    fn indent(&mut self) {
        self.indent += 1;
    }

    fn dedent(&mut self) {
        if self.indent > 0 {
            self.indent -= 1;
        }
    }

    /// Write a line with current indentation.
    fn writeln(&mut self, text: &str) {
        self.write_indent();
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn newline(&mut self) {
        self.output.push('\n');
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn write_program(&mut self, program: &Program) {
        for (i, item) in program.items.iter().enumerate() {
            if i > 0 {
                self.newline();
            }
            match &item.node {
                Item::Function(f) => self.write_function(f),
                Item::Workflow(w) => self.write_workflow(w),
            }
        }
    }

    fn write_function(&mut self, function: &FunctionDef) {
        let params: Vec<&str> = function.params.iter().map(|p| p.node.as_str()).collect();
        self.writeln(&format!(
            "function {}({}) = {}",
            function.name.node,
            params.join(", "),
            serialize_expr(&function.body)
        ));
    }

    fn write_workflow(&mut self, workflow: &Workflow) {
        self.writeln(&format!("workflow {} {{", workflow.name.node));
        self.indent();
        for phase in &workflow.phases {
            self.write_phase(&phase.node);
        }
        self.dedent();
        self.writeln("}");
    }

    fn write_phase(&mut self, phase: &Phase) {
        self.writeln(&format!("{} {{", phase.keyword()));
        self.indent();
        match phase {
            Phase::Score { rules } => {
                for rule in rules {
                    self.write_score_rule(&rule.node);
                }
            }
            Phase::Match { rules } => {
                for rule in rules {
                    self.write_match_rule(&rule.node);
                }
            }
        }
        self.dedent();
        self.writeln("}");
    }

    fn write_score_rule(&mut self, rule: &ScoreRule) {
        let action = match &rule.action {
            ScoreRuleAction::Score { delta } => format!("score += {}", serialize_expr(delta)),
            ScoreRuleAction::Log { message } => format!("log {}", serialize_expr(message)),
        };
        self.writeln(&format!(
            "when {} then {}",
            serialize_expr(&rule.condition),
            action
        ));
    }

    fn write_match_rule(&mut self, rule: &MatchRule) {
        let target = if is_identifier(&rule.target_agent_id) {
            rule.target_agent_id.clone()
        } else {
            quote(&rule.target_agent_id)
        };
        self.writeln(&format!(
            "when {} then assign to {}",
            serialize_expr(&rule.condition),
            target
        ));
    }
}

// ============================================================================
// Expressions
// ============================================================================

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Literal { value } => write_literal(out, value),
        Expr::Identifier { path } => out.push_str(&path.join(".")),
        Expr::Unary { op, operand } => {
            out.push_str(op.symbol());
            write_operand(out, operand, matches!(**operand, Expr::Binary { .. }));
        }
        Expr::Binary { op, left, right } => {
            let prec = op.precedence();
            write_operand(out, left, binary_precedence(left).is_some_and(|p| p < prec));
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            // Left-associative: an equal-precedence right child needs parens
            write_operand(out, right, binary_precedence(right).is_some_and(|p| p <= prec));
        }
        Expr::Call { name, args } => {
            out.push_str(name);
            out.push('(');
            write_list(out, args);
            out.push(')');
        }
    }
}

fn write_operand(out: &mut String, expr: &Expr, parenthesize: bool) {
    if parenthesize {
        out.push('(');
        write_expr(out, expr);
        out.push(')');
    } else {
        write_expr(out, expr);
    }
}

fn write_list(out: &mut String, items: &[Expr]) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, item);
    }
}

fn write_literal(out: &mut String, literal: &Literal) {
    match literal {
        // No signed literals in the grammar
        Literal::Number(n) if n.is_sign_negative() => {
            out.push_str(&format!("(0 - {})", -n));
        }
        Literal::Number(n) => out.push_str(&n.to_string()),
        Literal::String(s) => out.push_str(&quote(s)),
        Literal::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Literal::List(items) => {
            out.push('[');
            write_list(out, items);
            out.push(']');
        }
    }
}

fn binary_precedence(expr: &Expr) -> Option<u8> {
    match expr {
        Expr::Binary { op, .. } => Some(op.precedence()),
        _ => None,
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s)
}
