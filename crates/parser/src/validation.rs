//! Semantic checks over a parsed [`Program`].
//!
//! Errors mark programs that cannot run as written; warnings flag code that
//! parses but will most likely fail or misbehave at evaluation time.

use crate::ast::{Expr, FunctionDef, Phase, Program, ScoreRuleAction, Spanned};
use serde::Serialize;
use std::collections::HashMap;
use std::ops::Range;

/// Functions every engine provides unless built-ins are disabled.
pub const BUILTIN_FUNCTIONS: [&str; 4] = ["len", "max", "min", "contains"];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SemanticError {
    pub message: String,
    pub span: Option<Range<usize>>,
    pub severity: Severity,
    pub hint: Option<String>,
}

impl SemanticError {
    fn error(message: String, span: &Range<usize>, hint: Option<String>) -> Self {
        Self {
            message,
            span: Some(span.clone()),
            severity: Severity::Error,
            hint,
        }
    }

    fn warning(message: String, span: &Range<usize>, hint: Option<String>) -> Self {
        Self {
            message,
            span: Some(span.clone()),
            severity: Severity::Warning,
            hint,
        }
    }
}

/// Run every check and return the diagnostics in document order per check.
pub fn validate_program(program: &Program) -> Vec<SemanticError> {
    let mut checker = Checker {
        arities: HashMap::new(),
        errors: Vec::new(),
    };

    // Rule 1 & 2: Unique function and parameter names
    for function in program.functions() {
        if checker
            .arities
            .insert(function.name.node.as_str(), function.arity())
            .is_some()
        {
            checker.errors.push(SemanticError::error(
                format!("Function '{}' is defined more than once", function.name.node),
                &function.name.span,
                Some("Rename one of the definitions".to_string()),
            ));
        }
        validate_params(function, &mut checker.errors);
    }

    // Rule 3-5: Calls and names inside function bodies
    for function in program.functions() {
        let scope = Scope {
            params: &function.params,
            in_score: false,
            span: &function.name.span,
        };
        checker.check_expr(&function.body, &scope);
    }

    // Rule 3-6: Workflows
    for workflow in program.workflows() {
        if workflow.phases.is_empty() {
            checker.errors.push(SemanticError::warning(
                format!("Workflow '{}' has no phases", workflow.name.node),
                &workflow.name.span,
                None,
            ));
        }

        for phase in &workflow.phases {
            match &phase.node {
                Phase::Score { rules } => {
                    for rule in rules {
                        let scope = Scope {
                            params: &[],
                            in_score: true,
                            span: &rule.span,
                        };
                        checker.check_expr(&rule.node.condition, &scope);
                        match &rule.node.action {
                            ScoreRuleAction::Score { delta } => checker.check_expr(delta, &scope),
                            ScoreRuleAction::Log { message } => checker.check_expr(message, &scope),
                        }
                    }
                }
                Phase::Match { rules } => {
                    for rule in rules {
                        let scope = Scope {
                            params: &[],
                            in_score: false,
                            span: &rule.span,
                        };
                        checker.check_expr(&rule.node.condition, &scope);
                    }
                }
            }
        }
    }

    checker.errors
}

fn validate_params(function: &FunctionDef, errors: &mut Vec<SemanticError>) {
    for (i, param) in function.params.iter().enumerate() {
        if function.params[..i].iter().any(|p| p.node == param.node) {
            errors.push(SemanticError::error(
                format!(
                    "Parameter '{}' is declared more than once in function '{}'",
                    param.node, function.name.node
                ),
                &param.span,
                None,
            ));
        }
    }
}

/// Where an expression sits. Expressions carry no spans of their own, so
/// diagnostics point at the enclosing rule or function name.
struct Scope<'a> {
    params: &'a [Spanned<String>],
    in_score: bool,
    span: &'a Range<usize>,
}

struct Checker<'a> {
    arities: HashMap<&'a str, usize>,
    errors: Vec<SemanticError>,
}

impl Checker<'_> {
    fn check_expr(&mut self, expr: &Expr, scope: &Scope<'_>) {
        match expr {
            Expr::Literal { value } => {
                if let crate::ast::Literal::List(items) = value {
                    for item in items {
                        self.check_expr(item, scope);
                    }
                }
            }
            Expr::Identifier { path } => self.check_identifier(path, scope),
            Expr::Unary { operand, .. } => self.check_expr(operand, scope),
            Expr::Binary { left, right, .. } => {
                self.check_expr(left, scope);
                self.check_expr(right, scope);
            }
            Expr::Call { name, args } => {
                self.check_call(name, args.len(), scope);
                for arg in args {
                    self.check_expr(arg, scope);
                }
            }
        }
    }

    fn check_identifier(&mut self, path: &[String], scope: &Scope<'_>) {
        let Some(root) = path.first() else {
            return;
        };

        if scope.params.iter().any(|p| &p.node == root) {
            return;
        }

        match root.as_str() {
            "case" => {}
            "agent" if scope.in_score => {
                self.errors.push(SemanticError::warning(
                    format!("'{}' is not available in a score phase", path.join(".")),
                    scope.span,
                    Some(
                        "Agents are only bound in match phases; this expression fails at runtime"
                            .to_string(),
                    ),
                ));
            }
            "agent" => {}
            _ => {
                self.errors.push(SemanticError::warning(
                    format!("Unknown name '{}'", path.join(".")),
                    scope.span,
                    Some("Names start with `case`, `agent`, or a function parameter".to_string()),
                ));
            }
        }
    }

    fn check_call(&mut self, name: &str, arg_count: usize, scope: &Scope<'_>) {
        match self.arities.get(name) {
            Some(&arity) if arity != arg_count => {
                self.errors.push(SemanticError::warning(
                    format!(
                        "Function '{}' expects {} argument(s) but is called with {}",
                        name, arity, arg_count
                    ),
                    scope.span,
                    None,
                ));
            }
            Some(_) => {}
            None if BUILTIN_FUNCTIONS.contains(&name) => {}
            None => {
                self.errors.push(SemanticError::warning(
                    format!("Unknown function '{}'", name),
                    scope.span,
                    Some(format!(
                        "Define it with `function {}(...) = ...` or use a built-in: {}",
                        name,
                        BUILTIN_FUNCTIONS.join(", ")
                    )),
                ));
            }
        }
    }
}
