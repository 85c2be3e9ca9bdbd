//! Structured model mapping for editors.
//!
//! The model is plain JSON with the following shape:
//!
//! ```text
//! { functions: [{name, params: [string], body: ExprNode}],
//!   workflows: [{name, phases: [
//!       {type: "score", rules: [{condition, action: {kind: "score", delta} | {kind: "log", message}}]} |
//!       {type: "match", rules: [{condition, assignTo}]}
//!   ]}] }
//!
//! ExprNode = {kind: "literal", type: "number"|"string"|"bool"|"list", value}
//!          | {kind: "identifier", path: [string]}
//!          | {kind: "unary", op: "!", operand}
//!          | {kind: "binary", op, left, right}
//!          | {kind: "call", name, args: [ExprNode]}
//! ```
//!
//! Conditions stay as nested expression nodes so an editor can change a
//! sub-expression without re-parsing text.
//!
//! ```rust
//! use routix_parser::{from_model, parse, to_model};
//!
//! let program = parse("workflow w { score { when true then score += 1 } }").unwrap();
//! let model = to_model(&program);
//! assert_eq!(model["workflows"][0]["phases"][0]["type"], "score");
//! assert_eq!(from_model(&model).unwrap(), program);
//! ```

use serde_json::{json, Map, Value};
use std::collections::HashSet;

use crate::ast::*;
use crate::error::ModelError;
use crate::lexer::is_identifier;

/// The editor-facing representation of a program.
pub type Model = Value;

type Result<T> = std::result::Result<T, ModelError>;

// ============================================================================
// AST -> Model
// ============================================================================

/// Convert a program into its structured model. Never fails.
///
/// Functions are listed before workflows; the relative order within each
/// list follows the document.
pub fn to_model(program: &Program) -> Model {
    let functions: Vec<Value> = program.functions().map(function_to_model).collect();
    let workflows: Vec<Value> = program.workflows().map(workflow_to_model).collect();
    json!({
        "functions": functions,
        "workflows": workflows,
    })
}

fn function_to_model(function: &FunctionDef) -> Value {
    let params: Vec<&str> = function.params.iter().map(|p| p.node.as_str()).collect();
    json!({
        "name": function.name.node,
        "params": params,
        "body": expr_to_model(&function.body),
    })
}

fn workflow_to_model(workflow: &Workflow) -> Value {
    let phases: Vec<Value> = workflow
        .phases
        .iter()
        .map(|phase| phase_to_model(&phase.node))
        .collect();
    json!({
        "name": workflow.name.node,
        "phases": phases,
    })
}

fn phase_to_model(phase: &Phase) -> Value {
    let rules: Vec<Value> = match phase {
        Phase::Score { rules } => rules
            .iter()
            .map(|rule| {
                let action = match &rule.node.action {
                    ScoreRuleAction::Score { delta } => {
                        json!({ "kind": "score", "delta": expr_to_model(delta) })
                    }
                    ScoreRuleAction::Log { message } => {
                        json!({ "kind": "log", "message": expr_to_model(message) })
                    }
                };
                json!({
                    "condition": expr_to_model(&rule.node.condition),
                    "action": action,
                })
            })
            .collect(),
        Phase::Match { rules } => rules
            .iter()
            .map(|rule| {
                json!({
                    "condition": expr_to_model(&rule.node.condition),
                    "assignTo": rule.node.target_agent_id,
                })
            })
            .collect(),
    };
    json!({
        "type": phase.keyword(),
        "rules": rules,
    })
}

/// Convert a single expression into its model node.
pub fn expr_to_model(expr: &Expr) -> Value {
    match expr {
        Expr::Literal { value } => {
            let (ty, value) = match value {
                Literal::Number(n) => ("number", number_to_json(*n)),
                Literal::String(s) => ("string", Value::String(s.clone())),
                Literal::Bool(b) => ("bool", Value::Bool(*b)),
                Literal::List(items) => (
                    "list",
                    Value::Array(items.iter().map(expr_to_model).collect()),
                ),
            };
            json!({ "kind": "literal", "type": ty, "value": value })
        }
        Expr::Identifier { path } => json!({ "kind": "identifier", "path": path }),
        Expr::Unary { op, operand } => json!({
            "kind": "unary",
            "op": op.symbol(),
            "operand": expr_to_model(operand),
        }),
        Expr::Binary { op, left, right } => json!({
            "kind": "binary",
            "op": op.symbol(),
            "left": expr_to_model(left),
            "right": expr_to_model(right),
        }),
        Expr::Call { name, args } => json!({
            "kind": "call",
            "name": name,
            "args": args.iter().map(expr_to_model).collect::<Vec<_>>(),
        }),
    }
}

/// Integral values are written as JSON integers (`3`, not `3.0`).
fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

// ============================================================================
// Model -> AST
// ============================================================================

/// Build a program from its structured model.
///
/// Fails with a [`ModelError`] whose `path` locates the offending node, e.g.
/// `workflows[0].phases[1].rules[2].condition.left`. Names and literals
/// that could not be written back as source text are rejected as well.
pub fn from_model(model: &Model) -> Result<Program> {
    let root = as_object(model, "")?;
    let mut items = Vec::new();

    let mut seen = HashSet::new();
    for (i, value) in array_field(root, "functions", "")?.iter().enumerate() {
        let path = index("functions", i);
        let function = function_from_model(value, &path)?;
        if !seen.insert(function.name.node.clone()) {
            return Err(ModelError::new(
                join(&path, "name"),
                format!("function `{}` is already defined", function.name.node),
            ));
        }
        items.push(Spanned::detached(Item::Function(function)));
    }

    for (i, value) in array_field(root, "workflows", "")?.iter().enumerate() {
        let path = index("workflows", i);
        items.push(Spanned::detached(Item::Workflow(workflow_from_model(
            value, &path,
        )?)));
    }

    Ok(Program { items })
}

fn function_from_model(value: &Value, path: &str) -> Result<FunctionDef> {
    let obj = as_object(value, path)?;
    let name = name_field(obj, "name", path)?;

    let mut params: Vec<Spanned<String>> = Vec::new();
    for (i, param) in array_field(obj, "params", path)?.iter().enumerate() {
        let param_path = index(&join(path, "params"), i);
        let param = name_value(param, &param_path)?;
        if params.iter().any(|p| p.node == param) {
            return Err(ModelError::new(
                param_path,
                format!("duplicate parameter `{}`", param),
            ));
        }
        params.push(Spanned::detached(param));
    }

    let body = expr_from_model(field(obj, "body", path)?, &join(path, "body"))?;
    Ok(FunctionDef {
        name: Spanned::detached(name),
        params,
        body,
    })
}

fn workflow_from_model(value: &Value, path: &str) -> Result<Workflow> {
    let obj = as_object(value, path)?;
    let name = name_field(obj, "name", path)?;

    let mut phases = Vec::new();
    for (i, phase) in array_field(obj, "phases", path)?.iter().enumerate() {
        let phase_path = index(&join(path, "phases"), i);
        phases.push(Spanned::detached(phase_from_model(phase, &phase_path)?));
    }

    Ok(Workflow {
        name: Spanned::detached(name),
        phases,
    })
}

fn phase_from_model(value: &Value, path: &str) -> Result<Phase> {
    let obj = as_object(value, path)?;
    let ty = string_field(obj, "type", path)?;
    let rules = array_field(obj, "rules", path)?;
    let rule_path = |i: usize| index(&join(path, "rules"), i);

    match ty {
        "score" => {
            let mut out = Vec::with_capacity(rules.len());
            for (i, rule) in rules.iter().enumerate() {
                out.push(Spanned::detached(score_rule_from_model(rule, &rule_path(i))?));
            }
            Ok(Phase::Score { rules: out })
        }
        "match" => {
            let mut out = Vec::with_capacity(rules.len());
            for (i, rule) in rules.iter().enumerate() {
                out.push(Spanned::detached(match_rule_from_model(rule, &rule_path(i))?));
            }
            Ok(Phase::Match { rules: out })
        }
        other => Err(ModelError::new(
            join(path, "type"),
            format!("unknown phase type `{}`", other),
        )),
    }
}

fn score_rule_from_model(value: &Value, path: &str) -> Result<ScoreRule> {
    let obj = as_object(value, path)?;
    let condition = expr_from_model(field(obj, "condition", path)?, &join(path, "condition"))?;

    let action_path = join(path, "action");
    let action = as_object(field(obj, "action", path)?, &action_path)?;
    let action = match string_field(action, "kind", &action_path)? {
        "score" => ScoreRuleAction::Score {
            delta: expr_from_model(
                field(action, "delta", &action_path)?,
                &join(&action_path, "delta"),
            )?,
        },
        "log" => ScoreRuleAction::Log {
            message: expr_from_model(
                field(action, "message", &action_path)?,
                &join(&action_path, "message"),
            )?,
        },
        other => {
            return Err(ModelError::new(
                join(&action_path, "kind"),
                format!("unknown action kind `{}`", other),
            ))
        }
    };

    Ok(ScoreRule { condition, action })
}

fn match_rule_from_model(value: &Value, path: &str) -> Result<MatchRule> {
    let obj = as_object(value, path)?;
    let condition = expr_from_model(field(obj, "condition", path)?, &join(path, "condition"))?;
    let target = string_field(obj, "assignTo", path)?;
    check_quotable(target, &join(path, "assignTo"))?;
    Ok(MatchRule {
        condition,
        target_agent_id: target.to_string(),
    })
}

/// Build a single expression from its model node.
pub fn expr_from_model(value: &Value, path: &str) -> Result<Expr> {
    let obj = as_object(value, path)?;
    match string_field(obj, "kind", path)? {
        "literal" => literal_from_model(obj, path),
        "identifier" => {
            let segments = array_field(obj, "path", path)?;
            let mut out = Vec::with_capacity(segments.len());
            for (i, segment) in segments.iter().enumerate() {
                let segment_path = index(&join(path, "path"), i);
                match segment.as_str() {
                    Some(s) => out.push(s.to_string()),
                    None => return Err(ModelError::new(segment_path, "expected a string")),
                }
            }
            if out.is_empty() {
                return Err(ModelError::new(
                    join(path, "path"),
                    "identifier path must not be empty",
                ));
            }
            let dotted = out.join(".");
            if !is_identifier(&dotted) {
                return Err(ModelError::new(
                    join(path, "path"),
                    format!("`{}` is not a valid identifier", dotted),
                ));
            }
            Ok(Expr::Identifier { path: out })
        }
        "unary" => {
            let op = string_field(obj, "op", path)?;
            let op = UnaryOp::from_symbol(op).ok_or_else(|| {
                ModelError::new(join(path, "op"), format!("unknown unary operator `{}`", op))
            })?;
            let operand =
                expr_from_model(field(obj, "operand", path)?, &join(path, "operand"))?;
            Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            })
        }
        "binary" => {
            let op = string_field(obj, "op", path)?;
            let op = BinOp::from_symbol(op).ok_or_else(|| {
                ModelError::new(join(path, "op"), format!("unknown binary operator `{}`", op))
            })?;
            let left = expr_from_model(field(obj, "left", path)?, &join(path, "left"))?;
            let right = expr_from_model(field(obj, "right", path)?, &join(path, "right"))?;
            Ok(Expr::binary(op, left, right))
        }
        "call" => {
            let name = string_field(obj, "name", path)?;
            if !is_identifier(name) {
                return Err(ModelError::new(
                    join(path, "name"),
                    format!("`{}` is not a valid function name", name),
                ));
            }
            let mut args = Vec::new();
            for (i, arg) in array_field(obj, "args", path)?.iter().enumerate() {
                args.push(expr_from_model(arg, &index(&join(path, "args"), i))?);
            }
            Ok(Expr::call(name, args))
        }
        other => Err(ModelError::new(
            join(path, "kind"),
            format!("unknown expression kind `{}`", other),
        )),
    }
}

fn literal_from_model(obj: &Map<String, Value>, path: &str) -> Result<Expr> {
    let ty = string_field(obj, "type", path)?;
    let value = field(obj, "value", path)?;
    let value_path = join(path, "value");
    let mismatch = |expected: &str| {
        ModelError::new(
            value_path.clone(),
            format!("expected {} for a `{}` literal", expected, ty),
        )
    };

    let literal = match ty {
        "number" => Literal::Number(value.as_f64().ok_or_else(|| mismatch("a number"))?),
        "string" => {
            let s = value.as_str().ok_or_else(|| mismatch("a string"))?;
            check_quotable(s, &value_path)?;
            Literal::String(s.to_string())
        }
        "bool" => Literal::Bool(value.as_bool().ok_or_else(|| mismatch("a boolean"))?),
        "list" => {
            let items = value.as_array().ok_or_else(|| mismatch("an array"))?;
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                out.push(expr_from_model(item, &index(&value_path, i))?);
            }
            Literal::List(out)
        }
        other => {
            return Err(ModelError::new(
                join(path, "type"),
                format!("unknown literal type `{}`", other),
            ))
        }
    };
    Ok(Expr::Literal { value: literal })
}

// ============================================================================
// Helpers
// ============================================================================

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn index(path: &str, i: usize) -> String {
    format!("{}[{}]", path, i)
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "$".to_string()
    } else {
        path.to_string()
    }
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| ModelError::new(display_path(path), "expected an object"))
}

fn field<'a>(obj: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a Value> {
    obj.get(key)
        .ok_or_else(|| ModelError::new(display_path(path), format!("missing field `{}`", key)))
}

fn string_field<'a>(obj: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a str> {
    field(obj, key, path)?
        .as_str()
        .ok_or_else(|| ModelError::new(join(path, key), "expected a string"))
}

fn array_field<'a>(obj: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a Vec<Value>> {
    field(obj, key, path)?
        .as_array()
        .ok_or_else(|| ModelError::new(join(path, key), "expected an array"))
}

/// Function, parameter, and workflow names are single-segment identifiers.
fn name_value(value: &Value, path: &str) -> Result<String> {
    let name = value
        .as_str()
        .ok_or_else(|| ModelError::new(path, "expected a string"))?;
    if name.contains('.') || !is_identifier(name) {
        return Err(ModelError::new(
            path,
            format!("`{}` is not a valid name", name),
        ));
    }
    Ok(name.to_string())
}

fn name_field(obj: &Map<String, Value>, key: &str, path: &str) -> Result<String> {
    name_value(field(obj, key, path)?, &join(path, key))
}

/// String literals have no escape sequences, so a `"` cannot be written back.
fn check_quotable(s: &str, path: &str) -> Result<()> {
    if s.contains('"') {
        return Err(ModelError::new(path, "strings cannot contain '\"'"));
    }
    Ok(())
}
