//! Expression evaluation.
//!
//! Evaluation is a pure function of the expression and its [`Context`]; the
//! evaluator itself only carries limits, so one instance can be shared across
//! threads.
//!
//! ```rust
//! use routix_engine::{evaluate, Context, FunctionTable, Record, Value};
//! use routix_parser::parse_expression;
//!
//! let case = Record::new().with("age", 5.0).with("priority", "high");
//! let functions = FunctionTable::new();
//! let ctx = Context::for_case(&case, &functions);
//!
//! let expr = parse_expression(r#"case.age > 3 and case.priority in ["high", "urgent"]"#).unwrap();
//! assert_eq!(evaluate(&expr, &ctx), Ok(Value::Bool(true)));
//! ```

use routix_parser::{BinOp, Expr, Literal, UnaryOp};

use crate::builtins;
use crate::config::{EngineConfig, DEFAULT_MAX_CALL_DEPTH};
use crate::context::Context;
use crate::error::{EvalError, Result};
use crate::value::Value;

/// Function parameters bound for the current call.
type Locals<'l> = [(&'l str, Value)];

/// Evaluate `expr` with the default limits.
pub fn evaluate(expr: &Expr, ctx: &Context<'_>) -> Result<Value> {
    Evaluator::default().evaluate(expr, ctx)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluator {
    max_call_depth: usize,
    builtins: bool,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            builtins: true,
        }
    }
}

impl Evaluator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_call_depth: config.max_call_depth,
            builtins: config.builtins,
        }
    }

    /// Evaluate a top-level expression (no parameters in scope).
    pub fn evaluate(&self, expr: &Expr, ctx: &Context<'_>) -> Result<Value> {
        self.eval(expr, ctx, &[], 0)
    }

    /// Evaluate and require a Bool, as rule conditions do.
    pub fn evaluate_condition(&self, expr: &Expr, ctx: &Context<'_>) -> Result<bool> {
        let value = self.evaluate(expr, ctx)?;
        value
            .as_bool()
            .ok_or_else(|| EvalError::mismatch("condition", "bool", value.type_name()))
    }

    // Everything on the recursive path (`eval`, `eval_logical`, `eval_call`)
    // keeps few locals; operator application and error construction live in
    // leaf functions so each nested call costs little stack.
    fn eval(&self, expr: &Expr, ctx: &Context<'_>, locals: &Locals<'_>, depth: usize) -> Result<Value> {
        match expr {
            Expr::Literal { value } => self.eval_literal(value, ctx, locals, depth),
            Expr::Identifier { path } => resolve(path, ctx, locals),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand, ctx, locals, depth)?;
                apply_unary(*op, value)
            }
            Expr::Binary {
                op: op @ (BinOp::And | BinOp::Or),
                left,
                right,
            } => self.eval_logical(*op, left, right, ctx, locals, depth),
            Expr::Binary { op, left, right } => {
                let lhs = self.eval(left, ctx, locals, depth)?;
                let rhs = self.eval(right, ctx, locals, depth)?;
                apply_binary(*op, lhs, rhs)
            }
            Expr::Call { name, args } => self.eval_call(name, args, ctx, locals, depth),
        }
    }

    fn eval_literal(
        &self,
        literal: &Literal,
        ctx: &Context<'_>,
        locals: &Locals<'_>,
        depth: usize,
    ) -> Result<Value> {
        Ok(match literal {
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| self.eval(item, ctx, locals, depth))
                    .collect::<Result<Vec<_>>>()?,
            ),
        })
    }

    /// `and` / `or`: the right side is only evaluated when it can change the result.
    fn eval_logical(
        &self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        ctx: &Context<'_>,
        locals: &Locals<'_>,
        depth: usize,
    ) -> Result<Value> {
        let lhs = expect_bool(op, self.eval(left, ctx, locals, depth)?)?;
        if lhs == (op == BinOp::Or) {
            return Ok(Value::Bool(lhs));
        }
        let rhs = expect_bool(op, self.eval(right, ctx, locals, depth)?)?;
        Ok(Value::Bool(rhs))
    }

    fn eval_call(
        &self,
        name: &str,
        args: &[Expr],
        ctx: &Context<'_>,
        locals: &Locals<'_>,
        depth: usize,
    ) -> Result<Value> {
        if let Some(function) = ctx.functions.get(name) {
            if args.len() != function.arity() {
                return Err(arity_mismatch(name, function.arity(), args.len()));
            }
            if depth >= self.max_call_depth {
                return Err(recursion_limit(name, self.max_call_depth));
            }

            // Call-by-value: arguments are evaluated in the caller's scope
            let mut bindings = Vec::with_capacity(args.len());
            for (param, arg) in function.params.iter().zip(args) {
                bindings.push((param.node.as_str(), self.eval(arg, ctx, locals, depth)?));
            }
            return self.eval(&function.body, ctx, &bindings, depth + 1);
        }

        let builtin = self
            .builtins
            .then(|| builtins::lookup(name))
            .flatten()
            .ok_or_else(|| unknown_function(name))?;
        let values = args
            .iter()
            .map(|arg| self.eval(arg, ctx, locals, depth))
            .collect::<Result<Vec<_>>>()?;
        builtin.call(&values)
    }
}

fn apply_unary(op: UnaryOp, value: Value) -> Result<Value> {
    match (op, value) {
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Not, other) => Err(EvalError::mismatch("`!`", "bool", other.type_name())),
    }
}

/// Apply a non-short-circuit operator to evaluated operands.
fn apply_binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value> {
    match op {
        BinOp::Eq => Ok(Value::Bool(lhs == rhs)),
        BinOp::Ne => Ok(Value::Bool(lhs != rhs)),
        BinOp::In => {
            let Value::List(haystack) = &rhs else {
                return Err(EvalError::mismatch("`in`", "list on the right", rhs.type_name()));
            };
            let found = match &lhs {
                Value::List(needles) => needles.iter().any(|n| haystack.contains(n)),
                needle => haystack.contains(needle),
            };
            Ok(Value::Bool(found))
        }
        // Both sides already evaluated: no short-circuit left to do
        BinOp::And => Ok(Value::Bool(expect_bool(op, lhs)? & expect_bool(op, rhs)?)),
        BinOp::Or => Ok(Value::Bool(expect_bool(op, lhs)? | expect_bool(op, rhs)?)),
        _ => {
            let (a, b) = expect_numbers(op, &lhs, &rhs)?;
            Ok(match op {
                BinOp::Gt => Value::Bool(a > b),
                BinOp::Lt => Value::Bool(a < b),
                BinOp::Ge => Value::Bool(a >= b),
                BinOp::Le => Value::Bool(a <= b),
                BinOp::Add => Value::Number(a + b),
                BinOp::Sub => Value::Number(a - b),
                BinOp::Mul => Value::Number(a * b),
                BinOp::Div if b == 0.0 => return Err(EvalError::DivisionByZero),
                _ => Value::Number(a / b),
            })
        }
    }
}

#[cold]
fn arity_mismatch(name: &str, expected: usize, found: usize) -> EvalError {
    EvalError::ArityMismatch {
        name: name.to_string(),
        expected: expected.to_string(),
        found,
    }
}

#[cold]
fn recursion_limit(name: &str, limit: usize) -> EvalError {
    EvalError::RecursionLimitExceeded {
        name: name.to_string(),
        limit,
    }
}

#[cold]
fn unknown_function(name: &str) -> EvalError {
    EvalError::UnknownFunction {
        name: name.to_string(),
    }
}

/// Resolve a dot-path: parameters first, then `case.*` and `agent.*`.
fn resolve(path: &[String], ctx: &Context<'_>, locals: &Locals<'_>) -> Result<Value> {
    let Some((root, fields)) = path.split_first() else {
        return Err(EvalError::UnboundName {
            name: String::new(),
        });
    };

    if let Some((_, value)) = locals.iter().find(|(name, _)| name == root) {
        return walk(root, value, fields);
    }

    let record = match root.as_str() {
        "case" => ctx.case,
        "agent" => ctx.agent.ok_or_else(|| EvalError::UnboundName {
            name: "agent".to_string(),
        })?,
        _ => {
            return Err(EvalError::UnboundName {
                name: root.clone(),
            })
        }
    };

    let Some((field, rest)) = fields.split_first() else {
        return Err(EvalError::mismatch(
            format!("`{}`", root),
            "a field such as `case.score`",
            "record",
        ));
    };
    let value = record.get(field).ok_or_else(|| EvalError::MissingField {
        path: root.clone(),
        field: field.clone(),
    })?;
    walk(&format!("{}.{}", root, field), value, rest)
}

/// Values have no fields, so any remaining segment is missing.
fn walk(path: &str, value: &Value, rest: &[String]) -> Result<Value> {
    match rest.first() {
        None => Ok(value.clone()),
        Some(field) => Err(EvalError::MissingField {
            path: path.to_string(),
            field: field.clone(),
        }),
    }
}

fn expect_bool(op: BinOp, value: Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| EvalError::mismatch(format!("`{}`", op.symbol()), "bool", value.type_name()))
}

fn expect_numbers(op: BinOp, lhs: &Value, rhs: &Value) -> Result<(f64, f64)> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        (Value::Number(_), other) | (other, _) => Err(EvalError::mismatch(
            format!("`{}`", op.symbol()),
            "number",
            other.type_name(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FunctionTable;
    use crate::value::Record;
    use pretty_assertions::assert_eq;
    use routix_parser::{parse, parse_expression};

    fn eval_with(source: &str, program: &str, case: &Record, agent: Option<&Record>) -> Result<Value> {
        let functions = FunctionTable::from_program(&parse(program).unwrap());
        let ctx = Context {
            case,
            agent,
            functions: &functions,
        };
        evaluate(&parse_expression(source).unwrap(), &ctx)
    }

    fn eval(source: &str) -> Result<Value> {
        eval_with(source, "", &Record::new(), None)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), Ok(Value::Number(7.0)));
        assert_eq!(eval("(1 + 2) * 3"), Ok(Value::Number(9.0)));
        assert_eq!(eval("10 - 3 - 2"), Ok(Value::Number(5.0)));
        assert_eq!(eval("7 / 2"), Ok(Value::Number(3.5)));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("5 / (2 - 2)"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_arithmetic_type_mismatch() {
        assert_eq!(
            eval(r#"1 + "2""#),
            Err(EvalError::TypeMismatch {
                operation: "`+`".into(),
                expected: "number".into(),
                found: "string".into(),
            })
        );
        assert!(matches!(eval(r#""a" < "b""#), Err(EvalError::TypeMismatch { .. })));
    }

    #[test]
    fn test_equality() {
        assert_eq!(eval(r#""a" == "a""#), Ok(Value::Bool(true)));
        assert_eq!(eval("[1, 2] == [1, 2]"), Ok(Value::Bool(true)));
        assert_eq!(eval("[1, 2] == [2, 1]"), Ok(Value::Bool(false)));
        // Cross-type comparisons never error
        assert_eq!(eval(r#"1 == "1""#), Ok(Value::Bool(false)));
        assert_eq!(eval(r#"1 != "1""#), Ok(Value::Bool(true)));
        assert_eq!(eval("true != [true]"), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval("3 >= 3"), Ok(Value::Bool(true)));
        assert_eq!(eval("3 > 3"), Ok(Value::Bool(false)));
        assert_eq!(eval("2 <= 1"), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_in_operator() {
        assert_eq!(eval(r#""finance" in ["billing", "finance"]"#), Ok(Value::Bool(true)));
        assert_eq!(eval(r#"["x", "finance"] in ["billing", "finance"]"#), Ok(Value::Bool(true)));
        assert_eq!(eval(r#"["x", "y"] in ["billing", "finance"]"#), Ok(Value::Bool(false)));
        assert_eq!(eval("[] in [1]"), Ok(Value::Bool(false)));
        assert!(matches!(eval(r#""a" in "abc""#), Err(EvalError::TypeMismatch { .. })));
    }

    #[test]
    fn test_short_circuit() {
        // The right side would fail if it were evaluated
        assert_eq!(eval("false and 1 / 0 > 1"), Ok(Value::Bool(false)));
        assert_eq!(eval("true or missing"), Ok(Value::Bool(true)));
        assert_eq!(eval("true and 1 / 0 > 1"), Err(EvalError::DivisionByZero));
        assert!(matches!(eval("1 and true"), Err(EvalError::TypeMismatch { .. })));
        assert!(matches!(eval("true and 1"), Err(EvalError::TypeMismatch { .. })));
    }

    #[test]
    fn test_not() {
        assert_eq!(eval("!false"), Ok(Value::Bool(true)));
        assert_eq!(eval("!!true"), Ok(Value::Bool(true)));
        assert!(matches!(eval("!0"), Err(EvalError::TypeMismatch { .. })));
    }

    #[test]
    fn test_identifier_resolution() {
        let case = Record::new().with("score", 4.0).with("tags", vec!["a"]);
        let agent = Record::new().with("skills", vec!["billing"]);

        assert_eq!(
            eval_with("case.score", "", &case, None),
            Ok(Value::Number(4.0))
        );
        assert_eq!(
            eval_with("agent.skills", "", &case, Some(&agent)),
            Ok(Value::from(vec!["billing"]))
        );
        assert_eq!(
            eval_with("case.priority", "", &case, None),
            Err(EvalError::MissingField {
                path: "case".into(),
                field: "priority".into(),
            })
        );
        assert_eq!(
            eval_with("case.score.value", "", &case, None),
            Err(EvalError::MissingField {
                path: "case.score".into(),
                field: "value".into(),
            })
        );
        assert_eq!(
            eval_with("agent.skills", "", &case, None),
            Err(EvalError::UnboundName {
                name: "agent".into()
            })
        );
        assert_eq!(
            eval_with("customer.tier", "", &case, None),
            Err(EvalError::UnboundName {
                name: "customer".into()
            })
        );
        assert!(matches!(
            eval_with("case", "", &case, None),
            Err(EvalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_function_calls() {
        let program = "function decay(age, rate) = max(0, 10 - age * rate)\n\
                       function bonus(p) = case.score + p";
        let case = Record::new().with("score", 2.0);
        assert_eq!(eval_with("decay(3, 2)", program, &case, None), Ok(Value::Number(4.0)));
        assert_eq!(eval_with("decay(30, 2)", program, &case, None), Ok(Value::Number(0.0)));
        // case stays visible inside a function body
        assert_eq!(eval_with("bonus(5)", program, &case, None), Ok(Value::Number(7.0)));
    }

    #[test]
    fn test_parameters_shadow_and_do_not_leak() {
        let program = "function id(case) = case\nfunction outer(x) = inner()\nfunction inner() = x";
        assert_eq!(
            eval_with("id(3)", program, &Record::new(), None),
            Ok(Value::Number(3.0))
        );
        assert_eq!(
            eval_with("outer(1)", program, &Record::new(), None),
            Err(EvalError::UnboundName { name: "x".into() })
        );
    }

    #[test]
    fn test_call_errors() {
        let program = "function f(a) = a";
        assert_eq!(
            eval_with("g(1)", program, &Record::new(), None),
            Err(EvalError::UnknownFunction { name: "g".into() })
        );
        assert_eq!(
            eval_with("f(1, 2)", program, &Record::new(), None),
            Err(EvalError::ArityMismatch {
                name: "f".into(),
                expected: "1".into(),
                found: 2,
            })
        );
    }

    #[test]
    fn test_recursion() {
        let program = "function countdown(n) = n == 0 or countdown(n - 1)\n\
                       function f(n) = f(n)";
        let case = Record::new();
        assert_eq!(
            eval_with("countdown(10)", program, &case, None),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            eval_with("f(1)", program, &case, None),
            Err(EvalError::RecursionLimitExceeded {
                name: "f".into(),
                limit: 256,
            })
        );
    }

    #[test]
    fn test_recursion_limit_holds_on_default_stack() {
        // Same stack size as a spawned test thread
        let result = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let program = "function f(n) = n == 0 or (f(n - 1) and n * 2 + 1 > 0 - 1)";
                eval_with("f(100000)", program, &Record::new(), None)
            })
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(
            result,
            Err(EvalError::RecursionLimitExceeded {
                name: "f".into(),
                limit: 256,
            })
        );
    }

    #[test]
    fn test_mutual_recursion() {
        let program = "function even(n) = n == 0 or odd(n - 1)\n\
                       function odd(n) = n != 0 and even(n - 1)";
        assert_eq!(
            eval_with("even(10)", program, &Record::new(), None),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            eval_with("odd(7)", program, &Record::new(), None),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn test_custom_depth_limit() {
        let program = parse("function down(n) = n == 0 or down(n - 1)").unwrap();
        let functions = FunctionTable::from_program(&program);
        let case = Record::new();
        let ctx = Context::for_case(&case, &functions);
        let evaluator = Evaluator::new(&EngineConfig {
            max_call_depth: 5,
            ..EngineConfig::default()
        });

        let call = |n: i32| parse_expression(&format!("down({})", n)).unwrap();
        assert_eq!(evaluator.evaluate(&call(4), &ctx), Ok(Value::Bool(true)));
        assert!(matches!(
            evaluator.evaluate(&call(5), &ctx),
            Err(EvalError::RecursionLimitExceeded { limit: 5, .. })
        ));
    }

    #[test]
    fn test_builtins_and_shadowing() {
        assert_eq!(eval("len([1, 2, 3]) + max(1, 9, 4)"), Ok(Value::Number(12.0)));

        let program = "function len(x) = 42";
        assert_eq!(
            eval_with("len([1])", program, &Record::new(), None),
            Ok(Value::Number(42.0))
        );

        let functions = FunctionTable::new();
        let case = Record::new();
        let ctx = Context::for_case(&case, &functions);
        let evaluator = Evaluator::new(&EngineConfig {
            builtins: false,
            ..EngineConfig::default()
        });
        assert_eq!(
            evaluator.evaluate(&parse_expression("len([])").unwrap(), &ctx),
            Err(EvalError::UnknownFunction { name: "len".into() })
        );
    }

    #[test]
    fn test_condition_requires_bool() {
        let functions = FunctionTable::new();
        let case = Record::new();
        let ctx = Context::for_case(&case, &functions);
        let evaluator = Evaluator::default();
        assert_eq!(
            evaluator.evaluate_condition(&parse_expression("1 < 2").unwrap(), &ctx),
            Ok(true)
        );
        assert!(matches!(
            evaluator.evaluate_condition(&parse_expression("1 + 2").unwrap(), &ctx),
            Err(EvalError::TypeMismatch { .. })
        ));
    }
}
