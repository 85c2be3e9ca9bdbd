//! Built-in functions.
//!
//! Looked up only after user-defined functions, so a program can shadow any
//! of them.

use crate::error::{EvalError, Result};
use crate::value::Value;

/// How many arguments a built-in accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }

    fn describe(self) -> String {
        match self {
            Arity::Exactly(n) => n.to_string(),
            Arity::AtLeast(n) => format!("at least {}", n),
        }
    }
}

/// A built-in function implemented in Rust.
pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    func: fn(&[Value]) -> Result<Value>,
}

impl Builtin {
    /// Check the argument count, then apply.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        if !self.arity.accepts(args.len()) {
            return Err(EvalError::ArityMismatch {
                name: self.name.to_string(),
                expected: self.arity.describe(),
                found: args.len(),
            });
        }
        (self.func)(args)
    }
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<builtin {}>", self.name)
    }
}

static BUILTINS: [Builtin; 4] = [
    Builtin {
        name: "len",
        arity: Arity::Exactly(1),
        func: builtin_len,
    },
    Builtin {
        name: "max",
        arity: Arity::AtLeast(1),
        func: builtin_max,
    },
    Builtin {
        name: "min",
        arity: Arity::AtLeast(1),
        func: builtin_min,
    },
    Builtin {
        name: "contains",
        arity: Arity::Exactly(2),
        func: builtin_contains,
    },
];

/// Find a built-in by name.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

/// All built-ins, in registration order.
pub fn all() -> &'static [Builtin] {
    &BUILTINS
}

fn builtin_len(args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::List(items) => Ok(Value::Number(items.len() as f64)),
        Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
        other => Err(EvalError::mismatch("len()", "list or string", other.type_name())),
    }
}

fn numbers<'a>(name: &str, args: &'a [Value]) -> Result<impl Iterator<Item = f64> + 'a> {
    if let Some(bad) = args.iter().find(|v| v.as_number().is_none()) {
        return Err(EvalError::mismatch(
            format!("{}()", name),
            "number",
            bad.type_name(),
        ));
    }
    Ok(args.iter().filter_map(Value::as_number))
}

fn builtin_max(args: &[Value]) -> Result<Value> {
    let max = numbers("max", args)?.fold(f64::NEG_INFINITY, f64::max);
    Ok(Value::Number(max))
}

fn builtin_min(args: &[Value]) -> Result<Value> {
    let min = numbers("min", args)?.fold(f64::INFINITY, f64::min);
    Ok(Value::Number(min))
}

fn builtin_contains(args: &[Value]) -> Result<Value> {
    match (&args[0], &args[1]) {
        (Value::List(items), needle) => Ok(Value::Bool(items.contains(needle))),
        (Value::String(haystack), Value::String(needle)) => {
            Ok(Value::Bool(haystack.contains(needle.as_str())))
        }
        (Value::String(_), other) => Err(EvalError::mismatch(
            "contains()",
            "string needle",
            other.type_name(),
        )),
        (other, _) => Err(EvalError::mismatch(
            "contains()",
            "list or string",
            other.type_name(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn call(name: &str, args: Vec<Value>) -> Result<Value> {
        lookup(name).unwrap().call(&args)
    }

    #[test]
    fn test_names_match_validator() {
        let names: Vec<&str> = all().iter().map(|b| b.name).collect();
        assert_eq!(names, routix_parser::BUILTIN_FUNCTIONS.to_vec());
    }

    #[test]
    fn test_len() {
        assert_eq!(call("len", vec![Value::from(vec![1, 2, 3])]), Ok(Value::Number(3.0)));
        assert_eq!(call("len", vec![Value::from("héllo")]), Ok(Value::Number(5.0)));
        assert!(matches!(
            call("len", vec![Value::Bool(true)]),
            Err(EvalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_max_min() {
        let args = vec![Value::Number(3.0), Value::Number(-1.0), Value::Number(7.5)];
        assert_eq!(call("max", args.clone()), Ok(Value::Number(7.5)));
        assert_eq!(call("min", args), Ok(Value::Number(-1.0)));
        assert!(matches!(
            call("max", vec![Value::Number(1.0), Value::from("2")]),
            Err(EvalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_contains() {
        let list = Value::from(vec!["billing", "finance"]);
        assert_eq!(
            call("contains", vec![list.clone(), Value::from("finance")]),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            call("contains", vec![list, Value::from("legal")]),
            Ok(Value::Bool(false))
        );
        assert_eq!(
            call("contains", vec![Value::from("overdue invoice"), Value::from("invoice")]),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn test_arity() {
        assert_eq!(
            call("max", vec![]),
            Err(EvalError::ArityMismatch {
                name: "max".into(),
                expected: "at least 1".into(),
                found: 0,
            })
        );
        assert_eq!(
            call("contains", vec![Value::from(vec![1])]),
            Err(EvalError::ArityMismatch {
                name: "contains".into(),
                expected: "2".into(),
                found: 1,
            })
        );
        assert!(lookup("sqrt").is_none());
    }
}
