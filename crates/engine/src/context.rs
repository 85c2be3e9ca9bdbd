//! Evaluation context: the records in scope and the program's functions.

use indexmap::IndexMap;
use routix_parser::{FunctionDef, Program};

use crate::value::Record;

/// Immutable name → definition mapping, built once per program.
///
/// Calls resolve by name at evaluation time, so recursive and mutually
/// recursive definitions need no special handling here.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: IndexMap<String, FunctionDef>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every function of `program`. A later definition with the same
    /// name replaces an earlier one; the parser rejects such programs anyway.
    pub fn from_program(program: &Program) -> Self {
        program.functions().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl FromIterator<FunctionDef> for FunctionTable {
    fn from_iter<I: IntoIterator<Item = FunctionDef>>(iter: I) -> Self {
        Self {
            functions: iter
                .into_iter()
                .map(|f| (f.name.node.clone(), f))
                .collect(),
        }
    }
}

/// What an expression can see: the case, the candidate agent (match phases
/// only), and the function table.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub case: &'a Record,
    pub agent: Option<&'a Record>,
    pub functions: &'a FunctionTable,
}

impl<'a> Context<'a> {
    /// Context for a score phase: no agent is bound.
    pub fn for_case(case: &'a Record, functions: &'a FunctionTable) -> Self {
        Self {
            case,
            agent: None,
            functions,
        }
    }

    /// The same context with `agent` bound to a candidate.
    pub fn with_agent(self, agent: &'a Record) -> Self {
        Self {
            agent: Some(agent),
            ..self
        }
    }
}
