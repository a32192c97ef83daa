// Term contract, evaluation context, and tree compilation.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::datum::DatumError;
use crate::op::BindError;
use crate::terms::{DatumTerm, JsonTerm, MakeArrayTerm, MakeObjTerm};
use crate::tree::{TermKind, TermTree};
use crate::value::Value;

/// Evaluation errors
///
/// Every variant aborts the nearest enclosing `eval` call and unwinds
/// through all ancestor evaluations to the query boundary; no term
/// recovers locally or returns a partial result.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Expected type datum but found {found} (while evaluating `{term}`)")]
    NotDatum {
        term: &'static str,
        found: &'static str,
    },

    #[error("Expected type string but found {found} (while evaluating `{term}`)")]
    NotString {
        term: &'static str,
        found: &'static str,
    },

    #[error("Duplicate key in object: {0}.")]
    DuplicateKey(String),

    #[error("Could not parse JSON:\n{0}")]
    BadJson(String),

    #[error("Evaluation interrupted")]
    Interrupted,
}

impl From<DatumError> for EvalError {
    fn from(e: DatumError) -> Self {
        match e {
            DatumError::DuplicateKey(key) => EvalError::DuplicateKey(key),
        }
    }
}

/// One node of a compiled query expression.
///
/// Implementations are built once from the decoded tree, queried for
/// determinism by the planner, then evaluated zero or more times.
/// Evaluation is synchronous recursive descent; errors propagate by
/// early return.
pub trait Term {
    /// Execute this node's semantics, recursing into bound children.
    fn eval(&self, env: &Env) -> Result<Value, EvalError>;

    /// Structural property fixed at construction: whether repeated
    /// evaluation is guaranteed to produce equal results. Consulted by
    /// the planner before any evaluation is attempted.
    fn is_deterministic(&self) -> bool;

    /// Stable identifier used only in diagnostics; never affects
    /// evaluation.
    fn name(&self) -> &'static str;
}

pub type BoxTerm = Box<dyn Term>;

impl fmt::Debug for dyn Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Term({})", self.name())
    }
}

/// Context shared by one query-tree traversal.
///
/// The only cross-cutting state in this core is the interruption flag:
/// operator terms observe it once per `eval` and convert a tripped flag
/// into an early [`EvalError::Interrupted`] at that recursion point.
/// Terms poll nothing else.
#[derive(Clone, Default)]
pub struct Env {
    interrupted: Rc<Cell<bool>>,
}

impl Env {
    pub fn new() -> Self {
        Env::default()
    }

    /// Handle the enclosing executor can trip from outside the traversal.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle(Rc::clone(&self.interrupted))
    }

    pub(crate) fn check_interrupted(&self) -> Result<(), EvalError> {
        if self.interrupted.get() {
            Err(EvalError::Interrupted)
        } else {
            Ok(())
        }
    }
}

/// Trips the interruption flag of the [`Env`] it came from.
#[derive(Clone)]
pub struct InterruptHandle(Rc<Cell<bool>>);

impl InterruptHandle {
    pub fn interrupt(&self) {
        self.0.set(true);
    }
}

/// Compile a decoded term tree into an evaluable term, bottom-up.
///
/// Binding failures (wrong argument count, undeclared option, missing
/// literal payload) surface here, at query-compile time; a term that
/// builds successfully can no longer fail on argument shape.
pub fn build(tree: &TermTree) -> Result<BoxTerm, BindError> {
    // Literals carry their payload directly and have no children.
    if tree.kind == TermKind::Datum {
        let datum = tree.datum.clone().ok_or(BindError::MissingDatum {
            term: tree.kind.name(),
        })?;
        return Ok(Box::new(DatumTerm::new(datum)));
    }

    let args = tree
        .args
        .iter()
        .map(build)
        .collect::<Result<Vec<_>, _>>()?;
    let optargs = tree
        .optargs
        .iter()
        .map(|(key, sub)| Ok((key.clone(), build(sub)?)))
        .collect::<Result<Vec<_>, BindError>>()?;

    let term: BoxTerm = match tree.kind {
        TermKind::MakeArray => Box::new(MakeArrayTerm::bind(args, optargs)?),
        TermKind::MakeObj => Box::new(MakeObjTerm::bind(args, optargs)?),
        TermKind::Json => Box::new(JsonTerm::bind(args, optargs)?),
        TermKind::Datum => unreachable!(), // handled above
    };
    Ok(term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum;

    #[test]
    fn test_build_literal_requires_payload() {
        let tree = TermTree {
            kind: TermKind::Datum,
            args: vec![],
            optargs: vec![],
            datum: None,
        };
        let err = build(&tree).unwrap_err();
        assert_eq!(err.to_string(), "`datum` is missing its literal datum payload");
    }

    #[test]
    fn test_build_recurses_into_children() {
        let tree = TermTree::make_array(vec![
            TermTree::datum(1i64),
            TermTree::json(TermTree::datum("null")),
        ]);
        let term = build(&tree).unwrap();
        assert_eq!(term.name(), "make_array");
        let value = term.eval(&Env::new()).unwrap();
        assert_eq!(value, Value::Datum(datum!([1i64, null])));
    }

    #[test]
    fn test_build_propagates_child_bind_failure() {
        // a json node with no argument, nested under make_array
        let bad = TermTree {
            kind: TermKind::Json,
            args: vec![],
            optargs: vec![],
            datum: None,
        };
        let tree = TermTree::make_array(vec![bad]);
        let err = build(&tree).unwrap_err();
        assert!(matches!(err, BindError::ArgCount { term: "json", .. }));
    }

    #[test]
    fn test_interrupt_handle() {
        let env = Env::new();
        let handle = env.interrupt_handle();
        assert!(env.check_interrupted().is_ok());
        handle.interrupt();
        assert!(matches!(
            env.check_interrupted(),
            Err(EvalError::Interrupted)
        ));
    }
}
