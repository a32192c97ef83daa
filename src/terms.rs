// Concrete term kinds: literal datum, array/object constructors, json.

use std::rc::Rc;

use crate::datum::{ArrayBuilder, Datum, ObjectBuilder};
use crate::op::{ArgSpec, BindError, OpArgs, OptArgSpec};
use crate::term::{BoxTerm, Env, EvalError, Term};
use crate::value::Value;

/// Coerce an evaluated child into a datum, tagging failures with the
/// parent term's name.
fn as_datum(value: Value, term: &'static str) -> Result<Datum, EvalError> {
    let found = value.kind_name();
    value.into_datum().ok_or(EvalError::NotDatum { term, found })
}

/// Coerce an evaluated child into a string datum.
fn as_str(value: Value, term: &'static str) -> Result<Rc<str>, EvalError> {
    match as_datum(value, term)? {
        Datum::String(s) => Ok(s),
        other => Err(EvalError::NotString {
            term,
            found: other.kind_name(),
        }),
    }
}

// ── datum ────────────────────────────────────────────────────────────────────

/// A pre-parsed literal.
///
/// Literals are the overwhelming majority of sub-terms in real queries,
/// so the datum is wrapped into a [`Value`] once at construction and
/// every `eval` hands out that same value: O(1) regardless of size,
/// with no failure path. Always deterministic.
#[derive(Debug)]
pub struct DatumTerm {
    raw_val: Value,
}

impl DatumTerm {
    pub fn new(datum: Datum) -> Self {
        DatumTerm {
            raw_val: Value::Datum(datum),
        }
    }
}

impl Term for DatumTerm {
    fn eval(&self, _env: &Env) -> Result<Value, EvalError> {
        Ok(self.raw_val.clone())
    }

    fn is_deterministic(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "datum"
    }
}

// ── make_array ───────────────────────────────────────────────────────────────

/// Array constructor: any number of positional arguments, no options.
///
/// Arguments are evaluated left to right and appended in that exact
/// order. A failure mid-way discards the partial array.
#[derive(Debug)]
pub struct MakeArrayTerm {
    op: OpArgs,
}

impl MakeArrayTerm {
    pub fn bind(args: Vec<BoxTerm>, optargs: Vec<(String, BoxTerm)>) -> Result<Self, BindError> {
        Ok(MakeArrayTerm {
            op: OpArgs::bind("make_array", ArgSpec::at_least(0), OptArgSpec::None, args, optargs)?,
        })
    }
}

impl Term for MakeArrayTerm {
    fn eval(&self, env: &Env) -> Result<Value, EvalError> {
        env.check_interrupted()?;
        let mut acc = ArrayBuilder::with_capacity(self.op.args().len());
        for arg in self.op.args() {
            acc.push(as_datum(arg.eval(env)?, self.name())?);
        }
        Ok(Value::Datum(acc.finish()))
    }

    fn is_deterministic(&self) -> bool {
        self.op.deterministic()
    }

    fn name(&self) -> &'static str {
        "make_array"
    }
}

// ── make_obj ─────────────────────────────────────────────────────────────────

/// Object constructor: no positional arguments, all bindings arrive as
/// named options.
///
/// Option values are evaluated in declared order and inserted into the
/// accumulating object. The decoder already guarantees unique option
/// keys, but insertion re-checks so option kinds that resolve keys
/// dynamically stay covered; a duplicate aborts before freezing.
pub struct MakeObjTerm {
    op: OpArgs,
}

impl MakeObjTerm {
    pub fn bind(args: Vec<BoxTerm>, optargs: Vec<(String, BoxTerm)>) -> Result<Self, BindError> {
        Ok(MakeObjTerm {
            op: OpArgs::bind("make_obj", ArgSpec::exactly(0), OptArgSpec::Object, args, optargs)?,
        })
    }
}

impl Term for MakeObjTerm {
    fn eval(&self, env: &Env) -> Result<Value, EvalError> {
        env.check_interrupted()?;
        let mut acc = ObjectBuilder::new();
        for (key, term) in self.op.optargs() {
            let datum = as_datum(term.eval(env)?, self.name())?;
            acc.insert(key.clone(), datum)?;
        }
        Ok(Value::Datum(acc.finish()))
    }

    fn is_deterministic(&self) -> bool {
        self.op.deterministic()
    }

    fn name(&self) -> &'static str {
        "make_obj"
    }
}

// ── json ─────────────────────────────────────────────────────────────────────

/// JSON parser: exactly one argument, no options.
///
/// The argument is coerced to a string and parsed into a datum; a parse
/// failure carries the original text. Deterministic iff the argument
/// term is.
pub struct JsonTerm {
    op: OpArgs,
}

impl JsonTerm {
    pub fn bind(args: Vec<BoxTerm>, optargs: Vec<(String, BoxTerm)>) -> Result<Self, BindError> {
        Ok(JsonTerm {
            op: OpArgs::bind("json", ArgSpec::exactly(1), OptArgSpec::None, args, optargs)?,
        })
    }
}

impl Term for JsonTerm {
    fn eval(&self, env: &Env) -> Result<Value, EvalError> {
        env.check_interrupted()?;
        let text = as_str(self.op.args()[0].eval(env)?, self.name())?;
        let datum = Datum::from_json_str(&text)
            .map_err(|_| EvalError::BadJson(text.to_string()))?;
        Ok(Value::Datum(datum))
    }

    fn is_deterministic(&self) -> bool {
        self.op.deterministic()
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
