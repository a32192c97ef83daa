// termeval - term evaluation engine for a document-database query language
// Copyright (c) 2026 termeval contributors
// Licensed under the MIT License

//! # termeval
//!
//! The term evaluation core of a document-database query language: a tree
//! of typed expression nodes ("terms") that evaluate to immutable,
//! reference-counted datum values, the language's JSON-superset runtime
//! type.
//!
//! A query arrives from the wire decoder as a [`TermTree`], is compiled
//! once into an evaluable [`Term`] (binding and arity violations surface
//! here), and is then evaluated any number of times. The planner consults
//! [`Term::is_deterministic`], which is fixed at construction from the
//! static shape of the tree, before deciding caching and retry strategy.
//!
//! ## Architecture
//!
//! - `datum` - the immutable value model and its builders, JSON I/O
//! - `value` - the reference-counted evaluation result wrapper
//! - `tree` - the decoder-facing term-tree representation
//! - `op` - positional-argument and named-option binding
//! - `term` - the term contract, evaluation context, tree compilation
//! - `terms` - the concrete term kinds (datum, make_array, make_obj, json)
//!
//! ## Example
//!
//! ```
//! use termeval::{build, Env, TermTree, Value};
//!
//! // [1, json("{\"a\":2}")], compiled once and evaluated many times
//! let tree = TermTree::make_array(vec![
//!     TermTree::datum(1i64),
//!     TermTree::json(TermTree::datum("{\"a\":2}")),
//! ]);
//! let term = build(&tree)?;
//! assert!(term.is_deterministic());
//!
//! let value = term.eval(&Env::new())?;
//! assert_eq!(value, Value::Datum(termeval::datum!([1i64, {"a": 2i64}])));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod datum;
pub mod op;
pub mod term;
pub mod terms;
pub mod tree;
pub mod value;

pub use datum::{ArrayBuilder, Datum, DatumError, ObjectBuilder};
pub use op::{ArgSpec, BindError, OpArgs, OptArgSpec};
pub use term::{build, BoxTerm, Env, EvalError, InterruptHandle, Term};
pub use terms::{DatumTerm, JsonTerm, MakeArrayTerm, MakeObjTerm};
pub use tree::{TermKind, TermTree};
pub use value::Value;
