// Decoded term tree: the shape a query arrives in from the wire decoder.

use crate::datum::Datum;

/// Term kinds understood by this evaluation core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermKind {
    /// Literal datum payload.
    Datum,
    /// Array constructor.
    MakeArray,
    /// Object constructor.
    MakeObj,
    /// JSON string parser.
    Json,
}

impl TermKind {
    /// Stable identifier used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            TermKind::Datum => "datum",
            TermKind::MakeArray => "make_array",
            TermKind::MakeObj => "make_obj",
            TermKind::Json => "json",
        }
    }
}

/// One node of the decoded query tree.
///
/// The decoder hands this over already structured: positional arguments
/// and named options are nested subtrees, and literal payloads arrive
/// pre-materialized as [`Datum`]. This core never parses query syntax.
///
/// Options are kept as pairs in declared order. Key uniqueness is the
/// decoder's contract; the object term re-checks it at insertion time.
#[derive(Clone, Debug)]
pub struct TermTree {
    pub kind: TermKind,
    pub args: Vec<TermTree>,
    pub optargs: Vec<(String, TermTree)>,
    pub datum: Option<Datum>,
}

impl TermTree {
    /// A literal datum node.
    pub fn datum(d: impl Into<Datum>) -> Self {
        TermTree {
            kind: TermKind::Datum,
            args: Vec::new(),
            optargs: Vec::new(),
            datum: Some(d.into()),
        }
    }

    /// An array constructor node over the given argument subtrees.
    pub fn make_array(args: Vec<TermTree>) -> Self {
        TermTree {
            kind: TermKind::MakeArray,
            args,
            optargs: Vec::new(),
            datum: None,
        }
    }

    /// An object constructor node over the given option pairs.
    pub fn make_obj<K: Into<String>>(optargs: Vec<(K, TermTree)>) -> Self {
        TermTree {
            kind: TermKind::MakeObj,
            args: Vec::new(),
            optargs: optargs.into_iter().map(|(k, t)| (k.into(), t)).collect(),
            datum: None,
        }
    }

    /// A JSON-parsing node over a single argument subtree.
    pub fn json(arg: TermTree) -> Self {
        TermTree {
            kind: TermKind::Json,
            args: vec![arg],
            optargs: Vec::new(),
            datum: None,
        }
    }
}
