// Value: the reference-counted result of evaluating one term.

use std::rc::Rc;

use crate::datum::Datum;

/// Result of one `eval` call, shared by anything that stores it.
///
/// For the term kinds in this crate the result is always a single datum.
/// `Sequence` stands in for the wider family of stream-shaped results
/// produced by other term kinds; it has no singular datum projection, so
/// coercing it to a datum is an evaluation failure, never a silent
/// conversion.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Datum(Datum),
    Sequence(Rc<Vec<Datum>>),
}

impl Value {
    #[inline]
    pub fn is_datum(&self) -> bool {
        matches!(self, Value::Datum(_))
    }

    #[inline]
    pub fn as_datum(&self) -> Option<&Datum> {
        match self {
            Value::Datum(d) => Some(d),
            Value::Sequence(_) => None,
        }
    }

    #[inline]
    pub fn into_datum(self) -> Option<Datum> {
        match self {
            Value::Datum(d) => Some(d),
            Value::Sequence(_) => None,
        }
    }

    /// Kind label used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Datum(d) => d.kind_name(),
            Value::Sequence(_) => "sequence",
        }
    }
}

impl From<Datum> for Value {
    #[inline]
    fn from(d: Datum) -> Self {
        Value::Datum(d)
    }
}
