// Datum: the immutable query value type, Rc-wrapped for O(1) cloning.

use std::fmt;
use std::rc::Rc;

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use thiserror::Error;

/// Errors raised while assembling a datum.
#[derive(Error, Debug)]
pub enum DatumError {
    #[error("Duplicate key in object: {0}.")]
    DuplicateKey(String),
}

/// The runtime value of the query language: a JSON-superset tagged union.
///
/// Aggregate variants (String, Array, Object) are Rc-wrapped, so cloning a
/// datum of any size is O(1) and frozen values can be shared read-only by
/// every holder. There is no in-place mutation once a datum is exposed;
/// incremental construction goes through [`ArrayBuilder`] and
/// [`ObjectBuilder`], which freeze on `finish`.
#[derive(Clone, Debug)]
pub enum Datum {
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Rc<Vec<Datum>>),
    Object(Rc<IndexMap<String, Datum>>),
}

// ── Type checks ──────────────────────────────────────────────────────────────

impl Datum {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    #[inline]
    pub fn is_bool(&self) -> bool {
        matches!(self, Datum::Bool(_))
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Datum::Number(_))
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Datum::String(_))
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, Datum::Array(_))
    }

    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, Datum::Object(_))
    }

    /// Kind label used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Datum::Null => "null",
            Datum::Bool(_) => "bool",
            Datum::Number(_) => "number",
            Datum::String(_) => "string",
            Datum::Array(_) => "array",
            Datum::Object(_) => "object",
        }
    }
}

// ── Extraction ───────────────────────────────────────────────────────────────

impl Datum {
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Datum::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Datum::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Datum::Number(n) => {
                let f = *n;
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    Some(f as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&Vec<Datum>> {
        match self {
            Datum::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&IndexMap<String, Datum>> {
        match self {
            Datum::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Index into an object by key.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Datum> {
        match self {
            Datum::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Index into an array by position.
    #[inline]
    pub fn get_index(&self, index: usize) -> Option<&Datum> {
        match self {
            Datum::Array(arr) => arr.get(index),
            _ => None,
        }
    }
}

// ── Constructors ─────────────────────────────────────────────────────────────

impl Datum {
    #[inline]
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Datum::String(s.into())
    }

    #[inline]
    pub fn array(v: Vec<Datum>) -> Self {
        Datum::Array(Rc::new(v))
    }

    #[inline]
    pub fn object(m: IndexMap<String, Datum>) -> Self {
        Datum::Object(Rc::new(m))
    }
}

// ── From impls ───────────────────────────────────────────────────────────────

impl From<bool> for Datum {
    #[inline]
    fn from(b: bool) -> Self {
        Datum::Bool(b)
    }
}

impl From<i32> for Datum {
    #[inline]
    fn from(n: i32) -> Self {
        Datum::Number(n as f64)
    }
}

impl From<i64> for Datum {
    #[inline]
    fn from(n: i64) -> Self {
        Datum::Number(n as f64)
    }
}

impl From<u64> for Datum {
    #[inline]
    fn from(n: u64) -> Self {
        Datum::Number(n as f64)
    }
}

impl From<usize> for Datum {
    #[inline]
    fn from(n: usize) -> Self {
        Datum::Number(n as f64)
    }
}

impl From<f64> for Datum {
    #[inline]
    fn from(n: f64) -> Self {
        Datum::Number(n)
    }
}

impl From<&str> for Datum {
    #[inline]
    fn from(s: &str) -> Self {
        Datum::String(s.into())
    }
}

impl From<String> for Datum {
    #[inline]
    fn from(s: String) -> Self {
        Datum::String(s.into())
    }
}

impl From<Rc<str>> for Datum {
    #[inline]
    fn from(s: Rc<str>) -> Self {
        Datum::String(s)
    }
}

impl From<Vec<Datum>> for Datum {
    #[inline]
    fn from(v: Vec<Datum>) -> Self {
        Datum::Array(Rc::new(v))
    }
}

impl From<IndexMap<String, Datum>> for Datum {
    #[inline]
    fn from(m: IndexMap<String, Datum>) -> Self {
        Datum::Object(Rc::new(m))
    }
}

// ── Incremental construction ─────────────────────────────────────────────────

/// Accumulates array elements in evaluation order, then freezes.
///
/// Element order is significant and preserved exactly as pushed.
#[derive(Default)]
pub struct ArrayBuilder {
    items: Vec<Datum>,
}

impl ArrayBuilder {
    pub fn new() -> Self {
        ArrayBuilder { items: Vec::new() }
    }

    pub fn with_capacity(n: usize) -> Self {
        ArrayBuilder {
            items: Vec::with_capacity(n),
        }
    }

    #[inline]
    pub fn push(&mut self, datum: Datum) {
        self.items.push(datum);
    }

    /// Freeze the accumulated elements into an array datum.
    pub fn finish(self) -> Datum {
        Datum::Array(Rc::new(self.items))
    }
}

/// Accumulates object entries, rejecting duplicate keys at insertion.
#[derive(Default)]
pub struct ObjectBuilder {
    entries: IndexMap<String, Datum>,
}

impl ObjectBuilder {
    pub fn new() -> Self {
        ObjectBuilder {
            entries: IndexMap::new(),
        }
    }

    /// Insert one entry. A key already present is a rejected operation,
    /// never a silent overwrite.
    pub fn insert(&mut self, key: impl Into<String>, datum: Datum) -> Result<(), DatumError> {
        match self.entries.entry(key.into()) {
            Entry::Occupied(slot) => Err(DatumError::DuplicateKey(slot.key().clone())),
            Entry::Vacant(slot) => {
                slot.insert(datum);
                Ok(())
            }
        }
    }

    /// Freeze the accumulated entries into an object datum.
    pub fn finish(self) -> Datum {
        Datum::Object(Rc::new(self.entries))
    }
}

// ── PartialEq ────────────────────────────────────────────────────────────────

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Datum::Null, Datum::Null) => true,
            (Datum::Bool(a), Datum::Bool(b)) => a == b,
            (Datum::Number(a), Datum::Number(b)) => {
                // NaN != NaN
                if a.is_nan() && b.is_nan() {
                    return false;
                }
                a == b
            }
            (Datum::String(a), Datum::String(b)) => a == b,
            (Datum::Array(a), Datum::Array(b)) => a == b,
            (Datum::Object(a), Datum::Object(b)) => a == b,
            _ => false,
        }
    }
}

// ── Display ──────────────────────────────────────────────────────────────────

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => write!(f, "null"),
            Datum::Bool(b) => write!(f, "{}", b),
            Datum::Number(n) => format_number(*n, f),
            Datum::String(s) => write!(f, "\"{}\"", escape_json_string(s)),
            Datum::Array(arr) => {
                write!(f, "[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Datum::Object(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "\"{}\":{}", escape_json_string(k), v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn escape_json_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c < '\x20' => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}

fn format_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if !n.is_finite() {
        // NaN and +/-Infinity serialize as null (matching JSON)
        write!(f, "null")
    } else if n.fract() == 0.0 && n.abs() < 1e20 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{}", n)
    }
}

// ── Serialization ────────────────────────────────────────────────────────────

impl Serialize for Datum {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Datum::Null => serializer.serialize_unit(),
            Datum::Bool(b) => serializer.serialize_bool(*b),
            Datum::Number(n) => {
                if n.is_nan() || n.is_infinite() {
                    serializer.serialize_unit()
                } else if n.fract() == 0.0 && *n >= i64::MIN as f64 && *n <= i64::MAX as f64 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Datum::String(s) => serializer.serialize_str(s),
            Datum::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for v in arr.iter() {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Datum::Object(map) => {
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    m.serialize_entry(k, v)?;
                }
                m.end()
            }
        }
    }
}

// ── Deserialization (single-pass JSON→Datum) ─────────────────────────────────

impl<'de> serde::Deserialize<'de> for Datum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DatumVisitor)
    }
}

struct DatumVisitor;

impl<'de> Visitor<'de> for DatumVisitor {
    type Value = Datum;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "any valid JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Datum, E> {
        Ok(Datum::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Datum, E> {
        Ok(Datum::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Datum, E> {
        Ok(Datum::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Datum, E> {
        Ok(Datum::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Datum, E> {
        Ok(Datum::string(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Datum, E> {
        Ok(Datum::String(v.into()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Datum, E> {
        Ok(Datum::Null)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Datum, E> {
        Ok(Datum::Null)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Datum, A::Error> {
        let mut vec = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(elem) = seq.next_element()? {
            vec.push(elem);
        }
        Ok(Datum::array(vec))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Datum, A::Error> {
        let mut m = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Datum>()? {
            // The parser is last-wins on repeated keys; object key
            // uniqueness is a construction invariant here, so repeats in
            // the input text are rejected rather than silently collapsed.
            match m.entry(key) {
                Entry::Occupied(slot) => {
                    return Err(de::Error::custom(format!(
                        "Duplicate key in object: {}.",
                        slot.key()
                    )));
                }
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
            }
        }
        Ok(Datum::object(m))
    }
}

// ── JSON string I/O ──────────────────────────────────────────────────────────

impl Datum {
    /// Serialize to a compact JSON string.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a JSON string into a datum (single-pass, no intermediate
    /// generic tree).
    ///
    /// When the `simd` feature is enabled, uses simd-json for faster
    /// parsing on CPUs with SIMD support, falling back to serde_json.
    pub fn from_json_str(s: &str) -> Result<Datum, serde_json::Error> {
        #[cfg(feature = "simd")]
        {
            // simd-json requires a mutable byte slice
            let mut bytes = s.as_bytes().to_vec();
            if let Ok(datum) = simd_json::serde::from_slice::<Datum>(&mut bytes) {
                return Ok(datum);
            }
            // Fall back to serde_json so error reporting stays uniform
        }
        serde_json::from_str(s)
    }
}

// ── datum! macro ─────────────────────────────────────────────────────────────

/// Macro for constructing datum literals, similar to serde_json::json!
///
/// Usage:
///   datum!(null)           → Datum::Null
///   datum!(true)           → Datum::Bool(true)
///   datum!(42i64)          → Datum::Number(42.0)
///   datum!("hello")        → Datum::String(Rc::from("hello"))
///   datum!([1i64, 2i64])   → Datum::Array(Rc::new(vec![...]))
///   datum!({"k": v, ...})  → Datum::Object(Rc::new(IndexMap from pairs))
///   datum!(expr)           → Datum::from(expr)
#[macro_export]
macro_rules! datum {
    // null
    (null) => {
        $crate::datum::Datum::Null
    };

    // true
    (true) => {
        $crate::datum::Datum::Bool(true)
    };

    // false
    (false) => {
        $crate::datum::Datum::Bool(false)
    };

    // Array
    ([ $($elem:tt),* $(,)? ]) => {
        $crate::datum::Datum::Array(std::rc::Rc::new(vec![ $( $crate::datum!($elem) ),* ]))
    };

    // Object
    ({ $($key:tt : $val:tt),* $(,)? }) => {
        {
            let mut map = indexmap::IndexMap::new();
            $(
                map.insert(($key).to_string(), $crate::datum!($val));
            )*
            $crate::datum::Datum::Object(std::rc::Rc::new(map))
        }
    };

    // Expression (fallback: numbers, strings, variables, etc.)
    ($other:expr) => {
        $crate::datum::Datum::from($other)
    };
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_is_cheap() {
        // Array clone should be O(1), same Rc pointer
        let arr = Datum::array(vec![Datum::from(1i64), Datum::from(2i64)]);
        let arr2 = arr.clone();
        if let (Datum::Array(a), Datum::Array(b)) = (&arr, &arr2) {
            assert!(Rc::ptr_eq(a, b));
        } else {
            panic!("expected arrays");
        }

        let mut map = IndexMap::new();
        map.insert("x".to_string(), Datum::from(1i64));
        let obj = Datum::object(map);
        let obj2 = obj.clone();
        if let (Datum::Object(a), Datum::Object(b)) = (&obj, &obj2) {
            assert!(Rc::ptr_eq(a, b));
        } else {
            panic!("expected objects");
        }
    }

    #[test]
    fn test_type_checks() {
        assert!(Datum::Null.is_null());
        assert!(Datum::Bool(true).is_bool());
        assert!(Datum::Number(42.0).is_number());
        assert!(Datum::string("hello").is_string());
        assert!(Datum::array(vec![]).is_array());
        assert!(Datum::object(IndexMap::new()).is_object());
        assert_eq!(Datum::Null.kind_name(), "null");
        assert_eq!(Datum::array(vec![]).kind_name(), "array");
    }

    #[test]
    fn test_extraction() {
        assert_eq!(Datum::Number(42.0).as_f64(), Some(42.0));
        assert_eq!(Datum::Number(42.0).as_i64(), Some(42));
        assert_eq!(Datum::Number(42.5).as_i64(), None);
        assert_eq!(Datum::string("hello").as_str(), Some("hello"));
        assert_eq!(Datum::Bool(true).as_bool(), Some(true));
        assert_eq!(
            datum!([1i64, 2i64]).get_index(1),
            Some(&Datum::Number(2.0))
        );
        assert_eq!(
            datum!({"a": 1i64}).get("a"),
            Some(&Datum::Number(1.0))
        );
    }

    #[test]
    fn test_equality() {
        assert_eq!(Datum::Null, Datum::Null);
        assert_eq!(Datum::Bool(true), Datum::Bool(true));
        assert_ne!(Datum::Bool(true), Datum::Bool(false));
        assert_eq!(Datum::Number(42.0), Datum::Number(42.0));
        assert_ne!(Datum::Number(f64::NAN), Datum::Number(f64::NAN));
        assert_ne!(Datum::Null, Datum::Bool(false));
    }

    #[test]
    fn test_array_builder_preserves_order() {
        let mut acc = ArrayBuilder::new();
        acc.push(Datum::from(3i64));
        acc.push(Datum::from(1i64));
        acc.push(Datum::from(2i64));
        assert_eq!(acc.finish(), datum!([3i64, 1i64, 2i64]));
    }

    #[test]
    fn test_object_builder_rejects_duplicate_key() {
        let mut acc = ObjectBuilder::new();
        acc.insert("a", Datum::from(1i64)).unwrap();
        acc.insert("b", Datum::from(2i64)).unwrap();
        let err = acc.insert("a", Datum::from(3i64)).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate key in object: a.");
    }

    #[test]
    fn test_display() {
        let d = datum!({"name": "Ali\"ce", "scores": [1i64, 2.5f64], "ok": true, "gone": null});
        assert_eq!(
            d.to_string(),
            r#"{"name":"Ali\"ce","scores":[1,2.5],"ok":true,"gone":null}"#
        );
    }

    #[test]
    fn test_json_roundtrip() {
        let d = datum!({"name": "Alice", "scores": [1i64, 2i64, 3i64], "active": true});
        let text = d.to_json_string().unwrap();
        let parsed = Datum::from_json_str(&text).unwrap();
        assert_eq!(d, parsed);
    }

    #[test]
    fn test_json_scalars() {
        assert_eq!(Datum::from_json_str("null").unwrap(), Datum::Null);
        assert_eq!(Datum::from_json_str("true").unwrap(), Datum::Bool(true));
        assert_eq!(Datum::from_json_str("1.5").unwrap(), Datum::Number(1.5));
        assert_eq!(
            Datum::from_json_str("\"hi\"").unwrap(),
            Datum::string("hi")
        );
    }

    #[test]
    fn test_json_duplicate_keys_rejected() {
        // serde_json alone would keep the last "a"; the visitor re-applies
        // the uniqueness invariant instead
        let err = Datum::from_json_str(r#"{"a":1,"a":2}"#).unwrap_err();
        assert!(err.to_string().contains("Duplicate key in object: a."));
    }

    #[test]
    fn test_datum_macro() {
        assert!(datum!(null).is_null());
        assert_eq!(datum!(true).as_bool(), Some(true));
        let arr = datum!([1i64, 2i64, 3i64]);
        assert_eq!(arr.as_array().map(|a| a.len()), Some(3));
        let obj = datum!({"name": "Alice", "age": 30i64});
        assert_eq!(obj.get("name").and_then(|v| v.as_str()), Some("Alice"));
    }
}
