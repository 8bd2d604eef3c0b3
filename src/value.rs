//! Runtime values and tuples.
//!
//! A tuple is a fixed-arity sequence of values; each element is a scalar
//! (integer, float, string) or a nested tuple. Values carry a total order so
//! relations can be kept sorted, but tuple comparison is fallible: comparing
//! tuples of differing arity is a caller bug, never a silent truncation.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::error::EngineError;

/// A single element of a tuple.
///
/// The derived `PartialEq`/`Hash` are structural: `Int(2)` and `Float(2.0)`
/// are distinct values even though [`try_cmp`](Value::try_cmp) orders them
/// `Equal`. The comparator order is what the engine sorts and deduplicates
/// by, so a relation never holds both; structural equality only matters for
/// callers keying maps or sets by `Value` directly.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Signed integer.
    Int(i64),
    /// Floating point (wrapped for Eq/Ord via total ordering).
    Float(OrderedFloat),
    /// String.
    Str(Rc<str>),
    /// Nested tuple.
    Tuple(Rc<Vec<Value>>),
}

/// A tuple of values, used as a row in a relation.
pub type Tuple = Vec<Value>;

/// Wrapper for `f64` that implements Eq and Ord via `total_cmp`.
#[derive(Clone, Copy, Debug)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for OrderedFloat {}

impl Hash for OrderedFloat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // total_cmp equality is bit equality, so hashing the bits agrees
        // with Eq.
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Value {
    /// Create a string value.
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(s.as_ref()))
    }

    /// Create a nested tuple value.
    pub fn tuple(values: Vec<Value>) -> Self {
        Value::Tuple(Rc::new(values))
    }

    /// Rank used to order values of different kinds: numbers, then strings,
    /// then tuples. Keeps the order total over heterogeneous columns.
    fn kind_rank(&self) -> u8 {
        match self {
            Value::Int(_) | Value::Float(_) => 0,
            Value::Str(_) => 1,
            Value::Tuple(_) => 2,
        }
    }

    /// Compare two values. Numbers compare numerically (ints and floats mix),
    /// strings lexicographically, nested tuples recursively element-wise.
    ///
    /// Fails with [`EngineError::ArityMismatch`] when two nested tuples of
    /// differing arity meet.
    pub fn try_cmp(&self, other: &Value) -> Result<Ordering, EngineError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::Int(a), Value::Float(b)) => Ok(cmp_i64_f64(*a, b.0)),
            (Value::Float(a), Value::Int(b)) => Ok(cmp_i64_f64(*b, a.0).reverse()),
            (Value::Float(a), Value::Float(b)) => Ok(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::Tuple(a), Value::Tuple(b)) => compare_tuples(a, b),
            (a, b) => Ok(a.kind_rank().cmp(&b.kind_rank())),
        }
    }
}

/// Exact comparison of an `i64` against an `f64`.
///
/// Casting the integer to `f64` rounds above 2^53 and makes the mixed-numeric
/// order non-transitive, so the float is split into its integral part and
/// fractional remainder instead. NaN and the zero signs follow `total_cmp`:
/// negative NaN below everything, positive NaN above, and -0.0 below the
/// integer zero.
fn cmp_i64_f64(a: i64, b: f64) -> Ordering {
    if b.is_nan() {
        return if b.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    // Every i64 lies in [-2^63, 2^63); both bounds are exact as f64.
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if b >= TWO_POW_63 {
        return Ordering::Less;
    }
    if b < -TWO_POW_63 {
        return Ordering::Greater;
    }
    let truncated = b.trunc() as i64;
    match a.cmp(&truncated) {
        Ordering::Equal => {
            let fraction = b - b.trunc();
            if fraction > 0.0 {
                Ordering::Less
            } else if fraction < 0.0 {
                Ordering::Greater
            } else if a == 0 && b.is_sign_negative() {
                // Int(0) ties with +0.0, and total_cmp puts -0.0 below that.
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        }
        other => other,
    }
}

/// Lexicographic comparison of two tuples: element by element, equal leading
/// elements continue to the next position, nested tuples recurse.
///
/// Tuples of differing arity fail immediately with
/// [`EngineError::ArityMismatch`].
pub fn compare_tuples(a: &[Value], b: &[Value]) -> Result<Ordering, EngineError> {
    if a.len() != b.len() {
        return Err(EngineError::ArityMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    for (va, vb) in a.iter().zip(b.iter()) {
        let ord = va.try_cmp(vb)?;
        if ord != Ordering::Equal {
            return Ok(ord);
        }
    }
    Ok(Ordering::Equal)
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{:?}", v.0),
            Value::Str(v) => write!(f, "{v:?}"),
            Value::Tuple(v) => {
                write!(f, "(")?;
                for (i, val) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{val:?}")?;
                }
                if v.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            other => write!(f, "{other:?}"),
        }
    }
}

// Convenience From implementations
impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(OrderedFloat(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::str(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::tuple(v)
    }
}
