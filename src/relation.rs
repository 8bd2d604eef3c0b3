//! Sorted, duplicate-free relations and the comparator strategy bound to them.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

use crate::error::EngineError;
use crate::gallop::gallop;
use crate::value::{Tuple, Value, compare_tuples};

/// A total-order strategy over tuples.
///
/// A comparator is constructed independently of any relation and passed in at
/// construction time; two comparators are considered the same by declared tag
/// identity, never by structural equality of their comparison logic.
/// Combining relations built with different comparators is a
/// [`EngineError::ComparatorMismatch`].
#[derive(Clone, Copy)]
pub struct Comparator {
    tag: &'static str,
    cmp: fn(&[Value], &[Value]) -> Result<Ordering, EngineError>,
}

impl Comparator {
    /// The default element-wise lexicographic order (see
    /// [`compare_tuples`](crate::value::compare_tuples)).
    pub const LEXICOGRAPHIC: Comparator = Comparator {
        tag: "lexicographic",
        cmp: compare_tuples,
    };

    /// Declare a named comparison strategy. The `tag` is the identity under
    /// which relations built with this comparator may be combined.
    pub const fn new(
        tag: &'static str,
        cmp: fn(&[Value], &[Value]) -> Result<Ordering, EngineError>,
    ) -> Self {
        Comparator { tag, cmp }
    }

    /// Compare two tuples under this strategy.
    pub fn compare(&self, a: &[Value], b: &[Value]) -> Result<Ordering, EngineError> {
        (self.cmp)(a, b)
    }

    /// The identity tag this comparator was declared with.
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub(crate) fn ensure_matches(&self, other: &Comparator) -> Result<(), EngineError> {
        if self.tag == other.tag {
            Ok(())
        } else {
            Err(EngineError::ComparatorMismatch {
                left: self.tag,
                right: other.tag,
            })
        }
    }
}

impl PartialEq for Comparator {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
    }
}

impl Eq for Comparator {}

impl Default for Comparator {
    fn default() -> Self {
        Comparator::LEXICOGRAPHIC
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Comparator").field(&self.tag).finish()
    }
}

/// An immutable, sorted, duplicate-free container of tuples sharing one
/// comparator.
///
/// Invariant: adjacent tuples compare strictly less-than, so no duplicates, no
/// inversions. Relations are never mutated after construction; every
/// combining operation produces a new relation, so sharing one between
/// components only ever means sharing finalized read-only data.
#[derive(Clone, Debug)]
pub struct Relation {
    elements: Vec<Tuple>,
    comparator: Comparator,
}

impl Relation {
    /// A relation with no tuples.
    pub fn empty(comparator: Comparator) -> Self {
        Relation {
            elements: Vec::new(),
            comparator,
        }
    }

    /// Build a relation by sorting `tuples` and removing duplicates.
    ///
    /// All tuples must share one arity; the first comparison that detects a
    /// violation aborts construction. O(n log n).
    pub fn from_tuples(tuples: Vec<Tuple>, comparator: Comparator) -> Result<Self, EngineError> {
        let mut elements = tuples;
        check_uniform_arity(&elements)?;
        sort_dedup(&mut elements, &comparator)?;
        Ok(Relation {
            elements,
            comparator,
        })
    }

    /// Merge two relations into their set union as a new relation.
    ///
    /// Requires both operands to have been built with the same comparator.
    /// O((n+m) log(n+m)).
    pub fn merge(&self, other: &Relation) -> Result<Relation, EngineError> {
        self.comparator.ensure_matches(&other.comparator)?;
        let mut elements = Vec::with_capacity(self.len() + other.len());
        elements.extend_from_slice(&self.elements);
        elements.extend_from_slice(&other.elements);
        check_uniform_arity(&elements)?;
        sort_dedup(&mut elements, &self.comparator)?;
        Ok(Relation {
            elements,
            comparator: self.comparator,
        })
    }

    /// Membership test via galloping search.
    pub fn contains(&self, tuple: &Tuple) -> Result<bool, EngineError> {
        let pos = gallop(&self.elements, 0, |seen| {
            Ok(self.comparator.compare(seen, tuple)? == Ordering::Less)
        })?;
        Ok(pos < self.elements.len()
            && self.comparator.compare(&self.elements[pos], tuple)? == Ordering::Equal)
    }

    /// Tuple count.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The comparator this relation was built with.
    pub fn comparator(&self) -> &Comparator {
        &self.comparator
    }

    /// Build from elements already sorted and deduplicated under `comparator`.
    pub(crate) fn from_sorted(elements: Vec<Tuple>, comparator: Comparator) -> Self {
        Relation {
            elements,
            comparator,
        }
    }

    pub(crate) fn into_elements(self) -> Vec<Tuple> {
        self.elements
    }
}

impl Deref for Relation {
    type Target = [Tuple];

    fn deref(&self) -> &Self::Target {
        &self.elements
    }
}

fn check_uniform_arity(elements: &[Tuple]) -> Result<(), EngineError> {
    if let Some(first) = elements.first() {
        let arity = first.len();
        for tuple in &elements[1..] {
            if tuple.len() != arity {
                return Err(EngineError::ArityMismatch {
                    left: arity,
                    right: tuple.len(),
                });
            }
        }
    }
    Ok(())
}

/// Sort in place, then compact away duplicates with a two-pointer scan: the
/// write cursor advances only when the read element differs from the last
/// kept element.
fn sort_dedup(elements: &mut Vec<Tuple>, comparator: &Comparator) -> Result<(), EngineError> {
    // `sort_by` cannot return early, so the first comparison failure is
    // captured and the sorted-garbage result discarded afterwards.
    let mut first_err = None;
    elements.sort_by(|a, b| match comparator.compare(a, b) {
        Ok(ord) => ord,
        Err(e) => {
            first_err.get_or_insert(e);
            Ordering::Equal
        }
    });
    if let Some(e) = first_err {
        return Err(e);
    }

    if elements.len() > 1 {
        let mut write = 1;
        for read in 1..elements.len() {
            if comparator.compare(&elements[read], &elements[write - 1])? != Ordering::Equal {
                elements.swap(read, write);
                write += 1;
            }
        }
        elements.truncate(write);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn pair(a: i64, b: i64) -> Tuple {
        vec![Value::Int(a), Value::Int(b)]
    }

    fn lex() -> Comparator {
        Comparator::default()
    }

    #[test]
    fn test_construct_sorts_and_dedups() {
        let rel =
            Relation::from_tuples(vec![pair(3, 1), pair(1, 2), pair(3, 1), pair(2, 0)], lex())
                .unwrap();
        assert_eq!(rel.len(), 3);
        assert_eq!(&rel[..], &[pair(1, 2), pair(2, 0), pair(3, 1)]);
    }

    #[test]
    fn test_construct_is_idempotent() {
        let rel = Relation::from_tuples(vec![pair(2, 2), pair(1, 1), pair(2, 2)], lex()).unwrap();
        let again = Relation::from_tuples(rel.to_vec(), lex()).unwrap();
        assert_eq!(&rel[..], &again[..]);
    }

    #[test]
    fn test_empty_relation() {
        let rel = Relation::from_tuples(vec![], lex()).unwrap();
        assert!(rel.is_empty());
        assert_eq!(rel.len(), 0);
    }

    #[test]
    fn test_merge_is_set_union() {
        let a = Relation::from_tuples(vec![pair(1, 1), pair(2, 2)], lex()).unwrap();
        let b = Relation::from_tuples(vec![pair(2, 2), pair(3, 3)], lex()).unwrap();
        let merged = a.merge(&b).unwrap();
        assert_eq!(&merged[..], &[pair(1, 1), pair(2, 2), pair(3, 3)]);

        // commutative on set content
        let reversed = b.merge(&a).unwrap();
        assert_eq!(&merged[..], &reversed[..]);
    }

    #[test]
    fn test_merge_comparator_mismatch() {
        fn always_equal(_: &[Value], _: &[Value]) -> Result<Ordering, EngineError> {
            Ok(Ordering::Equal)
        }
        let other = Comparator::new("degenerate", always_equal);
        let a = Relation::from_tuples(vec![pair(1, 1)], lex()).unwrap();
        let b = Relation::from_tuples(vec![pair(1, 1)], other).unwrap();
        assert_eq!(
            a.merge(&b).unwrap_err(),
            EngineError::ComparatorMismatch {
                left: "lexicographic",
                right: "degenerate",
            }
        );
    }

    #[test]
    fn test_arity_mismatch_rejected_at_construction() {
        let result = Relation::from_tuples(vec![pair(1, 1), vec![Value::Int(9)]], lex());
        assert_eq!(
            result.unwrap_err(),
            EngineError::ArityMismatch { left: 2, right: 1 }
        );
    }

    #[test]
    fn test_contains() {
        let rel =
            Relation::from_tuples(vec![pair(1, 1), pair(5, 5), pair(9, 9)], lex()).unwrap();
        assert!(rel.contains(&pair(5, 5)).unwrap());
        assert!(!rel.contains(&pair(4, 4)).unwrap());
        assert!(!rel.contains(&pair(10, 0)).unwrap());
    }

    #[test]
    fn test_mixed_numeric_keys_above_float_precision() {
        // Int(2^53) and Float(2^53.0) compare Equal, so exactly one survives
        // dedup; Int(2^53 + 1) must stay strictly above it.
        let big = 1i64 << 53;
        let rel = Relation::from_tuples(
            vec![
                vec![Value::Int(big + 1)],
                vec![Value::from(big as f64)],
                vec![Value::Int(big)],
            ],
            lex(),
        )
        .unwrap();
        assert_eq!(rel.len(), 2);
        for w in rel.windows(2) {
            assert!(compare_tuples(&w[0], &w[1]).unwrap().is_lt());
        }
        assert!(rel.contains(&vec![Value::Int(big)]).unwrap());
        assert!(rel.contains(&vec![Value::Int(big + 1)]).unwrap());
    }

    #[test]
    fn test_string_tuples() {
        let rel = Relation::from_tuples(
            vec![
                vec![Value::str("bob"), Value::str("alice")],
                vec![Value::str("alice"), Value::str("eve")],
            ],
            lex(),
        )
        .unwrap();
        assert_eq!(rel[0][0], Value::str("alice"));
        assert_eq!(rel[1][0], Value::str("bob"));
    }
}
