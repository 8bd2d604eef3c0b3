//! Merge-join over sorted relations and the two-variable semi-naive join.

use std::cmp::Ordering;

use crate::error::EngineError;
use crate::gallop::gallop;
use crate::relation::Relation;
use crate::value::{Tuple, Value};
use crate::variable::Variable;

/// Joins two sorted relations on their leading tuple element.
///
/// Key comparison and cursor galloping use the value order
/// ([`Value::try_cmp`]), not the operands' comparator. Both operands must
/// therefore be ordered leading-element-first under that order, as
/// [`Comparator::LEXICOGRAPHIC`](crate::Comparator::LEXICOGRAPHIC) relations
/// are; a custom comparator whose order disagrees on leading elements yields
/// wrong join results, not an error.
///
/// Both cursors start at 0. Whichever side holds the smaller key is galloped
/// forward past all keys strictly less than the other side's key. On a key
/// match, `result_fn(key, a_rest, b_rest)` is invoked for every pair in the
/// cross product of the two matching-key runs (A-run outer, B-run inner, both
/// in stored order), where `a_rest`/`b_rest` are the tuple suffixes after the
/// key. Terminates when either cursor exhausts its relation.
///
/// This one operator serves every join shape in the engine: variable against
/// frozen relation, and all three components of a two-variable join.
pub fn join_helper<F>(a: &Relation, b: &Relation, mut result_fn: F) -> Result<(), EngineError>
where
    F: FnMut(&Value, &[Value], &[Value]),
{
    a.comparator().ensure_matches(b.comparator())?;

    let a = &a[..];
    let b = &b[..];
    let mut idx_a = 0;
    let mut idx_b = 0;

    while idx_a < a.len() && idx_b < b.len() {
        let key_a = leading(&a[idx_a])?;
        let key_b = leading(&b[idx_b])?;
        match key_a.try_cmp(key_b)? {
            Ordering::Less => {
                idx_a = gallop(a, idx_a, |t| {
                    Ok(leading(t)?.try_cmp(key_b)? == Ordering::Less)
                })?;
            }
            Ordering::Greater => {
                idx_b = gallop(b, idx_b, |t| {
                    Ok(leading(t)?.try_cmp(key_a)? == Ordering::Less)
                })?;
            }
            Ordering::Equal => {
                // Runs are expected to be short, so a linear scan beats
                // galloping here.
                let run_a = run_length(a, idx_a, key_a)?;
                let run_b = run_length(b, idx_b, key_b)?;
                for tuple_a in &a[idx_a..idx_a + run_a] {
                    for tuple_b in &b[idx_b..idx_b + run_b] {
                        result_fn(key_a, &tuple_a[1..], &tuple_b[1..]);
                    }
                }
                idx_a += run_a;
                idx_b += run_b;
            }
        }
    }
    Ok(())
}

/// Joins two evolving variables into `out`.
///
/// When both operands change across rounds, three joins cover exactly the
/// not-yet-considered pairs:
///
/// - `a.recent` against each relation in `b.stable`
/// - each relation in `a.stable` against `b.recent`
/// - `a.recent` against `b.recent`
///
/// stable × stable is never joined: those pairs were produced and consumed in
/// an earlier round. Across the life of the computation each matching pair is
/// handed to `logic` exactly once, which is what makes total work proportional
/// to results produced rather than rounds × relation sizes.
///
/// All results are merged into one relation and queued on `out.to_add`.
pub fn join_into<F>(
    a: &Variable,
    b: &Variable,
    out: &Variable,
    mut logic: F,
) -> Result<(), EngineError>
where
    F: FnMut(&Value, &[Value], &[Value]) -> Tuple,
{
    let mut results = Vec::new();
    {
        let recent_a = a.recent.borrow();
        let recent_b = b.recent.borrow();

        for batch in b.stable.borrow().iter() {
            join_helper(&recent_a, batch, |k, va, vb| results.push(logic(k, va, vb)))?;
        }
        for batch in a.stable.borrow().iter() {
            join_helper(batch, &recent_b, |k, va, vb| results.push(logic(k, va, vb)))?;
        }
        join_helper(&recent_a, &recent_b, |k, va, vb| results.push(logic(k, va, vb)))?;
    }
    out.insert(Relation::from_tuples(results, out.comparator())?)
}

fn leading(tuple: &Tuple) -> Result<&Value, EngineError> {
    // A join on the leading element has no key to read from a 0-arity tuple.
    tuple.first().ok_or(EngineError::ArityMismatch {
        left: 0,
        right: 1,
    })
}

fn run_length(rel: &[Tuple], start: usize, key: &Value) -> Result<usize, EngineError> {
    let mut len = 1;
    while start + len < rel.len() && leading(&rel[start + len])?.try_cmp(key)? == Ordering::Equal {
        len += 1;
    }
    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::Comparator;

    fn pair(a: i64, b: i64) -> Tuple {
        vec![Value::Int(a), Value::Int(b)]
    }

    fn rel(tuples: Vec<Tuple>) -> Relation {
        Relation::from_tuples(tuples, Comparator::default()).unwrap()
    }

    fn collect_join(a: &Relation, b: &Relation) -> Vec<Tuple> {
        let mut out = Vec::new();
        join_helper(a, b, |k, va, vb| {
            let mut t = vec![k.clone()];
            t.extend_from_slice(va);
            t.extend_from_slice(vb);
            out.push(t);
        })
        .unwrap();
        out
    }

    #[test]
    fn test_simple_join() {
        let a = rel(vec![pair(1, 10), pair(2, 20)]);
        let b = rel(vec![pair(2, 200), pair(3, 300)]);
        let out = collect_join(&a, &b);
        assert_eq!(
            out,
            vec![vec![Value::Int(2), Value::Int(20), Value::Int(200)]]
        );
    }

    #[test]
    fn test_no_common_keys() {
        let a = rel(vec![pair(1, 10), pair(3, 30)]);
        let b = rel(vec![pair(2, 20), pair(4, 40)]);
        assert!(collect_join(&a, &b).is_empty());
    }

    #[test]
    fn test_matching_runs_emit_cross_product() {
        let a = rel(vec![pair(5, 1), pair(5, 2)]);
        let b = rel(vec![pair(5, 7), pair(5, 8), pair(5, 9)]);
        let out = collect_join(&a, &b);
        assert_eq!(out.len(), 6);
        // A-run outer, B-run inner, stored order
        assert_eq!(out[0], vec![Value::Int(5), Value::Int(1), Value::Int(7)]);
        assert_eq!(out[1], vec![Value::Int(5), Value::Int(1), Value::Int(8)]);
        assert_eq!(out[5], vec![Value::Int(5), Value::Int(2), Value::Int(9)]);
    }

    #[test]
    fn test_join_skips_long_gaps() {
        let a = rel((0..100).map(|i| pair(i, i)).collect());
        let b = rel(vec![pair(97, 0)]);
        let out = collect_join(&a, &b);
        assert_eq!(out, vec![vec![Value::Int(97), Value::Int(97), Value::Int(0)]]);
    }

    #[test]
    fn test_empty_side_terminates() {
        let a = rel(vec![]);
        let b = rel(vec![pair(1, 1)]);
        assert!(collect_join(&a, &b).is_empty());
        assert!(collect_join(&b, &a).is_empty());
    }

    #[test]
    fn test_comparator_mismatch_rejected() {
        fn alt(a: &[Value], b: &[Value]) -> Result<Ordering, EngineError> {
            crate::value::compare_tuples(a, b)
        }
        let a = rel(vec![pair(1, 1)]);
        let b = Relation::from_tuples(vec![pair(1, 1)], Comparator::new("alt", alt)).unwrap();
        let result = join_helper(&a, &b, |_, _, _| {});
        assert!(matches!(
            result,
            Err(EngineError::ComparatorMismatch { .. })
        ));
    }
}
