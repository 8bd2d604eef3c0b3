//! The mutable working set for one derived relation.
//!
//! A variable partitions its tuples by processing status: `stable` holds
//! tuples that have participated in every join already, `recent` holds tuples
//! promoted this round but not yet joined, and `to_add` holds raw join output
//! pending promotion. The partitions sit behind individually-borrowed
//! `RefCell`s so a variable can be a join input and the join output at the
//! same time, which the transitive-closure shape requires.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use tracing::debug;

use crate::error::EngineError;
use crate::gallop::gallop;
use crate::join::join_helper;
use crate::relation::{Comparator, Relation};
use crate::value::{Tuple, Value};

/// A named, monotonically growing set of tuples.
///
/// Handles are cheap to clone and share one underlying accumulator. Created
/// through [`Iteration::variable`](crate::Iteration::variable); once the
/// fixpoint loop terminates, [`complete`](Variable::complete) yields the
/// final queryable relation.
pub struct Variable {
    name: String,
    comparator: Comparator,
    /// Disjoint relations, collectively duplicate-free. Later entries are
    /// smaller: `stable[i].len() > 2 * stable[i+1].len()` holds between
    /// adjacent entries, which bounds total merge cost across all rounds to
    /// O(n log n) amortized.
    pub(crate) stable: Rc<RefCell<Vec<Relation>>>,
    /// Tuples promoted this round but not yet joined.
    pub(crate) recent: Rc<RefCell<Relation>>,
    /// Raw join output pending promotion; unsorted, undeduplicated.
    pub(crate) to_add: Rc<RefCell<Vec<Relation>>>,
}

impl Clone for Variable {
    fn clone(&self) -> Self {
        Variable {
            name: self.name.clone(),
            comparator: self.comparator,
            stable: Rc::clone(&self.stable),
            recent: Rc::clone(&self.recent),
            to_add: Rc::clone(&self.to_add),
        }
    }
}

impl Variable {
    pub(crate) fn new(name: &str, comparator: Comparator) -> Self {
        Variable {
            name: name.to_string(),
            comparator,
            stable: Rc::new(RefCell::new(Vec::new())),
            recent: Rc::new(RefCell::new(Relation::empty(comparator))),
            to_add: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    /// Queue a relation of tuples for promotion in the next round.
    ///
    /// The relation is appended as-is; sorting against and deduplicating with
    /// the tuples already present is deferred to [`changed`](Variable::changed).
    pub fn insert(&self, relation: Relation) -> Result<(), EngineError> {
        self.comparator.ensure_matches(relation.comparator())?;
        self.to_add.borrow_mut().push(relation);
        Ok(())
    }

    /// Run the semi-naive promotion step for one fixpoint round.
    ///
    /// 1. `recent` → `stable`: the outgoing `recent` absorbs stable entries
    ///    popped off the tail while their length is at most twice the
    ///    accumulator's, then the accumulator is pushed. This is carry
    ///    propagation in a binary counter; it keeps `stable` short and merges
    ///    amortized.
    /// 2. `to_add` → `recent`: all pending relations are merged down to one,
    ///    tuples already present in any stable relation are dropped (gallop
    ///    probe per stable entry), and the remainder becomes the new `recent`.
    ///
    /// Returns whether `recent` is non-empty afterwards. The fixpoint driver
    /// must call this on every participating variable before evaluating the
    /// loop condition; short-circuiting would strand queued tuples.
    pub fn changed(&self) -> Result<bool, EngineError> {
        // 1. Promote recent → stable under the size-doubling discipline.
        let recent = std::mem::replace(
            &mut *self.recent.borrow_mut(),
            Relation::empty(self.comparator),
        );
        if !recent.is_empty() {
            let mut accumulator = recent;
            let mut stable = self.stable.borrow_mut();
            while stable
                .last()
                .is_some_and(|last| last.len() <= 2 * accumulator.len())
            {
                if let Some(batch) = stable.pop() {
                    accumulator = accumulator.merge(&batch)?;
                }
            }
            stable.push(accumulator);
        }

        // 2. Merge to_add down to one relation, drop tuples already in
        // stable, and promote the rest to recent.
        let pending = std::mem::take(&mut *self.to_add.borrow_mut());
        if let Some((first, rest)) = pending.split_first() {
            let mut merged = first.clone();
            for relation in rest {
                merged = merged.merge(relation)?;
            }

            let stable = self.stable.borrow();
            let mut elements = merged.into_elements();
            for batch in stable.iter() {
                let mut kept = Vec::with_capacity(elements.len());
                // Candidates are sorted, so the probe cursor into the batch
                // only ever moves forward.
                let mut pos = 0;
                for tuple in elements {
                    pos = gallop(batch, pos, |seen| {
                        Ok(self.comparator.compare(seen, &tuple)? == Ordering::Less)
                    })?;
                    let duplicate = pos < batch.len()
                        && self.comparator.compare(&batch[pos], &tuple)? == Ordering::Equal;
                    if !duplicate {
                        kept.push(tuple);
                    }
                }
                elements = kept;
            }
            *self.recent.borrow_mut() = Relation::from_sorted(elements, self.comparator);
        }

        let recent_len = self.recent.borrow().len();
        let stable_total: usize = self.stable.borrow().iter().map(Relation::len).sum();
        debug!(
            name = %self.name,
            stable = stable_total,
            recent = recent_len,
            "variable advanced"
        );
        Ok(recent_len > 0)
    }

    /// Join this variable's `recent` tuples against a frozen relation and
    /// queue the results on this variable's `to_add`.
    ///
    /// Only `recent` participates: every tuple ever promoted to `stable` was
    /// already joined against `fixed` in an earlier round. That argument is
    /// only sound if `fixed` holds the same tuples in every round. A
    /// `Relation` is immutable, so rebuilding one mid-computation and passing
    /// it here violates the contract even though the type system cannot see
    /// it.
    pub fn join_relation<F>(&self, fixed: &Relation, mut logic: F) -> Result<(), EngineError>
    where
        F: FnMut(&Value, &[Value], &[Value]) -> Tuple,
    {
        let mut results = Vec::new();
        {
            let recent = self.recent.borrow();
            join_helper(&recent, fixed, |k, va, vb| results.push(logic(k, va, vb)))?;
        }
        self.insert(Relation::from_tuples(results, self.comparator)?)
    }

    /// Consume the variable and merge `stable` down to the final relation.
    ///
    /// Panics if tuples are still pending: at a true fixpoint both `recent`
    /// and `to_add` are empty.
    pub fn complete(self) -> Result<Relation, EngineError> {
        assert!(
            self.recent.borrow().is_empty(),
            "variable '{}' completed with unjoined recent tuples",
            self.name
        );
        assert!(
            self.to_add.borrow().is_empty(),
            "variable '{}' completed with unpromoted tuples",
            self.name
        );
        let mut result = Relation::empty(self.comparator);
        while let Some(batch) = self.stable.borrow_mut().pop() {
            result = result.merge(&batch)?;
        }
        Ok(result)
    }

    /// Total tuples across `stable` plus `recent`.
    pub fn len(&self) -> usize {
        let stable: usize = self.stable.borrow().iter().map(Relation::len).sum();
        stable + self.recent.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lengths of the stable relations, newest last. Exposed for inspection
    /// and for asserting the size-ordering invariant in tests.
    pub fn stable_sizes(&self) -> Vec<usize> {
        self.stable.borrow().iter().map(Relation::len).collect()
    }
}
