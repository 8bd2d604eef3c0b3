//! Error types for the join engine.

use thiserror::Error;

/// Errors reported by the engine.
///
/// Both variants signal caller bugs rather than runtime conditions: the
/// operation that detects the violation aborts with no partial result and
/// nothing is retried. Non-monotone rule sets and fixed relations that are
/// mutated between rounds are documented preconditions, not detected errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Two tuples of differing arity were compared.
    #[error("tuple arity mismatch: {left} vs {right}")]
    ArityMismatch { left: usize, right: usize },

    /// Two relations built with different comparators were combined.
    #[error("comparator mismatch: '{left}' vs '{right}'")]
    ComparatorMismatch {
        left: &'static str,
        right: &'static str,
    },
}
