//! The fixpoint driver.

use rustc_hash::FxHashMap;

use crate::error::EngineError;
use crate::relation::Comparator;
use crate::variable::Variable;

/// Tracks every variable participating in a fixpoint computation and drives
/// the rounds.
///
/// The driver is entirely synchronous and runs until the caller's loop
/// condition goes false; it does not detect non-termination. A rule set that
/// is not monotone over a finite domain may loop forever; bound the rounds
/// externally if the rule set is not trusted.
///
/// # Example
///
/// ```
/// use seminaive::{Comparator, Iteration, Relation, Value};
///
/// # fn main() -> Result<(), seminaive::EngineError> {
/// let edges = Relation::from_tuples(
///     vec![
///         vec![Value::Int(1), Value::Int(2)],
///         vec![Value::Int(2), Value::Int(3)],
///     ],
///     Comparator::default(),
/// )?;
///
/// let mut iteration = Iteration::new();
/// let reach = iteration.variable("reach");
/// reach.insert(Relation::from_tuples(
///     vec![vec![Value::Int(1), Value::Int(1)]],
///     Comparator::default(),
/// )?)?;
///
/// while iteration.changed()? {
///     // reach(y, y) <-- reach(x, _), edge(x, y)
///     reach.join_relation(&edges, |_x, _, dst| vec![dst[0].clone(), dst[0].clone()])?;
/// }
///
/// let result = reach.complete()?;
/// assert_eq!(result.len(), 3);
/// # Ok(())
/// # }
/// ```
pub struct Iteration {
    variables: Vec<Variable>,
    by_name: FxHashMap<String, usize>,
    round: usize,
}

impl Iteration {
    /// Create a new iterative context.
    pub fn new() -> Self {
        Iteration {
            variables: Vec::new(),
            by_name: FxHashMap::default(),
            round: 0,
        }
    }

    /// Create and register a variable using the default lexicographic
    /// comparator.
    pub fn variable(&mut self, name: &str) -> Variable {
        self.variable_with(name, Comparator::default())
    }

    /// Create and register a variable with an explicit comparator.
    ///
    /// Panics on a duplicate name: two variables sharing a name is a caller
    /// bug, not a runtime condition.
    pub fn variable_with(&mut self, name: &str, comparator: Comparator) -> Variable {
        assert!(
            !self.by_name.contains_key(name),
            "duplicate variable name: {name}"
        );
        let variable = Variable::new(name, comparator);
        self.by_name.insert(name.to_string(), self.variables.len());
        self.variables.push(variable.clone());
        variable
    }

    /// Look up a registered variable by name.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.by_name.get(name).map(|&i| &self.variables[i])
    }

    /// Advance every variable one round and report whether any still has
    /// recent tuples.
    ///
    /// Every variable's promotion step runs before the results are combined:
    /// short-circuiting on the first `true` would leave queued tuples
    /// unpromoted in later variables and could end the loop early.
    pub fn changed(&mut self) -> Result<bool, EngineError> {
        self.round += 1;
        let mut any = false;
        for variable in &self.variables {
            if variable.changed()? {
                any = true;
            }
        }
        Ok(any)
    }

    /// Number of rounds driven so far.
    pub fn round(&self) -> usize {
        self.round
    }
}

impl Default for Iteration {
    fn default() -> Self {
        Self::new()
    }
}
