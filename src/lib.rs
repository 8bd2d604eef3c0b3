//! Incremental fixpoint join engine.
//!
//! Computes the least fixpoint of a set of join rules over growing relations
//! using semi-naive evaluation: each round joins only newly-derived tuples
//! against previously-known ones, so total work is proportional to the number
//! of results produced rather than rounds × relation sizes. Relations are
//! immutable sorted tuple sets; joins are merge-joins whose cursors advance
//! by galloping search.
//!
//! There is no rule language here. A rule compiler (or a hand-written
//! driver) translates rules into [`Variable::insert`],
//! [`Variable::join_relation`], and [`join_into`] calls and loops on
//! [`Iteration::changed`] until no variable reports new tuples.
//!
//! # Example
//!
//! The grandparent relation, as a two-variable join:
//!
//! ```
//! use seminaive::{Comparator, Iteration, Relation, Value, join_into};
//!
//! # fn main() -> Result<(), seminaive::EngineError> {
//! let lex = Comparator::default();
//! // parent_of(child, parent)
//! let parent_of = vec![
//!     vec![Value::str("bob"), Value::str("alice")],
//!     vec![Value::str("alice"), Value::str("eve")],
//! ];
//! // The same facts keyed by parent: child_of(parent, child).
//! let child_of: Vec<_> = parent_of
//!     .iter()
//!     .map(|t| vec![t[1].clone(), t[0].clone()])
//!     .collect();
//!
//! let mut iteration = Iteration::new();
//! let parents = iteration.variable("parents");
//! let children = iteration.variable("children");
//! let grandparents = iteration.variable("grandparents");
//! parents.insert(Relation::from_tuples(parent_of, lex)?)?;
//! children.insert(Relation::from_tuples(child_of, lex)?)?;
//!
//! while iteration.changed()? {
//!     // grandparent(c, g) <-- child_of(p, c), parent_of(p, g)
//!     join_into(&children, &parents, &grandparents, |_p, c, g| {
//!         vec![c[0].clone(), g[0].clone()]
//!     })?;
//! }
//!
//! let result = grandparents.complete()?;
//! assert_eq!(result.len(), 1);
//! # Ok(())
//! # }
//! ```

mod error;
mod gallop;
mod iteration;
mod join;
mod relation;
mod value;
mod variable;

pub use error::EngineError;
pub use gallop::gallop;
pub use iteration::Iteration;
pub use join::{join_helper, join_into};
pub use relation::{Comparator, Relation};
pub use value::{OrderedFloat, Tuple, Value, compare_tuples};
pub use variable::Variable;
