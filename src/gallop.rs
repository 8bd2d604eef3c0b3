//! Galloping boundary search over sorted slices.

/// Returns the smallest index `>= start` at which `pred` is false.
///
/// Precondition: `pred` is true on a prefix of `slice[start..]` and false
/// thereafter (monotone). A non-monotone predicate yields an unspecified
/// boundary, not an error. The predicate itself may fail (tuple comparisons
/// are fallible); the first failure aborts the search.
///
/// Probes forward with a doubling step, then refines by halving, which is
/// O(log d) in the distance d from `start` to the boundary. In a merge-join
/// the lagging cursor is usually already close to where it needs to land, so
/// this consistently beats a full binary search over the whole slice.
pub fn gallop<T, E, P>(slice: &[T], start: usize, mut pred: P) -> Result<usize, E>
where
    P: FnMut(&T) -> Result<bool, E>,
{
    let mut index = start;
    if index >= slice.len() || !pred(&slice[index])? {
        return Ok(index);
    }

    // Invariant throughout: pred holds at `index`.
    let mut step = 1;
    while index + step < slice.len() && pred(&slice[index + step])? {
        index += step;
        step <<= 1;
    }

    step >>= 1;
    while step > 0 {
        if index + step < slice.len() && pred(&slice[index + step])? {
            index += step;
        }
        step >>= 1;
    }

    Ok(index + 1)
}
