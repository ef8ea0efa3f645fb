
use std::sync::Arc;

use log::{debug, trace};
use rayon::prelude::*;

use crate::error::*;
use crate::lexicographic::*;
use crate::memo::Memo;
use crate::restriction::*;
use crate::sequence::*;

/// Enumerates the permutations of `{1..n}` allowed by a [Restriction], in lexicographic order
///
/// The enumerator itself is stateless between steps; the caller owns the current
/// permutation and passes it to [advance](Sequence::advance) or [retreat](ReversibleSequence::retreat),
/// or uses one of the traversal disciplines from [Sequence] and [ReversibleSequence].
///
/// Stepping walks the lexicographic successor relation over *all* permutations and skips the
/// ones the restriction excludes.  For the fixed-point-free and forbidden-pair restrictions a
/// violation in position `i` condemns every permutation sharing the prefix up to `i`, so the
/// whole block is jumped in one step.  Predicates are opaque and are skipped one permutation
/// at a time.
///
/// The first and last allowed permutations are cached, and the cache is keyed by a version
/// number that every mutation ([insert_pair](Self::insert_pair), [resize](Self::resize),
/// [clear](Self::clear), ...) bumps.  There is no incremental update: after a mutation the
/// boundaries are recomputed from scratch on their next use.
///
/// ```
/// use combinat_gen::{RestrictedPermutations, Restriction, Sequence};
///
/// let perms = RestrictedPermutations::new(3, Restriction::forbidden_pairs([(1, 1)])).unwrap();
/// assert_eq!(perms.first(), Some(vec![2, 1, 3]));
/// assert_eq!(perms.count_states(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct RestrictedPermutations<'a> {

    /// The number of labels being permuted
    size: usize,

    /// Which permutations are visited
    restriction: Restriction<'a>,

    /// Bumped by every mutation, invalidating the cached boundaries
    version: u64,

    /// The lexicographically smallest allowed permutation, `None` if there is none
    first_element: Memo<Option<Vec<usize>>>,

    /// The lexicographically largest allowed permutation, `None` if there is none
    last_element: Memo<Option<Vec<usize>>>,
}

impl<'a> RestrictedPermutations<'a> {

    /// Makes an enumerator over permutations of `{1..size}`
    ///
    /// Fails with [Error::DomainInfeasible] for a fixed-point-free restriction of size 1, and
    /// with [Error::InvalidMutation] if a forbidden pair lies outside `{1..size}`.
    pub fn new(size: usize, restriction: Restriction<'a>) -> Result<Self> {

        check_domain(size, &restriction)?;
        restriction.validate_for(size)?;
        debug!("RestrictedPermutations::new(size = {}, restriction = {:?})", size, restriction);

        Ok(Self {
            size,
            restriction,
            version: 0,
            first_element: Memo::new(),
            last_element: Memo::new(),
        })
    }
    pub fn unrestricted(size: usize) -> Self {
        Self {
            size,
            restriction: Restriction::Unrestricted,
            version: 0,
            first_element: Memo::new(),
            last_element: Memo::new(),
        }
    }
    pub fn fixed_point_free(size: usize) -> Result<Self> {
        Self::new(size, Restriction::FixedPointFree)
    }
    pub fn size(&self) -> usize {
        self.size
    }
    pub fn restriction(&self) -> &Restriction<'a> {
        &self.restriction
    }
    /// The mutation counter.  Two equal versions of the same enumerator describe the same sequence
    pub fn version(&self) -> u64 {
        self.version
    }
    /// True if at least one permutation satisfies the restriction
    pub fn is_nonempty(&self) -> bool {
        self.first().is_some()
    }
    /// True if `state` is excluded by the restriction
    pub fn violates(&self, state: &[usize]) -> bool {
        self.restriction.violates(state)
    }

    /// Forbids `value` from appearing at `position`, both 1-based
    pub fn insert_pair(&mut self, position: usize, value: usize) -> Result<()> {
        self.restriction.insert_pair((position, value), self.size)?;
        self.bump_version("insert_pair");
        Ok(())
    }

    /// Forbids every `(position, value)` pair in `pairs`.  Either all of them are inserted or none is
    pub fn insert_pairs<I: IntoIterator<Item=(usize, usize)>>(&mut self, pairs: I) -> Result<()> {

        let mut updated = self.restriction.clone();
        for pair in pairs {
            updated.insert_pair(pair, self.size)?;
        }
        self.restriction = updated;
        self.bump_version("insert_pairs");
        Ok(())
    }

    /// Adds a predicate.  Permutations for which it returns `true` are skipped
    pub fn insert_predicate(&mut self, predicate: Predicate<'a>) -> Result<()> {
        self.restriction.insert_predicate(predicate)?;
        self.bump_version("insert_predicate");
        Ok(())
    }

    /// Changes the number of labels.  Forbidden pairs outside the new range are dropped
    pub fn resize(&mut self, size: usize) -> Result<()> {

        check_domain(size, &self.restriction)?;
        let dropped = self.restriction.retain_in_range(size);
        if dropped > 0 {
            debug!("resize: dropped {} forbidden pairs outside size {}", dropped, size);
        }
        self.size = size;
        self.bump_version("resize");
        Ok(())
    }

    /// Removes every inserted pair or predicate.  A fixed-point-free restriction stays fixed-point-free
    pub fn clear(&mut self) {
        self.restriction.clear();
        self.bump_version("clear");
    }

    /// Counts the allowed permutations on `tasks` threads
    ///
    /// The `n!` lexicographic ranks are split into `tasks` contiguous ranges.  Each task
    /// unranks the start of its range, steps through it, and returns its own count; the
    /// counts are then summed.  Needs `n!` to fit in a u64.
    pub fn par_count(&self, tasks: usize) -> Result<u64> {

        let total = match factorial(self.size) {
            Some(total) if self.size <= MAX_RANKABLE_SIZE => total,
            _ => return Err(Error::SizeTooLarge { size: self.size, max: MAX_RANKABLE_SIZE }),
        };
        //At most one task per rank
        let tasks = u64::try_from(tasks).unwrap_or(u64::MAX).clamp(1, total);
        let chunk = total.div_ceil(tasks);
        debug!("par_count(size = {}): {} ranks in {} tasks of {}", self.size, total, tasks, chunk);

        let count = (0..tasks).into_par_iter()
            .map(|task| {
                let start = (task * chunk).min(total);
                let end = (start + chunk).min(total);
                self.count_rank_range(start, end)
            })
            .sum::<u64>();
        Ok(count)
    }

    /// Wraps the enumerator so its states can be indexed in O(1)
    pub fn into_random_access(self) -> MaterializedPermutations<'a> {
        MaterializedPermutations::new(self)
    }

    fn count_rank_range(&self, start: u64, end: u64) -> u64 {

        let mut state = match nth_permutation(self.size, start) {
            Some(state) if start < end => state,
            _ => return 0,
        };

        let mut count = 0;
        for _ in start..end {
            if !self.restriction.violates(&state) {
                count += 1;
            }
            next_permutation(&mut state);
        }
        count
    }

    fn bump_version(&mut self, cause: &str) {
        self.version += 1;
        debug!("{}: version -> {}, size = {}, restriction = {:?}", cause, self.version, self.size, self.restriction);
    }

    fn compute_first(&self) -> Option<Vec<usize>> {
        match self.restriction {
            Restriction::FixedPointFree => Some(fixed_point_free_first(self.size)),
            _ => {
                let mut state = identity(self.size);
                if self.settle_forward(&mut state) {
                    Some(state)
                } else {
                    None
                }
            }
        }
    }

    fn compute_last(&self) -> Option<Vec<usize>> {
        match self.restriction {
            Restriction::FixedPointFree => Some(fixed_point_free_last(self.size)),
            _ => {
                let mut state = reversal(self.size);
                if self.settle_backward(&mut state) {
                    Some(state)
                } else {
                    None
                }
            }
        }
    }

    /// Moves `state` forward until it is allowed.  Returns `false` if it wrapped around first
    fn settle_forward(&self, state: &mut Vec<usize>) -> bool {
        while let Some(idx) = self.restriction.first_violation(state) {
            trace!("skip forward past prefix {:?}", state.get(..=idx).unwrap_or(&[]));

            //Every permutation with this prefix is excluded.  Jump to the last of them, and step once
            if let Some(tail) = state.get_mut(idx+1..) {
                tail.sort_unstable_by(|a, b| b.cmp(a));
            }
            if !next_permutation(state) {
                return false;
            }
        }
        true
    }

    /// Moves `state` backward until it is allowed.  Returns `false` if it wrapped around first
    fn settle_backward(&self, state: &mut Vec<usize>) -> bool {
        while let Some(idx) = self.restriction.first_violation(state) {
            trace!("skip backward past prefix {:?}", state.get(..=idx).unwrap_or(&[]));

            if let Some(tail) = state.get_mut(idx+1..) {
                tail.sort_unstable();
            }
            if !prev_permutation(state) {
                return false;
            }
        }
        true
    }
}

impl Sequence for RestrictedPermutations<'_> {
    type State = Vec<usize>;

    fn first(&self) -> Option<Vec<usize>> {
        self.first_element.get_or_compute(self.version, || self.compute_first())
    }

    /// When nothing satisfies the restriction, `state` is cleared to the empty no-solution state,
    /// which every later step leaves empty
    fn advance(&self, state: &mut Vec<usize>) -> bool {

        if next_permutation(state) && self.settle_forward(state) {
            return true;
        }
        match self.first() {
            Some(first) => *state = first,
            None => state.clear(),
        }
        false
    }
}

impl ReversibleSequence for RestrictedPermutations<'_> {

    fn last(&self) -> Option<Vec<usize>> {
        self.last_element.get_or_compute(self.version, || self.compute_last())
    }

    fn retreat(&self, state: &mut Vec<usize>) -> bool {

        if prev_permutation(state) && self.settle_backward(state) {
            return true;
        }
        match self.last() {
            Some(last) => *state = last,
            None => state.clear(),
        }
        false
    }
}

fn check_domain(size: usize, restriction: &Restriction) -> Result<()> {
    if size == 1 && matches!(restriction, Restriction::FixedPointFree) {
        Err(Error::DomainInfeasible { size, reason: "a single label is always a fixed point" })
    } else {
        Ok(())
    }
}

/// The smallest derangement of `{1..n}`, `n != 1`
///
/// Adjacent positions are swapped pairwise, `2, 1, 4, 3, ..`.  When `n` is odd the final three
/// labels `p, p+1, p+2` are instead rotated into the 3-cycle `p+1, p+2, p`.
fn fixed_point_free_first(n: usize) -> Vec<usize> {

    let paired = if n % 2 == 0 { n } else { n.saturating_sub(3) };
    let mut state = Vec::with_capacity(n);
    for pair_start in (1..=paired).step_by(2) {
        state.push(pair_start + 1);
        state.push(pair_start);
    }
    if n % 2 == 1 {
        let p = n - 2;
        state.extend_from_slice(&[p + 1, p + 2, p]);
    }
    state
}

/// The largest derangement of `{1..n}`, `n != 1`
///
/// The reversal has no fixed point when `n` is even.  When `n` is odd its middle label is
/// fixed, and swapping it with its right neighbour gives the largest derangement.
fn fixed_point_free_last(n: usize) -> Vec<usize> {

    let mut state = reversal(n);
    if n % 2 == 1 {
        let middle = n / 2;
        state.swap(middle, middle + 1);
    }
    state
}

/// A [RestrictedPermutations] enumerator with its sequence stored for random access
///
/// The table is built on first use and rebuilt whenever the wrapped enumerator's version
/// changes.  Only suitable when the number of allowed permutations fits in memory.
///
/// Implements [Sequence] and [ReversibleSequence] over indices into the table.
#[derive(Debug, Clone)]
pub struct MaterializedPermutations<'a> {
    enumerator: RestrictedPermutations<'a>,
    table: Memo<Arc<Materialized<Vec<usize>>>>,
}

impl<'a> MaterializedPermutations<'a> {
    pub fn new(enumerator: RestrictedPermutations<'a>) -> Self {
        Self {
            enumerator,
            table: Memo::new(),
        }
    }
    pub fn enumerator(&self) -> &RestrictedPermutations<'a> {
        &self.enumerator
    }
    /// Mutable access to the wrapped enumerator.  Any mutation through it invalidates the table
    pub fn enumerator_mut(&mut self) -> &mut RestrictedPermutations<'a> {
        &mut self.enumerator
    }
    /// The full table, materializing it if the enumerator changed since it was last built
    pub fn table(&self) -> Arc<Materialized<Vec<usize>>> {
        let enumerator = &self.enumerator;
        self.table.get_or_compute(enumerator.version(), || {
            debug!("materializing permutations of size {} at version {}", enumerator.size(), enumerator.version());
            Arc::new(enumerator.materialize())
        })
    }
    /// True if the table is up to date with the enumerator
    pub fn is_materialized(&self) -> bool {
        self.table.is_fresh(self.enumerator.version())
    }
    pub fn len(&self) -> usize {
        self.table().len()
    }
    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }
    pub fn get(&self, index: usize) -> Option<Vec<usize>> {
        self.table().get(index).cloned()
    }
    /// Returns the position of `state` in the sequence, or `None` if it isn't in it
    pub fn index_of(&self, state: &[usize]) -> Option<usize> {
        self.table().as_slice()
            .binary_search_by(|probe| probe.as_slice().cmp(state))
            .ok()
    }
}

impl Sequence for MaterializedPermutations<'_> {
    type State = usize;

    fn first(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    fn advance(&self, state: &mut usize) -> bool {
        if *state + 1 < self.len() {
            *state += 1;
            true
        } else {
            *state = 0;
            false
        }
    }
}

impl ReversibleSequence for MaterializedPermutations<'_> {

    fn last(&self) -> Option<usize> {
        self.len().checked_sub(1)
    }

    fn retreat(&self, state: &mut usize) -> bool {
        if *state > 0 && *state < self.len() {
            *state -= 1;
            true
        } else {
            *state = self.len().saturating_sub(1);
            false
        }
    }
}
