
use core::fmt;
use std::collections::BTreeSet;

use crate::error::*;

/// A caller-supplied test over a whole candidate permutation.  Returns `true` if the
/// permutation is to be excluded
pub type Predicate<'a> = &'a (dyn Fn(&[usize]) -> bool + Sync);

/// The rule deciding which permutations of `{1..n}` a [RestrictedPermutations](crate::RestrictedPermutations)
/// enumerator visits
///
/// Positions and values are both 1-based, so the pair `(1, 1)` forbids the label `1` from
/// appearing in the first position.
#[derive(Clone, Default)]
pub enum Restriction<'a> {
    /// Every permutation is visited
    #[default]
    Unrestricted,

    /// Only permutations with no fixed point, `value[i] != i+1` for every `i`
    FixedPointFree,

    /// A set of forbidden `(position, value)` pairs
    ForbiddenPairs(BTreeSet<(usize, usize)>),

    /// Any permutation for which at least one of the predicates returns `true` is skipped
    Predicates(Vec<Predicate<'a>>),
}

impl<'a> Restriction<'a> {
    pub fn forbidden_pairs<I: IntoIterator<Item=(usize, usize)>>(pairs: I) -> Self {
        Restriction::ForbiddenPairs(pairs.into_iter().collect())
    }
    pub fn predicate(predicate: Predicate<'a>) -> Self {
        Restriction::Predicates(vec![predicate])
    }

    /// True if `state` must be skipped
    pub fn violates(&self, state: &[usize]) -> bool {
        self.first_violation(state).is_some()
    }

    /// Returns the smallest index `i` such that every permutation sharing `state[..=i]` as a
    /// prefix violates the restriction, or `None` if `state` is allowed
    ///
    /// Predicates are opaque, so for them the answer is the final index, which only
    /// condemns `state` itself.
    pub fn first_violation(&self, state: &[usize]) -> Option<usize> {
        match self {
            Restriction::Unrestricted => None,
            Restriction::FixedPointFree => {
                state.iter()
                    .enumerate()
                    .position(|(idx, &value)| value == idx+1)
            },
            Restriction::ForbiddenPairs(pairs) => {
                if pairs.is_empty() {
                    return None;
                }
                state.iter()
                    .enumerate()
                    .position(|(idx, &value)| pairs.contains(&(idx+1, value)))
            },
            Restriction::Predicates(predicates) => {
                //Each predicate sees the whole state, so it is called once per candidate
                if predicates.iter().any(|predicate| predicate(state)) {
                    Some(state.len().saturating_sub(1))
                } else {
                    None
                }
            },
        }
    }

    /// Checks that every stored pair names a position and value inside `{1..size}`
    pub fn validate_for(&self, size: usize) -> Result<()> {
        if let Restriction::ForbiddenPairs(pairs) = self {
            for &pair in pairs.iter() {
                check_pair(pair, size)?;
            }
        }
        Ok(())
    }

    /// Adds one forbidden pair.  An [Unrestricted](Restriction::Unrestricted) restriction
    /// becomes a [ForbiddenPairs](Restriction::ForbiddenPairs) restriction
    pub(crate) fn insert_pair(&mut self, pair: (usize, usize), size: usize) -> Result<()> {

        check_pair(pair, size)?;
        match self {
            Restriction::Unrestricted => {
                *self = Restriction::forbidden_pairs([pair]);
                Ok(())
            },
            Restriction::ForbiddenPairs(pairs) => {
                pairs.insert(pair);
                Ok(())
            },
            other => Err(Error::InvalidMutation(format!("cannot add a forbidden pair to a {} restriction", other.kind_name()))),
        }
    }

    /// Adds one predicate.  An [Unrestricted](Restriction::Unrestricted) restriction
    /// becomes a [Predicates](Restriction::Predicates) restriction
    pub(crate) fn insert_predicate(&mut self, predicate: Predicate<'a>) -> Result<()> {
        match self {
            Restriction::Unrestricted => {
                *self = Restriction::predicate(predicate);
                Ok(())
            },
            Restriction::Predicates(predicates) => {
                predicates.push(predicate);
                Ok(())
            },
            other => Err(Error::InvalidMutation(format!("cannot add a predicate to a {} restriction", other.kind_name()))),
        }
    }

    /// Drops every inserted pair or predicate, keeping the kind of restriction
    pub(crate) fn clear(&mut self) {
        match self {
            Restriction::ForbiddenPairs(pairs) => pairs.clear(),
            Restriction::Predicates(predicates) => predicates.clear(),
            Restriction::Unrestricted | Restriction::FixedPointFree => {},
        }
    }

    /// Drops pairs that fall outside `{1..size}`, returning how many were dropped
    pub(crate) fn retain_in_range(&mut self, size: usize) -> usize {
        match self {
            Restriction::ForbiddenPairs(pairs) => {
                let before = pairs.len();
                pairs.retain(|&pair| check_pair(pair, size).is_ok());
                before - pairs.len()
            },
            _ => 0,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Restriction::Unrestricted => "unrestricted",
            Restriction::FixedPointFree => "fixed-point-free",
            Restriction::ForbiddenPairs(_) => "forbidden-pairs",
            Restriction::Predicates(_) => "predicate",
        }
    }
}

fn check_pair((position, value): (usize, usize), size: usize) -> Result<()> {
    if position == 0 || position > size || value == 0 || value > size {
        Err(Error::InvalidMutation(format!("pair ({}, {}) is outside a permutation of size {}", position, value, size)))
    } else {
        Ok(())
    }
}

impl fmt::Debug for Restriction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Restriction::Unrestricted => write!(f, "Unrestricted"),
            Restriction::FixedPointFree => write!(f, "FixedPointFree"),
            Restriction::ForbiddenPairs(pairs) => f.debug_tuple("ForbiddenPairs").field(pairs).finish(),
            Restriction::Predicates(predicates) => write!(f, "Predicates(<{} fns>)", predicates.len()),
        }
    }
}
