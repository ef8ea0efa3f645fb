#![crate_name = "combinat_gen"]

#![doc = include_str!("../README.md")]

mod error;
pub use error::{Error, Result};

mod memo;

mod sequence;
pub use sequence::{Sequence, ReversibleSequence, Materialized, ForwardIter, BidirectionalCursor, BackwardIter, Position};

pub mod lexicographic;

mod restriction;
pub use restriction::{Restriction, Predicate};

mod restricted_permutation_iter;
pub use restricted_permutation_iter::{RestrictedPermutations, MaterializedPermutations};

mod set_partition;
pub use set_partition::SetPartition;

mod boltzmann_sampler;
pub use boltzmann_sampler::{BoltzmannSampler, SamplerConfig, Strategy, approximate_x, sample, NUMERICALLY_TRUSTED_SIZE};

mod mallows_sampler;
pub use mallows_sampler::{MallowsSampler, inversion_count};

mod random_source;
pub use random_source::random_source;

#[cfg(test)]
mod tests;
