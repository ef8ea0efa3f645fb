
use core::fmt;
use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

/// The shape of a set partition: how many blocks of each size it has
///
/// Stores a map from block size to multiplicity (zero multiplicities are never stored) and
/// the running weight `sum(size * multiplicity)`, which is the size of the underlying set.
/// [to_blocks](SetPartition::to_blocks) turns a shape into a concrete partition of `{1..weight}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetPartition {
    parts: BTreeMap<usize, usize>,
    weight: usize,
}

impl SetPartition {
    pub fn new() -> Self {
        Self::default()
    }
    /// Builds a shape from `(block size, multiplicity)` pairs.  Repeated sizes accumulate
    pub fn from_multiplicities<I: IntoIterator<Item=(usize, usize)>>(multiplicities: I) -> Self {
        let mut partition = Self::new();
        for (size, count) in multiplicities {
            partition.add_parts(size, count);
        }
        partition
    }
    /// The total number of elements, `sum(size * multiplicity)`
    pub fn weight(&self) -> usize {
        self.weight
    }
    /// The total number of blocks
    pub fn number_of_parts(&self) -> usize {
        self.parts.values().sum()
    }
    /// How many blocks have exactly `size` elements
    pub fn multiplicity(&self, size: usize) -> usize {
        self.parts.get(&size).copied().unwrap_or(0)
    }
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
    /// Iterates `(block size, multiplicity)` pairs in increasing block size
    pub fn iter(&self) -> impl Iterator<Item=(usize, usize)> + '_ {
        self.parts.iter().map(|(&size, &count)| (size, count))
    }
    /// The block sizes as an integer partition, largest first
    pub fn block_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.number_of_parts());
        for (&size, &count) in self.parts.iter().rev() {
            sizes.extend(std::iter::repeat(size).take(count));
        }
        sizes
    }

    /// Assigns the labels `{1..weight}` to blocks of this shape uniformly at random
    ///
    /// Blocks are returned sorted internally and ordered by their smallest label, so equal
    /// partitions always compare equal.
    pub fn to_blocks<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Vec<usize>> {

        let mut labels: Vec<usize> = (1..=self.weight).collect();
        labels.shuffle(rng);

        let mut blocks = Vec::with_capacity(self.number_of_parts());
        let mut remaining = labels.as_slice();
        for size in self.block_sizes() {
            let (block, rest) = remaining.split_at(size);
            let mut block = block.to_vec();
            block.sort_unstable();
            blocks.push(block);
            remaining = rest;
        }
        blocks.sort_unstable_by_key(|block| block[0]);
        blocks
    }

    pub(crate) fn add_parts(&mut self, size: usize, count: usize) {
        if size == 0 || count == 0 {
            return;
        }
        *self.parts.entry(size).or_insert(0) += count;
        self.weight += size * count;
    }
}

impl fmt::Display for SetPartition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.parts.is_empty() {
            return write!(f, "{{}}");
        }
        let mut first = true;
        for (size, count) in self.iter() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}^{}", size, count)?;
            first = false;
        }
        Ok(())
    }
}
