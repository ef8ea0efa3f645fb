
use log::debug;
use rand::Rng;
use rand_distr::Distribution;

use crate::error::*;

/// Samples permutations of `{1..n}` from the Mallows distribution, `P(p) ∝ q^inv(p)`
///
/// The permutation is built by inserting the labels `1, 2, .., n` in turn.  Inserting label
/// `k` so that it lands ahead of `j` of the smaller labels creates exactly `j` new inversions,
/// so `j` is drawn from `{0, .., k-1}` with weights `1, q, q^2, ..`.  The weight list grows by
/// one power per label rather than being rebuilt.
///
/// For `q > 1` the weights are taken in `1/q` and the draw counts the labels that end up in
/// front of the new one instead, which keeps every weight at most 1.
///
/// `q = 1` is the uniform distribution, `q = 0` always yields the identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MallowsSampler {
    size: usize,
    q: f64,
}

impl MallowsSampler {
    pub fn new(size: usize, q: f64) -> Result<Self> {
        if !q.is_finite() || q < 0.0 {
            return Err(Error::InvalidParameter(format!("Mallows parameter q must be finite and non-negative, got {}", q)));
        }
        debug!("MallowsSampler::new(size = {}, q = {})", size, q);
        Ok(Self { size, q })
    }
    pub fn size(&self) -> usize {
        self.size
    }
    pub fn q(&self) -> f64 {
        self.q
    }
}

impl Distribution<Vec<usize>> for MallowsSampler {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<usize> {

        let reversed = self.q > 1.0;
        let ratio = if reversed { 1.0 / self.q } else { self.q };

        let mut labels: Vec<usize> = Vec::with_capacity(self.size);
        let mut weights: Vec<f64> = Vec::with_capacity(self.size);
        let mut total = 0.0;
        let mut next_weight = 1.0;

        for label in 1..=self.size {
            weights.push(next_weight);
            total += next_weight;
            next_weight *= ratio;

            let threshold = rng.gen::<f64>() * total;
            let mut drawn = weights.len() - 1;
            let mut cumulative = 0.0;
            for (idx, &weight) in weights.iter().enumerate() {
                cumulative += weight;
                if threshold < cumulative {
                    drawn = idx;
                    break;
                }
            }

            //`drawn` counts new inversions, or for q > 1 the labels in front
            let position = if reversed { drawn } else { labels.len() - drawn };
            labels.insert(position, label);
        }
        labels
    }
}

/// The number of pairs `i < j` with `labels[i] > labels[j]`
pub fn inversion_count(labels: &[usize]) -> usize {
    let mut count = 0;
    for (i, &earlier) in labels.iter().enumerate() {
        count += labels[i+1..].iter().filter(|&&later| later < earlier).count();
    }
    count
}
