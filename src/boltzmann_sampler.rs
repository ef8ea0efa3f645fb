
use log::{debug, trace, warn};
use num_traits::ToPrimitive;
use rand::Rng;
use rand_distr::{Distribution, Poisson};

use crate::error::*;
use crate::set_partition::SetPartition;

/// The largest size the Boltzmann strategies sample without [SamplerConfig::allow_untrusted_sizes]
///
/// Larger sizes fail with [Error::NumericInstability] unless the caller opts in.
pub const NUMERICALLY_TRUSTED_SIZE: usize = 10_000_000;

/// How a [BoltzmannSampler] turns its draws into a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Exact uniform sampling by the Bell-number recursion.  O(n^2) per sample, no rejection
    BruteForce,

    /// A single unconditioned Boltzmann draw.  The weight is only `n` in expectation
    Boltzmann,

    /// Unconditioned draws repeated until one has weight exactly `n`.  Θ(√n) expected trials
    ExactRejection,

    /// Probabilistic divide-and-conquer with a deterministic second half.  One coordinate is
    /// solved for instead of drawn, and accepted by a ratio of Poisson masses
    PdcDsh,
}

/// Tunables for the rejection loops of a [BoltzmannSampler]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {

    /// The number of draws a rejection loop may make before giving up with
    /// [Error::TrialLimitExceeded]
    pub max_trials: usize,

    /// Poisson rates below this, past the peak of the rate sequence, end the draw
    pub tolerance: f64,

    /// Lets the Boltzmann strategies run above [NUMERICALLY_TRUSTED_SIZE]
    pub allow_untrusted_sizes: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_trials: 1_000_000,
            tolerance: 1e-16,
            allow_untrusted_sizes: false,
        }
    }
}

impl SamplerConfig {
    pub fn with_max_trials(mut self, max_trials: usize) -> Self {
        self.max_trials = max_trials;
        self
    }
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
    pub fn with_untrusted_sizes(mut self, allow: bool) -> Self {
        self.allow_untrusted_sizes = allow;
        self
    }
}

/// Samples set partitions of a fixed size `n`, represented by their block-size multiplicities
///
/// The Boltzmann model draws the number of blocks of each size `i` as an independent
/// `Poisson(x^i / i!)` variate.  With the tilting parameter `x` solving `x*e^x = n` (see
/// [approximate_x]) the expected total weight is `n`, and conditioning on the weight being
/// exactly `n` gives the shape of a uniformly random set partition of `{1..n}`.
///
/// ```
/// use combinat_gen::{BoltzmannSampler, Strategy, random_source};
///
/// let mut rng = random_source(Some(7));
/// let partition = BoltzmannSampler::new(100).sample(Strategy::PdcDsh, &mut rng).unwrap();
/// assert_eq!(partition.weight(), 100);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BoltzmannSampler {
    size: usize,
    config: SamplerConfig,
}

impl BoltzmannSampler {
    pub fn new(size: usize) -> Self {
        Self::with_config(size, SamplerConfig::default())
    }
    pub fn with_config(size: usize, config: SamplerConfig) -> Self {
        Self {
            size,
            config,
        }
    }
    pub fn size(&self) -> usize {
        self.size
    }
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }
    /// The tilting parameter used for this size: [approximate_x], refined by Newton's method
    pub fn tilt(&self) -> f64 {
        refine_tilt(self.size)
    }

    /// Draws one sample with the chosen strategy
    pub fn sample<R: Rng + ?Sized>(&self, strategy: Strategy, rng: &mut R) -> Result<SetPartition> {

        if self.size == 0 {
            return Ok(SetPartition::new());
        }

        match strategy {
            Strategy::BruteForce => self.brute_force(rng),
            Strategy::Boltzmann => self.draw_unconditioned(self.checked_tilt()?, rng),
            Strategy::ExactRejection => self.exact_by_rejection(rng),
            Strategy::PdcDsh => self.exact_by_pdc_dsh(rng),
        }
    }

    /// One unconditioned Boltzmann draw at tilt `x`, over block sizes `1..=n`
    pub fn draw_unconditioned<R: Rng + ?Sized>(&self, x: f64, rng: &mut R) -> Result<SetPartition> {
        let partition = self.draw(x, None, None, rng)?;
        Ok(partition.unwrap_or_default())
    }

    /// Repeats unconditioned draws until one weighs exactly `n`
    pub fn exact_by_rejection<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SetPartition> {

        let n = self.size;
        let x = self.checked_tilt()?;
        debug!("exact_by_rejection(n = {}): x = {}", n, x);

        for trial in 1..=self.config.max_trials {
            if let Some(partition) = self.draw(x, None, Some(n), rng)? {
                if partition.weight() == n {
                    debug!("exact_by_rejection(n = {}): accepted after {} trials", n, trial);
                    return Ok(partition);
                }
                trace!("exact_by_rejection: rejected weight {}", partition.weight());
            }
        }
        Err(Error::TrialLimitExceeded { size: n, trials: self.config.max_trials })
    }

    /// Exact sampling by probabilistic divide-and-conquer with a deterministic second half
    ///
    /// The block size `k = round(x)` is left out of the draw.  Whatever weight `r` the other
    /// sizes leave over must then be made up by `r/k` blocks of size `k`, which is only
    /// possible when `k` divides `r`.  That count is accepted with probability
    /// `P(Z = r/k) / P(Z = mode)` for `Z ~ Poisson(x^k / k!)`, the ratio being built up one
    /// factor at a time so nothing overflows.
    pub fn exact_by_pdc_dsh<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SetPartition> {

        let n = self.size;
        let x = self.checked_tilt()?;
        let pdc_index = x.round().to_usize().unwrap_or(1).max(1);
        let pdc_rate = poisson_rate(x, pdc_index);
        let mode = pdc_rate.floor().to_usize().ok_or_else(|| Error::NumericInstability {
            size: n,
            detail: format!("Poisson rate {} for block size {} has no finite mode", pdc_rate, pdc_index),
        })?;
        debug!("exact_by_pdc_dsh(n = {}): x = {}, index = {}, rate = {}, mode = {}", n, x, pdc_index, pdc_rate, mode);

        for trial in 1..=self.config.max_trials {
            let mut partition = match self.draw(x, Some(pdc_index), Some(n), rng)? {
                Some(partition) => partition,
                None => continue,
            };

            let residual = n - partition.weight();
            if residual % pdc_index != 0 {
                trace!("exact_by_pdc_dsh: residual {} not divisible by {}", residual, pdc_index);
                continue;
            }
            let count = residual / pdc_index;

            let ratio = poisson_mass_ratio(pdc_rate, count, mode);
            if !ratio.is_finite() {
                return Err(Error::NumericInstability {
                    size: n,
                    detail: format!("acceptance ratio for {} blocks of size {} is {}", count, pdc_index, ratio),
                });
            }
            if rng.gen::<f64>() < ratio {
                partition.add_parts(pdc_index, count);
                debug!("exact_by_pdc_dsh(n = {}): accepted after {} trials", n, trial);
                return Ok(partition);
            }
            trace!("exact_by_pdc_dsh: rejected {} blocks of size {} at ratio {}", count, pdc_index, ratio);
        }
        Err(Error::TrialLimitExceeded { size: n, trials: self.config.max_trials })
    }

    /// Exact sampling without rejection
    ///
    /// With `m` elements left, the block holding the smallest of them has size `k` with
    /// probability `C(m-1, k-1) * B(m-k) / B(m)`, `B` being the Bell numbers.  Everything is
    /// kept in log space.
    pub fn brute_force<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SetPartition> {

        let n = self.size;
        let log_bell = log_bell_numbers(n);
        let log_factorial = log_factorials(n);
        let log_binomial = |m: usize, k: usize| log_factorial[m] - log_factorial[k] - log_factorial[m - k];

        let mut partition = SetPartition::new();
        let mut remaining = n;
        while remaining > 0 {
            let threshold: f64 = rng.gen();
            let mut cumulative = 0.0;
            let mut block_size = remaining;
            for k in 1..=remaining {
                let log_prob = log_binomial(remaining - 1, k - 1) + log_bell[remaining - k] - log_bell[remaining];
                if !log_prob.is_finite() {
                    return Err(Error::NumericInstability {
                        size: n,
                        detail: format!("log probability of a block of {} among {} is {}", k, remaining, log_prob),
                    });
                }
                cumulative += log_prob.exp();
                if threshold < cumulative {
                    block_size = k;
                    break;
                }
            }
            partition.add_parts(block_size, 1);
            remaining -= block_size;
        }
        Ok(partition)
    }

    fn checked_tilt(&self) -> Result<f64> {

        if self.size > NUMERICALLY_TRUSTED_SIZE {
            if !self.config.allow_untrusted_sizes {
                return Err(Error::NumericInstability {
                    size: self.size,
                    detail: format!("size is above the trusted maximum of {}", NUMERICALLY_TRUSTED_SIZE),
                });
            }
            warn!("sampling size {} is above the trusted maximum of {}", self.size, NUMERICALLY_TRUSTED_SIZE);
        }

        let x = refine_tilt(self.size);
        if x.is_finite() && x > 0.0 {
            Ok(x)
        } else {
            Err(Error::NumericInstability { size: self.size, detail: format!("tilting parameter is {}", x) })
        }
    }

    /// Draws block counts for sizes `1..=n`, leaving out `skip_index`
    ///
    /// Returns `None` as soon as the weight passes `weight_cap`, since such a draw can never be
    /// accepted.
    fn draw<R: Rng + ?Sized>(&self, x: f64, skip_index: Option<usize>, weight_cap: Option<usize>, rng: &mut R) -> Result<Option<SetPartition>> {

        let mut partition = SetPartition::new();
        let mut rate = x;
        for i in 1..=self.size {
            if !rate.is_finite() {
                return Err(Error::NumericInstability { size: self.size, detail: format!("Poisson rate for block size {} is {}", i, rate) });
            }

            //Past the peak the rates only shrink, so once they are negligible we are done
            if (i as f64) > x && rate < self.config.tolerance {
                break;
            }

            if skip_index != Some(i) && rate > 0.0 {
                let count = poisson_variate(rate, self.size, rng)?;
                partition.add_parts(i, count);
                if weight_cap.map_or(false, |cap| partition.weight() > cap) {
                    trace!("draw: weight {} passed the cap at block size {}", partition.weight(), i);
                    return Ok(None);
                }
            }
            rate = rate * x / (i + 1) as f64;
        }
        Ok(Some(partition))
    }
}

/// Samples a set partition of weight `n` with a default-configured [BoltzmannSampler]
pub fn sample<R: Rng + ?Sized>(n: usize, strategy: Strategy, rng: &mut R) -> Result<SetPartition> {
    BoltzmannSampler::new(n).sample(strategy, rng)
}

/// Solves `x*e^x = n` for the tilting parameter `x`
///
/// Uses de Bruijn's asymptotic `log(n) - log(log(n)) + log(log(n))/log(n)`.  Below `n = 3`
/// that form is undefined or negative, so Newton's method is used there instead.
pub fn approximate_x(n: usize) -> f64 {

    let n = n as f64;
    if n <= 0.0 {
        return 0.0;
    }
    if n >= 3.0 {
        let log_n = n.ln();
        let log_log_n = log_n.ln();
        return log_n - log_log_n + log_log_n / log_n;
    }

    let mut x: f64 = 0.5;
    for _ in 0..32 {
        let e_x = x.exp();
        x -= (x * e_x - n) / (e_x * (1.0 + x));
    }
    x
}

/// [approximate_x] polished with Newton's method on `x + ln(x) = ln(n)`
///
/// The asymptotic form alone leaves `x*e^x` a fraction of a percent away from `n`.
fn refine_tilt(n: usize) -> f64 {

    let mut x = approximate_x(n);
    if n < 3 {
        return x;
    }
    let log_n = (n as f64).ln();
    for _ in 0..16 {
        let step = (x + x.ln() - log_n) / (1.0 + 1.0 / x);
        x -= step;
        if step.abs() <= f64::EPSILON * x {
            break;
        }
    }
    x
}

/// `x^k / k!`, accumulated term by term
fn poisson_rate(x: f64, k: usize) -> f64 {
    (1..=k).fold(1.0, |rate, i| rate * x / i as f64)
}

/// `P(Z = count) / P(Z = mode)` for `Z ~ Poisson(rate)`, as a telescoping product
fn poisson_mass_ratio(rate: f64, count: usize, mode: usize) -> f64 {

    let mut ratio = 1.0;
    if count > mode {
        for j in mode+1..=count {
            ratio *= rate / j as f64;
            if ratio == 0.0 {
                break;
            }
        }
    } else {
        for j in count+1..=mode {
            ratio *= j as f64 / rate;
            if ratio == 0.0 {
                break;
            }
        }
    }
    ratio
}

fn poisson_variate<R: Rng + ?Sized>(rate: f64, size: usize, rng: &mut R) -> Result<usize> {

    let poisson = Poisson::new(rate).map_err(|err| Error::NumericInstability {
        size,
        detail: format!("Poisson({}): {}", rate, err),
    })?;
    let draw: f64 = poisson.sample(rng);
    draw.to_usize().ok_or_else(|| Error::NumericInstability {
        size,
        detail: format!("Poisson({}) produced {}", rate, draw),
    })
}

/// `ln(B(m))` for `m` in `0..=n`, from the Bell triangle
fn log_bell_numbers(n: usize) -> Vec<f64> {

    let mut log_bell = Vec::with_capacity(n + 1);
    log_bell.push(0.0);

    //Each row starts with the last entry of the previous row, and each entry adds the one
    // above-left.  The first entry of row m is B(m)
    let mut row: Vec<f64> = vec![0.0];
    for _ in 1..=n {
        let mut next_row = Vec::with_capacity(row.len() + 1);
        let mut entry = row[row.len() - 1];
        next_row.push(entry);
        for &above in row.iter() {
            entry = log_add(entry, above);
            next_row.push(entry);
        }
        log_bell.push(next_row[0]);
        row = next_row;
    }
    log_bell
}

/// `ln(m!)` for `m` in `0..=n`
fn log_factorials(n: usize) -> Vec<f64> {
    let mut table = Vec::with_capacity(n + 1);
    let mut acc = 0.0;
    table.push(acc);
    for m in 1..=n {
        acc += (m as f64).ln();
        table.push(acc);
    }
    table
}

/// `ln(e^a + e^b)`
fn log_add(a: f64, b: f64) -> f64 {
    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
    hi + (lo - hi).exp().ln_1p()
}
