
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::prelude::*;
use rand_pcg::Pcg64;
use test_log::test;

use crate::*;
use crate::lexicographic::*;

//Every permutation of {1..n}, built recursively and sorted, to serve as ground truth
fn all_permutations(n: usize) -> Vec<Vec<usize>> {

    fn extend(prefix: &mut Vec<usize>, used: &mut Vec<bool>, out: &mut Vec<Vec<usize>>) {
        if prefix.len() == used.len() {
            out.push(prefix.clone());
            return;
        }
        for label in 1..=used.len() {
            if !used[label-1] {
                used[label-1] = true;
                prefix.push(label);
                extend(prefix, used, out);
                prefix.pop();
                used[label-1] = false;
            }
        }
    }

    let mut out = vec![];
    extend(&mut vec![], &mut vec![false; n], &mut out);
    out.sort();
    out
}

/// Convenience function for test cases
fn ground_truth<F: Fn(&[usize]) -> bool>(n: usize, allowed: F) -> Vec<Vec<usize>> {
    all_permutations(n).into_iter().filter(|perm| allowed(perm)).collect()
}

/// Convenience function for test cases
fn is_derangement(perm: &[usize]) -> bool {
    perm.iter().enumerate().all(|(idx, &value)| value != idx+1)
}

/// Stirling numbers of the second kind S(n, k) for k in 0..=n
fn stirling_row(n: usize) -> Vec<u64> {
    let mut row = vec![1u64];
    for m in 1..=n {
        let mut next = vec![0u64; m+1];
        for k in 1..=m {
            let carried = if k < m { k as u64 * row[k] } else { 0 };
            next[k] = carried + row[k-1];
        }
        row = next;
    }
    row
}

/// Histogram of `number_of_parts`, normalized
fn part_count_frequencies(samples: &[SetPartition]) -> HashMap<usize, f64> {
    let mut histogram = HashMap::new();
    for partition in samples {
        *histogram.entry(partition.number_of_parts()).or_insert(0.0) += 1.0;
    }
    for freq in histogram.values_mut() {
        *freq /= samples.len() as f64;
    }
    histogram
}

#[test]
/// Stepping through all permutations with next_permutation visits n! of them, in order,
/// and wraps back to the identity
fn lexicographic_test_0() {

    for n in 1..=6 {
        let mut state = identity(n);
        let mut visited = vec![state.clone()];
        while next_permutation(&mut state) {
            visited.push(state.clone());
        }
        assert_eq!(state, identity(n));
        assert_eq!(visited, all_permutations(n));
    }
}

#[test]
/// prev_permutation is the exact mirror of next_permutation
fn lexicographic_test_1() {

    let mut state = reversal(5);
    let mut visited = vec![state.clone()];
    while prev_permutation(&mut state) {
        visited.push(state.clone());
    }
    assert_eq!(state, reversal(5));
    visited.reverse();
    assert_eq!(visited, all_permutations(5));
}

#[test]
/// Unranking and ranking agree with the enumeration order
fn lexicographic_test_2() {

    for (rank, perm) in all_permutations(5).into_iter().enumerate() {
        assert_eq!(nth_permutation(5, rank as u64), Some(perm.clone()));
        assert_eq!(permutation_rank(&perm), Some(rank as u64));
    }
    assert_eq!(nth_permutation(5, 120), None);
    assert_eq!(nth_permutation(0, 0), Some(vec![]));
    assert_eq!(factorial(20), Some(2_432_902_008_176_640_000));
    assert_eq!(factorial(21), None);
}

#[test]
/// The unrestricted enumeration produces exactly n! distinct permutations before wrapping
fn unrestricted_test_0() {

    for n in 2..=6 {
        let perms = RestrictedPermutations::unrestricted(n);
        let states: Vec<Vec<usize>> = perms.iter_forward().collect();
        let distinct: BTreeSet<Vec<usize>> = states.iter().cloned().collect();

        assert_eq!(states.len() as u64, factorial(n).unwrap());
        assert_eq!(distinct.len(), states.len());
        assert_eq!(states, all_permutations(n));

        //The step after the last state reports the wrap and lands back on the first
        let mut state = perms.last().unwrap();
        assert!(!perms.advance(&mut state));
        assert_eq!(Some(state), perms.first());
    }
}

#[test]
/// Size 0 has a single, empty, arrangement
fn unrestricted_test_1() {

    let perms = RestrictedPermutations::unrestricted(0);
    assert_eq!(perms.first(), Some(vec![]));
    assert_eq!(perms.last(), Some(vec![]));
    assert_eq!(perms.count_states(), 1);
    assert!(perms.is_nonempty());
}

#[test]
/// Every fixed-point-free state is a derangement, and the counts are the derangement numbers
fn fixed_point_free_test_0() {

    let derangement_numbers = [(2, 1), (3, 2), (4, 9), (5, 44), (6, 265), (7, 1854)];
    for (n, expected) in derangement_numbers {
        let perms = RestrictedPermutations::fixed_point_free(n).unwrap();
        let states: Vec<Vec<usize>> = perms.iter_forward().collect();

        assert!(states.iter().all(|perm| is_derangement(perm)));
        assert_eq!(states.len(), expected);
        assert_eq!(states, ground_truth(n, is_derangement));
    }
}

#[test]
/// The closed-form boundaries match the brute-force smallest and largest derangements
fn fixed_point_free_test_1() {

    assert_eq!(RestrictedPermutations::fixed_point_free(5).unwrap().first(), Some(vec![2, 1, 4, 5, 3]));
    assert_eq!(RestrictedPermutations::fixed_point_free(3).unwrap().first(), Some(vec![2, 3, 1]));
    assert_eq!(RestrictedPermutations::fixed_point_free(6).unwrap().first(), Some(vec![2, 1, 4, 3, 6, 5]));
    assert_eq!(RestrictedPermutations::fixed_point_free(5).unwrap().last(), Some(vec![5, 4, 2, 3, 1]));

    for n in 2..=8 {
        let truth = ground_truth(n, is_derangement);
        let perms = RestrictedPermutations::fixed_point_free(n).unwrap();
        assert_eq!(perms.first().as_ref(), truth.first());
        assert_eq!(perms.last().as_ref(), truth.last());
    }
}

#[test]
/// A single label can't be deranged, either at construction or by resizing
fn fixed_point_free_test_2() {

    assert!(matches!(RestrictedPermutations::fixed_point_free(1), Err(Error::DomainInfeasible { size: 1, .. })));

    let mut perms = RestrictedPermutations::fixed_point_free(4).unwrap();
    let version = perms.version();
    assert!(matches!(perms.resize(1), Err(Error::DomainInfeasible { .. })));
    assert_eq!(perms.size(), 4);
    assert_eq!(perms.version(), version);
    assert_eq!(perms.first(), Some(vec![2, 1, 4, 3]));
}

#[test]
/// Forbidding label 1 at position 1 skips (1,2,3) and (1,3,2)
fn forbidden_pairs_test_0() {

    let perms = RestrictedPermutations::new(3, Restriction::forbidden_pairs([(1, 1)])).unwrap();
    assert_eq!(perms.first(), Some(vec![2, 1, 3]));

    let table = perms.materialize();
    assert_eq!(table.as_slice(), &[
        vec![2, 1, 3],
        vec![2, 3, 1],
        vec![3, 1, 2],
        vec![3, 2, 1],
    ]);
}

#[test]
/// Random pair sets give the same sequence as filtering every permutation
fn forbidden_pairs_test_1() {

    let mut rng = Pcg64::seed_from_u64(1); //non-cryptographic random used for repeatability
    for _ in 0..20 {
        let n = rng.gen_range(2..=6);
        let pair_count = rng.gen_range(0..=2*n);
        let pairs: BTreeSet<(usize, usize)> = (0..pair_count)
            .map(|_| (rng.gen_range(1..=n), rng.gen_range(1..=n)))
            .collect();

        let perms = RestrictedPermutations::new(n, Restriction::ForbiddenPairs(pairs.clone())).unwrap();
        let truth = ground_truth(n, |perm| {
            perm.iter().enumerate().all(|(idx, &value)| !pairs.contains(&(idx+1, value)))
        });

        let states: Vec<Vec<usize>> = perms.iter_forward().collect();
        assert_eq!(states, truth, "pairs {:?}", pairs);
        assert_eq!(perms.first().as_ref(), truth.first());
        assert_eq!(perms.last().as_ref(), truth.last());
        assert_eq!(perms.is_nonempty(), !truth.is_empty());
    }
}

#[test]
/// A restriction nothing satisfies gives an empty sequence under every discipline
fn forbidden_pairs_test_2() {

    let perms = RestrictedPermutations::new(2, Restriction::forbidden_pairs([(1, 1), (1, 2)])).unwrap();
    assert_eq!(perms.first(), None);
    assert_eq!(perms.last(), None);
    assert!(!perms.is_nonempty());
    assert_eq!(perms.iter_forward().count(), 0);
    assert!(perms.materialize().is_empty());
    assert_eq!(perms.cursor().move_next(), None);
    assert_eq!(perms.par_count(2).unwrap(), 0);
}

#[test]
/// Pairs outside the permutation are refused, and a failed batch inserts nothing
fn forbidden_pairs_test_3() {

    assert!(matches!(RestrictedPermutations::new(3, Restriction::forbidden_pairs([(4, 1)])), Err(Error::InvalidMutation(_))));

    let mut perms = RestrictedPermutations::unrestricted(3);
    assert!(matches!(perms.insert_pair(0, 1), Err(Error::InvalidMutation(_))));
    assert!(matches!(perms.insert_pair(3, 4), Err(Error::InvalidMutation(_))));
    assert!(matches!(perms.insert_pairs([(1, 1), (5, 5)]), Err(Error::InvalidMutation(_))));
    assert_eq!(perms.version(), 0);
    assert_eq!(perms.count_states(), 6);

    let mut derangements = RestrictedPermutations::fixed_point_free(3).unwrap();
    assert!(matches!(derangements.insert_pair(1, 2), Err(Error::InvalidMutation(_))));
}

#[test]
/// Stepping an infeasible enumerator leaves the empty no-solution state, and keeps it there
fn forbidden_pairs_test_4() {

    let perms = RestrictedPermutations::new(2, Restriction::forbidden_pairs([(1, 1), (1, 2)])).unwrap();

    let mut state = vec![1, 2];
    assert!(!perms.advance(&mut state));
    assert!(state.is_empty());
    assert!(!perms.advance(&mut state));
    assert!(state.is_empty());

    let mut state = vec![2, 1];
    assert!(!perms.retreat(&mut state));
    assert!(state.is_empty());
    assert!(!perms.retreat(&mut state));
    assert!(state.is_empty());
}

#[test]
/// Mutations invalidate the cached boundaries
fn mutation_test_0() {

    let mut perms = RestrictedPermutations::unrestricted(3);
    assert_eq!(perms.first(), Some(vec![1, 2, 3]));
    assert_eq!(perms.last(), Some(vec![3, 2, 1]));

    perms.insert_pair(1, 1).unwrap();
    assert_eq!(perms.first(), Some(vec![2, 1, 3]));
    assert_eq!(perms.version(), 1);

    perms.insert_pairs([(1, 3), (2, 1)]).unwrap();
    assert_eq!(perms.first(), Some(vec![2, 3, 1]));
    assert_eq!(perms.last(), Some(vec![2, 3, 1]));
    assert_eq!(perms.count_states(), 1);

    perms.resize(4).unwrap();
    assert_eq!(perms.first(), Some(vec![2, 3, 1, 4]));

    //Shrinking drops the pair at position 3
    perms.insert_pair(3, 3).unwrap();
    perms.resize(2).unwrap();
    assert_eq!(perms.first(), None);

    perms.clear();
    assert_eq!(perms.first(), Some(vec![1, 2]));
    assert_eq!(perms.count_states(), 2);
}

#[test]
/// Predicates see the whole state, once per candidate
fn predicate_test_0() {

    let calls = AtomicUsize::new(0);
    let counting = |_perm: &[usize]| {
        calls.fetch_add(1, Ordering::Relaxed);
        false
    };
    let perms = RestrictedPermutations::new(4, Restriction::predicate(&counting)).unwrap();
    assert_eq!(perms.count_states(), 24);
    assert_eq!(calls.load(Ordering::Relaxed), 24);
}

#[test]
/// Several predicates combine, and the result matches filtering
fn predicate_test_1() {

    let no_leading_one = |perm: &[usize]| perm.first() == Some(&1);
    let no_ascent_at_end = |perm: &[usize]| perm.len() >= 2 && perm[perm.len()-2] < perm[perm.len()-1];

    let mut perms = RestrictedPermutations::new(5, Restriction::predicate(&no_leading_one)).unwrap();
    perms.insert_predicate(&no_ascent_at_end).unwrap();

    let truth = ground_truth(5, |perm| !no_leading_one(perm) && !no_ascent_at_end(perm));
    let states: Vec<Vec<usize>> = perms.iter_forward().collect();
    assert_eq!(states, truth);
    assert_eq!(perms.last().as_ref(), truth.last());

    let backward: Vec<Vec<usize>> = perms.iter_backward().collect();
    assert_eq!(backward, truth.iter().rev().cloned().collect::<Vec<_>>());

    let mut pairs = RestrictedPermutations::new(3, Restriction::forbidden_pairs([(1, 1)])).unwrap();
    assert!(matches!(pairs.insert_predicate(&no_leading_one), Err(Error::InvalidMutation(_))));
}

#[test]
/// advance then retreat returns to the same state, away from the boundary
fn round_trip_test_0() {

    let restrictions = vec![
        Restriction::Unrestricted,
        Restriction::FixedPointFree,
        Restriction::forbidden_pairs([(1, 2), (2, 2), (4, 1), (3, 5)]),
    ];
    for restriction in restrictions {
        let perms = RestrictedPermutations::new(5, restriction).unwrap();
        let last = perms.last().unwrap();
        for state in perms.iter_forward() {
            if state == last {
                continue;
            }
            let mut stepped = state.clone();
            assert!(perms.advance(&mut stepped));
            assert!(perms.retreat(&mut stepped));
            assert_eq!(stepped, state);
        }

        let mut state = perms.first().unwrap();
        assert!(!perms.retreat(&mut state));
        assert_eq!(state, last);
    }
}

#[test]
/// first is never lexicographically after last
fn boundary_order_test_0() {

    let mut rng = Pcg64::seed_from_u64(2);
    for n in 2..=7 {
        let pairs: Vec<(usize, usize)> = (0..n).map(|_| (rng.gen_range(1..=n), rng.gen_range(1..=n))).collect();
        for restriction in [Restriction::Unrestricted, Restriction::FixedPointFree, Restriction::forbidden_pairs(pairs)] {
            let perms = RestrictedPermutations::new(n, restriction).unwrap();
            if let (Some(first), Some(last)) = (perms.first(), perms.last()) {
                assert!(first <= last);
            }
        }
    }
}

#[test]
/// The cursor parks on either boundary and re-enters from the same end
fn cursor_test_0() {

    let perms = RestrictedPermutations::fixed_point_free(3).unwrap();
    let mut cursor = perms.cursor();

    assert_eq!(cursor.position(), &Position::BeforeFirst);
    assert_eq!(cursor.move_prev(), None);
    assert_eq!(cursor.position(), &Position::BeforeFirst);

    assert_eq!(cursor.move_next(), Some(vec![2, 3, 1]));
    assert_eq!(cursor.move_next(), Some(vec![3, 1, 2]));
    assert_eq!(cursor.move_next(), None);
    assert_eq!(cursor.position(), &Position::AfterLast);
    assert_eq!(cursor.move_next(), None);
    assert_eq!(cursor.current(), None);

    assert_eq!(cursor.move_prev(), Some(vec![3, 1, 2]));
    assert_eq!(cursor.move_prev(), Some(vec![2, 3, 1]));
    assert_eq!(cursor.move_prev(), None);
    assert_eq!(cursor.move_next(), Some(vec![2, 3, 1]));
}

#[test]
/// A forward iterator ends on wraparound and can be rewound
fn forward_iter_test_0() {

    let perms = RestrictedPermutations::unrestricted(3);
    let mut iter = perms.iter_forward();
    assert_eq!(iter.by_ref().count(), 6);
    assert!(iter.is_exhausted());
    assert_eq!(iter.next(), None);

    iter.restart();
    assert_eq!(iter.next(), Some(vec![1, 2, 3]));
    assert_eq!(iter.next(), Some(vec![1, 3, 2]));
}

#[test]
/// The parallel count agrees with the sequential one for any number of tasks
fn par_count_test_0() {

    let derangements = RestrictedPermutations::fixed_point_free(7).unwrap();
    for tasks in [1, 3, 8, 5040, 6000] {
        assert_eq!(derangements.par_count(tasks).unwrap(), 1854);
    }

    let pairs = RestrictedPermutations::new(6, Restriction::forbidden_pairs([(1, 1), (2, 3), (6, 6), (4, 2)])).unwrap();
    assert_eq!(pairs.par_count(4).unwrap(), pairs.count_states());

    let too_big = RestrictedPermutations::unrestricted(21);
    assert!(matches!(too_big.par_count(4), Err(Error::SizeTooLarge { size: 21, max: 20 })));
}

#[test]
/// Asking for more tasks than there are permutations still counts every one exactly once
fn par_count_test_1() {

    assert_eq!(RestrictedPermutations::unrestricted(4).par_count(usize::MAX).unwrap(), 24);
    assert_eq!(RestrictedPermutations::unrestricted(0).par_count(usize::MAX).unwrap(), 1);
    assert_eq!(RestrictedPermutations::fixed_point_free(5).unwrap().par_count(0).unwrap(), 44);
}

#[test]
/// The random-access wrapper indexes the sequence and rebuilds after a mutation
fn random_access_test_0() {

    let table = RestrictedPermutations::fixed_point_free(4).unwrap().into_random_access();
    assert!(!table.is_materialized());
    assert_eq!(table.len(), 9);
    assert!(table.is_materialized());
    assert_eq!(table.get(0), Some(vec![2, 1, 4, 3]));
    assert_eq!(table.get(8), Some(vec![4, 3, 2, 1]));
    assert_eq!(table.get(9), None);
    assert_eq!(table.index_of(&[4, 3, 2, 1]), Some(8));
    assert_eq!(table.index_of(&[1, 2, 3, 4]), None);

    //Sequence over indices
    assert_eq!(table.first(), Some(0));
    assert_eq!(table.last(), Some(8));
    let mut idx = 8;
    assert!(!table.advance(&mut idx));
    assert_eq!(idx, 0);
    assert!(!table.retreat(&mut idx));
    assert_eq!(idx, 8);
    assert_eq!(table.iter_forward().count(), 9);

    let mut table = RestrictedPermutations::unrestricted(4).into_random_access();
    assert_eq!(table.len(), 24);
    table.enumerator_mut().insert_pair(1, 1).unwrap();
    assert!(!table.is_materialized());
    assert_eq!(table.len(), 18);
    assert_eq!(table.get(0), Some(vec![2, 1, 3, 4]));
}

#[test]
/// The tilt solves x*e^x = n, exactly below 3 and asymptotically above
fn tilt_test_0() {

    assert_eq!(approximate_x(0), 0.0);
    for n in [1usize, 2] {
        let x = approximate_x(n);
        assert!((x * x.exp() - n as f64).abs() < 1e-9, "n = {}, x = {}", n, x);
    }
    for n in [10usize, 100, 1000, 1_000_000] {
        let x = approximate_x(n);
        let relative = (x * x.exp() - n as f64).abs() / n as f64;
        assert!(relative < 0.2, "n = {}, x = {}, relative error {}", n, x, relative);
    }
}

#[test]
/// The sampler's tilt solves x*e^x = n to double precision, up to sizes in the hundreds of millions
fn tilt_test_1() {

    for n in [3usize, 10, 1000, 1_000_000, 10_000_000, 200_000_000] {
        let x = BoltzmannSampler::new(n).tilt();
        let relative = (x * x.exp() - n as f64).abs() / n as f64;
        assert!(relative < 1e-10, "n = {}, x = {}, relative error {}", n, x, relative);
    }

    //The closed form on its own is measurably short at large n
    let closed_form = approximate_x(200_000_000);
    assert!(closed_form < BoltzmannSampler::new(200_000_000).tilt());
}

#[test]
/// Exact strategies always return the requested weight
fn exact_weight_test_0() {

    let mut rng = Pcg64::seed_from_u64(1);
    for n in [1, 5, 20, 100, 1000] {
        for strategy in [Strategy::ExactRejection, Strategy::PdcDsh, Strategy::BruteForce] {
            for _ in 0..5 {
                let partition = sample(n, strategy, &mut rng).unwrap();
                assert_eq!(partition.weight(), n, "{:?}", strategy);
                let recomputed: usize = partition.iter().map(|(size, count)| size * count).sum();
                assert_eq!(recomputed, n);
            }
        }
    }
    assert!(sample(0, Strategy::PdcDsh, &mut rng).unwrap().is_empty());
}

#[test]
/// The part-count distribution of exact samples at n=10 matches S(10,k)/B(10)
fn part_count_distribution_test_0() {

    let n = 10;
    let stirling = stirling_row(n);
    let bell: u64 = stirling.iter().sum();
    assert_eq!(bell, 115_975);

    let mut rng = Pcg64::seed_from_u64(3);
    let sampler = BoltzmannSampler::new(n);
    for strategy in [Strategy::ExactRejection, Strategy::PdcDsh, Strategy::BruteForce] {
        let samples: Vec<SetPartition> = (0..10_000)
            .map(|_| sampler.sample(strategy, &mut rng).unwrap())
            .collect();
        let frequencies = part_count_frequencies(&samples);

        for k in 1..=n {
            let expected = stirling[k] as f64 / bell as f64;
            let observed = frequencies.get(&k).copied().unwrap_or(0.0);
            assert!((observed - expected).abs() < 0.02, "{:?}: k = {}, observed {}, expected {}", strategy, k, observed, expected);
        }
    }
}

#[test]
/// A plain Boltzmann draw only hits n on average
fn plain_boltzmann_test_0() {

    let mut rng = Pcg64::seed_from_u64(4);
    let sampler = BoltzmannSampler::new(100);
    let x = sampler.tilt();
    let expected = x * x.exp();

    let draws = 2000;
    let total: usize = (0..draws)
        .map(|_| sampler.sample(Strategy::Boltzmann, &mut rng).unwrap().weight())
        .sum();
    let mean = total as f64 / draws as f64;
    assert!((mean - expected).abs() < 0.05 * expected, "mean {} expected {}", mean, expected);
}

#[test]
/// Rejection loops stop at their configured budget
fn trial_limit_test_0() {

    let mut rng = Pcg64::seed_from_u64(5);
    let sampler = BoltzmannSampler::with_config(50, SamplerConfig::default().with_max_trials(0));
    assert_eq!(sampler.sample(Strategy::ExactRejection, &mut rng), Err(Error::TrialLimitExceeded { size: 50, trials: 0 }));
    assert_eq!(sampler.sample(Strategy::PdcDsh, &mut rng), Err(Error::TrialLimitExceeded { size: 50, trials: 0 }));

    //Brute force never rejects
    assert_eq!(sampler.sample(Strategy::BruteForce, &mut rng).unwrap().weight(), 50);
}

#[test]
/// Sizes above the trusted range are refused unless the configuration allows them
fn large_size_test_0() {

    let mut rng = Pcg64::seed_from_u64(8);
    let n = NUMERICALLY_TRUSTED_SIZE + 1;
    let sampler = BoltzmannSampler::new(n);
    for strategy in [Strategy::Boltzmann, Strategy::ExactRejection, Strategy::PdcDsh] {
        assert!(matches!(sampler.sample(strategy, &mut rng), Err(Error::NumericInstability { size, .. }) if size == n), "{:?}", strategy);
    }

    let n = 2 * NUMERICALLY_TRUSTED_SIZE;
    let sampler = BoltzmannSampler::with_config(n, SamplerConfig::default().with_untrusted_sizes(true));
    let partition = sampler.sample(Strategy::PdcDsh, &mut rng).unwrap();
    assert_eq!(partition.weight(), n);
}

#[test]
/// Labelling a shape gives a partition of {1..n} with the same block sizes
fn set_partition_test_0() {

    let mut rng = Pcg64::seed_from_u64(6);
    let shape = SetPartition::from_multiplicities([(1, 2), (3, 1), (2, 2), (1, 1)]);
    assert_eq!(shape.weight(), 10);
    assert_eq!(shape.number_of_parts(), 6);
    assert_eq!(shape.multiplicity(1), 3);
    assert_eq!(shape.multiplicity(4), 0);
    assert_eq!(shape.block_sizes(), vec![3, 2, 2, 1, 1, 1]);
    assert_eq!(format!("{}", shape), "1^3 2^2 3^1");
    assert_eq!(format!("{}", SetPartition::new()), "{}");

    let blocks = shape.to_blocks(&mut rng);
    let mut labels: Vec<usize> = blocks.iter().flatten().copied().collect();
    labels.sort_unstable();
    assert_eq!(labels, identity(10));

    let mut sizes: Vec<usize> = blocks.iter().map(|block| block.len()).collect();
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(sizes, shape.block_sizes());
    assert_eq!(blocks[0][0], 1);
}

#[test]
/// q=0 gives the identity and a huge q gives the reversal
fn mallows_test_0() {

    let mut rng = Pcg64::seed_from_u64(7);
    let identity_sampler = MallowsSampler::new(8, 0.0).unwrap();
    let reversal_sampler = MallowsSampler::new(8, 1e9).unwrap();
    for _ in 0..20 {
        assert_eq!(rng.sample(&identity_sampler), identity(8));
        assert_eq!(rng.sample(&reversal_sampler), reversal(8));
    }

    assert!(matches!(MallowsSampler::new(3, -0.5), Err(Error::InvalidParameter(_))));
    assert!(matches!(MallowsSampler::new(3, f64::NAN), Err(Error::InvalidParameter(_))));
}

#[test]
/// Permutation frequencies follow q^inversions / Z
fn mallows_test_1() {

    let mut rng = Pcg64::seed_from_u64(8);
    let draws = 20_000;
    for q in [0.5, 1.0, 2.0] {
        let sampler = MallowsSampler::new(3, q).unwrap();
        let mut counts: HashMap<Vec<usize>, usize> = HashMap::new();
        for _ in 0..draws {
            let perm = sampler.sample(&mut rng);
            *counts.entry(perm).or_insert(0) += 1;
        }

        let normalizer = (1.0 + q) * (1.0 + q + q * q);
        for perm in all_permutations(3) {
            let expected = q.powi(inversion_count(&perm) as i32) / normalizer;
            let observed = counts.get(&perm).copied().unwrap_or(0) as f64 / draws as f64;
            assert!((observed - expected).abs() < 0.02, "q = {}, {:?}: observed {}, expected {}", q, perm, observed, expected);
        }
    }
}

#[test]
/// The same seed gives the same stream
fn random_source_test_0() {

    let mut a = random_source(Some(42));
    let mut b = random_source(Some(42));
    let a_draws: Vec<u64> = (0..8).map(|_| a.gen()).collect();
    let b_draws: Vec<u64> = (0..8).map(|_| b.gen()).collect();
    assert_eq!(a_draws, b_draws);

    let mut rng = random_source(Some(9));
    let first = sample(30, Strategy::PdcDsh, &mut rng).unwrap();
    let mut rng = random_source(Some(9));
    let second = sample(30, Strategy::PdcDsh, &mut rng).unwrap();
    assert_eq!(first, second);
}
