
//! Lexicographic stepping over label sequences, plus ranking helpers for permutations of `{1..n}`

/// The largest `n` for which `n!` fits in a `u64`
pub const MAX_RANKABLE_SIZE: usize = 20;

/// Returns `n!`, or `None` if it doesn't fit in a `u64`
pub fn factorial(n: usize) -> Option<u64> {
    (1..=n as u64).try_fold(1u64, |acc, i| acc.checked_mul(i))
}

/// Replaces `labels` with its lexicographic successor
///
/// Returns `false` if `labels` was already the largest arrangement, in which case it wraps
/// around to the smallest (ascending) arrangement.
pub fn next_permutation<T: Ord>(labels: &mut [T]) -> bool {

    if labels.len() < 2 {
        return false;
    }

    //Find the rightmost ascent
    let mut i = labels.len() - 1;
    while i > 0 && labels[i-1] >= labels[i] {
        i -= 1;
    }
    if i == 0 {
        labels.reverse();
        return false;
    }

    //Swap the ascent with the smallest larger element to its right, then make the tail ascending
    let mut j = labels.len() - 1;
    while labels[j] <= labels[i-1] {
        j -= 1;
    }
    labels.swap(i-1, j);
    labels[i..].reverse();
    true
}

/// Replaces `labels` with its lexicographic predecessor
///
/// Returns `false` if `labels` was already the smallest arrangement, in which case it wraps
/// around to the largest (descending) arrangement.
pub fn prev_permutation<T: Ord>(labels: &mut [T]) -> bool {

    if labels.len() < 2 {
        return false;
    }

    //Find the rightmost descent
    let mut i = labels.len() - 1;
    while i > 0 && labels[i-1] <= labels[i] {
        i -= 1;
    }
    if i == 0 {
        labels.reverse();
        return false;
    }

    let mut j = labels.len() - 1;
    while labels[j] >= labels[i-1] {
        j -= 1;
    }
    labels.swap(i-1, j);
    labels[i..].reverse();
    true
}

/// The identity permutation `[1, 2, .., n]`
pub fn identity(n: usize) -> Vec<usize> {
    (1..=n).collect()
}

/// The reversal permutation `[n, n-1, .., 1]`
pub fn reversal(n: usize) -> Vec<usize> {
    (1..=n).rev().collect()
}

/// Returns the `rank`-th permutation of `{1..n}` in lexicographic order, counting from 0
///
/// Decodes `rank` in the factorial number system.  Returns `None` if `n!` overflows a u64
/// or `rank >= n!`.
pub fn nth_permutation(n: usize, rank: u64) -> Option<Vec<usize>> {

    let total = factorial(n)?;
    if rank >= total {
        return None;
    }

    let mut remaining = identity(n);
    let mut result = Vec::with_capacity(n);
    let mut rank = rank;
    let mut block = total;
    for len in (1..=n as u64).rev() {
        block /= len;
        let idx = (rank / block) as usize;
        result.push(remaining.remove(idx));
        rank %= block;
    }
    Some(result)
}

/// Returns the lexicographic rank of a permutation of `{1..n}`, the inverse of [nth_permutation]
pub fn permutation_rank(labels: &[usize]) -> Option<u64> {

    let n = labels.len();
    let mut block = factorial(n)?;
    let mut rank = 0u64;
    for (i, &label) in labels.iter().enumerate() {
        block /= (n - i) as u64;
        let smaller_after = labels[i+1..].iter().filter(|&&later| later < label).count() as u64;
        rank += smaller_after * block;
    }
    Some(rank)
}
