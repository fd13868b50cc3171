//! Combination enumerator: the bounded power set of a variant set's
//! indices (§4.3).

use itertools::Itertools;

/// Enumerate combinations of `0..n` indices: all `n` singletons first,
/// then the full `n`-wide set, then ascending `k`-subsets for
/// `k = 2..n-1`, stopping as soon as the emitted count exceeds
/// `n + 1 + maxh`. Singletons and the full set are always included
/// regardless of `maxh`.
pub fn enumerate_combinations(n: usize, maxh: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return Vec::new();
    }

    let mut combos: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();

    if n > 1 {
        combos.push((0..n).collect());
    }

    let budget = n + 1 + maxh;
    if n > 2 {
        'outer: for k in 2..n {
            for combo in (0..n).combinations(k) {
                combos.push(combo);
                if combos.len() > budget {
                    break 'outer;
                }
            }
        }
    }

    combos
}
