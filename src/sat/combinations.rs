//! k-element subsets of an ordered sequence

/// Every `k`-element subset of `items`, each keeping the relative order of `items`.
///
/// `k == 0` or an empty `items` yields no subsets at all (not a single empty one);
/// the encoder relies on this to emit nothing for degenerate inputs.
pub fn combinations<T: Clone>(items: &[T], k: usize) -> Vec<Vec<T>> {
    if k == 0 || items.is_empty() {
        return Vec::new();
    }
    if k == 1 {
        return items.iter().map(|item| vec![item.clone()]).collect();
    }

    let mut result = Vec::new();
    for (i, first) in items.iter().enumerate() {
        for tail in combinations(&items[i + 1..], k - 1) {
            let mut subset = Vec::with_capacity(k);
            subset.push(first.clone());
            subset.extend(tail);
            result.push(subset);
        }
    }
    result
}

/// Binomial coefficient C(m, k), `None` on u64 overflow.
pub fn binomial(m: u64, k: u64) -> Option<u64> {
    if k > m {
        return Some(0);
    }
    let k = k.min(m - k);
    let mut acc: u64 = 1;
    for i in 0..k {
        // acc * (m - i) is always divisible by (i + 1) at this point
        acc = acc.checked_mul(m - i)? / (i + 1);
    }
    Some(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_counts_match_binomial() {
        let items: Vec<usize> = (0..7).collect();
        for k in 1..=7 {
            let subsets = combinations(&items, k);
            assert_eq!(subsets.len() as u64, binomial(7, k as u64).unwrap());
            assert!(subsets.iter().all(|s| s.len() == k));
        }
    }

    #[test]
    fn test_subsets_preserve_order_and_are_distinct() {
        let items = vec![3, 9, 4, 1, 8];
        let subsets = combinations(&items, 3);

        let mut seen = HashSet::new();
        for subset in &subsets {
            let positions: Vec<usize> = subset
                .iter()
                .map(|x| items.iter().position(|y| y == x).unwrap())
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));

            let mut key = subset.clone();
            key.sort();
            assert!(seen.insert(key), "duplicate subset {:?}", subset);
        }
    }

    #[test]
    fn test_zero_k_and_empty_items_yield_nothing() {
        assert!(combinations(&[1, 2, 3], 0).is_empty());
        assert!(combinations::<i32>(&[], 2).is_empty());
        assert!(combinations(&[1, 2], 3).is_empty());
    }

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(5, 2), Some(10));
        assert_eq!(binomial(5, 0), Some(1));
        assert_eq!(binomial(3, 4), Some(0));
        assert_eq!(binomial(40, 20), Some(137_846_528_820));
        assert_eq!(binomial(200, 100), None);
    }
}
