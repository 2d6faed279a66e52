//! Identity-based set difference.

use std::collections::HashSet;
use std::hash::Hash;

use crate::types::Snapshot;

/// Elements of `all` whose key does not appear among the keys of `exclude`.
///
/// Output preserves the order of `all`. Runs in O(n + m).
pub fn difference_by_key<T, K, F>(all: &[T], exclude: &[T], key: F) -> Vec<T>
where
    T: Clone,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let excluded: HashSet<K> = exclude.iter().map(&key).collect();
    all.iter()
        .filter(|item| !excluded.contains(&key(*item)))
        .cloned()
        .collect()
}

/// Snapshots in `all` that are not in `retain`, compared by id.
pub fn difference(all: &[Snapshot], retain: &[Snapshot]) -> Vec<Snapshot> {
    difference_by_key(all, retain, |s| s.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_difference_of_lists() {
        let all = [1, 2, 3, 4, 5];
        let exclude = [1, 4, 3];
        assert_eq!(difference_by_key(&all, &exclude, |x| *x), vec![2, 5]);
    }

    #[test]
    fn test_compares_by_id_not_value() {
        let t1 = Utc.with_ymd_and_hms(2020, 3, 10, 5, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let all = vec![Snapshot::manual("a", t1), Snapshot::manual("b", t1)];
        // Same id, different timestamp: still the same snapshot.
        let retain = vec![Snapshot::automated("a", t2)];

        let deleted = difference(&all, &retain);
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].id.as_str(), "b");
    }

    #[test]
    fn test_identity_and_empty() {
        let t = Utc.with_ymd_and_hms(2020, 3, 10, 5, 0, 0).unwrap();
        let all = vec![Snapshot::manual("a", t), Snapshot::manual("b", t)];

        assert!(difference(&all, &all).is_empty());
        assert_eq!(difference(&all, &[]), all);
        assert!(difference(&[], &all).is_empty());
    }
}
