//! Cartesian product over a configuration space
//!
//! Keys are sorted before the product is taken, so the order of the produced
//! combinations only depends on the keys and values, never on the insertion
//! order of the input map. The last key varies fastest:
//!
//! ```text
//! {"color": [orange, blue], "number": [1, 2]}
//!   → {color: orange, number: 1}
//!     {color: orange, number: 2}
//!     {color: blue,   number: 1}
//!     {color: blue,   number: 2}
//! ```
//!
//! An empty space yields exactly one empty combination. A key with an empty
//! value list yields no combinations at all.

use std::collections::BTreeMap;

/// Lazy iterator over all combinations of a configuration space.
///
/// Created by [`product_iter`]. Combinations are produced on demand, which
/// lets callers truncate a huge space without materializing it.
#[derive(Debug, Clone)]
pub struct Product<'a, K, V> {
    keys: Vec<&'a K>,
    values: Vec<&'a [V]>,
    indices: Vec<usize>,
    done: bool,
}

/// Iterate over the Cartesian product of `space` in sorted-key order.
pub fn product_iter<'a, K, V, I>(space: I) -> Product<'a, K, V>
where
    K: Ord + 'a,
    V: 'a,
    I: IntoIterator<Item = (&'a K, &'a Vec<V>)>,
{
    let mut dimensions: Vec<(&'a K, &'a [V])> = space
        .into_iter()
        .map(|(k, v)| (k, v.as_slice()))
        .collect();
    dimensions.sort_by(|a, b| a.0.cmp(b.0));

    let done = dimensions.iter().any(|(_, v)| v.is_empty());
    let (keys, values): (Vec<_>, Vec<_>) = dimensions.into_iter().unzip();
    Product {
        indices: vec![0; keys.len()],
        keys,
        values,
        done,
    }
}

/// Compute every combination of `space`.
pub fn cartesian_product<'a, K, V, I>(space: I) -> Vec<BTreeMap<K, V>>
where
    K: Ord + Clone + 'a,
    V: Clone + 'a,
    I: IntoIterator<Item = (&'a K, &'a Vec<V>)>,
{
    product_iter(space).collect()
}

/// Number of combinations `space` expands to, or `None` on overflow.
///
/// An empty value list anywhere makes the count 0, even when the other
/// lists alone would overflow.
pub fn combination_count<'a, V: 'a, K: 'a>(
    space: impl IntoIterator<Item = (&'a K, &'a Vec<V>)>,
) -> Option<usize> {
    let lengths: Vec<usize> = space.into_iter().map(|(_, values)| values.len()).collect();
    if lengths.contains(&0) {
        return Some(0);
    }
    lengths.into_iter().try_fold(1usize, usize::checked_mul)
}

impl<K, V> Iterator for Product<'_, K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    type Item = BTreeMap<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let combination = self
            .keys
            .iter()
            .zip(&self.values)
            .zip(&self.indices)
            .map(|((key, values), &i)| ((*key).clone(), values[i].clone()))
            .collect();

        // odometer step, rightmost dimension first
        let mut position = self.indices.len();
        loop {
            if position == 0 {
                self.done = true;
                break;
            }
            position -= 1;
            self.indices[position] += 1;
            if self.indices[position] < self.values[position].len() {
                break;
            }
            self.indices[position] = 0;
        }

        Some(combination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn space(entries: &[(&str, &[i32])]) -> BTreeMap<String, Vec<i32>> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.to_vec()))
            .collect()
    }

    #[test]
    fn test_product_size_and_keys() {
        let s = space(&[("k1", &[1, 2]), ("k2", &[10, 20, 30])]);
        let result = cartesian_product(&s);
        assert_eq!(result.len(), 6);
        for c in &result {
            assert_eq!(c.keys().collect::<Vec<_>>(), vec!["k1", "k2"]);
        }
        let unique: std::collections::HashSet<_> = result.iter().map(|c| format!("{c:?}")).collect();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn test_last_key_varies_fastest() {
        let s = space(&[("number", &[1, 2, 3]), ("color", &[7, 8])]);
        let result = cartesian_product(&s);
        assert_eq!(result[0]["color"], 7);
        assert_eq!(result[0]["number"], 1);
        assert_eq!(result[1]["color"], 7);
        assert_eq!(result[1]["number"], 2);
        assert_eq!(result[3]["color"], 8);
        assert_eq!(result[3]["number"], 1);
    }

    #[test]
    fn test_insertion_order_independent() {
        let mut a = HashMap::new();
        a.insert("x".to_string(), vec![1, 2]);
        a.insert("y".to_string(), vec![3, 4]);
        let mut b = HashMap::new();
        b.insert("y".to_string(), vec![3, 4]);
        b.insert("x".to_string(), vec![1, 2]);
        assert_eq!(cartesian_product(&a), cartesian_product(&b));
    }

    #[test]
    fn test_empty_space_is_identity() {
        let s: BTreeMap<String, Vec<i32>> = BTreeMap::new();
        let result = cartesian_product(&s);
        assert_eq!(result.len(), 1);
        assert!(result[0].is_empty());
        assert_eq!(combination_count(&s), Some(1));
    }

    #[test]
    fn test_empty_value_list_collapses() {
        let s = space(&[("a", &[1, 2]), ("b", &[])]);
        assert!(cartesian_product(&s).is_empty());
        assert_eq!(combination_count(&s), Some(0));
    }

    #[test]
    fn test_count_overflow() {
        let values: Vec<i32> = (0..1000).collect();
        let mut s: BTreeMap<String, Vec<i32>> =
            (0..10).map(|i| (format!("k{i}"), values.clone())).collect();
        assert_eq!(combination_count(&s), None);

        s.insert("z".to_string(), Vec::new());
        assert_eq!(combination_count(&s), Some(0));
    }

    #[test]
    fn test_lazy_take() {
        let s = space(&[("a", &[1, 2, 3]), ("b", &[1, 2, 3])]);
        let first: Vec<_> = product_iter(&s).take(2).collect();
        assert_eq!(first.len(), 2);
        assert_eq!(combination_count(&s), Some(9));
    }
}
