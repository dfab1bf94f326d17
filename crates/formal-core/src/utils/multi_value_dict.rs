//! A dictionary that can hold multiple values per key.
//!
//! [`MultiValueDict`] backs submission data, where a key may repeat (a
//! multiple-choice checkbox group) and where the order keys arrived in is
//! worth keeping for diagnostics.

use std::collections::HashMap;
use std::hash::Hash;

/// An insertion-ordered dictionary that maps keys to lists of values.
///
/// [`get`](MultiValueDict::get) returns the **last** value for a key, while
/// [`get_list`](MultiValueDict::get_list) returns all values. Iteration
/// follows the order in which keys were first inserted.
///
/// # Examples
///
/// ```
/// use formal_core::utils::MultiValueDict;
///
/// let mut d = MultiValueDict::new();
/// d.append("color".to_string(), "red");
/// d.append("size".to_string(), "large");
/// d.append("color".to_string(), "blue");
///
/// assert_eq!(d.get(&"color".to_string()), Some(&"blue"));
/// assert_eq!(d.get_list(&"color".to_string()), Some(&["red", "blue"][..]));
/// let keys: Vec<_> = d.keys().collect();
/// assert_eq!(keys, ["color", "size"]);
/// ```
#[derive(Debug, Clone)]
pub struct MultiValueDict<K: Eq + Hash + Clone, V> {
    index: HashMap<K, usize>,
    entries: Vec<(K, Vec<V>)>,
}

impl<K: Eq + Hash + Clone, V> Default for MultiValueDict<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone, V> MultiValueDict<K, V> {
    /// Creates an empty `MultiValueDict`.
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Returns a reference to the **last** value associated with the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_list(key).and_then(<[V]>::last)
    }

    /// Returns all values associated with the key.
    pub fn get_list(&self, key: &K) -> Option<&[V]> {
        self.index
            .get(key)
            .map(|&i| self.entries[i].1.as_slice())
    }

    /// Sets the value for a key, replacing any existing values.
    pub fn set(&mut self, key: K, value: V) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = vec![value],
            None => self.push_entry(key, vec![value]),
        }
    }

    /// Appends a value to the list for the given key.
    pub fn append(&mut self, key: K, value: V) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1.push(value),
            None => self.push_entry(key, vec![value]),
        }
    }

    /// Removes a key, returning its values.
    pub fn remove(&mut self, key: &K) -> Option<Vec<V>> {
        let i = self.index.remove(key)?;
        let (_, values) = self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(values)
    }

    /// Returns an iterator over the keys, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Returns an iterator over (key, values) pairs, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[V])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the dictionary contains no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if the dictionary contains the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn push_entry(&mut self, key: K, values: Vec<V>) {
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, values));
    }
}

impl<K: Eq + Hash + Clone, V> IntoIterator for MultiValueDict<K, V> {
    type Item = (K, Vec<V>);
    type IntoIter = std::vec::IntoIter<(K, Vec<V>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Eq + Hash + Clone, V> FromIterator<(K, V)> for MultiValueDict<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut d = Self::new();
        for (k, v) in iter {
            d.append(k, v);
        }
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let d: MultiValueDict<String, String> = MultiValueDict::new();
        assert!(d.is_empty());
        assert_eq!(d.len(), 0);
    }

    #[test]
    fn test_append_and_get_returns_last() {
        let mut d = MultiValueDict::new();
        d.append("color", "red");
        d.append("color", "blue");
        d.append("color", "green");

        assert_eq!(d.get(&"color"), Some(&"green"));
        assert_eq!(d.get_list(&"color"), Some(&["red", "blue", "green"][..]));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn test_set_replaces_existing() {
        let mut d = MultiValueDict::new();
        d.append("k", "a");
        d.append("k", "b");
        d.set("k", "c");
        assert_eq!(d.get_list(&"k"), Some(&["c"][..]));
    }

    #[test]
    fn test_insertion_order_kept() {
        let d: MultiValueDict<_, _> = [("b", 1), ("a", 2), ("c", 3), ("a", 4)]
            .into_iter()
            .collect();
        let keys: Vec<_> = d.keys().copied().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_remove_reindexes() {
        let mut d = MultiValueDict::new();
        d.append("a", 1);
        d.append("b", 2);
        d.append("c", 3);

        assert_eq!(d.remove(&"a"), Some(vec![1]));
        assert_eq!(d.remove(&"a"), None);
        assert_eq!(d.get(&"b"), Some(&2));
        assert_eq!(d.get(&"c"), Some(&3));
        d.append("c", 4);
        assert_eq!(d.get_list(&"c"), Some(&[3, 4][..]));
    }

    #[test]
    fn test_get_missing_key() {
        let d: MultiValueDict<&str, &str> = MultiValueDict::new();
        assert_eq!(d.get(&"missing"), None);
        assert!(!d.contains_key(&"missing"));
    }
}
