use std::collections::btree_map;
use std::collections::BTreeMap;
use std::ops::RangeBounds;

/// A keyed series with one value per category on every row.
///
/// Rows are kept sorted by key, and every row has exactly `categories().len()` values
/// in category order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTable<K: Ord, V = i64> {
    categories: Vec<String>,
    rows: BTreeMap<K, Vec<V>>,
}

impl<K: Ord + Copy, V: Clone> CategoryTable<K, V> {
    pub fn new(categories: Vec<String>) -> Self {
        Self {
            categories,
            rows: BTreeMap::new(),
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn category_index(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == name)
    }

    /// Inserts a row, returning the previous one for the same key.
    ///
    /// Panics if the row width differs from the category count.
    pub fn insert(&mut self, key: K, values: Vec<V>) -> Option<Vec<V>> {
        assert_eq!(
            values.len(),
            self.categories.len(),
            "row width must match category count"
        );
        self.rows.insert(key, values)
    }

    pub fn get(&self, key: &K) -> Option<&[V]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.rows.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.rows.keys().copied()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, K, Vec<V>> {
        self.rows.iter()
    }

    pub fn range<R: RangeBounds<K>>(&self, range: R) -> btree_map::Range<'_, K, Vec<V>> {
        self.rows.range(range)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a CategoryTable<K, V> {
    type Item = (&'a K, &'a Vec<V>);
    type IntoIter = btree_map::Iter<'a, K, Vec<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
