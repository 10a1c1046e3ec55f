// Table<T> - the ordered, element-typed collection a host declares as a field

use serde::{Deserialize, Serialize};

/// An ordered, mutable sequence of `T`.
///
/// Insertion order is preserved and duplicates are allowed. A table is
/// replaced wholesale when its database loads, so anything held in it before
/// a load is discarded rather than merged.
///
/// Not synchronized: callers that share a table across threads must bring
/// their own locking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table<T> {
    values: Vec<T>,
}

impl<T> Table<T> {
    /// Create an empty table.
    pub fn new() -> Self {
        Table { values: Vec::new() }
    }

    /// Append an element at the end of the table.
    pub fn add(&mut self, item: T) {
        self.values.push(item);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Number of elements currently held.
    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate the current contents in insertion order.
    /// Every call starts a fresh traversal.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<T> {
        self.values
    }
}

impl<T: PartialEq> Table<T> {
    /// Remove the first element equal to `item`.
    /// Returns false when no element matched.
    pub fn remove(&mut self, item: &T) -> bool {
        match self.values.iter().position(|v| v == item) {
            Some(index) => {
                self.values.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.values.contains(item)
    }
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Table::new()
    }
}

impl<T> From<Vec<T>> for Table<T> {
    fn from(values: Vec<T>) -> Self {
        Table { values }
    }
}

impl<T> FromIterator<T> for Table<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Table {
            values: iter.into_iter().collect(),
        }
    }
}

impl<T> Extend<T> for Table<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.values.extend(iter);
    }
}

impl<T> IntoIterator for Table<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Table<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Build a [`Table`] from a list of elements, like `vec!`.
///
/// ```
/// let scores: tabledb::Table<i64> = tabledb::table![12, 34];
/// assert_eq!(scores.count(), 2);
/// ```
#[macro_export]
macro_rules! table {
    () => {
        $crate::Table::new()
    };
    ($($item:expr),+ $(,)?) => {
        $crate::Table::from(vec![$($item),+])
    };
}
