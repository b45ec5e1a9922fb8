//! §4.4 Dictionary Facade: like the set facade but each leaf slot carries a
//! value alongside its key, plus `Keys`/`Values` sub-views.

use std::cmp::Ordering;
use std::fmt;

use crate::bias::Bias;
use crate::engine::Tree;
use crate::error::{Error, Result};
use crate::iter::{Backward, Forward, Range};

fn natural_order<K: Ord>(a: &K, b: &K) -> Ordering {
    a.cmp(b)
}

/// Default node capacity when a caller doesn't have a specific workload in
/// mind (§6).
pub const DEFAULT_CAPACITY: usize = 128;

/// An ordered, indexable key/value map, optionally admitting duplicate keys
/// under a configurable bias.
pub struct OrderedDict<K, V, C = fn(&K, &K) -> Ordering> {
    pub(crate) tree: Tree<K, V>,
    pub(crate) cmp: C,
    allow_duplicates: bool,
    insert_bias: Bias,
    lookup_bias: Bias,
    remove_bias: Bias,
    read_only: bool,
}

impl<K: Ord + Clone, V> OrderedDict<K, V, fn(&K, &K) -> Ordering> {
    /// Builds a dictionary ordered by `K`'s natural `Ord` implementation.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_comparator(capacity, natural_order)
    }
}

impl<K: Ord + Clone, V> Default for OrderedDict<K, V, fn(&K, &K) -> Ordering> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY).expect("default capacity is always valid")
    }
}

impl<K: Clone, V, C: Fn(&K, &K) -> Ordering> OrderedDict<K, V, C> {
    pub fn with_comparator(capacity: usize, cmp: C) -> Result<Self> {
        Ok(OrderedDict {
            tree: Tree::new(capacity)?,
            cmp,
            allow_duplicates: false,
            insert_bias: Bias::Arbitrary,
            lookup_bias: Bias::Arbitrary,
            remove_bias: Bias::Arbitrary,
            read_only: false,
        })
    }

    pub fn with_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    pub fn with_insert_bias(mut self, bias: Bias) -> Self {
        self.insert_bias = bias;
        self
    }

    pub fn with_lookup_bias(mut self, bias: Bias) -> Self {
        self.lookup_bias = bias;
        self
    }

    pub fn with_remove_bias(mut self, bias: Bias) -> Self {
        self.remove_bias = bias;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn comparer(&self) -> &C {
        &self.cmp
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn allow_duplicates(&self) -> bool {
        self.allow_duplicates
    }

    /// Disabling duplicates on a non-empty container is rejected (§4.3, §7).
    pub fn set_allow_duplicates(&mut self, allow: bool) -> Result<()> {
        if !allow && self.allow_duplicates && !self.tree.is_empty() {
            return Err(Error::AllowDuplicatesTransition);
        }
        self.allow_duplicates = allow;
        Ok(())
    }

    pub fn insert_bias(&self) -> Bias {
        self.insert_bias
    }

    pub fn set_insert_bias(&mut self, bias: Bias) {
        self.insert_bias = bias;
    }

    pub fn lookup_bias(&self) -> Bias {
        self.lookup_bias
    }

    pub fn set_lookup_bias(&mut self, bias: Bias) {
        self.lookup_bias = bias;
    }

    pub fn remove_bias(&self) -> Bias {
        self.remove_bias
    }

    pub fn set_remove_bias(&mut self, bias: Bias) {
        self.remove_bias = bias;
    }

    fn effective(&self, bias: Bias) -> Bias {
        if self.allow_duplicates {
            bias
        } else {
            Bias::Arbitrary
        }
    }

    pub fn count(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn clear(&mut self) -> Result<()> {
        if self.read_only {
            return Err(Error::ImmutableMutation);
        }
        self.tree.clear();
        Ok(())
    }

    pub fn contains_key(&self, key: &K) -> bool {
        let bias = self.effective(self.lookup_bias);
        self.tree.find(key, &self.cmp, bias).2
    }

    /// Reads the value at the first slot matching `key` under the lookup
    /// bias. Fails loudly (per §7) on a missing key.
    pub fn get(&self, key: &K) -> Result<&V> {
        let bias = self.effective(self.lookup_bias);
        let (leaf, pos, found) = self.tree.find(key, &self.cmp, bias);
        if !found {
            return Err(Error::KeyNotFound);
        }
        Ok(self.tree.leaf_value(leaf, pos))
    }

    pub fn try_get_value(&self, key: &K) -> Option<&V> {
        let bias = self.effective(self.lookup_bias);
        let (leaf, pos, found) = self.tree.find(key, &self.cmp, bias);
        found.then(|| self.tree.leaf_value(leaf, pos))
    }

    /// Upserts: overwrites the value at an existing matching slot, or
    /// inserts a new entry when the key is absent.
    pub fn set(&mut self, key: K, value: V) -> Result<()> {
        if self.read_only {
            return Err(Error::ImmutableMutation);
        }
        let bias = self.effective(self.insert_bias);
        let (leaf, pos, found) = self.tree.find(&key, &self.cmp, bias);
        if found {
            self.tree.set_value(leaf, pos, value);
        } else {
            self.tree.insert(key, value, leaf, pos, &self.cmp);
        }
        Ok(())
    }

    /// §4.3-style add semantics: fails on a duplicate key when duplicates
    /// are disabled; otherwise lands at the head or tail of an existing
    /// equal run according to `insert_bias`.
    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        if self.read_only {
            return Err(Error::ImmutableMutation);
        }
        let bias = self.effective(self.insert_bias);
        let (leaf, mut pos, found) = self.tree.find(&key, &self.cmp, bias);
        if found {
            if !self.allow_duplicates {
                return Err(Error::DuplicateKey);
            }
            if bias == Bias::Tail {
                pos += 1;
            }
        }
        self.tree.insert(key, value, leaf, pos, &self.cmp);
        Ok(())
    }

    pub fn remove(&mut self, key: &K) -> Result<bool> {
        if self.read_only {
            return Err(Error::ImmutableMutation);
        }
        let bias = self.effective(self.remove_bias);
        let (leaf, pos, found) = self.tree.find(key, &self.cmp, bias);
        if !found {
            return Ok(false);
        }
        self.tree.remove_at(leaf, pos);
        Ok(true)
    }

    pub fn at(&self, index: usize) -> Result<(&K, &V)> {
        if index >= self.tree.len() {
            return Err(Error::IndexOutOfRange {
                index: index as i64,
                len: self.tree.len(),
            });
        }
        let (leaf, pos) = self.tree.leaf_at(index);
        Ok((self.tree.leaf_key(leaf, pos), self.tree.leaf_value(leaf, pos)))
    }

    pub fn remove_at(&mut self, index: usize) -> Result<(K, V)> {
        if self.read_only {
            return Err(Error::ImmutableMutation);
        }
        if index >= self.tree.len() {
            return Err(Error::IndexOutOfRange {
                index: index as i64,
                len: self.tree.len(),
            });
        }
        let (leaf, pos) = self.tree.leaf_at(index);
        Ok(self.tree.remove_at(leaf, pos))
    }

    pub fn set_value_at(&mut self, index: usize, value: V) -> Result<V> {
        if self.read_only {
            return Err(Error::ImmutableMutation);
        }
        if index >= self.tree.len() {
            return Err(Error::IndexOutOfRange {
                index: index as i64,
                len: self.tree.len(),
            });
        }
        let (leaf, pos) = self.tree.leaf_at(index);
        Ok(self.tree.set_value(leaf, pos, value))
    }

    /// `{(k, v) : k >= key}` ascending.
    pub fn where_greater_or_equal(&self, key: &K) -> Forward<'_, K, V> {
        let (leaf, pos, _) = self.tree.find(key, &self.cmp, Bias::Head);
        self.tree.forward_from(leaf, pos)
    }

    /// `{(k, v) : k <= key}` descending.
    pub fn where_less_or_equal_backwards(&self, key: &K) -> Backward<'_, K, V> {
        let (leaf, pos, found) = self.tree.find(key, &self.cmp, Bias::Tail);
        let pos = if found { pos as isize } else { pos as isize - 1 };
        self.tree.backward_from(leaf, pos)
    }

    /// `{lo..=hi}` ascending (§4.4's range+upper-bound query).
    pub fn where_in_range(&self, lo: &K, hi: &K) -> Result<Range<'_, K, V>>
    where
        K: fmt::Debug,
    {
        if (self.cmp)(hi, lo) == Ordering::Less {
            return Err(Error::InvalidRange {
                lo: format!("{lo:?}"),
                hi: format!("{hi:?}"),
            });
        }
        let (leaf_start, start_pos, _) = self.tree.find(lo, &self.cmp, Bias::Head);
        let (leaf_end, end_pos, found) = self.tree.find(hi, &self.cmp, Bias::Tail);
        let end_pos = if found { end_pos as isize } else { end_pos as isize - 1 };
        Ok(self.tree.range(leaf_start, start_pos, leaf_end, end_pos))
    }

    /// Absolute rank of the first entry whose key is strictly greater than
    /// `key`, correct for a duplicate run of any length (§9 Open Question 1).
    pub fn first_index_where_greater_than(&self, key: &K) -> usize {
        let (leaf, pos, found) = self.tree.find(key, &self.cmp, Bias::Tail);
        let rank = self.tree.rank(leaf, pos);
        if found {
            rank + 1
        } else {
            rank
        }
    }

    /// Absolute rank of the last entry whose key is strictly less than `key`.
    pub fn last_index_where_less_than(&self, key: &K) -> isize {
        let (leaf, pos, _) = self.tree.find(key, &self.cmp, Bias::Head);
        self.tree.rank(leaf, pos) as isize - 1
    }

    pub fn forward_from_index(&self, index: usize) -> Forward<'_, K, V> {
        if index >= self.tree.len() {
            let last = self.tree.last_leaf();
            return self.tree.forward_from(last, self.tree.leaf_len(last));
        }
        let (leaf, pos) = self.tree.leaf_at(index);
        self.tree.forward_from(leaf, pos)
    }

    pub fn backward_from_index(&self, index: usize) -> Backward<'_, K, V> {
        if self.tree.is_empty() {
            return self.tree.backward_from(self.tree.first_leaf(), -1);
        }
        if index >= self.tree.len() {
            let last = self.tree.last_leaf();
            return self.tree.backward_from(last, self.tree.leaf_len(last) as isize);
        }
        let (leaf, pos) = self.tree.leaf_at(index);
        self.tree.backward_from(leaf, pos as isize)
    }

    pub fn iter(&self) -> Forward<'_, K, V> {
        self.tree.forward_from(self.tree.first_leaf(), 0)
    }

    /// A read-only ordered-set-like view over this dictionary's keys.
    pub fn keys(&self) -> KeysView<'_, K, V, C> {
        KeysView { dict: self }
    }

    /// An unordered multiset view over this dictionary's values.
    pub fn values(&self) -> ValuesView<'_, K, V, C> {
        ValuesView { dict: self }
    }
}

impl<K, V, C: Fn(&K, &K) -> Ordering> fmt::Debug for OrderedDict<K, V, C>
where
    K: fmt::Debug + Clone,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K: Clone, V, C: Fn(&K, &K) -> Ordering> IntoIterator for &'a OrderedDict<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Forward<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Consumes the dictionary in ascending key order (§6's `copyTo`-equivalent
/// drain).
impl<K: Clone, V, C: Fn(&K, &K) -> Ordering> IntoIterator for OrderedDict<K, V, C> {
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;

    fn into_iter(mut self) -> Self::IntoIter {
        let mut items = Vec::with_capacity(self.count());
        while !self.tree.is_empty() {
            let (leaf, _) = self.tree.leaf_at(0);
            items.push(self.tree.remove_at(leaf, 0));
        }
        items.into_iter()
    }
}

/// `at(i)` exposed the Rust-native way: panics on an out-of-range index
/// like `Vec`'s indexer (§7). `IndexMut` hands out the value only — the key
/// at a position stays immutable, since mutating it in place could violate
/// the tree's sort order, while the value carries no such constraint.
impl<K: Clone, V, C: Fn(&K, &K) -> Ordering> std::ops::Index<usize> for OrderedDict<K, V, C> {
    type Output = V;

    fn index(&self, index: usize) -> &V {
        self.at(index)
            .unwrap_or_else(|_| panic!("index out of range: the len is {} but the index is {}", self.count(), index))
            .1
    }
}

impl<K: Clone, V, C: Fn(&K, &K) -> Ordering> std::ops::IndexMut<usize> for OrderedDict<K, V, C> {
    fn index_mut(&mut self, index: usize) -> &mut V {
        let len = self.tree.len();
        if index >= len {
            panic!("index out of range: the len is {len} but the index is {index}");
        }
        let (leaf, pos) = self.tree.leaf_at(index);
        self.tree.leaf_value_mut(leaf, pos)
    }
}

/// Read-only ordered-set-like view over an [`OrderedDict`]'s keys. Every
/// mutator fails with [`Error::Unsupported`] rather than being omitted,
/// since the view still needs to report the rejection to a caller holding
/// it behind the same trait surface as a real set.
pub struct KeysView<'a, K, V, C> {
    dict: &'a OrderedDict<K, V, C>,
}

impl<'a, K: Clone, V, C: Fn(&K, &K) -> Ordering> KeysView<'a, K, V, C> {
    pub fn count(&self) -> usize {
        self.dict.count()
    }

    pub fn is_empty(&self) -> bool {
        self.dict.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.dict.contains_key(key)
    }

    pub fn at(&self, index: usize) -> Result<&K> {
        self.dict.at(index).map(|(k, _)| k)
    }

    pub fn iter(&self) -> std::iter::Map<Forward<'a, K, V>, fn((&'a K, &'a V)) -> &'a K> {
        let project: fn((&'a K, &'a V)) -> &'a K = |(k, _)| k;
        self.dict.iter().map(project)
    }

    pub fn add(&self, _key: K) -> Result<()> {
        Err(Error::Unsupported("Keys view is read-only"))
    }

    pub fn remove(&self, _key: &K) -> Result<bool> {
        Err(Error::Unsupported("Keys view is read-only"))
    }

    pub fn remove_at(&self, _index: usize) -> Result<K> {
        Err(Error::Unsupported("Keys view is read-only"))
    }
}

/// Unordered multiset view over an [`OrderedDict`]'s values. There is no
/// index structure on values, so `contains` is a linear scan of the leaf
/// chain (§4.4).
pub struct ValuesView<'a, K, V, C> {
    dict: &'a OrderedDict<K, V, C>,
}

impl<'a, K: Clone, V: PartialEq, C: Fn(&K, &K) -> Ordering> ValuesView<'a, K, V, C> {
    pub fn count(&self) -> usize {
        self.dict.count()
    }

    pub fn is_empty(&self) -> bool {
        self.dict.is_empty()
    }

    pub fn contains(&self, value: &V) -> bool {
        self.dict.iter().any(|(_, v)| v == value)
    }

    pub fn iter(&self) -> std::iter::Map<Forward<'a, K, V>, fn((&'a K, &'a V)) -> &'a V> {
        let project: fn((&'a K, &'a V)) -> &'a V = |(_, v)| v;
        self.dict.iter().map(project)
    }

    pub fn add(&self, _value: V) -> Result<()> {
        Err(Error::Unsupported("Values view is read-only"))
    }
}
