//! Container types with strongly-typed indexes.
use std::collections::HashMap;

/// Stores a set of `(V, I)` tuples, with lookup in both directions.
///
/// Implemented using a `Vec<V>` and a `HashMap<V, I>`.  Indexes are handed
/// out in first-insertion order, so iterating over [`IndexMap::iter`] is
/// deterministic even though the lookup side is a hash map.
///
/// The index type `I` should be a wrapper around a `usize` and be convertible
/// in both directions using the `Index` trait; a suitable index type can be
/// constructed with [define_index].
#[derive(Clone, Debug)]
pub(crate) struct IndexMap<V, I> {
    data: Vec<V>,
    map: HashMap<V, I>,
}

impl<V, I> Default for IndexMap<V, I> {
    fn default() -> Self {
        Self {
            data: vec![],
            map: HashMap::new(),
        }
    }
}

pub(crate) trait Index {
    fn new(i: usize) -> Self;
    fn get(&self) -> usize;
}

impl<V, I> IndexMap<V, I>
where
    V: Eq + std::hash::Hash + Clone,
    I: Eq + std::hash::Hash + Copy + Index,
{
    pub fn get(&self, v: &V) -> Option<I> {
        self.map.get(v).copied()
    }
    /// Insert the given value into the map, returning a handle.
    ///
    /// If the value is already in the map, the handle will be to the existing
    /// instance (so it will not be inserted twice).
    pub fn insert(&mut self, v: V) -> I {
        if let Some(i) = self.map.get(&v) {
            return *i;
        }
        let out = I::new(self.data.len());
        self.map.insert(v.clone(), out);
        self.data.push(v);
        out
    }
    /// Iterates over `(index, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (I, &V)> {
        self.data.iter().enumerate().map(|(i, v)| (I::new(i), v))
    }
}

////////////////////////////////////////////////////////////////////////////////

/// A `Vec<V>` with strongly-typed indexes, used to improve the type-safety
/// of data storage.
#[derive(Clone, Debug)]
pub(crate) struct IndexVec<V, I> {
    data: Vec<V>,
    _phantom: std::marker::PhantomData<*const I>,
}

impl<V, I> Default for IndexVec<V, I> {
    fn default() -> Self {
        Self {
            data: vec![],
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<V, I: Index> IndexVec<V, I> {
    pub fn push(&mut self, v: V) -> I {
        let i = I::new(self.data.len());
        self.data.push(v);
        i
    }
    pub fn into_values(self) -> impl Iterator<Item = V> {
        self.data.into_iter()
    }
}

impl<V, I: Index> std::ops::Index<I> for IndexVec<V, I> {
    type Output = V;
    fn index(&self, i: I) -> &V {
        &self.data[i.get()]
    }
}

impl<V, I: Index> std::ops::IndexMut<I> for IndexVec<V, I> {
    fn index_mut(&mut self, i: I) -> &mut V {
        &mut self.data[i.get()]
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Defines an index type suitable for use in an [`IndexMap`] or [`IndexVec`].
macro_rules! define_index {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Copy, Clone, Default, Debug, Eq, PartialEq, Hash, Ord, PartialOrd,
        )]
        pub(crate) struct $name(usize);
        impl crate::indexed::Index for $name {
            fn new(i: usize) -> Self {
                Self(i)
            }
            fn get(&self) -> usize {
                self.0
            }
        }
    };
}
pub(crate) use define_index;

#[cfg(test)]
mod test {
    use super::*;

    define_index!(TestIndex, "Index for unit tests");

    #[test]
    fn insert_dedup() {
        let mut m: IndexMap<String, TestIndex> = IndexMap::default();
        let a = m.insert("a".to_owned());
        let b = m.insert("b".to_owned());
        assert_ne!(a, b);
        assert_eq!(m.insert("a".to_owned()), a);
        assert_eq!(m.get(&"b".to_owned()), Some(b));
        assert_eq!(m.get(&"c".to_owned()), None);

        let order: Vec<_> = m.iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(order, ["a", "b"]);
    }

    #[test]
    fn index_vec() {
        let mut v: IndexVec<u32, TestIndex> = IndexVec::default();
        let i = v.push(3);
        let j = v.push(5);
        v[i] += 1;
        assert_eq!(v[i], 4);
        assert_eq!(v[j], 5);
        assert_eq!(v.into_values().collect::<Vec<_>>(), [4, 5]);
    }
}
