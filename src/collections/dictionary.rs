//! Progressive one-to-one mapping of keys to values.

use std::{collections::HashMap, hash::Hash};

use futures::channel::mpsc;

use crate::{
    observer::{Notification, Observer, Subscription},
    Error, Progressor,
};

use super::{Cache, Iter, ProgressiveCollection};

/// [`Cache`] of `(key, value)` pairs refusing the pairs whose key it holds
/// already.
#[derive(Debug)]
pub struct KeyedCache<K, V> {
    /// Cached pairs in the order of their keys' first occurrence.
    entries: Vec<(K, V)>,

    /// Indices of the [`KeyedCache::entries`] by their keys.
    index: HashMap<K, usize>,
}

impl<K, V> KeyedCache<K, V>
where
    K: Eq + Hash,
{
    /// Returns the value cached for the provided `key`.
    fn value(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }
}

impl<K, V> Default for KeyedCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K, V> Cache<(K, V)> for KeyedCache<K, V>
where
    K: Clone + Eq + Hash,
{
    #[inline]
    fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    fn get(&self, index: usize) -> Option<&(K, V)> {
        self.entries.get(index)
    }

    fn contains(&self, item: &(K, V)) -> bool
    where
        (K, V): PartialEq,
    {
        self.index
            .get(&item.0)
            .map_or(false, |&i| &self.entries[i] == item)
    }

    fn offer(&mut self, item: (K, V)) -> bool {
        if self.index.contains_key(&item.0) {
            return false;
        }
        let _ = self.index.insert(item.0.clone(), self.entries.len());
        self.entries.push(item);
        true
    }
}

/// Read-only dictionary lazily filled with the `(key, value)` pairs pulled
/// from a [`Progressor`].
///
/// The first pair of each key wins, later pairs with the same key are
/// skipped.
///
/// ```
/// use medea_progressive::{Error, ProgressiveDictionary};
///
/// let dict = ProgressiveDictionary::new(vec![("a", 1), ("b", 2), ("a", 3)]);
///
/// assert_eq!(dict.get(&"a"), Some(1));
/// assert_eq!(dict.value(&"c"), Err(Error::KeyNotFound));
/// assert_eq!(dict.count(), 2);
/// ```
#[derive(Debug)]
pub struct ProgressiveDictionary<K, V>(
    ProgressiveCollection<(K, V), KeyedCache<K, V>>,
);

impl<K, V> ProgressiveDictionary<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: 'static,
{
    /// Creates new [`ProgressiveDictionary`] over the provided pairs.
    pub fn new<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: 'static,
    {
        Self(ProgressiveCollection::new(pairs))
    }

    /// Creates new [`ProgressiveDictionary`] caching the pairs of the
    /// provided [`Progressor`].
    #[inline]
    pub fn from_progressor(progressor: Progressor<(K, V)>) -> Self {
        Self(ProgressiveCollection::from_progressor(progressor))
    }

    /// Returns the value of the provided `key`, pulling until the key
    /// appears.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.0.pull_until(|cache| cache.value(key).cloned())
    }

    /// Returns the value of the provided `key`.
    ///
    /// # Errors
    ///
    /// With [`Error::KeyNotFound`] if the source is exhausted without the
    /// `key` appearing.
    #[inline]
    pub fn value(&self, key: &K) -> Result<V, Error>
    where
        V: Clone,
    {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Indicates whether the provided `key` has a value, pulling until the
    /// key appears.
    pub fn contains_key(&self, key: &K) -> bool {
        self.0
            .pull_until(|cache| cache.index.get(key).map(|_| ()))
            .is_some()
    }

    /// Returns an iterator over the `(key, value)` pairs, in the order of
    /// their keys' first occurrence.
    #[inline]
    pub fn iter(&self) -> Iter<'_, (K, V), KeyedCache<K, V>>
    where
        V: Clone,
    {
        self.0.iter()
    }

    /// Returns an iterator over the keys, in the order of their first
    /// occurrence.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_
    where
        V: Clone,
    {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the values, in the order of their keys' first
    /// occurrence.
    pub fn values(&self) -> impl Iterator<Item = V> + '_
    where
        V: Clone,
    {
        self.iter().map(|(_, value)| value)
    }

    /// Returns count of the pairs with distinct keys, pulling everything from
    /// the source.
    #[inline]
    pub fn count(&self) -> usize {
        self.0.count()
    }

    /// Returns count of the keys seen so far, without pulling.
    #[inline]
    pub fn cached_len(&self) -> usize {
        self.0.cached_len()
    }

    /// Indicates whether everything has been pulled from the source.
    #[inline]
    pub fn is_materialized(&self) -> bool {
        self.0.is_materialized()
    }

    /// Subscribes the provided [`Observer`] to the pairs pulled by this
    /// [`ProgressiveDictionary`].
    #[inline]
    pub fn subscribe<O>(&self, observer: O) -> Subscription
    where
        O: Observer<(K, V)> + 'static,
    {
        self.0.subscribe(observer)
    }

    /// Subscribes to the pairs pulled by this [`ProgressiveDictionary`] with
    /// an unbounded channel.
    #[inline]
    pub fn subscribe_stream(
        &self,
    ) -> mpsc::UnboundedReceiver<Notification<(K, V)>>
    where
        K: Send,
        V: Clone + Send,
    {
        self.0.subscribe_stream()
    }

    /// Always fails, as [`ProgressiveDictionary`] is read-only.
    ///
    /// # Errors
    ///
    /// Always with [`Error::NotSupported`].
    #[inline]
    pub fn insert(&self, _: K, _: V) -> Result<Option<V>, Error> {
        Err(Error::NotSupported("insert"))
    }

    /// Always fails, as [`ProgressiveDictionary`] is read-only.
    ///
    /// # Errors
    ///
    /// Always with [`Error::NotSupported`].
    #[inline]
    pub fn remove(&self, _: &K) -> Result<Option<V>, Error> {
        Err(Error::NotSupported("remove"))
    }

    /// Always fails, as [`ProgressiveDictionary`] is read-only.
    ///
    /// # Errors
    ///
    /// Always with [`Error::NotSupported`].
    #[inline]
    pub fn clear(&self) -> Result<(), Error> {
        Err(Error::NotSupported("clear"))
    }
}

#[cfg(test)]
mod progressive_dictionary_spec {
    use std::{cell::Cell, rc::Rc};

    use futures::{executor, StreamExt as _};

    use crate::{observer::Notification, Error, Progressor};

    use super::ProgressiveDictionary;

    #[test]
    fn first_pair_of_key_wins() {
        let dict = ProgressiveDictionary::new(vec![
            (1, "one"),
            (2, "two"),
            (1, "uno"),
            (3, "three"),
        ]);

        assert_eq!(
            dict.iter().collect::<Vec<_>>(),
            vec![(1, "one"), (2, "two"), (3, "three")],
        );
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(
            dict.values().collect::<Vec<_>>(),
            vec!["one", "two", "three"],
        );
        assert_eq!(dict.get(&1), Some("one"));
        assert_eq!(dict.count(), 3);
    }

    #[test]
    fn lookups_pull_only_until_key_appears() {
        let pulls = Rc::new(Cell::new(0));
        let dict = {
            let pulls = Rc::clone(&pulls);
            let mut pairs = vec![('a', 1), ('b', 2), ('c', 3)].into_iter();
            ProgressiveDictionary::from_progressor(Progressor::from_fn(
                move || {
                    pulls.set(pulls.get() + 1);
                    pairs.next()
                },
            ))
        };

        assert!(dict.contains_key(&'b'));
        assert_eq!(pulls.get(), 2);
        assert_eq!(dict.value(&'a'), Ok(1));
        assert_eq!(pulls.get(), 2);
        assert_eq!(dict.cached_len(), 2);

        assert_eq!(dict.value(&'z'), Err(Error::KeyNotFound));
        assert!(!dict.contains_key(&'z'));
        assert!(dict.is_materialized());
    }

    #[test]
    fn streams_every_pulled_pair() {
        let dict = ProgressiveDictionary::new(vec![("k", 1), ("k", 2)]);
        let rx = dict.subscribe_stream();

        assert_eq!(dict.get(&"k"), Some(1));
        assert_eq!(dict.count(), 1);

        let received: Vec<_> = executor::block_on(rx.collect());
        assert_eq!(
            received,
            vec![
                Notification::Next(("k", 1)),
                Notification::Next(("k", 2)),
                Notification::Completed,
            ],
        );
        let late = dict.subscribe_stream();
        assert!(executor::block_on(late.collect::<Vec<_>>()).is_empty());
    }

    #[test]
    fn rejects_mutations() {
        let dict = ProgressiveDictionary::new(vec![(1, 1)]);

        assert_eq!(dict.insert(2, 2), Err(Error::NotSupported("insert")));
        assert_eq!(dict.remove(&1), Err(Error::NotSupported("remove")));
        assert_eq!(dict.clear(), Err(Error::NotSupported("clear")));
        assert_eq!(dict.get(&1), Some(1));
    }
}
