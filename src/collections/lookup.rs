//! Progressive one-to-many mapping of keys to values.

use std::{
    cell::RefCell, collections::HashMap, fmt, hash::Hash, iter::FusedIterator,
    rc::Rc,
};

use futures::channel::mpsc;

use crate::{
    observer::{Notification, Observer, Subscription},
    Error, Progressor, ProgressorExt as _, ProxyObservable,
};

/// Pulled pairs grouped by their keys, along with the [`Progressor`] of the
/// pairs.
struct State<K, V> {
    /// Source of the pairs.
    progressor: Progressor<(K, V)>,

    /// Keys in the order of their first occurrence.
    keys: Vec<K>,

    /// Values pulled so far for each key.
    groups: HashMap<K, Vec<V>>,
}

impl<K, V> State<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: 'static,
{
    /// Pulls the next pair and caches it into its group.
    ///
    /// Returns the key of the pulled pair.
    fn advance(&mut self) -> Option<K> {
        let (key, value) = self.progressor.try_take()?;
        if !self.groups.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.groups.entry(key.clone()).or_default().push(value);
        Some(key)
    }

    /// Pulls everything left in the [`State::progressor`].
    fn materialize(&mut self) {
        while self.advance().is_some() {}
    }

    /// Returns the cached values of the provided `key`.
    fn values(&self, key: &K) -> &[V] {
        self.groups.get(key).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Shared [`State`] of a [`ProgressiveLookup`] and its [`Grouping`]s.
type SharedState<K, V> = Rc<RefCell<State<K, V>>>;

/// Read-only lookup lazily grouping the `(key, value)` pairs pulled from a
/// [`Progressor`].
///
/// Groups are yielded in the order of their keys' first occurrence. Values
/// of each group keep the pull order.
///
/// ```
/// use medea_progressive::ProgressiveLookup;
///
/// let lookup = ProgressiveLookup::from_iter_by_key(
///     vec!["apple", "avocado", "banana", "apricot"],
///     |fruit| fruit.chars().next(),
/// );
///
/// let a = lookup.get(&Some('a')).unwrap();
/// assert_eq!(a.to_vec(), vec!["apple", "avocado", "apricot"]);
/// assert_eq!(lookup.count(), 2);
/// ```
pub struct ProgressiveLookup<K, V> {
    /// Grouped pairs and their source.
    state: SharedState<K, V>,

    /// Subscribers of the source.
    proxy: ProxyObservable<(K, V)>,
}

impl<K, V> ProgressiveLookup<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: 'static,
{
    /// Creates new [`ProgressiveLookup`] over the provided pairs.
    pub fn new<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: 'static,
    {
        Self::from_progressor(Progressor::new(pairs))
    }

    /// Creates new [`ProgressiveLookup`] grouping the provided values by the
    /// keys produced with the `key` function.
    pub fn from_iter_by_key<I, F>(values: I, mut key: F) -> Self
    where
        I: IntoIterator<Item = V>,
        I::IntoIter: 'static,
        F: FnMut(&V) -> K + 'static,
    {
        Self::from_progressor(
            Progressor::new(values).convert(move |v| (key(&v), v)),
        )
    }

    /// Creates new [`ProgressiveLookup`] grouping the pairs of the provided
    /// [`Progressor`].
    pub fn from_progressor(progressor: Progressor<(K, V)>) -> Self {
        Self {
            proxy: progressor.proxy().clone(),
            state: Rc::new(RefCell::new(State {
                progressor,
                keys: Vec::new(),
                groups: HashMap::new(),
            })),
        }
    }

    /// Returns an iterator over the [`Grouping`]s of this
    /// [`ProgressiveLookup`], pulling only until the next new key appears.
    #[inline]
    pub fn iter(&self) -> Iter<K, V> {
        Iter {
            state: Rc::clone(&self.state),
            index: 0,
        }
    }

    /// Returns an iterator over the distinct keys, in the order of their
    /// first occurrence.
    pub fn keys(&self) -> impl Iterator<Item = K> {
        self.iter().map(|group| group.key)
    }

    /// Returns the [`Grouping`] of the provided `key`, pulling until the key
    /// appears.
    pub fn get(&self, key: &K) -> Option<Grouping<K, V>> {
        let mut state = self.state.borrow_mut();
        while !state.groups.contains_key(key) {
            let _ = state.advance()?;
        }
        Some(Grouping {
            key: key.clone(),
            state: Rc::clone(&self.state),
        })
    }

    /// Returns the [`Grouping`] of the provided `key`.
    ///
    /// # Errors
    ///
    /// With [`Error::KeyNotFound`] if the source is exhausted without the
    /// `key` appearing.
    #[inline]
    pub fn group(&self, key: &K) -> Result<Grouping<K, V>, Error> {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Indicates whether the provided `key` has a [`Grouping`], pulling until
    /// the key appears.
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns count of [`Grouping`]s, pulling everything from the source.
    pub fn count(&self) -> usize {
        let mut state = self.state.borrow_mut();
        state.materialize();
        state.keys.len()
    }

    /// Returns count of the keys seen so far, without pulling.
    pub fn cached_len(&self) -> usize {
        self.state.borrow().keys.len()
    }

    /// Indicates whether everything has been pulled from the source.
    pub fn is_materialized(&self) -> bool {
        self.state.borrow().progressor.is_closed()
    }

    /// Subscribes the provided [`Observer`] to the pairs pulled by this
    /// [`ProgressiveLookup`].
    #[inline]
    pub fn subscribe<O>(&self, observer: O) -> Subscription
    where
        O: Observer<(K, V)> + 'static,
    {
        self.proxy.subscribe(observer)
    }

    /// Subscribes to the pairs pulled by this [`ProgressiveLookup`] with an
    /// unbounded channel.
    #[inline]
    pub fn subscribe_stream(
        &self,
    ) -> mpsc::UnboundedReceiver<Notification<(K, V)>>
    where
        K: Send,
        V: Clone + Send,
    {
        self.proxy.subscribe_stream()
    }

    /// Always fails, as [`ProgressiveLookup`] is read-only.
    ///
    /// # Errors
    ///
    /// Always with [`Error::NotSupported`].
    #[inline]
    pub fn add(&self, _: K, _: V) -> Result<(), Error> {
        Err(Error::NotSupported("add"))
    }

    /// Always fails, as [`ProgressiveLookup`] is read-only.
    ///
    /// # Errors
    ///
    /// Always with [`Error::NotSupported`].
    #[inline]
    pub fn remove(&self, _: &K) -> Result<bool, Error> {
        Err(Error::NotSupported("remove"))
    }

    /// Always fails, as [`ProgressiveLookup`] is read-only.
    ///
    /// # Errors
    ///
    /// Always with [`Error::NotSupported`].
    #[inline]
    pub fn clear(&self) -> Result<(), Error> {
        Err(Error::NotSupported("clear"))
    }
}

impl<K, V> fmt::Debug for ProgressiveLookup<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressiveLookup")
            .field("proxy", &self.proxy)
            .finish()
    }
}

impl<K, V> IntoIterator for &ProgressiveLookup<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: 'static,
{
    type IntoIter = Iter<K, V>;
    type Item = Grouping<K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the [`Grouping`]s of a [`ProgressiveLookup`].
pub struct Iter<K, V> {
    /// Shared state of the iterated [`ProgressiveLookup`].
    state: SharedState<K, V>,

    /// Index of the key of the next yielded [`Grouping`].
    index: usize,
}

impl<K, V> Iterator for Iter<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: 'static,
{
    type Item = Grouping<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = {
            let mut state = self.state.borrow_mut();
            while state.keys.len() <= self.index {
                let _ = state.advance()?;
            }
            state.keys[self.index].clone()
        };
        self.index += 1;
        Some(Grouping {
            key,
            state: Rc::clone(&self.state),
        })
    }
}

impl<K, V> FusedIterator for Iter<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: 'static,
{
}

impl<K, V> fmt::Debug for Iter<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").field("index", &self.index).finish()
    }
}

/// Values of a single key of a [`ProgressiveLookup`].
///
/// Enumerating a [`Grouping`] keeps pulling from the source shared with its
/// [`ProgressiveLookup`]. Pairs of other keys met on the way are cached into
/// their own [`Grouping`]s.
pub struct Grouping<K, V> {
    /// Key of this [`Grouping`].
    key: K,

    /// Shared state of the [`ProgressiveLookup`] of this [`Grouping`].
    state: SharedState<K, V>,
}

impl<K, V> Grouping<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: 'static,
{
    /// Returns the key of this [`Grouping`].
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns an iterator over the values of this [`Grouping`].
    #[inline]
    pub fn iter(&self) -> GroupingIter<K, V>
    where
        V: Clone,
    {
        GroupingIter {
            group: self.clone(),
            index: 0,
        }
    }

    /// Indicates whether this [`Grouping`] contains the provided value,
    /// pulling until it's found.
    pub fn contains(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        let mut state = self.state.borrow_mut();
        if state.values(&self.key).contains(value) {
            return true;
        }
        while let Some(key) = state.advance() {
            if key == self.key && state.values(&key).last() == Some(value) {
                return true;
            }
        }
        false
    }

    /// Returns count of values, pulling everything from the source.
    pub fn count(&self) -> usize {
        let mut state = self.state.borrow_mut();
        state.materialize();
        state.values(&self.key).len()
    }

    /// Collects all the values into a [`Vec`], pulling everything from the
    /// source.
    pub fn to_vec(&self) -> Vec<V>
    where
        V: Clone,
    {
        let mut state = self.state.borrow_mut();
        state.materialize();
        state.values(&self.key).to_vec()
    }

    /// Returns the value with the provided index, pulling as much as needed.
    fn value_at(&self, index: usize) -> Option<V>
    where
        V: Clone,
    {
        let mut state = self.state.borrow_mut();
        while state.values(&self.key).len() <= index {
            let _ = state.advance()?;
        }
        state.values(&self.key).get(index).cloned()
    }
}

impl<K: Clone, V> Clone for Grouping<K, V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            state: Rc::clone(&self.state),
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Grouping<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grouping").field("key", &self.key).finish()
    }
}

impl<K, V> IntoIterator for &Grouping<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: Clone + 'static,
{
    type IntoIter = GroupingIter<K, V>;
    type Item = V;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the values of a [`Grouping`].
pub struct GroupingIter<K, V> {
    /// Iterated [`Grouping`].
    group: Grouping<K, V>,

    /// Index of the next yielded value.
    index: usize,
}

impl<K, V> Iterator for GroupingIter<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: Clone + 'static,
{
    type Item = V;

    fn next(&mut self) -> Option<V> {
        let value = self.group.value_at(self.index)?;
        self.index += 1;
        Some(value)
    }
}

impl<K, V> FusedIterator for GroupingIter<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: Clone + 'static,
{
}

impl<K: fmt::Debug, V> fmt::Debug for GroupingIter<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupingIter")
            .field("group", &self.group)
            .field("index", &self.index)
            .finish()
    }
}
