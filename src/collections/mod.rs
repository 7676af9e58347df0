//! Read-only collections lazily materialized from [`Progressor`]s.
//!
//! Every progressive collection owns one [`Progressor`] and a cache of the
//! items already pulled from it. Operations look into the cache first and
//! pull further only when the cache can't answer them. Each pulled item is
//! cached, so the [`Progressor`] is never asked for the same item twice.
//!
//! Progressive collections are single-threaded. An [`Observer`] subscribed to
//! a progressive collection is notified while the collection is busy pulling,
//! so it must not access the same collection.
//!
//! [`Observer`]: crate::Observer

pub mod dictionary;
pub mod list;
pub mod lookup;
pub mod set;

use std::{cell::RefCell, fmt, iter::FusedIterator};

use futures::channel::mpsc;

use crate::{
    observer::{Notification, Observer, Subscription},
    Error, Progressor, ProxyObservable,
};

#[doc(inline)]
pub use self::{
    dictionary::ProgressiveDictionary,
    list::ProgressiveList,
    lookup::{Grouping, ProgressiveLookup},
    set::ProgressiveSet,
};

/// Backing store of a [`ProgressiveCollection`].
pub trait Cache<T>: Default {
    /// Returns count of the cached items.
    fn len(&self) -> usize;

    /// Indicates whether nothing is cached yet.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached item with the provided index.
    ///
    /// Indices follow the order in which items were cached.
    fn get(&self, index: usize) -> Option<&T>;

    /// Indicates whether the provided item is cached.
    fn contains(&self, item: &T) -> bool
    where
        T: PartialEq;

    /// Offers the pulled item to this [`Cache`].
    ///
    /// Returns `false` if the item was refused, which makes the pulling
    /// collection skip it.
    fn offer(&mut self, item: T) -> bool;
}

impl<T> Cache<T> for Vec<T> {
    #[inline]
    fn len(&self) -> usize {
        self.len()
    }

    #[inline]
    fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|cached| cached == item)
    }

    #[inline]
    fn offer(&mut self, item: T) -> bool {
        self.push(item);
        true
    }
}

/// Cache together with the [`Progressor`] filling it.
struct Inner<T, C> {
    /// Items pulled from the [`Inner::progressor`] so far.
    cache: C,

    /// Source of the items.
    progressor: Progressor<T>,
}

impl<T: 'static, C: Cache<T>> Inner<T, C> {
    /// Pulls items until one of them gets cached.
    ///
    /// Returns `false` if the [`Inner::progressor`] is exhausted.
    fn advance(&mut self) -> bool {
        while let Some(item) = self.progressor.try_take() {
            if self.cache.offer(item) {
                return true;
            }
        }
        false
    }

    /// Pulls everything left in the [`Inner::progressor`].
    fn materialize(&mut self) {
        while self.advance() {}
    }

    /// Makes sure the item with the provided index is cached, pulling as
    /// much as needed.
    fn reach(&mut self, index: usize) -> Option<&T> {
        while self.cache.len() <= index {
            if !self.advance() {
                return None;
            }
        }
        self.cache.get(index)
    }

    /// Returns the last cached item.
    fn last_cached(&self) -> Option<&T> {
        self.cache
            .len()
            .checked_sub(1)
            .and_then(|last| self.cache.get(last))
    }
}

/// Read-only collection lazily materialized from a [`Progressor`].
///
/// ```
/// use medea_progressive::ProgressiveCollection;
///
/// let collection = ProgressiveCollection::<_>::new(vec![1, 2, 3]);
///
/// // Only the first item is pulled here.
/// assert_eq!(collection.iter().next(), Some(1));
/// assert_eq!(collection.cached_len(), 1);
///
/// // Pulls the rest.
/// assert_eq!(collection.count(), 3);
/// assert!(collection.is_materialized());
/// ```
pub struct ProgressiveCollection<T, C = Vec<T>> {
    /// Cache and its [`Progressor`].
    inner: RefCell<Inner<T, C>>,

    /// Subscribers of the [`Progressor`].
    proxy: ProxyObservable<T>,
}

impl<T, C> ProgressiveCollection<T, C>
where
    T: 'static,
    C: Cache<T>,
{
    /// Creates new [`ProgressiveCollection`] over the provided items.
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        Self::from_progressor(Progressor::new(items))
    }

    /// Creates new [`ProgressiveCollection`] caching the items of the
    /// provided [`Progressor`].
    pub fn from_progressor(progressor: Progressor<T>) -> Self {
        Self {
            proxy: progressor.proxy().clone(),
            inner: RefCell::new(Inner {
                cache: C::default(),
                progressor,
            }),
        }
    }

    /// Returns an iterator over the items of this [`ProgressiveCollection`].
    ///
    /// Cached items are yielded first, then the [`Progressor`] is pulled
    /// further, caching every new item before yielding it.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T, C>
    where
        T: Clone,
    {
        Iter {
            collection: self,
            index: 0,
        }
    }

    /// Indicates whether this [`ProgressiveCollection`] contains the provided
    /// item, pulling until it's found or the [`Progressor`] is exhausted.
    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        let mut inner = self.inner.borrow_mut();
        if inner.cache.contains(item) {
            return true;
        }
        while inner.advance() {
            if inner.last_cached() == Some(item) {
                return true;
            }
        }
        false
    }

    /// Returns count of items, pulling everything from the [`Progressor`].
    pub fn count(&self) -> usize {
        let mut inner = self.inner.borrow_mut();
        inner.materialize();
        inner.cache.len()
    }

    /// Alias of the [`ProgressiveCollection::count`].
    #[inline]
    pub fn len(&self) -> usize {
        self.count()
    }

    /// Indicates whether this [`ProgressiveCollection`] has no items.
    ///
    /// Pulls one item at most.
    pub fn is_empty(&self) -> bool {
        let mut inner = self.inner.borrow_mut();
        inner.cache.is_empty() && !inner.advance()
    }

    /// Returns count of the items cached so far, without pulling.
    pub fn cached_len(&self) -> usize {
        self.inner.borrow().cache.len()
    }

    /// Indicates whether everything has been pulled from the [`Progressor`].
    pub fn is_materialized(&self) -> bool {
        self.inner.borrow().progressor.is_closed()
    }

    /// Collects all the items into a [`Vec`], pulling everything from the
    /// [`Progressor`].
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut inner = self.inner.borrow_mut();
        inner.materialize();
        (0..inner.cache.len())
            .filter_map(|i| inner.cache.get(i).cloned())
            .collect()
    }

    /// Copies all the items into the `target` slice starting from `offset`,
    /// pulling everything from the [`Progressor`].
    ///
    /// Returns count of the copied items.
    ///
    /// # Errors
    ///
    /// With [`Error::InsufficientSpace`] if the items don't fit into the
    /// `target` slice. Nothing is copied in this case.
    pub fn copy_to(&self, target: &mut [T], offset: usize) -> Result<usize, Error>
    where
        T: Clone,
    {
        let mut inner = self.inner.borrow_mut();
        inner.materialize();

        let required = inner.cache.len();
        let available = target.len().saturating_sub(offset);
        if required > available {
            return Err(Error::InsufficientSpace {
                required,
                available,
            });
        }
        for (i, slot) in target.iter_mut().skip(offset).enumerate() {
            match inner.cache.get(i) {
                Some(item) => *slot = item.clone(),
                None => break,
            }
        }
        Ok(required)
    }

    /// Subscribes the provided [`Observer`] to the items pulled by this
    /// [`ProgressiveCollection`].
    #[inline]
    pub fn subscribe<O>(&self, observer: O) -> Subscription
    where
        O: Observer<T> + 'static,
    {
        self.proxy.subscribe(observer)
    }

    /// Subscribes to the items pulled by this [`ProgressiveCollection`] with
    /// an unbounded channel.
    #[inline]
    pub fn subscribe_stream(&self) -> mpsc::UnboundedReceiver<Notification<T>>
    where
        T: Clone + Send,
    {
        self.proxy.subscribe_stream()
    }

    /// Always fails, as [`ProgressiveCollection`] is read-only.
    ///
    /// # Errors
    ///
    /// Always with [`Error::NotSupported`].
    #[inline]
    pub fn add(&self, _: T) -> Result<(), Error> {
        Err(Error::NotSupported("add"))
    }

    /// Always fails, as [`ProgressiveCollection`] is read-only.
    ///
    /// # Errors
    ///
    /// Always with [`Error::NotSupported`].
    #[inline]
    pub fn remove(&self, _: &T) -> Result<bool, Error> {
        Err(Error::NotSupported("remove"))
    }

    /// Always fails, as [`ProgressiveCollection`] is read-only.
    ///
    /// # Errors
    ///
    /// Always with [`Error::NotSupported`].
    #[inline]
    pub fn clear(&self) -> Result<(), Error> {
        Err(Error::NotSupported("clear"))
    }

    /// Returns the item with the provided index, pulling as much as needed.
    pub(crate) fn item_at(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.inner.borrow_mut().reach(index).cloned()
    }

    /// Looks for an answer with the provided `find` function, pulling one more
    /// cached item after each failed attempt.
    pub(crate) fn pull_until<R, F>(&self, mut find: F) -> Option<R>
    where
        F: FnMut(&C) -> Option<R>,
    {
        let mut inner = self.inner.borrow_mut();
        loop {
            if let Some(found) = find(&inner.cache) {
                return Some(found);
            }
            if !inner.advance() {
                return None;
            }
        }
    }
}

impl<T, C> fmt::Debug for ProgressiveCollection<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("ProgressiveCollection");
        if let Ok(inner) = self.inner.try_borrow() {
            let _ = dbg.field("materialized", &inner.progressor.is_closed());
        }
        dbg.field("proxy", &self.proxy).finish()
    }
}

impl<'a, T, C> IntoIterator for &'a ProgressiveCollection<T, C>
where
    T: Clone + 'static,
    C: Cache<T>,
{
    type IntoIter = Iter<'a, T, C>;
    type Item = T;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the items of a [`ProgressiveCollection`].
///
/// Several [`Iter`]s may be alive at the same time, sharing the cache.
pub struct Iter<'a, T, C> {
    /// Iterated [`ProgressiveCollection`].
    collection: &'a ProgressiveCollection<T, C>,

    /// Index of the next yielded item.
    index: usize,
}

impl<'a, T, C> Iterator for Iter<'a, T, C>
where
    T: Clone + 'static,
    C: Cache<T>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let item = self.collection.item_at(self.index)?;
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let cached = self.collection.cached_len().saturating_sub(self.index);
        if self.collection.is_materialized() {
            (cached, Some(cached))
        } else {
            (cached, None)
        }
    }
}

impl<'a, T, C> FusedIterator for Iter<'a, T, C>
where
    T: Clone + 'static,
    C: Cache<T>,
{
}

impl<'a, T, C> fmt::Debug for Iter<'a, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").field("index", &self.index).finish()
    }
}

#[cfg(test)]
mod progressive_collection_spec {
    use std::{cell::Cell, rc::Rc};

    use futures::{executor, StreamExt as _};

    use crate::{
        observer::{self, Notification},
        Error, Progressor,
    };

    use super::ProgressiveCollection;

    /// Creates [`ProgressiveCollection`] over the provided items counting the
    /// pulls from its source.
    fn counted(items: Vec<u32>) -> (ProgressiveCollection<u32>, Rc<Cell<usize>>) {
        let pulls = Rc::new(Cell::new(0));
        let collection = {
            let pulls = Rc::clone(&pulls);
            let mut items = items.into_iter();
            ProgressiveCollection::from_progressor(Progressor::from_fn(
                move || {
                    pulls.set(pulls.get() + 1);
                    items.next()
                },
            ))
        };
        (collection, pulls)
    }

    #[test]
    fn second_enumeration_uses_cache() {
        let (collection, pulls) = counted(vec![5, 3, 5, 1]);

        let first: Vec<_> = collection.iter().collect();
        let pulled = pulls.get();
        let second: Vec<_> = collection.iter().collect();

        assert_eq!(first, vec![5, 3, 5, 1]);
        assert_eq!(first, second);
        assert_eq!(pulls.get(), pulled);
    }

    #[test]
    fn enumeration_continues_after_cached_items() {
        let (collection, pulls) = counted(vec![1, 2, 3, 4]);

        assert_eq!(collection.iter().take(2).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(pulls.get(), 2);
        assert_eq!(collection.cached_len(), 2);

        assert_eq!(collection.iter().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(pulls.get(), 5);
    }

    #[test]
    fn interleaved_iterators_share_cache() {
        let (collection, pulls) = counted(vec![1, 2, 3]);
        let mut a = collection.iter();
        let mut b = collection.iter();

        assert_eq!(a.next(), Some(1));
        assert_eq!(b.next(), Some(1));
        assert_eq!(b.next(), Some(2));
        assert_eq!(a.next(), Some(2));
        assert_eq!(a.next(), Some(3));
        assert_eq!(b.next(), Some(3));
        assert_eq!(a.next(), None);
        assert_eq!(b.next(), None);
        assert_eq!(pulls.get(), 4);
    }

    #[test]
    fn count_completes_materialization() {
        let (collection, _) = counted(vec![1, 2, 3, 4, 5]);

        let _ = collection.iter().take(2).count();
        assert!(!collection.is_materialized());

        assert_eq!(collection.count(), 5);
        assert!(collection.is_materialized());
        assert_eq!(collection.len(), 5);
    }

    #[test]
    fn contains_pulls_only_until_found() {
        let (collection, pulls) = counted(vec![1, 2, 3, 4]);

        assert!(collection.contains(&2));
        assert_eq!(pulls.get(), 2);
        assert!(collection.contains(&1));
        assert_eq!(pulls.get(), 2);
        assert!(!collection.contains(&7));
        assert!(collection.is_materialized());
    }

    #[test]
    fn is_empty_pulls_one_item_at_most() {
        let (collection, pulls) = counted(vec![1, 2]);
        assert!(!collection.is_empty());
        assert_eq!(pulls.get(), 1);

        let (empty, _) = counted(vec![]);
        assert!(empty.is_empty());
    }

    #[test]
    fn copies_into_slice() {
        let collection = ProgressiveCollection::<_>::new(vec![7, 8]);
        let mut target = [0; 4];

        assert_eq!(collection.copy_to(&mut target, 1), Ok(2));
        assert_eq!(target, [0, 7, 8, 0]);
        assert_eq!(
            collection.copy_to(&mut target, 3),
            Err(Error::InsufficientSpace {
                required: 2,
                available: 1,
            }),
        );
        assert_eq!(
            collection.copy_to(&mut target, 9),
            Err(Error::InsufficientSpace {
                required: 2,
                available: 0,
            }),
        );
    }

    #[test]
    fn rejects_mutations() {
        let collection = ProgressiveCollection::<_>::new(vec![1]);

        assert_eq!(collection.add(2), Err(Error::NotSupported("add")));
        assert_eq!(collection.remove(&1), Err(Error::NotSupported("remove")));
        assert_eq!(collection.clear(), Err(Error::NotSupported("clear")));
        assert_eq!(collection.to_vec(), vec![1]);
    }

    #[test]
    fn subscribers_see_newly_pulled_items() {
        let collection = ProgressiveCollection::<_>::new(vec!['a', 'b']);
        assert_eq!(collection.iter().next(), Some('a'));

        let rx = collection.subscribe_stream();
        assert_eq!(collection.to_vec(), vec!['a', 'b']);
        assert_eq!(collection.to_vec(), vec!['a', 'b']);

        drop(collection);
        let received: Vec<_> = executor::block_on(rx.collect());
        assert_eq!(
            received,
            vec![Notification::Next('b'), Notification::Completed],
        );
    }

    #[test]
    fn materialized_collection_releases_new_subscribers() {
        let collection = ProgressiveCollection::<_>::new(vec![1, 2]);
        assert_eq!(collection.count(), 2);

        let sub = collection.subscribe(observer::from_fn(|_: &i32| {}));
        let rx = collection.subscribe_stream();

        assert!(!sub.is_active());
        let received: Vec<_> = executor::block_on(rx.collect());
        assert!(received.is_empty());
        assert_eq!(collection.to_vec(), vec![1, 2]);
    }
}
