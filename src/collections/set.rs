//! Progressive collection of distinct items.

use std::{collections::HashSet, hash::Hash, ops::Deref};

use crate::{Progressor, ProgressorExt as _};

use super::{Cache, Iter, ProgressiveCollection};

/// [`Cache`] refusing the items it holds already.
///
/// Keeps the items in the order of their first occurrence.
#[derive(Debug)]
pub struct DistinctCache<T> {
    /// Cached items in the order of their first occurrence.
    items: Vec<T>,

    /// Cached items for the membership checks.
    seen: HashSet<T>,
}

impl<T> Default for DistinctCache<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
        }
    }
}

impl<T> Cache<T> for DistinctCache<T>
where
    T: Clone + Eq + Hash,
{
    #[inline]
    fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    #[inline]
    fn contains(&self, item: &T) -> bool {
        self.seen.contains(item)
    }

    fn offer(&mut self, item: T) -> bool {
        if self.seen.contains(&item) {
            return false;
        }
        let _ = self.seen.insert(item.clone());
        self.items.push(item);
        true
    }
}

/// [`ProgressiveCollection`] yielding every distinct item once, in the order
/// of first occurrence.
///
/// ```
/// use medea_progressive::ProgressiveSet;
///
/// let set = ProgressiveSet::new(vec![1, 2, 2, 3, 1, 4]);
///
/// assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
/// assert_eq!(set.count(), 4);
/// assert!(set.contains(&2));
/// assert!(!set.contains(&5));
/// ```
#[derive(Debug)]
pub struct ProgressiveSet<T>(ProgressiveCollection<T, DistinctCache<T>>);

impl<T> ProgressiveSet<T>
where
    T: Clone + Eq + Hash + 'static,
{
    /// Creates new [`ProgressiveSet`] over the provided items.
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        Self(ProgressiveCollection::new(items))
    }

    /// Creates new [`ProgressiveSet`] caching the distinct items of the
    /// provided [`Progressor`].
    #[inline]
    pub fn from_progressor(progressor: Progressor<T>) -> Self {
        Self(ProgressiveCollection::from_progressor(progressor))
    }

    /// Creates new [`ProgressiveSet`] caching the items of the provided
    /// [`Progressor`] whose key, produced by the provided function, hasn't
    /// been seen yet.
    ///
    /// Items sharing a key with an earlier one are never cached, nor seen by
    /// the subscribers of this [`ProgressiveSet`]. Membership checks still use
    /// the equality of `T` itself.
    pub fn from_progressor_by<K, F>(progressor: Progressor<T>, key: F) -> Self
    where
        K: Eq + Hash + 'static,
        F: FnMut(&T) -> K + 'static,
    {
        Self::from_progressor(progressor.distinct_by(key))
    }

    /// Indicates whether every item of this [`ProgressiveSet`] is in `other`.
    pub fn is_subset_of<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        let other: HashSet<_> = other.into_iter().collect();
        self.iter().all(|item| other.contains(&item))
    }

    /// Indicates whether every item of `other` is in this [`ProgressiveSet`].
    ///
    /// Pulls only until a missing item is found.
    pub fn is_superset_of<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        other.into_iter().all(|item| self.contains(&item))
    }

    /// Indicates whether this [`ProgressiveSet`] is a subset of `other` and
    /// `other` has some more items.
    pub fn is_proper_subset_of<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        let other: HashSet<_> = other.into_iter().collect();
        self.iter().all(|item| other.contains(&item))
            && other.len() > self.count()
    }

    /// Indicates whether this [`ProgressiveSet`] is a superset of `other` and
    /// has some more items.
    pub fn is_proper_superset_of<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        let other: HashSet<_> = other.into_iter().collect();
        other.iter().all(|item| self.contains(item))
            && self.count() > other.len()
    }

    /// Indicates whether this [`ProgressiveSet`] and `other` have at least
    /// one common item.
    ///
    /// Pulls only until a common item is found.
    pub fn overlaps<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        other.into_iter().any(|item| self.contains(&item))
    }

    /// Indicates whether this [`ProgressiveSet`] and `other` have the same
    /// distinct items.
    pub fn set_equals<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        let other: HashSet<_> = other.into_iter().collect();
        other.iter().all(|item| self.contains(item))
            && self.count() == other.len()
    }
}

impl<T> Deref for ProgressiveSet<T> {
    type Target = ProgressiveCollection<T, DistinctCache<T>>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a, T> IntoIterator for &'a ProgressiveSet<T>
where
    T: Clone + Eq + Hash + 'static,
{
    type IntoIter = Iter<'a, T, DistinctCache<T>>;
    type Item = T;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
