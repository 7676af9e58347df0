//! Progressive collection with positional access.

use std::ops::Deref;

use crate::{Error, Progressor};

use super::ProgressiveCollection;

/// [`ProgressiveCollection`] keeping every pulled item, in the pull order.
///
/// Positional access pulls just enough items to reach the requested position.
#[derive(Debug)]
pub struct ProgressiveList<T>(ProgressiveCollection<T>);

impl<T: 'static> ProgressiveList<T> {
    /// Creates new [`ProgressiveList`] over the provided items.
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        Self(ProgressiveCollection::new(items))
    }

    /// Creates new [`ProgressiveList`] caching the items of the provided
    /// [`Progressor`].
    #[inline]
    pub fn from_progressor(progressor: Progressor<T>) -> Self {
        Self(ProgressiveCollection::from_progressor(progressor))
    }

    /// Returns the item with the provided `index`, if there is one.
    #[inline]
    pub fn get(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.0.item_at(index)
    }

    /// Returns the item with the provided `index`.
    ///
    /// # Errors
    ///
    /// With [`Error::IndexOutOfRange`] if the source is exhausted before
    /// reaching the `index`.
    pub fn at(&self, index: usize) -> Result<T, Error>
    where
        T: Clone,
    {
        self.get(index).ok_or_else(|| Error::IndexOutOfRange {
            index,
            len: self.0.cached_len(),
        })
    }

    /// Returns index of the first occurrence of the provided item, pulling
    /// until it's found.
    pub fn index_of(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        let mut from = 0;
        self.0.pull_until(|cache: &Vec<T>| {
            let found = cache[from..]
                .iter()
                .position(|cached| cached == item)
                .map(|pos| from + pos);
            from = cache.len();
            found
        })
    }

    /// Returns the first item, pulling one item at most.
    #[inline]
    pub fn first(&self) -> Option<T>
    where
        T: Clone,
    {
        self.get(0)
    }

    /// Returns the last item, pulling everything from the source.
    pub fn last(&self) -> Option<T>
    where
        T: Clone,
    {
        let last = self.0.count().checked_sub(1)?;
        self.get(last)
    }
}

impl<T> Deref for ProgressiveList<T> {
    type Target = ProgressiveCollection<T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a, T: Clone + 'static> IntoIterator for &'a ProgressiveList<T> {
    type IntoIter = super::Iter<'a, T, Vec<T>>;
    type Item = T;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod progressive_list_spec {
    use std::{cell::Cell, rc::Rc};

    use crate::{Error, Progressor};

    use super::ProgressiveList;

    #[test]
    fn get_pulls_just_enough() {
        let pulls = Rc::new(Cell::new(0));
        let list = {
            let pulls = Rc::clone(&pulls);
            let mut items = vec!['a', 'b', 'c', 'd'].into_iter();
            ProgressiveList::from_progressor(Progressor::from_fn(move || {
                pulls.set(pulls.get() + 1);
                items.next()
            }))
        };

        assert_eq!(list.get(1), Some('b'));
        assert_eq!(pulls.get(), 2);
        assert_eq!(list.first(), Some('a'));
        assert_eq!(pulls.get(), 2);
        assert_eq!(list.get(3), Some('d'));
        assert_eq!(pulls.get(), 4);
        assert_eq!(list.get(4), None);
        assert!(list.is_materialized());
    }

    #[test]
    fn at_fails_past_the_end() {
        let list = ProgressiveList::new(vec![1, 2, 3]);

        assert_eq!(list.at(2), Ok(3));
        assert_eq!(
            list.at(5),
            Err(Error::IndexOutOfRange { index: 5, len: 3 }),
        );
    }

    #[test]
    fn index_of_finds_first_occurrence() {
        let list = ProgressiveList::new(vec![4, 7, 4, 9]);

        assert_eq!(list.index_of(&4), Some(0));
        assert_eq!(list.index_of(&7), Some(1));
        assert_eq!(list.cached_len(), 2);
        assert_eq!(list.index_of(&9), Some(3));
        assert_eq!(list.index_of(&5), None);
    }

    #[test]
    fn keeps_duplicates() {
        let list = ProgressiveList::new(vec![1, 1, 2]);

        assert_eq!(list.last(), Some(2));
        assert_eq!(list.count(), 3);
        assert_eq!((&list).into_iter().collect::<Vec<_>>(), vec![1, 1, 2]);
    }

    #[test]
    fn empty_list_has_no_ends() {
        let list = ProgressiveList::<u8>::new(vec![]);

        assert_eq!(list.first(), None);
        assert_eq!(list.last(), None);
        assert!(list.is_empty());
    }
}
