//! Composition of progressors.
//!
//! [`ProgressorExt`] is implemented for every [`TryTake`] source and builds a
//! new [`Progressor`] on top of it. The new [`Progressor`] has its own
//! subscribers, while the wrapped one keeps notifying its own.
//!
//! ```
//! use medea_progressive::{Progressor, ProgressorExt as _};
//!
//! let mut progressor = Progressor::new(vec![3, 1, 4, 1, 5, 9, 2, 6])
//!     .filter(|n| n % 2 == 1)
//!     .distinct()
//!     .convert(|n| n * 10);
//!
//! let items: Vec<_> = progressor.iter().collect();
//! assert_eq!(items, vec![30, 10, 50, 90]);
//! ```

use std::{collections::HashSet, hash::Hash};

use crate::{Progressor, TryTake};

/// Extension trait composing progressors.
pub trait ProgressorExt: TryTake + Sized + 'static {
    /// Creates [`Progressor`] yielding only the items satisfying the
    /// `predicate`.
    ///
    /// Items are pulled until one passes the `predicate` or the wrapped source
    /// is exhausted.
    fn filter<F>(mut self, mut predicate: F) -> Progressor<Self::Item>
    where
        F: FnMut(&Self::Item) -> bool + 'static,
        Self::Item: 'static,
    {
        Progressor::from_fn(move || loop {
            let item = self.try_take()?;
            if predicate(&item) {
                return Some(item);
            }
        })
    }

    /// Creates [`Progressor`] yielding the items converted by the
    /// `converter`.
    fn convert<U, F>(mut self, mut converter: F) -> Progressor<U>
    where
        F: FnMut(Self::Item) -> U + 'static,
        U: 'static,
    {
        Progressor::from_fn(move || self.try_take().map(&mut converter))
    }

    /// Creates [`Progressor`] yielding the items satisfying the `predicate`
    /// converted by the `converter`.
    fn filter_convert<U, P, F>(
        mut self,
        mut predicate: P,
        mut converter: F,
    ) -> Progressor<U>
    where
        P: FnMut(&Self::Item) -> bool + 'static,
        F: FnMut(Self::Item) -> U + 'static,
        U: 'static,
    {
        Progressor::from_fn(move || loop {
            let item = self.try_take()?;
            if predicate(&item) {
                return Some(converter(item));
            }
        })
    }

    /// Creates [`Progressor`] skipping the items which have been yielded
    /// already.
    fn distinct(self) -> Progressor<Self::Item>
    where
        Self::Item: Clone + Eq + Hash + 'static,
    {
        self.distinct_by(Clone::clone)
    }

    /// Creates [`Progressor`] skipping the items whose key, produced by the
    /// provided function, has been seen already.
    fn distinct_by<K, F>(mut self, mut key: F) -> Progressor<Self::Item>
    where
        K: Eq + Hash + 'static,
        F: FnMut(&Self::Item) -> K + 'static,
        Self::Item: 'static,
    {
        let mut seen = HashSet::new();
        Progressor::from_fn(move || loop {
            let item = self.try_take()?;
            if seen.insert(key(&item)) {
                return Some(item);
            }
        })
    }
}

impl<P> ProgressorExt for P where P: TryTake + 'static {}
