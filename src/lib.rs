//! Pull-based progressors and read-only collections lazily materialized from
//! them.
//!
//! A [`Progressor`] pulls items from its source one by one and notifies its
//! subscribers about every pulled item and about its closing. Progressive
//! collections ([`ProgressiveList`], [`ProgressiveSet`],
//! [`ProgressiveLookup`], [`ProgressiveDictionary`]) cache the pulled items,
//! so the source is pulled only as far as the asked questions require, and
//! never twice for the same item.
//!
//! ```
//! use medea_progressive::{Progressor, ProgressorExt as _, ProgressiveSet};
//!
//! let words = Progressor::new(vec!["a", "", "b", "a", "c"])
//!     .filter(|w| !w.is_empty());
//! let set = ProgressiveSet::from_progressor(words);
//!
//! assert!(set.contains(&"b"));
//! assert_eq!(set.cached_len(), 2);
//! assert_eq!(set.to_vec(), vec!["a", "b", "c"]);
//! ```

// TODO: Remove `clippy::must_use_candidate` once the issue below is resolved:
//       https://github.com/rust-lang/rust-clippy/issues/4779
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

pub mod builder;
pub mod collections;
pub mod conf;
pub mod error;
pub mod log;
pub mod observer;
pub mod progressor;
pub mod proxy;

#[doc(inline)]
pub use self::{
    builder::ProgressorExt,
    collections::{
        Grouping, ProgressiveCollection, ProgressiveDictionary,
        ProgressiveList, ProgressiveLookup, ProgressiveSet,
    },
    error::Error,
    observer::{Notification, Observer, Subscription},
    progressor::{Progressor, ProgressorBase, SilentProgressor, TryTake},
    proxy::ProxyObservable,
};
