//! Pull-based, closeable sources of items which broadcast everything they
//! produce.
//!
//! # Lifecycle
//!
//! Every progressor starts open, bound to its source. It becomes closed
//! permanently:
//! - on the first unsuccessful pull from the source;
//! - on an explicit [`Progressor::close`] or [`Progressor::abort`] call;
//! - when it's dropped.
//!
//! Once closed, a progressor never touches its source again (the source is
//! dropped right away) and every [`TryTake::try_take`] call returns [`None`].
//! Subscribers are notified about closing exactly once.
//!
//! # Concurrency
//!
//! Progressors are single-consumer: [`TryTake::try_take`] requires `&mut self`,
//! so pulling from the same progressor concurrently needs external
//! synchronization. Only the subscribers set ([`ProxyObservable`]) is
//! synchronized internally.

mod source;

use std::{fmt, mem};

use futures::channel::mpsc;

use crate::{
    log::prelude::*,
    observer::{Notification, Observer, Subscription},
    Error, ProxyObservable,
};

/// Pull contract of all the progressors.
///
/// [`Some`] is returned while the source has more items. The first [`None`]
/// closes the implementor permanently.
///
/// Implementors are not re-entrant: an [`Observer`] notified from inside
/// [`TryTake::try_take`] must not pull from the same implementor. Sharing one
/// via `Rc<RefCell<_>>` turns such an attempt into a `BorrowMutError` panic.
pub trait TryTake {
    /// Type of the pulled items.
    type Item;

    /// Pulls the next item, if any.
    fn try_take(&mut self) -> Option<Self::Item>;

    /// Closes this source permanently. Idempotent.
    fn close(&mut self);

    /// Indicates whether this source is closed.
    fn is_closed(&self) -> bool;
}

/// Pull function of an open progressor.
type Pull<T> = Box<dyn FnMut() -> Option<T>>;

/// State of a [`ProgressorBase`].
enum State<T> {
    /// Source may still have items.
    Open(Pull<T>),

    /// Source is exhausted or was closed.
    Closed,
}

/// Reason of a [`ProgressorBase`] closing.
#[derive(Debug)]
enum Termination {
    /// Source has no more items.
    Exhausted,

    /// [`ProgressorBase::close`] was called.
    Closed,

    /// [`ProgressorBase::abort`] was called.
    Aborted(Error),

    /// [`ProgressorBase`] was dropped while open.
    Dropped,
}

/// Close-once lifecycle and subscriptions shared by [`Progressor`] and
/// [`SilentProgressor`].
pub struct ProgressorBase<T> {
    /// Current state of this [`ProgressorBase`].
    state: State<T>,

    /// Subscribers of this [`ProgressorBase`].
    proxy: ProxyObservable<T>,
}

impl<T> ProgressorBase<T> {
    /// Creates new open [`ProgressorBase`] pulling items with the provided
    /// function.
    pub fn new<F>(pull: F) -> Self
    where
        F: FnMut() -> Option<T> + 'static,
    {
        Self {
            state: State::Open(Box::new(pull)),
            proxy: ProxyObservable::new(),
        }
    }

    /// Pulls the next item from the source, closing this [`ProgressorBase`]
    /// if there is none.
    fn pull(&mut self) -> Option<T> {
        let item = match &mut self.state {
            State::Open(pull) => pull(),
            State::Closed => return None,
        };
        if item.is_none() {
            self.terminate(Termination::Exhausted);
        }
        item
    }

    /// Moves this [`ProgressorBase`] to the [`State::Closed`] and notifies the
    /// subscribers, unless it's closed already.
    fn terminate(&mut self, reason: Termination) {
        let pull = match mem::replace(&mut self.state, State::Closed) {
            State::Open(pull) => pull,
            State::Closed => return,
        };
        drop(pull);
        trace!("Progressor closed: {:?}", reason);

        match reason {
            Termination::Aborted(err) => self.proxy.on_error(&err),
            Termination::Exhausted
            | Termination::Closed
            | Termination::Dropped => self.proxy.on_completed(),
        }
    }

    /// Closes this [`ProgressorBase`] and notifies the subscribers about
    /// completion. Does nothing if it's closed already.
    #[inline]
    pub fn close(&mut self) {
        self.terminate(Termination::Closed);
    }

    /// Closes this [`ProgressorBase`] and notifies the subscribers about the
    /// provided [`Error`] instead of completion. Does nothing if it's closed
    /// already.
    #[inline]
    pub fn abort(&mut self, error: Error) {
        self.terminate(Termination::Aborted(error));
    }

    /// Indicates whether this [`ProgressorBase`] is closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Subscribes the provided [`Observer`] to this [`ProgressorBase`].
    ///
    /// Nothing is replayed: an [`Observer`] subscribed to a closed
    /// [`ProgressorBase`] is dropped at once, and the returned
    /// [`Subscription`] is inactive.
    pub fn subscribe<O>(&self, observer: O) -> Subscription
    where
        O: Observer<T> + 'static,
        T: 'static,
    {
        self.proxy.subscribe(observer)
    }

    /// Subscribes to this [`ProgressorBase`] with an unbounded channel.
    pub fn subscribe_stream(&self) -> mpsc::UnboundedReceiver<Notification<T>>
    where
        T: Clone + Send + 'static,
    {
        self.proxy.subscribe_stream()
    }

    /// Returns [`ProxyObservable`] notifying the subscribers of this
    /// [`ProgressorBase`].
    #[inline]
    pub(crate) fn proxy(&self) -> &ProxyObservable<T> {
        &self.proxy
    }
}

impl<T> TryTake for ProgressorBase<T> {
    type Item = T;

    /// Pulls the next item without notifying the subscribers about it.
    #[inline]
    fn try_take(&mut self) -> Option<T> {
        self.pull()
    }

    #[inline]
    fn close(&mut self) {
        ProgressorBase::close(self);
    }

    #[inline]
    fn is_closed(&self) -> bool {
        ProgressorBase::is_closed(self)
    }
}

impl<T> Drop for ProgressorBase<T> {
    /// Notifies the subscribers about completion, if this [`ProgressorBase`]
    /// is still open.
    fn drop(&mut self) {
        self.terminate(Termination::Dropped);
    }
}

impl<T> fmt::Debug for ProgressorBase<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressorBase")
            .field("closed", &self.is_closed())
            .field("proxy", &self.proxy)
            .finish()
    }
}

/// Progressor which re-broadcasts every pulled item to its subscribers.
///
/// Subscribers are notified synchronously inside [`Progressor::try_take`],
/// before the item is returned to the caller.
///
/// ```
/// use futures::{executor, StreamExt as _};
/// use medea_progressive::{Notification, Progressor};
///
/// let mut progressor = Progressor::new(vec![10, 20, 30]);
/// let notifications = progressor.subscribe_stream();
///
/// while progressor.try_take().is_some() {}
///
/// let received: Vec<_> = executor::block_on(notifications.collect());
/// assert_eq!(
///     received,
///     vec![
///         Notification::Next(10),
///         Notification::Next(20),
///         Notification::Next(30),
///         Notification::Completed,
///     ],
/// );
/// ```
#[derive(Debug)]
pub struct Progressor<T>(ProgressorBase<T>);

impl<T: 'static> Progressor<T> {
    /// Creates new [`Progressor`] pulling items with the provided function.
    #[inline]
    pub fn from_fn<F>(pull: F) -> Self
    where
        F: FnMut() -> Option<T> + 'static,
    {
        Self(ProgressorBase::new(pull))
    }

    /// Pulls the next item and notifies the subscribers about it.
    ///
    /// Returns [`None`] once the source is exhausted, and keeps returning
    /// [`None`] afterwards without touching the source.
    pub fn try_take(&mut self) -> Option<T> {
        let item = self.0.pull()?;
        self.0.proxy.on_next(&item);
        Some(item)
    }

    /// Returns an iterator pulling items from this [`Progressor`].
    pub fn iter(&mut self) -> impl Iterator<Item = T> + '_ {
        std::iter::from_fn(move || self.try_take())
    }
}

impl<T> Progressor<T> {
    /// Closes this [`Progressor`] and notifies the subscribers about
    /// completion. Idempotent.
    #[inline]
    pub fn close(&mut self) {
        self.0.close();
    }

    /// Closes this [`Progressor`] and notifies the subscribers about the
    /// provided [`Error`]. Does nothing if it's closed already.
    #[inline]
    pub fn abort(&mut self, error: Error) {
        self.0.abort(error);
    }

    /// Indicates whether this [`Progressor`] is closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }

    /// Subscribes the provided [`Observer`] to the items of this
    /// [`Progressor`] and its closing.
    #[inline]
    pub fn subscribe<O>(&self, observer: O) -> Subscription
    where
        O: Observer<T> + 'static,
        T: 'static,
    {
        self.0.subscribe(observer)
    }

    /// Subscribes to this [`Progressor`] with an unbounded channel.
    #[inline]
    pub fn subscribe_stream(&self) -> mpsc::UnboundedReceiver<Notification<T>>
    where
        T: Clone + Send + 'static,
    {
        self.0.subscribe_stream()
    }

    #[inline]
    pub(crate) fn proxy(&self) -> &ProxyObservable<T> {
        self.0.proxy()
    }
}

impl<T: 'static> TryTake for Progressor<T> {
    type Item = T;

    #[inline]
    fn try_take(&mut self) -> Option<T> {
        Progressor::try_take(self)
    }

    #[inline]
    fn close(&mut self) {
        Progressor::close(self);
    }

    #[inline]
    fn is_closed(&self) -> bool {
        Progressor::is_closed(self)
    }
}

impl<T: 'static> IntoIterator for Progressor<T> {
    type IntoIter = IntoIter<T>;
    type Item = T;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self)
    }
}

/// Owning iterator over the items of a [`Progressor`].
#[derive(Debug)]
pub struct IntoIter<T>(Progressor<T>);

impl<T: 'static> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.0.try_take()
    }
}

impl<T: 'static> std::iter::FusedIterator for IntoIter<T> {}

/// Progressor which doesn't broadcast the pulled items.
///
/// Its subscribers are only notified about its closing.
#[derive(Debug)]
pub struct SilentProgressor<T>(ProgressorBase<T>);

impl<T: 'static> SilentProgressor<T> {
    /// Creates new [`SilentProgressor`] over the provided items.
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        let mut iter = items.into_iter();
        Self::from_fn(move || iter.next())
    }

    /// Creates new [`SilentProgressor`] pulling items with the provided
    /// function.
    #[inline]
    pub fn from_fn<F>(pull: F) -> Self
    where
        F: FnMut() -> Option<T> + 'static,
    {
        Self(ProgressorBase::new(pull))
    }

    /// Subscribes the provided [`Observer`] to the closing of this
    /// [`SilentProgressor`].
    #[inline]
    pub fn subscribe<O>(&self, observer: O) -> Subscription
    where
        O: Observer<T> + 'static,
    {
        self.0.subscribe(observer)
    }

    /// Closes this [`SilentProgressor`] and notifies the subscribers about
    /// the provided [`Error`]. Does nothing if it's closed already.
    #[inline]
    pub fn abort(&mut self, error: Error) {
        self.0.abort(error);
    }
}

impl<T: 'static> TryTake for SilentProgressor<T> {
    type Item = T;

    #[inline]
    fn try_take(&mut self) -> Option<T> {
        self.0.try_take()
    }

    #[inline]
    fn close(&mut self) {
        TryTake::close(&mut self.0);
    }

    #[inline]
    fn is_closed(&self) -> bool {
        TryTake::is_closed(&self.0)
    }
}
