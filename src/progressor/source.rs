//! Construction of [`Progressor`]s from the different kinds of sources.

use futures::channel::mpsc;

use crate::{
    log::prelude::*,
    observer::{Observer, Subscription},
    Error, ProxyObservable,
};

use super::{Progressor, TryTake};

impl<T: 'static> Progressor<T> {
    /// Creates new [`Progressor`] advancing the iterator of the provided
    /// items.
    ///
    /// The iterator is dropped as soon as it's exhausted.
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        let mut iter = items.into_iter();
        Self::from_fn(move || iter.next())
    }

    /// Creates new [`Progressor`] pulling the values pushed into the provided
    /// channel.
    ///
    /// Pulling never waits: if the channel is closed or has no buffered
    /// values at the moment of a pull, the [`Progressor`] is exhausted.
    pub fn from_receiver(mut rx: mpsc::UnboundedReceiver<T>) -> Self {
        Self::from_fn(move || rx.try_next().ok().flatten())
    }

    /// Creates new [`Progressor`] buffering the values pushed by the provided
    /// [`ProxyObservable`] and pulling them from the buffer.
    ///
    /// Completion or error of the [`ProxyObservable`] ends the buffer. Closing
    /// the [`Progressor`] unsubscribes it from the [`ProxyObservable`].
    ///
    /// Pulling never waits: an empty buffer exhausts the [`Progressor`] the
    /// same way as for [`Progressor::from_receiver`].
    pub fn from_observable(source: &ProxyObservable<T>) -> Self
    where
        T: Clone + Send,
    {
        let (tx, mut rx) = mpsc::unbounded();
        let subscription = Unsubscribe(Some(source.subscribe(Buffer(tx))));
        Self::from_fn(move || {
            let _ = &subscription;
            rx.try_next().ok().flatten()
        })
    }

    /// Creates new [`Progressor`] layered over the provided one.
    ///
    /// Subscribers of the `wrapped` progressor keep being notified. Closing
    /// the created [`Progressor`] closes the `wrapped` one as well.
    pub fn from_progressor<P>(mut wrapped: P) -> Self
    where
        P: TryTake<Item = T> + 'static,
    {
        Self::from_fn(move || {
            let item = wrapped.try_take();
            if item.is_none() {
                wrapped.close();
            }
            item
        })
    }
}

/// [`Observer`] pushing the observed values into a channel.
struct Buffer<T>(mpsc::UnboundedSender<T>);

impl<T> Observer<T> for Buffer<T>
where
    T: Clone + Send,
{
    fn on_next(&self, value: &T) {
        let _ = self.0.unbounded_send(value.clone());
    }

    fn on_error(&self, error: &Error) {
        warn!("Buffered push source failed: {}", error);
        self.0.close_channel();
    }

    fn on_completed(&self) {
        self.0.close_channel();
    }
}

/// [`Subscription`] which is unsubscribed on [`Drop`].
struct Unsubscribe(Option<Subscription>);

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        if let Some(sub) = self.0.take() {
            sub.unsubscribe();
        }
    }
}
