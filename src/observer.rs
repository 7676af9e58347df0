//! Listener side of the notifications flowing through progressors.

use std::{
    fmt,
    sync::{Arc, Weak},
};

use futures::channel::mpsc;

use crate::{proxy::Registry, Error};

/// Receiver of the values pulled from a progressor and of its termination.
///
/// All the methods are called synchronously by the notifying side, so they
/// should return quickly.
pub trait Observer<T>: Send + Sync {
    /// Called with every value successfully pulled from a progressor.
    fn on_next(&self, value: &T);

    /// Called once when a progressor is aborted with the provided [`Error`].
    fn on_error(&self, error: &Error);

    /// Called once when a progressor is closed.
    fn on_completed(&self);
}

/// Single notification delivered to an [`Observer`], in a form suitable for
/// sending over channels.
#[derive(Clone, Debug, PartialEq)]
pub enum Notification<T> {
    /// [`Observer::on_next`] was called with this value.
    Next(T),

    /// [`Observer::on_error`] was called with this [`Error`].
    Error(Error),

    /// [`Observer::on_completed`] was called.
    Completed,
}

impl<T> Observer<T> for mpsc::UnboundedSender<Notification<T>>
where
    T: Clone + Send,
{
    fn on_next(&self, value: &T) {
        let _ = self.unbounded_send(Notification::Next(value.clone()));
    }

    fn on_error(&self, error: &Error) {
        let _ = self.unbounded_send(Notification::Error(error.clone()));
        self.close_channel();
    }

    fn on_completed(&self) {
        let _ = self.unbounded_send(Notification::Completed);
        self.close_channel();
    }
}

/// [`Observer`] assembled from closures.
///
/// Created with [`from_fn`]. Handlers which are not provided do nothing.
pub struct FnObserver<N> {
    on_next: N,
    on_error: Option<Box<dyn Fn(&Error) + Send + Sync>>,
    on_completed: Option<Box<dyn Fn() + Send + Sync>>,
}

/// Creates new [`FnObserver`] calling the provided closure on every value.
#[inline]
pub fn from_fn<T, N>(on_next: N) -> FnObserver<N>
where
    N: Fn(&T) + Send + Sync,
{
    FnObserver {
        on_next,
        on_error: None,
        on_completed: None,
    }
}

impl<N> FnObserver<N> {
    /// Sets the closure called on [`Observer::on_error`].
    #[must_use]
    pub fn handle_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Sets the closure called on [`Observer::on_completed`].
    #[must_use]
    pub fn handle_completed<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_completed = Some(Box::new(f));
        self
    }
}

impl<T, N> Observer<T> for FnObserver<N>
where
    N: Fn(&T) + Send + Sync,
{
    #[inline]
    fn on_next(&self, value: &T) {
        (self.on_next)(value);
    }

    fn on_error(&self, error: &Error) {
        if let Some(f) = &self.on_error {
            f(error);
        }
    }

    fn on_completed(&self) {
        if let Some(f) = &self.on_completed {
            f();
        }
    }
}

impl<N> fmt::Debug for FnObserver<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnObserver")
            .field("on_error", &self.on_error.is_some())
            .field("on_completed", &self.on_completed.is_some())
            .finish()
    }
}

/// Handle of an [`Observer`] registered in a [`ProxyObservable`].
///
/// Dropping this handle does __not__ unsubscribe: the [`Observer`] stays
/// registered until [`Subscription::unsubscribe`] is called or the
/// [`ProxyObservable`] terminates.
///
/// [`ProxyObservable`]: crate::ProxyObservable
pub struct Subscription {
    /// ID of the registered [`Observer`].
    id: u64,

    /// Subscribers of the [`ProxyObservable`] this [`Subscription`] belongs
    /// to.
    ///
    /// [`ProxyObservable`]: crate::ProxyObservable
    subs: Weak<dyn Registry>,
}

impl Subscription {
    pub(crate) fn new(id: u64, subs: Weak<dyn Registry>) -> Self {
        Self { id, subs }
    }

    /// Removes the [`Observer`] from its [`ProxyObservable`].
    ///
    /// [`ProxyObservable`]: crate::ProxyObservable
    pub fn unsubscribe(self) {
        if let Some(subs) = self.subs.upgrade() {
            let _ = subs.remove(self.id);
        }
    }

    /// Indicates whether the [`Observer`] is still registered.
    pub fn is_active(&self) -> bool {
        self.subs
            .upgrade()
            .map_or(false, |subs: Arc<dyn Registry>| subs.contains(self.id))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod observer_spec {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use futures::{channel::mpsc, executor, StreamExt as _};

    use crate::Error;

    use super::{from_fn, Notification, Observer};

    #[test]
    fn channel_observer_closes_on_completion() {
        let (tx, rx) = mpsc::unbounded::<Notification<i32>>();

        tx.on_next(&1);
        tx.on_next(&2);
        tx.on_completed();
        tx.on_next(&3);

        let received: Vec<_> = executor::block_on(rx.collect());
        assert_eq!(
            received,
            vec![
                Notification::Next(1),
                Notification::Next(2),
                Notification::Completed,
            ],
        );
    }

    #[test]
    fn channel_observer_ignores_dropped_receiver() {
        let (tx, rx) = mpsc::unbounded::<Notification<u8>>();
        drop(rx);

        tx.on_next(&1);
        tx.on_error(&Error::KeyNotFound);
    }

    #[test]
    fn fn_observer_calls_only_provided_handlers() {
        let nexts = Arc::new(AtomicUsize::new(0));
        let completions = Arc::new(AtomicUsize::new(0));

        let observer = {
            let nexts = Arc::clone(&nexts);
            let completions = Arc::clone(&completions);
            from_fn(move |v: &usize| {
                let _ = nexts.fetch_add(*v, Ordering::SeqCst);
            })
            .handle_completed(move || {
                let _ = completions.fetch_add(1, Ordering::SeqCst);
            })
        };

        observer.on_next(&2);
        observer.on_next(&3);
        observer.on_error(&Error::KeyNotFound);
        observer.on_completed();

        assert_eq!(nexts.load(Ordering::SeqCst), 5);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }
}
