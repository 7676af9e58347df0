//! Thread-safe multicast dispatcher of [`Observer`] notifications.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
};

use futures::channel::mpsc;
use parking_lot::RwLock;

use crate::{
    log::prelude::*,
    observer::{Notification, Observer, Subscription},
    Error,
};

/// Type-erased registry of observers, used by [`Subscription`] to unsubscribe
/// without knowing the notification type.
pub(crate) trait Registry: Send + Sync {
    /// Removes the observer with the provided ID. Returns `false` if there was
    /// no such observer.
    fn remove(&self, id: u64) -> bool;

    /// Indicates whether the observer with the provided ID is registered.
    fn contains(&self, id: u64) -> bool;
}

/// Observers registered in a [`ProxyObservable`].
pub(crate) struct Subscribers<T> {
    /// ID to be assigned to the next registered observer.
    next_id: AtomicU64,

    /// Registered observers.
    ///
    /// [`None`] once a terminal notification has been sent.
    observers: RwLock<Option<HashMap<u64, Arc<dyn Observer<T>>>>>,
}

impl<T> Subscribers<T> {
    /// Clones all the registered observers, so they can be notified without
    /// holding the lock.
    fn snapshot(&self) -> Vec<Arc<dyn Observer<T>>> {
        self.observers
            .read()
            .iter()
            .flat_map(HashMap::values)
            .cloned()
            .collect()
    }

    /// Removes and returns all the registered observers, refusing any further
    /// registrations.
    fn drain(&self) -> Vec<Arc<dyn Observer<T>>> {
        self.observers
            .write()
            .take()
            .map(|observers| observers.into_iter().map(|(_, o)| o).collect())
            .unwrap_or_default()
    }
}

impl<T> Registry for Subscribers<T> {
    fn remove(&self, id: u64) -> bool {
        let removed = self
            .observers
            .write()
            .as_mut()
            .and_then(|observers| observers.remove(&id))
            .is_some();
        if removed {
            debug!("Observer {} unsubscribed", id);
        }
        removed
    }

    fn contains(&self, id: u64) -> bool {
        self.observers
            .read()
            .as_ref()
            .map_or(false, |observers| observers.contains_key(&id))
    }
}

/// Multicast notifier which fans out every notification to a dynamic set of
/// [`Observer`]s.
///
/// Subscribing, unsubscribing and notifying may happen concurrently from
/// different threads without any external locking. Observers are invoked
/// outside of the internal lock, so an [`Observer`] may freely unsubscribe
/// itself (or anyone else) while being notified.
///
/// The order in which [`Observer`]s are notified is unspecified.
///
/// [`ProxyObservable::on_error`] and [`ProxyObservable::on_completed`] are
/// terminal: the registered [`Observer`]s are removed after being notified,
/// and [`Observer`]s subscribed later are released right away with an
/// inactive [`Subscription`]. Nothing is ever replayed to late subscribers.
///
/// Cloning a [`ProxyObservable`] is cheap and results in a handle to the same
/// set of [`Observer`]s.
pub struct ProxyObservable<T> {
    subs: Arc<Subscribers<T>>,
}

impl<T> ProxyObservable<T> {
    /// Creates new [`ProxyObservable`] without any [`Observer`]s.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subs: Arc::new(Subscribers {
                next_id: AtomicU64::new(0),
                observers: RwLock::new(Some(HashMap::new())),
            }),
        }
    }

    /// Registers the provided [`Observer`].
    ///
    /// The [`Observer`] is held until [`Subscription::unsubscribe`] is called
    /// or this [`ProxyObservable`] terminates. If it has terminated already,
    /// the [`Observer`] is dropped at once.
    pub fn subscribe<O>(&self, observer: O) -> Subscription
    where
        O: Observer<T> + 'static,
        T: 'static,
    {
        self.subscribe_arc(Arc::new(observer))
    }

    /// Registers the provided shared [`Observer`].
    pub fn subscribe_arc(&self, observer: Arc<dyn Observer<T>>) -> Subscription
    where
        T: 'static,
    {
        let id = self.subs.next_id.fetch_add(1, Ordering::Relaxed);
        if let Some(observers) = self.subs.observers.write().as_mut() {
            let _ = observers.insert(id, observer);
            debug!("Observer {} subscribed", id);

            let subs: Arc<dyn Registry> = Arc::clone(&self.subs) as _;
            return Subscription::new(id, Arc::downgrade(&subs));
        }
        debug!("Observer {} released, as notifier is terminated", id);

        let gone: Weak<dyn Registry> = Weak::<Subscribers<T>>::new();
        Subscription::new(id, gone)
    }

    /// Subscribes to all the notifications with an unbounded channel.
    ///
    /// The returned receiver ends after a [`Notification::Completed`] or a
    /// [`Notification::Error`], or right away if this [`ProxyObservable`] has
    /// terminated already.
    pub fn subscribe_stream(&self) -> mpsc::UnboundedReceiver<Notification<T>>
    where
        T: Clone + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded();
        let _ = self.subscribe(tx);
        rx
    }

    /// Returns count of the currently registered [`Observer`]s.
    pub fn subscribers_count(&self) -> usize {
        self.subs.observers.read().as_ref().map_or(0, HashMap::len)
    }

    /// Notifies all the registered [`Observer`]s about the new `value`.
    pub fn on_next(&self, value: &T) {
        for observer in self.subs.snapshot() {
            observer.on_next(value);
        }
    }

    /// Notifies all the registered [`Observer`]s about the `error` and
    /// unregisters them.
    pub fn on_error(&self, error: &Error) {
        for observer in self.subs.drain() {
            observer.on_error(error);
        }
    }

    /// Notifies all the registered [`Observer`]s about completion and
    /// unregisters them.
    pub fn on_completed(&self) {
        for observer in self.subs.drain() {
            observer.on_completed();
        }
    }
}

impl<T> Clone for ProxyObservable<T> {
    fn clone(&self) -> Self {
        Self {
            subs: Arc::clone(&self.subs),
        }
    }
}

impl<T> Default for ProxyObservable<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ProxyObservable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyObservable")
            .field("subscribers", &self.subscribers_count())
            .finish()
    }
}

#[cfg(test)]
mod proxy_observable_spec {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Barrier,
        },
        thread,
    };

    use futures::{executor, StreamExt as _};
    use parking_lot::Mutex;

    use crate::{
        observer::{self, Notification, Observer, Subscription},
        Error,
    };

    use super::ProxyObservable;

    #[test]
    fn fans_out_to_all_subscribers() {
        let proxy = ProxyObservable::new();
        let first = proxy.subscribe_stream();
        let second = proxy.subscribe_stream();

        proxy.on_next(&1);
        proxy.on_next(&2);
        proxy.on_completed();

        for rx in vec![first, second] {
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
    }

    #[test]
    fn unsubscribed_observer_receives_nothing() {
        let proxy = ProxyObservable::new();
        let count = Arc::new(AtomicUsize::new(0));
        let sub = {
            let count = Arc::clone(&count);
            proxy.subscribe(observer::from_fn(move |_: &u8| {
                let _ = count.fetch_add(1, Ordering::SeqCst);
            }))
        };

        proxy.on_next(&1);
        assert!(sub.is_active());
        sub.unsubscribe();
        proxy.on_next(&2);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(proxy.subscribers_count(), 0);
    }

    #[test]
    fn terminal_notifications_unregister_observers() {
        let proxy = ProxyObservable::<u8>::new();
        let rx = proxy.subscribe_stream();

        proxy.on_error(&Error::KeyNotFound);
        assert_eq!(proxy.subscribers_count(), 0);
        proxy.on_completed();

        let received: Vec<_> = executor::block_on(rx.collect());
        assert_eq!(received, vec![Notification::Error(Error::KeyNotFound)]);
    }

    #[test]
    fn releases_observers_subscribed_after_termination() {
        let proxy = ProxyObservable::<u8>::new();
        proxy.on_completed();

        let sub = proxy.subscribe(observer::from_fn(|_: &u8| {}));
        let late = proxy.subscribe_stream();
        proxy.on_next(&1);

        assert!(!sub.is_active());
        assert_eq!(proxy.subscribers_count(), 0);
        let late: Vec<_> = executor::block_on(late.collect());
        assert!(late.is_empty());
        sub.unsubscribe();
    }

    /// Observer which unsubscribes itself on the first notification.
    struct SelfRemoving {
        sub: Mutex<Option<Subscription>>,
        calls: AtomicUsize,
    }

    impl Observer<u8> for SelfRemoving {
        fn on_next(&self, _: &u8) {
            let _ = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = self.sub.lock().take() {
                sub.unsubscribe();
            }
        }

        fn on_error(&self, _: &Error) {}

        fn on_completed(&self) {}
    }

    #[test]
    fn observer_may_unsubscribe_while_notified() {
        let proxy = ProxyObservable::<u8>::new();
        let observer = Arc::new(SelfRemoving {
            sub: Mutex::new(None),
            calls: AtomicUsize::new(0),
        });
        let sub = proxy.subscribe_arc(Arc::clone(&observer) as _);
        *observer.sub.lock() = Some(sub);
        let other = proxy.subscribe_stream();

        proxy.on_next(&1);
        proxy.on_next(&2);
        proxy.on_completed();

        assert_eq!(observer.calls.load(Ordering::SeqCst), 1);
        let received: Vec<_> = executor::block_on(other.collect());
        assert_eq!(received.len(), 3);
    }

    #[test]
    fn supports_concurrent_subscriptions_and_notifications() {
        const THREADS: usize = 8;

        let proxy = ProxyObservable::<usize>::new();
        let total = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let proxy = proxy.clone();
                let total = Arc::clone(&total);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let sub = proxy.subscribe(observer::from_fn(
                        move |v: &usize| {
                            let _ = total.fetch_add(*v, Ordering::SeqCst);
                        },
                    ));
                    proxy.on_next(&i);
                    sub.unsubscribe();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(proxy.subscribers_count(), 0);
        assert!(total.load(Ordering::SeqCst) >= (0..THREADS).sum::<usize>());
    }
}
