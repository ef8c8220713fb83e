use parking_lot::{Mutex, ReentrantMutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub(crate) type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Serializes emissions and subscriptions of one store.
///
/// Every stream derived from a store shares its gate, so a value travels
/// through the whole derived graph before the next one is published. The
/// lock is re-entrant: a subscriber may publish or subscribe from inside its
/// callback on the same thread.
pub(crate) type Gate = Arc<ReentrantMutex<()>>;

pub(crate) fn new_gate() -> Gate {
    Arc::new(ReentrantMutex::new(()))
}

/// Something that can push values to callbacks.
pub(crate) trait Source<T>: Send + Sync {
    fn subscribe(self: Arc<Self>, callback: Callback<T>) -> Subscription;
}

/// Ordered list of live callbacks.
pub(crate) struct SubscriberList<T> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Callback<T>)>>,
}

impl<T> SubscriberList<T> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, callback: Callback<T>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().push((id, callback));
        id
    }

    pub(crate) fn remove(&self, id: u64) {
        self.entries.lock().retain(|(entry, _)| *entry != id);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Call every subscriber in registration order.
    ///
    /// The list is snapshotted first so callbacks may subscribe or
    /// unsubscribe without deadlocking.
    pub(crate) fn notify(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = self
            .entries
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(value);
        }
    }
}

/// RAII handle for a stream subscription.
///
/// Dropping it, or calling [`unsubscribe`](Subscription::unsubscribe), stops
/// notifications to that one subscriber. Other subscribers and the store are
/// unaffected.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop receiving values.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// A push-stream of values.
///
/// Subscribing never blocks waiting for a value: streams built by this crate
/// hand the latest value to a new subscriber synchronously, then every later
/// value in publish order. Cloning shares the same stream.
pub struct Observable<T> {
    source: Arc<dyn Source<T>>,
    gate: Gate,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<T: 'static> Observable<T> {
    pub(crate) fn new(source: Arc<dyn Source<T>>, gate: Gate) -> Self {
        Self { source, gate }
    }

    pub(crate) fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Subscribe to values.
    ///
    /// The callback runs on the publishing thread, before the publish call
    /// returns.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let _gate = self.gate.lock();
        Arc::clone(&self.source).subscribe(Arc::new(callback))
    }

    /// Transform every value. No deduplication or caching is added.
    pub fn map<U, F>(&self, f: F) -> Observable<U>
    where
        U: 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let mapped = Mapped {
            upstream: self.clone(),
            f: Arc::new(f),
        };
        Observable::new(Arc::new(mapped), Arc::clone(&self.gate))
    }

    /// The value a new subscriber would receive first, if any.
    pub fn current(&self) -> Option<T>
    where
        T: Clone + Send,
    {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let subscription = self.subscribe(move |value: &T| {
            let mut slot = sink.lock();
            if slot.is_none() {
                *slot = Some(value.clone());
            }
        });
        drop(subscription);
        let value = seen.lock().take();
        value
    }
}

struct Mapped<S, U> {
    upstream: Observable<S>,
    f: Arc<dyn Fn(&S) -> U + Send + Sync>,
}

impl<S: 'static, U: 'static> Source<U> for Mapped<S, U> {
    fn subscribe(self: Arc<Self>, callback: Callback<U>) -> Subscription {
        let f = Arc::clone(&self.f);
        self.upstream.subscribe(move |value| callback(&f(value)))
    }
}
