use crate::error::Result;
use crate::observable::{new_gate, Callback, Gate, Observable, Source, SubscriberList, Subscription};
use crate::structural::{deep_freeze, naive_object_comparison, Frozen};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct SubjectInner<T> {
    name: Arc<str>,
    gate: Gate,
    current: RwLock<Frozen<T>>,
    version: AtomicU64,
    subscribers: SubscriberList<Frozen<T>>,
}

/// A behavior subject over frozen snapshots.
///
/// Holds exactly one current snapshot. Publishing a value structurally equal
/// to it does nothing at all; any other value becomes current and is pushed
/// to every subscriber, in subscription order, before `publish` returns.
/// New subscribers receive the current snapshot immediately.
///
/// Cloning gives another handle to the same channel.
pub struct StoreSubject<T> {
    inner: Arc<SubjectInner<T>>,
}

impl<T> Clone for StoreSubject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Serialize + Send + Sync + 'static> StoreSubject<T> {
    /// Create a channel whose current value is the frozen `initial`.
    pub fn new(initial: T) -> Self {
        Self::named(initial, "store")
    }

    /// Create a channel labelled `name` in log events.
    pub fn named(initial: T, name: impl Into<Arc<str>>) -> Self {
        Self {
            inner: Arc::new(SubjectInner {
                name: name.into(),
                gate: new_gate(),
                current: RwLock::new(deep_freeze(initial)),
                version: AtomicU64::new(0),
                subscribers: SubscriberList::new(),
            }),
        }
    }

    /// The current snapshot.
    pub fn value(&self) -> Frozen<T> {
        self.inner.current.read().clone()
    }

    /// Number of distinct values published since construction.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }

    /// Freeze and publish a value.
    ///
    /// Returns `Ok(false)` when the value equals the current snapshot and was
    /// dropped, `Ok(true)` when it was broadcast.
    pub fn publish(&self, value: T) -> Result<bool> {
        self.publish_frozen(deep_freeze(value))
    }

    /// Publish an already frozen snapshot without copying it.
    pub fn publish_frozen(&self, next: Frozen<T>) -> Result<bool> {
        let _gate = self.inner.gate.lock();

        let current = self.value();
        if naive_object_comparison(&*next, &*current)? {
            tracing::debug!(store = %self.inner.name, "publish skipped: state unchanged");
            return Ok(false);
        }

        *self.inner.current.write() = next.clone();
        let version = self.inner.version.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(store = %self.inner.name, version, "publishing snapshot");

        self.inner.subscribers.notify(&next);
        Ok(true)
    }

    /// Run `f` with emissions of this channel held off.
    ///
    /// No other thread can publish until `f` returns, so a read of
    /// [`value`](Self::value) followed by a publish inside `f` cannot lose a
    /// concurrent write. Publishing from `f` itself is allowed.
    pub(crate) fn exclusive<R>(&self, f: impl FnOnce() -> R) -> R {
        let _gate = self.inner.gate.lock();
        f()
    }

    /// Subscribe to snapshots, starting with the current one.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Frozen<T>) + Send + Sync + 'static,
    {
        self.as_observable().subscribe(callback)
    }

    /// The channel as a stream of snapshots.
    pub fn as_observable(&self) -> Observable<Frozen<T>> {
        let source: Arc<dyn Source<Frozen<T>>> = self.inner.clone();
        Observable::new(source, Arc::clone(&self.inner.gate))
    }
}

impl<T: Send + Sync + 'static> Source<Frozen<T>> for SubjectInner<T> {
    fn subscribe(self: Arc<Self>, callback: Callback<Frozen<T>>) -> Subscription {
        let id = self.subscribers.add(Arc::clone(&callback));
        let current = self.current.read().clone();
        callback(&current);

        let inner = Arc::downgrade(&self);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.subscribers.remove(id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::sync::atomic::AtomicUsize;

    fn recorder(subject: &StoreSubject<Value>) -> (Arc<Mutex<Vec<Value>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let subscription = subject.subscribe(move |snapshot| sink.lock().push((**snapshot).clone()));
        (seen, subscription)
    }

    #[test]
    fn subscribe_replays_the_current_value() {
        let subject = StoreSubject::new(json!({ "a": 1 }));
        let (seen, _subscription) = recorder(&subject);
        assert_eq!(*seen.lock(), vec![json!({ "a": 1 })]);
    }

    #[test]
    fn equal_values_are_not_broadcast() {
        let subject = StoreSubject::new(json!({ "a": 1 }));
        let (seen, _subscription) = recorder(&subject);

        assert!(!subject.publish(json!({ "a": 1 })).unwrap());
        assert_eq!(subject.version(), 0);
        assert_eq!(seen.lock().len(), 1);

        assert!(subject.publish(json!({ "a": 2 })).unwrap());
        assert_eq!(subject.version(), 1);
        assert_eq!(*seen.lock(), vec![json!({ "a": 1 }), json!({ "a": 2 })]);
    }

    #[test]
    fn broadcast_happens_before_publish_returns() {
        let subject = StoreSubject::new(0u32);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let _subscription = subject.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        subject.publish(1).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn old_snapshots_stay_valid() {
        let subject = StoreSubject::new(vec![1, 2]);
        let before = subject.value();
        subject.publish(vec![3]).unwrap();

        assert_eq!(*before, vec![1, 2]);
        assert_eq!(*subject.value(), vec![3]);
    }

    #[test]
    fn subscribers_may_publish_from_callbacks() {
        let subject = StoreSubject::new(0u32);
        let relay = subject.clone();
        let _subscription = subject.subscribe(move |n| {
            if **n == 1 {
                relay.publish(2).unwrap();
            }
        });

        subject.publish(1).unwrap();
        assert_eq!(*subject.value(), 2);
    }

    #[test]
    fn publishing_an_unserializable_value_fails() {
        use std::collections::HashMap;

        let subject = StoreSubject::new(HashMap::<(u8, u8), u8>::new());
        let mut broken = HashMap::new();
        broken.insert((1, 1), 1);
        assert!(subject.publish(broken).is_err());
        assert!(subject.value().is_empty());
    }
}
